/// Share Token Issuer
///
/// A share token grants unauthenticated read access to one work. It is
/// generated once, on first need, and never changes afterwards.
use crate::db::{Work, WorkStatus};
use crate::error::{WorkError, WorkResult};
use crate::work_store::{fetch_work, load_details, work_select, WorkDetails};
use rand::Rng;
use sqlx::SqlitePool;
use tracing::{debug, info};

/// Random bytes per token (hex encoded to 64 characters)
pub const SHARE_TOKEN_BYTES: usize = 32;

/// Share token issuer
#[derive(Clone)]
pub struct ShareTokenIssuer {
    db: SqlitePool,
}

impl ShareTokenIssuer {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Generate a new high-entropy token
    pub fn generate_token() -> String {
        let bytes: [u8; SHARE_TOKEN_BYTES] = rand::thread_rng().gen();
        hex::encode(bytes)
    }

    /// Return the work's token, creating and persisting one if absent
    pub async fn get_or_create_token(&self, work_id: i64) -> WorkResult<String> {
        let work = fetch_work(&self.db, work_id)
            .await?
            .ok_or_else(|| WorkError::NotFound(format!("Work {} not found", work_id)))?;

        if let Some(token) = work.share_token {
            return Ok(token);
        }

        let token = Self::generate_token();
        let result = sqlx::query("UPDATE works SET share_token = ? WHERE id = ? AND share_token IS NULL")
            .bind(&token)
            .bind(work_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 1 {
            info!("Issued share token for work {}", work_id);
            return Ok(token);
        }

        // Another request issued one first; theirs is the token
        debug!("Share token for work {} was issued concurrently", work_id);
        let stored: Option<String> = sqlx::query_scalar("SELECT share_token FROM works WHERE id = ?")
            .bind(work_id)
            .fetch_optional(&self.db)
            .await?
            .flatten();

        stored.ok_or_else(|| WorkError::NotFound(format!("Work {} not found", work_id)))
    }

    /// Active work behind a share token
    pub async fn find_active(&self, token: &str) -> WorkResult<Work> {
        let work = sqlx::query_as::<_, Work>(work_select!("WHERE share_token = ? AND status = ?"))
            .bind(token)
            .bind(WorkStatus::Active)
            .fetch_optional(&self.db)
            .await?;

        work.ok_or_else(|| WorkError::NotFound("Work not found or not available".to_string()))
    }

    /// Active work behind a share token, with every dependent row
    pub async fn shared_details(&self, token: &str) -> WorkResult<WorkDetails> {
        let work = self.find_active(token).await?;
        load_details(&self.db, work).await
    }
}
