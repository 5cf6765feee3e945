use std::sync::Arc;
use tokio::time::{interval, Duration};
use tracing::{error, info};

pub mod tasks;

/// Job scheduler for background tasks
pub struct JobScheduler {
    context: Arc<crate::context::AppContext>,
}

impl JobScheduler {
    pub fn new(context: Arc<crate::context::AppContext>) -> Self {
        Self { context }
    }

    /// Start all background jobs
    pub fn start(self: Arc<Self>) {
        info!("Starting background job scheduler");

        if self.context.config.jobs.orphan_sweep_enabled {
            tokio::spawn(Self::orphan_sweep_job(Arc::clone(&self)));
        } else {
            info!("Orphan sweep disabled");
        }

        tokio::spawn(Self::health_check_job(Arc::clone(&self)));

        info!("Background jobs started");
    }

    /// Remove stored files no row references (default every 6 hours)
    async fn orphan_sweep_job(scheduler: Arc<Self>) {
        let period = scheduler.context.config.jobs.orphan_sweep_interval_secs.max(1);
        let mut interval = interval(Duration::from_secs(period));

        loop {
            interval.tick().await;
            info!("Running orphan file sweep");

            match tasks::sweep_orphaned_files(&scheduler.context).await {
                Ok(count) => {
                    if count > 0 {
                        info!("Removed {} orphaned file(s)", count);
                    } else {
                        info!("Orphan sweep: no orphaned files found");
                    }
                }
                Err(e) => error!("Failed to sweep orphaned files: {}", e),
            }
        }
    }

    /// Health check job (runs every 5 minutes)
    async fn health_check_job(scheduler: Arc<Self>) {
        let mut interval = interval(Duration::from_secs(300));

        loop {
            interval.tick().await;

            if let Err(e) = tasks::health_check(&scheduler.context).await {
                error!("Health check failed: {}", e);
            }
        }
    }
}
