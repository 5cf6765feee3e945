/// AR Works - work storage daemon
///
/// Opens the works database and storage root, then runs the background
/// maintenance jobs until interrupted.
use ar_works::{config::AppConfig, context::AppContext, jobs::JobScheduler};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;

    // Initialize logging
    tracing_subscriber::registry()
        .with(config.logging.env_filter())
        .with(tracing_subscriber::fmt::layer())
        .init();

    print_banner();

    info!(
        "Storage root {:?}, database {:?}",
        config.storage.uploads_directory, config.database.location
    );

    let ctx = Arc::new(AppContext::new(config).await?);

    let scheduler = Arc::new(JobScheduler::new(Arc::clone(&ctx)));
    scheduler.start();

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");

    ctx.db.close().await;
    Ok(())
}

fn print_banner() {
    println!(
        r#"
    _   ___   __    __         _
   /_\ | _ \  \ \  / /__ _ _| |__ ___
  / _ \|   /   \ \/\/ / _ \ '_| / /(_-<
 /_/ \_\_|_\    \_/\_/\___/_| |_\_\/__/

        AR Works storage daemon v{}
        "#,
        env!("CARGO_PKG_VERSION")
    );
}
