use std::{net::SocketAddr, sync::Arc};

use engine::{Engine, Scheduler, SystemClock};
use migration::{Migrator, MigratorTrait};
use settings::Database;
use tokio::sync::watch;

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;
    let mut tasks = tokio::task::JoinSet::new();

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "tally={level},server={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let db = parse_database(&settings.server.database).await?;
    let engine = Engine::builder()
        .database(db)
        .config(settings.engine.to_config())
        .clock(Arc::new(SystemClock))
        .build()
        .await?;
    let engine = Arc::new(engine);

    let bind = settings
        .server
        .bind
        .clone()
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let addr: SocketAddr = format!("{}:{}", bind, settings.server.port).parse()?;

    // Validated before any task starts.
    let scheduler = match &settings.scheduler {
        Some(scheduler) => {
            tracing::info!("Found scheduler settings...");
            let config = scheduler.to_config();
            Some(Scheduler::new(engine.clone(), engine.clock().clone(), config)?)
        }
        None => None,
    };

    tasks.spawn(server::run(engine.clone(), addr));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    if let Some(scheduler) = scheduler {
        tasks.spawn(scheduler.run(shutdown_rx));
    }

    tokio::select! {
        _ = tasks.join_next() => {}
        signal = tokio::signal::ctrl_c() => {
            if let Err(err) = signal {
                tracing::error!("failed to listen for shutdown signal: {err}");
            }
            tracing::info!("shutting down");
        }
    }

    let _ = shutdown_tx.send(true);
    tasks.shutdown().await;

    Ok(())
}

async fn parse_database(
    config: &Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
