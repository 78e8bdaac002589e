use std::net::SocketAddr;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use attendance_ledger::api::{self, AppState};
use attendance_ledger::attendance::AttendanceRecorder;
use attendance_ledger::audit::AuditEmitter;
use attendance_ledger::config::AppConfig;
use attendance_ledger::corrections::CorrectionWorkflow;
use attendance_ledger::database::Database;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "attendance_ledger=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting attendance ledger service");

    // Load configuration
    let config = AppConfig::load().map_err(|e| anyhow::anyhow!("{}", e))?;
    info!("Configuration loaded");

    // Initialize database
    let database = Database::new(&config.database_url).await?;
    info!("Database connected");

    // Run migrations
    database.run_migrations().await?;
    info!("Database migrations completed");

    let audit = AuditEmitter::new(database.clone());
    let recorder = AttendanceRecorder::new(database.clone(), audit.clone());
    let workflow = CorrectionWorkflow::new(database, audit);

    let state = AppState { recorder, workflow };
    let app = api::router(state);

    let addr: SocketAddr = format!("{}:{}", config.server_host, config.server_port).parse()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
