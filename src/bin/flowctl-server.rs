//! flowctl-server: HTTP API + scheduler supervisor binary.

use std::net::SocketAddr;
use std::path::PathBuf;

use flowctl::api::routes::create_router;
use flowctl::config::ServerConfig;
use flowctl::db::DatabaseConnection;
use flowctl::scheduler::SchedulerSupervisor;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let rust_log = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt().with_env_filter(rust_log).init();

    tracing::info!("loading server configuration");
    let config = ServerConfig::load()?;

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    let database_url = config.database_url();
    tracing::info!(database_url, "connecting to database");
    let db = DatabaseConnection::new(&database_url).await?;

    tracing::info!("running database migrations");
    db.run_migrations().await?;
    db.health_check().await?;

    let worker_binary = worker_binary_path();
    tracing::info!(path = %worker_binary.display(), "resolved worker binary");

    let supervisor = SchedulerSupervisor::new(db.pool().clone(), worker_binary, config.clone());
    supervisor.start().await?;

    tracing::info!("building API router");
    let app = create_router(db);

    tracing::info!(%addr, "starting flowctl-server");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    supervisor.stop().await;
    tracing::info!("flowctl-server shut down gracefully");
    Ok(())
}

/// The worker binary ships alongside the server binary; resolve it relative
/// to the running executable rather than assuming it's on `PATH`.
fn worker_binary_path() -> PathBuf {
    if let Ok(path) = std::env::var("FLOWCTL_WORKER_BIN") {
        return PathBuf::from(path);
    }
    let exe_name = if cfg!(windows) { "flowctl-worker.exe" } else { "flowctl-worker" };
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|dir| dir.join(exe_name)))
        .unwrap_or_else(|| PathBuf::from(exe_name))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install CTRL-C signal handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received CTRL-C, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
