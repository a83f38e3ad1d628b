use backoffice_admin::config;
use backoffice_admin::server::{self, SessionKeys};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up SESSION_SECRET, PORT, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")))
        .init();

    let config = config::config();
    tracing::info!("Starting back office in {:?} mode", config.environment);

    if backoffice_admin::is_production!() && !config.security.require_https {
        tracing::warn!("session cookies are not marked Secure in production");
    }

    let keys = SessionKeys::from_config()?;
    server::serve(config.server.port, keys).await
}
