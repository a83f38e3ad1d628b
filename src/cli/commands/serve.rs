use crate::server::{self, SessionKeys};

pub async fn handle(port: Option<u16>) -> anyhow::Result<()> {
    let port = port.unwrap_or(crate::config::config().server.port);
    let keys = SessionKeys::from_config()?;
    server::serve(port, keys).await
}
