#![allow(dead_code)]

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use tokio::net::TcpListener;

use backoffice_admin::client::AdminClient;
use backoffice_admin::pages::{PageContext, TableKind};
use backoffice_admin::server::{self, AppState, SessionKeys, Store};
use backoffice_admin::session::SessionContext;
use backoffice_admin::table::DataTable;

pub const ADMIN: (&str, &str) = ("admin", "admin123");
pub const SUPERUSER: (&str, &str) = ("clerk", "clerk123");
pub const USER: (&str, &str) = ("viewer", "viewer123");

/// A freshly seeded back office running inside the current test's runtime
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub state: AppState,
}

pub fn test_keys() -> SessionKeys {
    SessionKeys {
        secret: "integration-test-secret".into(),
        expiry_hours: 1,
        cookie_name: "admin_session".into(),
        secure: false,
    }
}

impl TestServer {
    pub async fn start() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);
        let listener = TcpListener::bind(("127.0.0.1", port)).await.context("failed to bind test port")?;

        let state = AppState::new(Store::seeded(), test_keys());
        tokio::spawn(server::serve_on(listener, state.clone()));

        let server = Self { port, base_url, state };
        server.wait_ready(Duration::from_secs(5)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        let url = format!("{}/health", self.base_url);
        while Instant::now() < deadline {
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn client(&self) -> Result<AdminClient> {
        Ok(AdminClient::new(&self.base_url, Duration::from_secs(5))?)
    }

    /// Signed-in client plus the session the pages see
    pub async fn login(&self, (username, password): (&str, &str)) -> Result<(AdminClient, SessionContext)> {
        let client = self.client()?;
        let mut session = SessionContext::anonymous();
        session.login(&client, username, password).await?;
        Ok((client, session))
    }

    /// A mounted table as the given account sees it
    pub async fn table(&self, account: (&str, &str), kind: TableKind) -> Result<DataTable> {
        let (client, session) = self.login(account).await?;
        let ctx = PageContext::new(client, &session);
        let mut table = ctx.table(kind).await;
        table.mount().await;
        Ok(table)
    }
}
