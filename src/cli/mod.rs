pub mod commands;
pub mod config;
pub mod format;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::client::AdminClient;
use crate::pages::{PageContext, TableKind};
use crate::session::guard::{self, Access, Route};
use crate::session::{SessionContext, User};
use crate::table::DataTable;

#[derive(Parser)]
#[command(name = "backoffice")]
#[command(about = "Back office admin - browse and edit orders, products and users from the terminal")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Sign in and out of the back office")]
    Auth {
        #[command(subcommand)]
        cmd: commands::auth::AuthCommands,
    },

    #[command(about = "List, filter and edit table rows")]
    Table {
        #[command(subcommand)]
        cmd: commands::table::TableCommands,
    },

    #[command(about = "Interactive table browser")]
    Browse {
        #[arg(value_enum, help = "Table to open")]
        table: TableKind,
    },

    #[command(about = "Run the in-memory back office locally")]
    Serve {
        #[arg(long, help = "Port to listen on (defaults to ADMIN_SERVER_PORT)")]
        port: Option<u16>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

/// A client carrying the saved session plus who that session belongs to
pub struct Connection {
    pub client: AdminClient,
    pub session: SessionContext,
}

impl Connection {
    /// Restore the saved cookie and ask the server who it belongs to
    pub async fn open() -> anyhow::Result<Self> {
        let saved = config::load_session()?;
        let api = &crate::config::config().api;
        let base_url = saved.base_url.clone().unwrap_or_else(|| api.base_url.clone());
        let client = AdminClient::new(&base_url, Duration::from_secs(api.request_timeout_secs))?
            .with_cookie(saved.cookie.as_deref());
        let session = if client.session_cookie().is_some() {
            SessionContext::load(&client).await
        } else {
            SessionContext::anonymous()
        };
        Ok(Self { client, session })
    }

    /// Enforce the route guard for `route`
    pub fn require(&self, route: Route) -> anyhow::Result<User> {
        match guard::check(&self.session, route) {
            Access::Allow(user) => Ok(user),
            Access::Redirect(Route::Login) | Access::Anonymous => {
                Err(anyhow::anyhow!("Not logged in. Run `backoffice auth login <username>` first"))
            }
            Access::Redirect(_) => Err(anyhow::anyhow!("The {} page requires an admin account", route.title())),
        }
    }

    /// Guard, build and mount one table
    pub async fn table(&self, kind: TableKind) -> anyhow::Result<DataTable> {
        self.require(kind.route())?;
        let ctx = PageContext::new(self.client.clone(), &self.session);
        let mut table = ctx.table(kind).await;
        table.mount().await;
        Ok(table)
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Auth { cmd } => commands::auth::handle(cmd, output_format).await,
        Commands::Table { cmd } => commands::table::handle(cmd, output_format).await,
        Commands::Browse { table } => commands::browse::handle(table, output_format).await,
        Commands::Serve { port } => commands::serve::handle(port).await,
    }
}
