use clap::Subcommand;
use serde_json::json;
use std::io::{self, BufRead, Write};
use std::time::Duration;

use crate::cli::config::{self, SessionFile};
use crate::cli::utils::output_success;
use crate::cli::{Connection, OutputFormat};
use crate::client::AdminClient;
use crate::pages::login::LoginForm;
use crate::session::guard::Route;
use crate::session::SessionContext;

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Sign in to the back office")]
    Login {
        #[arg(help = "Username")]
        username: String,
        #[arg(long, help = "Password (read from stdin if not provided)")]
        password: Option<String>,
        #[arg(long, help = "API base URL (defaults to ADMIN_API_BASE_URL)")]
        url: Option<String>,
    },

    #[command(about = "Sign out and forget the saved session")]
    Logout,

    #[command(about = "Show the signed-in user")]
    Whoami,

    #[command(about = "Show session status and the pages available")]
    Status,
}

fn read_password() -> anyhow::Result<String> {
    eprint!("Password: ");
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

pub async fn handle(cmd: AuthCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        AuthCommands::Login { username, password, url } => {
            let password = match password {
                Some(p) => p,
                None => read_password()?,
            };
            let api = &crate::config::config().api;
            let saved = config::load_session()?;
            let base_url = url.or(saved.base_url).unwrap_or_else(|| api.base_url.clone());
            let client = AdminClient::new(&base_url, Duration::from_secs(api.request_timeout_secs))?;

            let mut session = SessionContext::anonymous();
            let mut form = LoginForm::new(username, password);
            if form.submit(&mut session, &client).await.is_none() {
                let message = form.error.unwrap_or_else(|| crate::pages::login::LOGIN_FAILED.to_string());
                return Err(anyhow::anyhow!(message));
            }
            let user = session.user().cloned().ok_or_else(|| anyhow::anyhow!("login returned no user"))?;
            config::save_session(&SessionFile::new(base_url.clone(), client.session_cookie(), user.clone()))?;

            output_success(
                &output_format,
                &format!("Logged in as {} ({})", user.username, user.role),
                Some(json!({ "user": user, "base_url": base_url })),
            )
        }
        AuthCommands::Logout => {
            let mut conn = Connection::open().await?;
            if conn.session.is_authenticated() {
                conn.session.logout(&conn.client).await;
            }
            config::clear_session()?;
            output_success(&output_format, "Logged out", None)
        }
        AuthCommands::Whoami => {
            let conn = Connection::open().await?;
            let user = conn.require(Route::Orders)?;
            output_success(&output_format, &format!("{} ({})", user.username, user.role), Some(json!({ "user": user })))
        }
        AuthCommands::Status => {
            let conn = Connection::open().await?;
            let pages: Vec<&str> = Route::visible_for(conn.session.user()).iter().map(|r| r.title()).collect();
            let message = match conn.session.user() {
                Some(user) => format!(
                    "Signed in to {} as {} ({}); pages: {}",
                    conn.client.base_url(),
                    user.username,
                    user.role,
                    pages.join(", ")
                ),
                None => format!("Not signed in to {}", conn.client.base_url()),
            };
            output_success(
                &output_format,
                &message,
                Some(json!({
                    "base_url": conn.client.base_url().as_str(),
                    "authenticated": conn.session.is_authenticated(),
                    "user": conn.session.user(),
                    "pages": pages,
                })),
            )
        }
    }
}
