use crate::session::guard::Route;
use crate::session::{AuthApi, SessionContext, SessionError};

pub const LOGIN_FAILED: &str = "Login failed. Please try again.";

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub error: Option<String>,
}

impl LoginForm {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self { username: username.into(), password: password.into(), error: None }
    }

    /// Sign in and return where to go next; on failure the form keeps the
    /// username, clears the password and shows a message
    pub async fn submit(&mut self, session: &mut SessionContext, api: &dyn AuthApi) -> Option<Route> {
        self.error = None;
        match session.login(api, &self.username, &self.password).await {
            Ok(_) => {
                self.password.clear();
                Some(Route::Orders)
            }
            Err(e) => {
                self.error = Some(match e {
                    SessionError::MissingCredentials | SessionError::Rejected => e.to_string(),
                    SessionError::Api(cause) => {
                        tracing::error!("login request failed: {:#}", cause);
                        LOGIN_FAILED.to_string()
                    }
                });
                self.password.clear();
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{Role, User};
    use async_trait::async_trait;

    struct FixedAuth(Result<Option<User>, &'static str>);

    #[async_trait]
    impl AuthApi for FixedAuth {
        async fn current_user(&self) -> anyhow::Result<Option<User>> {
            Ok(None)
        }

        async fn login(&self, _: &str, _: &str) -> anyhow::Result<Option<User>> {
            self.0.clone().map_err(anyhow::Error::msg)
        }

        async fn logout(&self) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn successful_login_goes_home() {
        let api = FixedAuth(Ok(Some(User { username: "root".into(), role: Role::Admin })));
        let mut session = SessionContext::anonymous();
        let mut form = LoginForm::new("root", "pw");
        assert_eq!(form.submit(&mut session, &api).await, Some(Route::Orders));
        assert!(session.is_authenticated());
        assert!(form.password.is_empty());
    }

    #[tokio::test]
    async fn failures_show_a_message() {
        let mut session = SessionContext::anonymous();

        let mut form = LoginForm::new("", "pw");
        assert_eq!(form.submit(&mut session, &FixedAuth(Ok(None))).await, None);
        assert_eq!(form.error.as_deref(), Some("Username and password are required."));

        let mut form = LoginForm::new("root", "bad");
        form.submit(&mut session, &FixedAuth(Ok(None))).await;
        assert_eq!(form.error.as_deref(), Some("Invalid username or password."));

        let mut form = LoginForm::new("root", "pw");
        form.submit(&mut session, &FixedAuth(Err("connection refused"))).await;
        assert_eq!(form.error.as_deref(), Some(LOGIN_FAILED));
        assert_eq!(form.username, "root");
    }
}
