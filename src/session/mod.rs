//! Signed-in user and the session calls around it.

pub mod guard;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use guard::Route;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Superuser,
    User,
    #[serde(other)]
    Other,
}

impl Role {
    /// Roles allowed to edit and create table rows
    pub fn can_manage_tables(&self) -> bool {
        matches!(self, Role::Admin | Role::Superuser)
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Admin => "admin",
            Role::Superuser => "superuser",
            Role::User => "user",
            Role::Other => "other",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub role: Role,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Username and password are required.")]
    MissingCredentials,

    #[error("Invalid username or password.")]
    Rejected,

    #[error(transparent)]
    Api(#[from] anyhow::Error),
}

/// The three session endpoints of the back office
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// `Ok(None)` when nobody is signed in
    async fn current_user(&self) -> anyhow::Result<Option<User>>;

    /// `Ok(None)` when the credentials are refused
    async fn login(&self, username: &str, password: &str) -> anyhow::Result<Option<User>>;

    async fn logout(&self) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    user: Option<User>,
}

impl SessionContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_user(user: User) -> Self {
        Self { user: Some(user) }
    }

    /// Ask the back office who is signed in; any failure means nobody is
    pub async fn load(api: &dyn AuthApi) -> Self {
        match api.current_user().await {
            Ok(user) => Self { user },
            Err(e) => {
                tracing::warn!("session check failed: {:#}", e);
                Self::anonymous()
            }
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// Whether tables on screen should expose edit controls
    pub fn can_manage_tables(&self) -> bool {
        self.user.as_ref().map(|u| u.role.can_manage_tables()).unwrap_or(false)
    }

    pub async fn login(&mut self, api: &dyn AuthApi, username: &str, password: &str) -> Result<&User, SessionError> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(SessionError::MissingCredentials);
        }
        match api.login(username.trim(), password).await? {
            Some(user) => {
                tracing::info!(username = %user.username, role = %user.role, "signed in");
                Ok(self.user.insert(user))
            }
            None => Err(SessionError::Rejected),
        }
    }

    /// Always ends signed out, even when the server call fails
    pub async fn logout(&mut self, api: &dyn AuthApi) -> Route {
        if let Err(e) = api.logout().await {
            tracing::error!("logout failed: {:#}", e);
        }
        self.user = None;
        Route::Login
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// In-memory auth backend with one account
    #[derive(Default)]
    struct StubAuth {
        signed_in: Mutex<Option<User>>,
        fail: bool,
        logouts: Mutex<u32>,
    }

    #[async_trait]
    impl AuthApi for StubAuth {
        async fn current_user(&self) -> anyhow::Result<Option<User>> {
            if self.fail {
                anyhow::bail!("network down");
            }
            Ok(self.signed_in.lock().unwrap().clone())
        }

        async fn login(&self, username: &str, password: &str) -> anyhow::Result<Option<User>> {
            if self.fail {
                anyhow::bail!("network down");
            }
            if username == "root" && password == "hunter2" {
                let user = User { username: username.into(), role: Role::Admin };
                *self.signed_in.lock().unwrap() = Some(user.clone());
                return Ok(Some(user));
            }
            Ok(None)
        }

        async fn logout(&self) -> anyhow::Result<()> {
            *self.logouts.lock().unwrap() += 1;
            *self.signed_in.lock().unwrap() = None;
            if self.fail {
                anyhow::bail!("network down");
            }
            Ok(())
        }
    }

    #[test]
    fn role_deserializes_unknown_as_other() {
        let role: Role = serde_json::from_str("\"auditor\"").unwrap();
        assert_eq!(role, Role::Other);
        let role: Role = serde_json::from_str("\"superuser\"").unwrap();
        assert!(role.can_manage_tables());
        assert!(!Role::User.can_manage_tables());
    }

    #[tokio::test]
    async fn load_failure_means_signed_out() {
        let api = StubAuth { fail: true, ..Default::default() };
        let session = SessionContext::load(&api).await;
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn login_rejects_empty_credentials_locally() {
        let api = StubAuth::default();
        let mut session = SessionContext::anonymous();
        let err = session.login(&api, "  ", "pw").await.unwrap_err();
        assert!(matches!(err, SessionError::MissingCredentials));
        assert!(api.signed_in.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn login_then_logout() {
        let api = StubAuth::default();
        let mut session = SessionContext::anonymous();
        assert!(matches!(session.login(&api, "root", "nope").await, Err(SessionError::Rejected)));
        let user = session.login(&api, "root", "hunter2").await.unwrap();
        assert_eq!(user.role, Role::Admin);
        assert!(session.can_manage_tables());

        assert_eq!(session.logout(&api).await, Route::Login);
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn logout_clears_user_even_when_server_fails() {
        let api = StubAuth { fail: true, ..Default::default() };
        let mut session = SessionContext::with_user(User { username: "a".into(), role: Role::User });
        assert_eq!(session.logout(&api).await, Route::Login);
        assert!(session.user().is_none());
        assert_eq!(*api.logouts.lock().unwrap(), 1);
    }
}
