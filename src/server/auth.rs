//! Cookie sessions for the fixture back office: a signed JWT in an HttpOnly
//! cookie, checked by the [`SessionUser`] extractor.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::COOKIE, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::error::ApiError;
use super::AppState;
use crate::config;
use crate::session::{Role, User};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

/// Signing secret and cookie settings
#[derive(Debug, Clone)]
pub struct SessionKeys {
    pub secret: String,
    pub expiry_hours: u64,
    pub cookie_name: String,
    pub secure: bool,
}

impl SessionKeys {
    pub fn from_config() -> anyhow::Result<Self> {
        let security = &config::config().security;
        if security.session_secret.is_empty() {
            anyhow::bail!("SESSION_SECRET must be set");
        }
        Ok(Self {
            secret: security.session_secret.clone(),
            expiry_hours: security.session_expiry_hours,
            cookie_name: security.cookie_name.clone(),
            secure: security.require_https,
        })
    }

    pub fn issue(&self, user: &User) -> Result<String, ApiError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.username.clone(),
            role: user.role.clone(),
            exp: (now + Duration::hours(self.expiry_hours as i64)).timestamp(),
            iat: now.timestamp(),
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(self.secret.as_bytes()))
            .map_err(|e| ApiError::internal_server_error(format!("could not sign session: {}", e)))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        let data = decode::<Claims>(token, &DecodingKey::from_secret(self.secret.as_bytes()), &Validation::default())?;
        Ok(data.claims)
    }

    pub fn session_cookie(&self, token: &str) -> String {
        let max_age = self.expiry_hours * 3600;
        let secure = if self.secure { "; Secure" } else { "" };
        format!("{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}{}", self.cookie_name, token, max_age, secure)
    }

    pub fn cleared_cookie(&self) -> String {
        format!("{}=; Path=/; HttpOnly; Max-Age=0", self.cookie_name)
    }
}

pub fn hash_password(password: &str) -> String {
    let digest = Sha256::digest(password.as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Pull one cookie value out of the request headers
fn cookie_value<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|header| header.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v)
        .filter(|v| !v.is_empty())
}

/// The signed-in user behind a request
#[derive(Debug, Clone)]
pub struct SessionUser(pub User);

impl SessionUser {
    pub fn require_table_manager(&self) -> Result<(), ApiError> {
        if self.0.role.can_manage_tables() {
            Ok(())
        } else {
            Err(ApiError::forbidden("Insufficient role"))
        }
    }

    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.0.role.is_admin() {
            Ok(())
        } else {
            Err(ApiError::forbidden("Admin only"))
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for SessionUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = cookie_value(parts, &state.keys.cookie_name).ok_or_else(|| ApiError::unauthorized("Not logged in"))?;
        let claims = state.keys.verify(token)?;
        // the account may have been deactivated since the token was issued
        let user = state
            .store
            .active_user(&claims.sub)
            .await
            .ok_or_else(|| ApiError::unauthorized("Account is no longer active"))?;
        Ok(SessionUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> SessionKeys {
        SessionKeys { secret: "test-secret".into(), expiry_hours: 1, cookie_name: "admin_session".into(), secure: false }
    }

    #[test]
    fn issued_tokens_verify() {
        let keys = keys();
        let token = keys.issue(&User { username: "root".into(), role: Role::Admin }).unwrap();
        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.sub, "root");
        assert_eq!(claims.role, Role::Admin);
    }

    #[test]
    fn tokens_from_another_secret_are_rejected() {
        let token = keys().issue(&User { username: "root".into(), role: Role::Admin }).unwrap();
        let other = SessionKeys { secret: "other".into(), ..keys() };
        assert!(matches!(other.verify(&token), Err(ApiError::Unauthorized(_))));
    }

    #[test]
    fn password_digest_is_hex_sha256() {
        assert_eq!(hash_password("abc"), "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad");
    }

    #[test]
    fn cookie_lookup_ignores_other_cookies() {
        let request = axum::http::Request::builder()
            .header(COOKIE, "theme=dark; admin_session=tok")
            .body(())
            .unwrap();
        let (parts, _) = request.into_parts();
        assert_eq!(cookie_value(&parts, "admin_session"), Some("tok"));
        assert_eq!(cookie_value(&parts, "missing"), None);
    }
}
