//! HTTP client for the back office REST API.
//!
//! The back office keeps its session in a cookie. The client carries a
//! `reqwest` cookie jar that honours `Expires` and `Max-Age`; clones share it.

pub mod error;
pub mod rest;

use async_trait::async_trait;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

pub use error::ClientError;
pub use rest::{Endpoints, RestTable};

use crate::config;
use crate::session::{AuthApi, User};

#[derive(Clone)]
pub struct AdminClient {
    http: reqwest::Client,
    base: Url,
    cookies: Arc<Jar>,
}

#[derive(Debug, Deserialize)]
struct SessionBody {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    user: Option<User>,
}

impl AdminClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let cookies = Arc::new(Jar::default());
        let http = reqwest::Client::builder().timeout(timeout).cookie_provider(cookies.clone()).build()?;
        Ok(Self { http, base, cookies })
    }

    /// Client for the configured API base URL
    pub fn from_config() -> Result<Self, ClientError> {
        let api = &config::config().api;
        Self::new(&api.base_url, Duration::from_secs(api.request_timeout_secs))
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Restore a `Cookie` header saved from an earlier session
    pub fn with_cookie(self, header: Option<&str>) -> Self {
        for (name, value) in header.map(cookie_pairs).unwrap_or_default() {
            self.cookies.add_cookie_str(&format!("{}={}; Path=/", name, value), &self.base);
        }
        self
    }

    /// The `Cookie` header the client currently sends, if any
    pub fn session_cookie(&self) -> Option<String> {
        let header = self.cookies.cookies(&self.base)?;
        header.to_str().ok().map(str::to_string)
    }

    /// Expire every cookie the jar would send; the back office scopes them all to `/`
    pub fn clear_session(&self) {
        let Some(header) = self.session_cookie() else { return };
        for (name, _) in cookie_pairs(&header) {
            self.cookies.add_cookie_str(&format!("{}=; Path=/; Max-Age=0", name), &self.base);
        }
    }

    pub fn url(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.base.join(path.trim_start_matches('/'))?)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(String, String)]) -> Result<T, ClientError> {
        let request = self.http.get(self.url(path)?).query(query);
        self.send(request).await
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.http.post(self.url(path)?).json(body);
        self.send(request).await
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        if config::config().api.enable_request_logging {
            tracing::debug!(url = %response.url(), status = status.as_u16(), "api response");
        }
        let body = response.bytes().await?;

        if !status.is_success() {
            return Err(ClientError::from_response(status.as_u16(), &body));
        }
        // some mutation endpoints answer with an empty body
        let body: &[u8] = if body.iter().all(u8::is_ascii_whitespace) { b"null" } else { &body };
        serde_json::from_slice(body).map_err(|e| ClientError::Decode(e.to_string()))
    }
}

/// `name=value` pairs of a `Cookie` header
fn cookie_pairs(header: &str) -> Vec<(&str, &str)> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .map(|(name, value)| (name.trim(), value.trim()))
        .filter(|(name, _)| !name.is_empty())
        .collect()
}

#[async_trait]
impl AuthApi for AdminClient {
    async fn current_user(&self) -> anyhow::Result<Option<User>> {
        match self.get_json::<SessionBody>("/admin/user/auth", &[]).await {
            Ok(body) if body.success => Ok(body.user),
            Ok(_) | Err(ClientError::Unauthorized) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn login(&self, username: &str, password: &str) -> anyhow::Result<Option<User>> {
        let credentials = json!({ "username": username, "password": password });
        match self.post_json::<_, SessionBody>("/admin/user/login", &credentials).await {
            Ok(body) if body.success => Ok(body.user),
            Ok(_) | Err(ClientError::Unauthorized) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn logout(&self) -> anyhow::Result<()> {
        let result = self.post_json::<_, Value>("/admin/user/logout", &json!({})).await;
        self.clear_session();
        result?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn receive(c: &AdminClient, set_cookies: &[&'static str]) {
        let values: Vec<HeaderValue> = set_cookies.iter().map(|v| HeaderValue::from_static(v)).collect();
        let url = c.url("admin/user/login").unwrap();
        c.cookies.set_cookies(&mut values.iter(), &url);
    }

    fn client() -> AdminClient {
        AdminClient::new("http://localhost:3000/api", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn joins_paths_under_base() {
        let c = client();
        assert_eq!(c.url("/admin/order/get/table").unwrap().as_str(), "http://localhost:3000/api/admin/order/get/table");
        assert_eq!(c.url("admin/user/auth").unwrap().path(), "/api/admin/user/auth");
    }

    #[test]
    fn set_cookie_updates_and_clears_jar() {
        let c = client();
        receive(&c, &["admin_session=abc; Path=/; HttpOnly", "theme=dark; Path=/"]);
        let header = c.session_cookie().unwrap();
        assert!(header.contains("admin_session=abc"), "{}", header);
        assert!(header.contains("theme=dark"), "{}", header);

        receive(&c, &["admin_session=; Path=/; Max-Age=0"]);
        assert_eq!(c.session_cookie().as_deref(), Some("theme=dark"));
    }

    #[test]
    fn expired_cookies_are_never_sent() {
        let c = client();
        receive(&c, &["admin_session=old; Path=/; Expires=Wed, 21 Oct 2015 07:28:00 GMT"]);
        assert!(c.session_cookie().is_none());

        receive(&c, &["admin_session=fresh; Path=/; Max-Age=3600"]);
        assert_eq!(c.session_cookie().as_deref(), Some("admin_session=fresh"));
    }

    #[test]
    fn saved_header_splits_into_pairs() {
        assert_eq!(cookie_pairs("a=1; b = 2;;c=x=y"), vec![("a", "1"), ("b", "2"), ("c", "x=y")]);
        assert!(cookie_pairs("").is_empty());
    }

    #[test]
    fn restored_cookie_is_shared_by_clones() {
        let c = client().with_cookie(Some("admin_session=xyz"));
        let clone = c.clone();
        assert_eq!(clone.session_cookie().as_deref(), Some("admin_session=xyz"));
        c.clear_session();
        assert!(clone.session_cookie().is_none());
    }

    #[test]
    fn rejects_bad_base_url() {
        assert!(matches!(AdminClient::new("not a url", Duration::from_secs(1)), Err(ClientError::InvalidUrl(_))));
    }
}
