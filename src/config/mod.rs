use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub api: ApiConfig,
    pub table: TableConfig,
    pub server: ServerConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

/// Where the admin client finds the back office REST API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub request_timeout_secs: u64,
    pub enable_request_logging: bool,
    /// Base for relative image paths; the API base URL when unset
    pub asset_base_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableConfig {
    pub page_size: u32,
    pub initial_offset: u32,
    /// Row limit used when loading select options (laminates, carvings)
    pub option_limit: u32,
}

/// Settings for the fixture back office binary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub enable_cors: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub session_secret: String,
    pub session_expiry_hours: u64,
    pub cookie_name: String,
    pub require_https: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // API overrides
        if let Ok(v) = env::var("ADMIN_API_BASE_URL") {
            if !v.trim().is_empty() {
                self.api.base_url = v.trim().trim_end_matches('/').to_string();
            }
        }
        if let Ok(v) = env::var("ADMIN_API_TIMEOUT_SECS") {
            self.api.request_timeout_secs = v.parse().unwrap_or(self.api.request_timeout_secs);
        }
        if let Ok(v) = env::var("ADMIN_API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Ok(v) = env::var("ADMIN_ASSET_BASE_URL") {
            let v = v.trim().trim_end_matches('/');
            self.api.asset_base_url = (!v.is_empty()).then(|| v.to_string());
        }

        // Table overrides
        if let Ok(v) = env::var("TABLE_PAGE_SIZE") {
            self.table.page_size = v.parse().ok().filter(|n| *n > 0).unwrap_or(self.table.page_size);
        }
        if let Ok(v) = env::var("TABLE_INITIAL_OFFSET") {
            self.table.initial_offset = v.parse().unwrap_or(self.table.initial_offset);
        }
        if let Ok(v) = env::var("TABLE_OPTION_LIMIT") {
            self.table.option_limit = v.parse().unwrap_or(self.table.option_limit);
        }

        // Server overrides
        if let Some(port) = env::var("ADMIN_SERVER_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.server.port = port;
        }
        if let Ok(v) = env::var("SERVER_ENABLE_CORS") {
            self.server.enable_cors = v.parse().unwrap_or(self.server.enable_cors);
        }

        // Security overrides
        if let Ok(v) = env::var("SESSION_SECRET") {
            if !v.is_empty() {
                self.security.session_secret = v;
            }
        }
        if let Ok(v) = env::var("SESSION_EXPIRY_HOURS") {
            self.security.session_expiry_hours = v.parse().unwrap_or(self.security.session_expiry_hours);
        }
        if let Ok(v) = env::var("SESSION_COOKIE_NAME") {
            if !v.is_empty() {
                self.security.cookie_name = v;
            }
        }
        if let Ok(v) = env::var("SECURITY_REQUIRE_HTTPS") {
            self.security.require_https = v.parse().unwrap_or(self.security.require_https);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            api: ApiConfig {
                base_url: "http://127.0.0.1:3000".to_string(),
                request_timeout_secs: 30,
                enable_request_logging: true,
                asset_base_url: None,
            },
            table: TableConfig {
                page_size: 10,
                initial_offset: 0,
                option_limit: 1000,
            },
            server: ServerConfig {
                port: 3000,
                enable_cors: true,
            },
            security: SecurityConfig {
                session_secret: "development-session-secret".to_string(),
                session_expiry_hours: 24 * 7, // 1 week
                cookie_name: "admin_session".to_string(),
                require_https: false,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            api: ApiConfig {
                base_url: "https://staging-api.example.com".to_string(),
                request_timeout_secs: 15,
                enable_request_logging: true,
                asset_base_url: None,
            },
            table: TableConfig {
                page_size: 10,
                initial_offset: 0,
                option_limit: 1000,
            },
            server: ServerConfig {
                port: 3000,
                enable_cors: true,
            },
            security: SecurityConfig {
                session_secret: String::new(),
                session_expiry_hours: 24,
                cookie_name: "admin_session".to_string(),
                require_https: true,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            api: ApiConfig {
                base_url: "https://api.example.com".to_string(),
                request_timeout_secs: 10,
                enable_request_logging: false,
                asset_base_url: None,
            },
            table: TableConfig {
                page_size: 10,
                initial_offset: 0,
                option_limit: 1000,
            },
            server: ServerConfig {
                port: 3000,
                enable_cors: false,
            },
            security: SecurityConfig {
                session_secret: String::new(),
                session_expiry_hours: 4,
                cookie_name: "admin_session".to_string(),
                require_https: true,
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_production {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Production)
    };
}
