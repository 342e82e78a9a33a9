use std::env;

/// When a key's expiry clock starts ticking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryPolicy {
    /// `expires_at` is computed when the key is issued.
    Issuance,
    /// `expires_at` stays unset until the first successful validation.
    FirstUse,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    pub admin_token: String,
    pub key_prefix: String,
    pub expiry_policy: ExpiryPolicy,
    pub dev_mode: bool,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let dev_mode = env::var("VUREKEYS_ENV")
            .map(|v| v == "dev" || v == "development")
            .unwrap_or(false);

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        let admin_token = match env::var("ADMIN_TOKEN") {
            Ok(token) if !token.is_empty() => token,
            _ if dev_mode => {
                tracing::warn!("ADMIN_TOKEN not set, using dev token (dev mode only)");
                "dev-admin-token".to_string()
            }
            _ => panic!("ADMIN_TOKEN must be set (or run with VUREKEYS_ENV=dev)"),
        };

        let expiry_policy = match env::var("EXPIRY_START").as_deref() {
            Ok("issuance") | Err(_) => ExpiryPolicy::Issuance,
            Ok("first-use") | Ok("first_use") => ExpiryPolicy::FirstUse,
            Ok(other) => panic!("EXPIRY_START must be 'issuance' or 'first-use', got '{other}'"),
        };

        Self {
            host,
            port,
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "vurekeys.db".to_string()),
            admin_token,
            key_prefix: env::var("KEY_PREFIX").unwrap_or_else(|_| "VURE".to_string()),
            expiry_policy,
            dev_mode,
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
