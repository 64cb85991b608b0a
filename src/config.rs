use std::env;

use crate::services::access::AccessPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiry_seconds: u64,
    pub host: String,
    pub port: u16,
    pub app_base_url: String,
    pub strict_class_access: bool,
    /// Default for attendance rates when a request does not say.
    pub count_late_as_present: bool,
    pub store_backend: StoreBackend,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let store_backend = match env::var("STORE_BACKEND")
            .unwrap_or_else(|_| "postgres".into())
            .to_lowercase()
            .as_str()
        {
            "postgres" => StoreBackend::Postgres,
            "memory" => StoreBackend::Memory,
            other => anyhow::bail!("Unknown STORE_BACKEND: {other}"),
        };
        // The in-memory store needs no database.
        let database_url = match store_backend {
            StoreBackend::Postgres => required("DATABASE_URL")?,
            StoreBackend::Memory => env::var("DATABASE_URL").unwrap_or_default(),
        };

        Ok(Self {
            database_url,
            jwt_secret: required("JWT_SECRET")?,
            jwt_expiry_seconds: env::var("JWT_EXPIRY_SECONDS")
                .unwrap_or_else(|_| "900".into())
                .parse()?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()?,
            app_base_url: env::var("APP_BASE_URL")
                .unwrap_or_else(|_| "http://localhost".into()),
            strict_class_access: flag("STRICT_CLASS_ACCESS", false)?,
            count_late_as_present: flag("COUNT_LATE_AS_PRESENT", true)?,
            store_backend,
        })
    }

    pub fn access_policy(&self) -> AccessPolicy {
        if self.strict_class_access {
            AccessPolicy::Strict
        } else {
            AccessPolicy::Legacy
        }
    }
}

fn required(key: &str) -> anyhow::Result<String> {
    env::var(key).map_err(|_| anyhow::anyhow!("Missing required env var: {}", key))
}

fn flag(key: &str, default: bool) -> anyhow::Result<bool> {
    match env::var(key) {
        Ok(v) if !v.is_empty() => v
            .parse()
            .map_err(|_| anyhow::anyhow!("{key} must be true or false, got {v}")),
        _ => Ok(default),
    }
}
