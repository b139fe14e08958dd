//! Environment configuration for the API server and the client stores.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};

const DEV_JWT_SECRET: &str = "storefront-dev-jwt-secret-change-me";
const DEV_ADMIN_TOKEN: &str = "storefront-dev-admin-token";
const KV_PLACEHOLDERS: [&str; 2] = ["your_vercel_kv_url", "your_vercel_kv_token"];

#[derive(Clone, Debug)]
pub struct KvCredentials {
    pub url: String,
    pub token: String,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub production: bool,
    /// `None` when the store is unset or still holds placeholder values.
    pub kv: Option<KvCredentials>,
    pub jwt_secret: String,
    pub admin_token: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let production = get("APP_ENV").is_some_and(|v| v.eq_ignore_ascii_case("production"));
        let port = get("PORT")
            .unwrap_or_else(|| "8083".to_string())
            .parse::<u16>()
            .context("Invalid PORT")?;

        let kv = match (get("KV_REST_API_URL"), get("KV_REST_API_TOKEN")) {
            (Some(url), Some(token)) if is_real(&url) && is_real(&token) => {
                Some(KvCredentials { url: url.trim_end_matches('/').to_string(), token })
            }
            _ => {
                tracing::warn!("KV_REST_API_URL / KV_REST_API_TOKEN not configured; data routes will answer 503");
                None
            }
        };

        let jwt_secret = secret(&get, "JWT_SECRET", DEV_JWT_SECRET, production)?;
        let admin_token = secret(&get, "ADMIN_SECRET_TOKEN", DEV_ADMIN_TOKEN, production)?;

        Ok(Self { port, production, kv, jwt_secret, admin_token })
    }
}

fn is_real(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && !KV_PLACEHOLDERS.contains(&value) && !value.contains("your-")
}

fn secret(get: &impl Fn(&str) -> Option<String>, name: &str, dev_default: &str, production: bool) -> Result<String> {
    match get(name).filter(|v| !v.trim().is_empty()) {
        Some(v) => Ok(v),
        None if production => bail!("{name} must be set when APP_ENV=production"),
        None => {
            tracing::warn!("{name} not set; using an insecure development value");
            Ok(dev_default.to_string())
        }
    }
}

/// Client-side settings.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// API origin without a trailing slash; `None` runs the stores offline.
    pub api_url: Option<String>,
    pub admin_token: Option<String>,
    pub cache_dir: PathBuf,
    pub catalog_timeout: Duration,
    pub collections_timeout: Duration,
    pub refresh_interval: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            admin_token: None,
            cache_dir: std::env::temp_dir().join("wallpaper-storefront"),
            catalog_timeout: Duration::from_secs(8),
            collections_timeout: Duration::from_secs(15),
            refresh_interval: Duration::from_secs(30),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            api_url: get("EXPO_PUBLIC_API_URL")
                .map(|u| u.trim().trim_end_matches('/').to_string())
                .filter(|u| !u.is_empty()),
            admin_token: get("EXPO_PUBLIC_ADMIN_TOKEN").filter(|t| !t.trim().is_empty()),
            cache_dir: get("STOREFRONT_CACHE_DIR").map(PathBuf::from).unwrap_or(defaults.cache_dir),
            ..defaults
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn test_placeholder_kv_counts_as_unconfigured() {
        let cfg = Config::from_lookup(lookup(&[
            ("KV_REST_API_URL", "your_vercel_kv_url"),
            ("KV_REST_API_TOKEN", "your_vercel_kv_token"),
        ]))
        .unwrap();
        assert!(cfg.kv.is_none());
        assert_eq!(cfg.port, 8083);

        let cfg = Config::from_lookup(lookup(&[("KV_REST_API_URL", "https://your-kv.example")])).unwrap();
        assert!(cfg.kv.is_none());
    }

    #[test]
    fn test_real_kv_is_kept() {
        let cfg = Config::from_lookup(lookup(&[
            ("KV_REST_API_URL", "https://kv.example.com/"),
            ("KV_REST_API_TOKEN", "abc"),
            ("PORT", "9000"),
        ]))
        .unwrap();
        assert_eq!(cfg.kv.map(|kv| kv.url), Some("https://kv.example.com".to_string()));
        assert_eq!(cfg.port, 9000);
    }

    #[test]
    fn test_production_requires_secrets() {
        assert!(Config::from_lookup(lookup(&[("APP_ENV", "production")])).is_err());
        let cfg = Config::from_lookup(lookup(&[
            ("APP_ENV", "production"),
            ("JWT_SECRET", "s"),
            ("ADMIN_SECRET_TOKEN", "a"),
        ]))
        .unwrap();
        assert!(cfg.production);
    }

    #[test]
    fn test_client_config_strips_trailing_slash() {
        let cfg = ClientConfig::from_lookup(lookup(&[("EXPO_PUBLIC_API_URL", "https://shop.example.com/")]));
        assert_eq!(cfg.api_url.as_deref(), Some("https://shop.example.com"));
        assert_eq!(cfg.catalog_timeout, Duration::from_secs(8));
        assert!(cfg.admin_token.is_none());
    }
}
