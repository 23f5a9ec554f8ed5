use std::path::PathBuf;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Only malformed numbers fail startup; every integration is optional and
/// degrades when its variables are absent.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub backend_url: String,
    pub data_dir: PathBuf,
    pub uploads_dir: PathBuf,
    pub generated_dir: PathBuf,
    pub archive_dir: PathBuf,
    pub database_url: Option<String>,
    pub max_slots: u32,
    pub eta_minutes: u32,
    pub anthropic_api_key: Option<String>,
    pub anthropic_model: Option<String>,
    pub apify_api_token: Option<String>,
    pub apify_actor_id: Option<String>,
    pub vercel_token: Option<String>,
    pub s3: Option<S3Config>,
    pub email_preview_mode: bool,
    pub email_api_url: Option<String>,
    pub email_api_key: Option<String>,
    pub email_from: String,
    pub admin_email: Option<String>,
    pub admin_contact: String,
    pub outbound_blocked: bool,
}

/// S3-compatible hosting target, present only when `S3_BUCKET` is set.
#[derive(Debug, Clone)]
pub struct S3Config {
    pub bucket: String,
    pub endpoint: Option<String>,
    pub public_url: String,
    pub aws_access_key_id: Option<String>,
    pub aws_secret_access_key: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .context("PORT must be a valid port number")?;
        let backend_url = optional_env("BACKEND_URL")
            .unwrap_or_else(|| format!("http://localhost:{port}"))
            .trim_end_matches('/')
            .to_string();

        let email_api_url = optional_env("EMAIL_API_URL");
        let email_preview_mode = match optional_env("EMAIL_PREVIEW_MODE") {
            Some(v) => parse_flag(&v),
            None => email_api_url.is_none(),
        };

        let s3 = optional_env("S3_BUCKET").map(|bucket| {
            let endpoint = optional_env("S3_ENDPOINT");
            let public_url = optional_env("S3_PUBLIC_URL").unwrap_or_else(|| match &endpoint {
                Some(e) => format!("{}/{bucket}", e.trim_end_matches('/')),
                None => format!("https://{bucket}.s3.amazonaws.com"),
            });
            S3Config {
                bucket,
                endpoint,
                public_url,
                aws_access_key_id: optional_env("AWS_ACCESS_KEY_ID"),
                aws_secret_access_key: optional_env("AWS_SECRET_ACCESS_KEY"),
            }
        });

        Ok(Config {
            port,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            backend_url,
            data_dir: dir_env("DATA_DIR", "data"),
            uploads_dir: dir_env("UPLOADS_DIR", "uploads"),
            generated_dir: dir_env("GENERATED_DIR", "generated"),
            archive_dir: dir_env("ARCHIVE_DIR", "temp"),
            database_url: optional_env("DATABASE_URL"),
            max_slots: number_env("MAX_SLOTS", 50)?,
            eta_minutes: number_env("ETA_MINUTES", 3)?,
            anthropic_api_key: optional_env("ANTHROPIC_API_KEY"),
            anthropic_model: optional_env("ANTHROPIC_MODEL"),
            apify_api_token: optional_env("APIFY_API_TOKEN"),
            apify_actor_id: optional_env("APIFY_ACTOR_ID"),
            vercel_token: optional_env("VERCEL_TOKEN"),
            s3,
            email_preview_mode,
            email_api_url,
            email_api_key: optional_env("EMAIL_API_KEY"),
            email_from: optional_env("EMAIL_FROM")
                .unwrap_or_else(|| "Folio <orders@folio.local>".to_string()),
            admin_email: optional_env("ADMIN_EMAIL"),
            admin_contact: optional_env("ADMIN_CONTACT")
                .unwrap_or_else(|| "the site administrator".to_string()),
            outbound_blocked: outbound_blocked(|key| std::env::var(key).ok()),
        })
    }
}

const PROXY_VARS: &[&str] = &[
    "HTTPS_PROXY",
    "https_proxy",
    "HTTP_PROXY",
    "http_proxy",
    "ALL_PROXY",
    "all_proxy",
];

/// True when a proxy variable points at the discard port, which means every
/// outbound call is known to fail.
pub fn outbound_blocked(lookup: impl Fn(&str) -> Option<String>) -> bool {
    PROXY_VARS
        .iter()
        .filter_map(|key| lookup(key))
        .any(|value| is_port_nine(&value.to_ascii_lowercase()))
}

/// `host:9` must not be the prefix of a longer port such as `:9000`.
fn is_port_nine(value: &str) -> bool {
    ["127.0.0.1:9", "localhost:9"].iter().any(|needle| {
        value.match_indices(needle).any(|(i, m)| {
            !value[i + m.len()..]
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_digit())
        })
    })
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn dir_env(key: &str, default: &str) -> PathBuf {
    PathBuf::from(optional_env(key).unwrap_or_else(|| default.to_string()))
}

fn number_env(key: &str, default: u32) -> Result<u32> {
    match optional_env(key) {
        Some(v) => v
            .parse::<u32>()
            .with_context(|| format!("{key} must be a non-negative integer")),
        None => Ok(default),
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn test_discard_proxy_blocks_outbound() {
        assert!(outbound_blocked(env(&[("HTTPS_PROXY", "http://127.0.0.1:9")])));
        assert!(outbound_blocked(env(&[("all_proxy", "socks5://localhost:9/")])));
    }

    #[test]
    fn test_real_proxies_do_not_block() {
        assert!(!outbound_blocked(env(&[])));
        assert!(!outbound_blocked(env(&[("HTTP_PROXY", "http://127.0.0.1:9000")])));
        assert!(!outbound_blocked(env(&[("HTTPS_PROXY", "http://proxy.corp:8080")])));
    }

    #[test]
    fn test_flags() {
        assert!(parse_flag("TRUE"));
        assert!(parse_flag("1"));
        assert!(!parse_flag("false"));
        assert!(!parse_flag("no"));
    }
}
