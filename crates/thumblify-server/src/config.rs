use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use thumblify_pipeline::assets::CloudinaryConfig;
use thumblify_pipeline::model::{DEFAULT_BASE_URL, DEFAULT_MODEL, GeminiConfig};

/// API keys that MUST NOT be used.
const PLACEHOLDER_KEYS: &[&str] = &["your-gemini-api-key", "changeme", "change-me", "xxx"];

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    /// Externally visible base URL, used for local asset links.
    pub public_url: String,
    pub cors_origins: Vec<String>,
    pub session_days: i64,
    pub secure_cookies: bool,
    pub asset_dir: PathBuf,
    pub maintenance_interval: Duration,
    pub stale_generation_after: Duration,
    pub gemini: GeminiConfig,
    /// `None` selects the local asset store.
    pub cloudinary: Option<CloudinaryConfig>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let get_or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let port: u16 = parse(&get_or("THUMBLIFY_PORT", "3000"), "THUMBLIFY_PORT")?;
        let host = get_or("THUMBLIFY_HOST", "0.0.0.0");

        let api_key = get("GEMINI_API_KEY").unwrap_or_default();
        if api_key.is_empty() || PLACEHOLDER_KEYS.contains(&api_key.to_lowercase().as_str()) {
            bail!("GEMINI_API_KEY is unset or still a placeholder");
        }
        let mut gemini = GeminiConfig::new(api_key);
        gemini.model = get_or("GEMINI_MODEL", DEFAULT_MODEL);
        gemini.base_url = get_or("GEMINI_BASE_URL", DEFAULT_BASE_URL);
        gemini.timeout = Duration::from_secs(parse(
            &get_or("GEMINI_TIMEOUT_SECS", "120"),
            "GEMINI_TIMEOUT_SECS",
        )?);
        gemini.retry.max_attempts =
            parse::<u32>(&get_or("GEMINI_MAX_ATTEMPTS", "3"), "GEMINI_MAX_ATTEMPTS")?.max(1);

        let cloudinary = match (
            get("CLOUDINARY_CLOUD_NAME"),
            get("CLOUDINARY_API_KEY"),
            get("CLOUDINARY_API_SECRET"),
        ) {
            (Some(cloud_name), Some(api_key), Some(api_secret)) => Some(CloudinaryConfig {
                cloud_name,
                api_key,
                api_secret,
                api_base: get_or(
                    "CLOUDINARY_API_BASE",
                    thumblify_pipeline::assets::DEFAULT_CLOUDINARY_API_BASE,
                ),
            }),
            _ => None,
        };

        let session_days: i64 = parse(&get_or("THUMBLIFY_SESSION_DAYS", "7"), "THUMBLIFY_SESSION_DAYS")?;
        if session_days < 1 {
            bail!("THUMBLIFY_SESSION_DAYS must be at least 1");
        }

        let maintenance_interval = Duration::from_secs(parse(
            &get_or("THUMBLIFY_MAINTENANCE_INTERVAL_SECS", "300"),
            "THUMBLIFY_MAINTENANCE_INTERVAL_SECS",
        )?);
        if maintenance_interval.is_zero() {
            bail!("THUMBLIFY_MAINTENANCE_INTERVAL_SECS must be at least 1");
        }
        if gemini.timeout.is_zero() {
            bail!("GEMINI_TIMEOUT_SECS must be at least 1");
        }

        let stale_generation_after = Duration::from_secs(
            parse::<u64>(
                &get_or("THUMBLIFY_STALE_GENERATION_MINS", "15"),
                "THUMBLIFY_STALE_GENERATION_MINS",
            )?
            .saturating_mul(60),
        );
        // The sweep must never catch a generation that is still running
        let longest = longest_generation(&gemini);
        if stale_generation_after <= longest {
            bail!(
                "THUMBLIFY_STALE_GENERATION_MINS must exceed the longest model call ({}s with {} attempts)",
                longest.as_secs(),
                gemini.retry.max_attempts
            );
        }

        Ok(Self {
            public_url: get_or("THUMBLIFY_PUBLIC_URL", &format!("http://localhost:{}", port)),
            host,
            port,
            db_path: get_or("THUMBLIFY_DB_PATH", "thumblify.db").into(),
            cors_origins: get_or("THUMBLIFY_CORS_ORIGINS", "http://localhost:5173,http://localhost:3000")
                .split(',')
                .map(|o| o.trim().trim_end_matches('/').to_string())
                .filter(|o| !o.is_empty())
                .collect(),
            session_days,
            secure_cookies: parse(
                &get_or("THUMBLIFY_SECURE_COOKIES", "false"),
                "THUMBLIFY_SECURE_COOKIES",
            )?,
            asset_dir: get_or("THUMBLIFY_ASSET_DIR", "./assets").into(),
            maintenance_interval,
            stale_generation_after,
            gemini,
            cloudinary,
        })
    }
}

/// Upper bound on one model call: every attempt timing out, plus the
/// longest backoff between attempts.
fn longest_generation(gemini: &GeminiConfig) -> Duration {
    let attempts = gemini.retry.max_attempts.max(1);
    gemini
        .timeout
        .saturating_mul(attempts)
        .saturating_add(gemini.retry.max_delay.saturating_mul(attempts - 1))
}

fn parse<T>(raw: &str, key: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.parse::<T>()
        .with_context(|| format!("{} has an invalid value: {:?}", key, raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_with_only_api_key() {
        let c = config(&[("GEMINI_API_KEY", "AIza-real")]).unwrap();
        assert_eq!(c.port, 3000);
        assert_eq!(c.public_url, "http://localhost:3000");
        assert_eq!(c.cors_origins, vec!["http://localhost:5173", "http://localhost:3000"]);
        assert_eq!(c.session_days, 7);
        assert!(!c.secure_cookies);
        assert_eq!(c.stale_generation_after, Duration::from_secs(15 * 60));
        assert_eq!(c.gemini.model, DEFAULT_MODEL);
        assert_eq!(c.gemini.retry.max_attempts, 3);
        assert!(c.cloudinary.is_none());
    }

    #[test]
    fn missing_or_placeholder_key_is_refused() {
        assert!(config(&[]).is_err());
        assert!(config(&[("GEMINI_API_KEY", "  ")]).is_err());
        assert!(config(&[("GEMINI_API_KEY", "your-gemini-api-key")]).is_err());
    }

    #[test]
    fn cloudinary_needs_all_three_credentials() {
        let partial = config(&[
            ("GEMINI_API_KEY", "k"),
            ("CLOUDINARY_CLOUD_NAME", "demo"),
            ("CLOUDINARY_API_KEY", "123"),
        ])
        .unwrap();
        assert!(partial.cloudinary.is_none());

        let full = config(&[
            ("GEMINI_API_KEY", "k"),
            ("CLOUDINARY_CLOUD_NAME", "demo"),
            ("CLOUDINARY_API_KEY", "123"),
            ("CLOUDINARY_API_SECRET", "shh"),
        ])
        .unwrap();
        let cloudinary = full.cloudinary.unwrap();
        assert_eq!(cloudinary.cloud_name, "demo");
        assert_eq!(cloudinary.api_base, "https://api.cloudinary.com");
    }

    #[test]
    fn bad_numbers_fail_fast() {
        let err = config(&[("GEMINI_API_KEY", "k"), ("THUMBLIFY_PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().contains("THUMBLIFY_PORT"));
        assert!(config(&[("GEMINI_API_KEY", "k"), ("THUMBLIFY_SESSION_DAYS", "0")]).is_err());
    }

    #[test]
    fn origins_are_normalized() {
        let c = config(&[
            ("GEMINI_API_KEY", "k"),
            ("THUMBLIFY_CORS_ORIGINS", " https://thumblify.app/ , ,http://localhost:5173"),
        ])
        .unwrap();
        assert_eq!(c.cors_origins, vec!["https://thumblify.app", "http://localhost:5173"]);
    }

    #[test]
    fn zero_intervals_are_refused() {
        assert!(config(&[("GEMINI_API_KEY", "k"), ("THUMBLIFY_MAINTENANCE_INTERVAL_SECS", "0")]).is_err());
        assert!(config(&[("GEMINI_API_KEY", "k"), ("THUMBLIFY_STALE_GENERATION_MINS", "0")]).is_err());
        assert!(config(&[("GEMINI_API_KEY", "k"), ("GEMINI_TIMEOUT_SECS", "0")]).is_err());
    }

    #[test]
    fn stale_threshold_must_outlast_generation() {
        // 3 attempts x 600s exceeds the 15 minute default
        let err = config(&[("GEMINI_API_KEY", "k"), ("GEMINI_TIMEOUT_SECS", "600")]).unwrap_err();
        assert!(err.to_string().contains("THUMBLIFY_STALE_GENERATION_MINS"));

        let c = config(&[
            ("GEMINI_API_KEY", "k"),
            ("GEMINI_TIMEOUT_SECS", "600"),
            ("THUMBLIFY_STALE_GENERATION_MINS", "45"),
        ])
        .unwrap();
        assert_eq!(c.stale_generation_after, Duration::from_secs(45 * 60));
        assert!(c.stale_generation_after > longest_generation(&c.gemini));
    }
}
