use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};

use crate::cache::{Ttl, TtlPolicy};

const DEFAULT_SKIP_PATHS: &[&str] = &["/auth/", "/session", "/notifications", "/my-"];
const DEFAULT_LLM_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";

/// Application configuration loaded from environment variables.
/// Fails at startup if a present variable is malformed.
#[derive(Debug, Clone)]
pub struct Config {
    /// Optional: without it the in-process repositories are used.
    pub database_url: Option<String>,
    pub cache: CacheConfig,
    pub llm: LlmConfig,
    pub port: u16,
    pub rust_log: String,
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// `None` disables caching entirely.
    pub redis_url: Option<String>,
    pub connect_timeout: Duration,
    pub command_timeout: Duration,
    pub ttl: TtlPolicy,
    /// Path substrings whose GET responses are never cached.
    pub skip_paths: Vec<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            connect_timeout: Duration::from_secs(3),
            command_timeout: Duration::from_secs(2),
            ttl: TtlPolicy::default(),
            skip_paths: DEFAULT_SKIP_PATHS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_url: String,
    /// Bearer credential. Without it every analysis uses the local fallback.
    pub api_key: Option<String>,
    pub model: String,
    pub timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_LLM_API_URL.to_string(),
            api_key: None,
            model: DEFAULT_LLM_MODEL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = TtlPolicy::default();
        let ttl = TtlPolicy {
            analysis: env_ttl("CACHE_TTL_ANALYSIS_SECS", defaults.analysis)?,
            fallback: env_ttl("CACHE_TTL_FALLBACK_SECS", defaults.fallback)?,
            api: env_ttl("CACHE_TTL_API_SECS", defaults.api)?,
            api_user: env_ttl("CACHE_TTL_API_USER_SECS", defaults.api_user)?,
            api_aggregate: env_ttl("CACHE_TTL_API_AGGREGATE_SECS", defaults.api_aggregate)?,
            session: env_ttl("CACHE_TTL_SESSION_SECS", defaults.session)?,
        };

        let cache = CacheConfig {
            redis_url: optional_env("REDIS_URL"),
            connect_timeout: Duration::from_millis(env_or("CACHE_CONNECT_TIMEOUT_MS", 3000)?),
            command_timeout: Duration::from_millis(env_or("CACHE_COMMAND_TIMEOUT_MS", 2000)?),
            ttl,
            skip_paths: optional_env("CACHE_SKIP_PATHS")
                .map(|raw| parse_list(&raw))
                .unwrap_or_else(|| CacheConfig::default().skip_paths),
        };

        let llm = LlmConfig {
            api_url: optional_env("LLM_API_URL").unwrap_or_else(|| DEFAULT_LLM_API_URL.to_string()),
            api_key: optional_env("LLM_API_KEY"),
            model: optional_env("LLM_MODEL").unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
            timeout: Duration::from_secs(env_or("LLM_TIMEOUT_SECS", 30)?),
        };

        Ok(Config {
            database_url: optional_env("DATABASE_URL"),
            cache,
            llm,
            port: env_or("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

/// Reads a variable, treating empty as unset.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    parse_or(key, optional_env(key).as_deref(), default)
}

fn parse_or<T>(key: &str, raw: Option<&str>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        None => Ok(default),
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has invalid value '{raw}'")),
    }
}

fn env_ttl(key: &str, default: Ttl) -> Result<Ttl> {
    parse_ttl(key, optional_env(key).as_deref(), default)
}

fn parse_ttl(key: &str, raw: Option<&str>, default: Ttl) -> Result<Ttl> {
    let secs: u64 = parse_or(key, raw, default.as_secs())?;
    Ttl::try_from_secs(secs).ok_or_else(|| anyhow!("Environment variable '{key}' must be a positive number of seconds"))
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ttl_uses_default_when_unset() {
        let ttl = parse_ttl("X", None, Ttl::hours(1)).unwrap();
        assert_eq!(ttl.as_secs(), 3600);
    }

    #[test]
    fn test_parse_ttl_rejects_zero_and_negative() {
        assert!(parse_ttl("X", Some("0"), Ttl::hours(1)).is_err());
        assert!(parse_ttl("X", Some("-5"), Ttl::hours(1)).is_err());
        assert!(parse_ttl("X", Some("ten"), Ttl::hours(1)).is_err());
    }

    #[test]
    fn test_parse_ttl_accepts_positive() {
        assert_eq!(parse_ttl("X", Some("90"), Ttl::hours(1)).unwrap().as_secs(), 90);
    }

    #[test]
    fn test_parse_or_reports_key_in_error() {
        let err = parse_or::<u16>("PORT", Some("99999"), 8080).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn test_parse_list_trims_and_drops_empty() {
        assert_eq!(parse_list(" /auth/ ,, /my-"), vec!["/auth/", "/my-"]);
    }

    #[test]
    fn test_default_skip_list_covers_user_scoped_paths() {
        let skip = CacheConfig::default().skip_paths;
        assert!(skip.iter().any(|s| "/api/v1/auth/profile".contains(s.as_str())));
        assert!(skip.iter().any(|s| "/api/v1/my-tickets".contains(s.as_str())));
    }
}
