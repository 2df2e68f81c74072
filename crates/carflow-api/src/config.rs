//! # Server Configuration
//!
//! Built once at startup from environment variables.
//!
//! | Variable                   | Default    | Meaning                                   |
//! |----------------------------|------------|-------------------------------------------|
//! | `PORT`                     | 8080       | Listen port                               |
//! | `APP_ENV`                  | production | `development` allows fallback secrets      |
//! | `JWT_ACCESS_SECRET`        |            | Access credential secret (>= 16 bytes)    |
//! | `JWT_REFRESH_SECRET`       |            | Renewal credential secret, must differ    |
//! | `JWT_ACCESS_TTL_SECS`      | 900        | Access credential lifetime                |
//! | `JWT_REFRESH_TTL_SECS`     | 604800     | Renewal credential lifetime               |
//! | `RATE_LIMIT_SWEEP_SECS`    | 3600       | Eviction sweep period                     |
//! | `RATE_LIMIT_IDLE_SECS`     | 3600       | Idle age before eviction; 0 = reset all   |
//! | `RATE_LIMIT_RETRY_AFTER`   | 60         | Positive seconds, or `precise`            |
//! | `IP_RATE_LIMIT_PER_MINUTE` | 600        | Budget of the client-address limiter      |
//! | `CORS_ALLOWED_ORIGINS`     |            | Comma-separated origins                   |
//! | `TENANTS_FILE`             |            | JSON array of tenant records              |
//! | `LOG_FORMAT`               | text       | `json` for structured output              |

use std::path::PathBuf;
use std::time::Duration;

use carflow_auth::{CredentialError, CredentialSecret, ValidatorConfig};
use carflow_ratelimit::{EvictionPolicy, RetryAfterPolicy};
use carflow_tenancy::Tenant;
use thiserror::Error;

const DEV_ACCESS_SECRET: &str = "access_secret_for_development_only";
const DEV_REFRESH_SECRET: &str = "refresh_secret_for_development_only";

/// Configuration could not be loaded.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required variable is unset.
    #[error("{0} must be set")]
    Missing(&'static str),

    /// A variable is set but unparseable.
    #[error("invalid {name}: {reason}")]
    Invalid {
        /// Variable name.
        name: &'static str,
        /// What was wrong.
        reason: String,
    },

    /// Secrets or lifetimes were rejected.
    #[error(transparent)]
    Credential(#[from] CredentialError),

    /// The tenants file could not be read or parsed.
    #[error("failed to load tenants from {path}: {reason}")]
    Tenants {
        /// File path.
        path: PathBuf,
        /// What went wrong.
        reason: String,
    },
}

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Local development: fallback secrets, permissive CORS.
    Development,
    /// Anything else.
    Production,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    /// `json` selects [`LogFormat::Json`]; anything else is text.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Rate limiter settings shared by both registries.
#[derive(Debug, Clone)]
pub struct RateLimitSettings {
    /// How often the eviction sweep runs.
    pub sweep_interval: Duration,
    /// Which buckets a sweep removes.
    pub eviction: EvictionPolicy,
    /// How the 429 retry hint is computed.
    pub retry_after: RetryAfterPolicy,
    /// Requests per minute per client address on public routes.
    pub client_per_minute: u32,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_secs(3600),
            eviction: EvictionPolicy::IdleFor(Duration::from_secs(3600)),
            retry_after: RetryAfterPolicy::default(),
            client_per_minute: 600,
        }
    }
}

/// Application configuration.
///
/// Secrets are held as [`CredentialSecret`], whose `Debug` is redacted.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Deployment environment.
    pub environment: Environment,
    /// Credential validator settings.
    pub credentials: ValidatorConfig,
    /// Rate limiter settings.
    pub rate_limit: RateLimitSettings,
    /// Allowed CORS origins. Empty means same-origin only, or any origin
    /// in development.
    pub cors_origins: Vec<String>,
    /// Tenant records to seed the in-memory directory with.
    pub tenants_file: Option<PathBuf>,
    /// Log output format.
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Production configuration with the given secrets and every other
    /// setting at its default.
    pub fn with_secrets(access: CredentialSecret, refresh: CredentialSecret) -> Self {
        Self {
            port: 8080,
            environment: Environment::Production,
            credentials: ValidatorConfig::new(access, refresh),
            rate_limit: RateLimitSettings::default(),
            cors_origins: Vec::new(),
            tenants_file: None,
            log_format: LogFormat::Text,
        }
    }

    /// Load from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for missing secrets outside development or
    /// any unparseable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Same as [`from_env`](Self::from_env).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let environment = match var("APP_ENV").as_deref() {
            Some("development") | Some("dev") => Environment::Development,
            _ => Environment::Production,
        };

        let access = secret(&var, "JWT_ACCESS_SECRET", "access", environment, DEV_ACCESS_SECRET)?;
        let refresh = secret(&var, "JWT_REFRESH_SECRET", "refresh", environment, DEV_REFRESH_SECRET)?;
        let mut credentials = ValidatorConfig::new(access, refresh);
        if let Some(secs) = parse::<u64>(&var, "JWT_ACCESS_TTL_SECS")? {
            credentials.access_ttl = Duration::from_secs(secs);
        }
        if let Some(secs) = parse::<u64>(&var, "JWT_REFRESH_TTL_SECS")? {
            credentials.refresh_ttl = Duration::from_secs(secs);
        }

        let mut rate_limit = RateLimitSettings::default();
        if let Some(secs) = parse::<u64>(&var, "RATE_LIMIT_SWEEP_SECS")? {
            if secs == 0 {
                return Err(ConfigError::Invalid {
                    name: "RATE_LIMIT_SWEEP_SECS",
                    reason: "must be positive".into(),
                });
            }
            rate_limit.sweep_interval = Duration::from_secs(secs);
        }
        match parse::<u64>(&var, "RATE_LIMIT_IDLE_SECS")? {
            Some(0) => rate_limit.eviction = EvictionPolicy::ResetAll,
            Some(secs) => rate_limit.eviction = EvictionPolicy::IdleFor(Duration::from_secs(secs)),
            None => {}
        }
        match var("RATE_LIMIT_RETRY_AFTER").as_deref() {
            None => {}
            Some("precise") => rate_limit.retry_after = RetryAfterPolicy::Precise,
            Some(raw) => {
                let secs = raw.trim().parse::<u64>().map_err(|e| ConfigError::Invalid {
                    name: "RATE_LIMIT_RETRY_AFTER",
                    reason: e.to_string(),
                })?;
                if secs == 0 {
                    return Err(ConfigError::Invalid {
                        name: "RATE_LIMIT_RETRY_AFTER",
                        reason: "must be positive".into(),
                    });
                }
                rate_limit.retry_after = RetryAfterPolicy::Fixed(secs);
            }
        }
        if let Some(n) = parse::<u32>(&var, "IP_RATE_LIMIT_PER_MINUTE")? {
            if n == 0 {
                return Err(ConfigError::Invalid {
                    name: "IP_RATE_LIMIT_PER_MINUTE",
                    reason: "must be positive".into(),
                });
            }
            rate_limit.client_per_minute = n;
        }

        let cors_origins = var("CORS_ALLOWED_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        let log_format = LogFormat::parse(var("LOG_FORMAT").as_deref());

        Ok(Self {
            port: parse::<u16>(&var, "PORT")?.unwrap_or(8080),
            environment,
            credentials,
            rate_limit,
            cors_origins,
            tenants_file: var("TENANTS_FILE").map(PathBuf::from),
            log_format,
        })
    }

    /// Whether this is a development deployment.
    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }

    /// Read [`tenants_file`](Self::tenants_file), if set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Tenants`] if the file is unreadable or not a
    /// JSON array of tenant records.
    pub fn load_tenants(&self) -> Result<Vec<Tenant>, ConfigError> {
        let Some(path) = &self.tenants_file else {
            return Ok(Vec::new());
        };
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Tenants {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        serde_json::from_str(&raw).map_err(|e| ConfigError::Tenants {
            path: path.clone(),
            reason: e.to_string(),
        })
    }
}

fn secret(
    var: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    label: &'static str,
    environment: Environment,
    fallback: &str,
) -> Result<CredentialSecret, ConfigError> {
    match var(name) {
        Some(value) => Ok(CredentialSecret::new(label, value)?),
        None if environment == Environment::Development => {
            tracing::warn!(
                variable = name,
                "using the built-in development secret; never run this outside development"
            );
            Ok(CredentialSecret::new(label, fallback)?)
        }
        None => Err(ConfigError::Missing(name)),
    }
}

fn parse<T>(
    var: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    var(name)
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
                name,
                reason: e.to_string(),
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|k| map.get(k).cloned())
    }

    const SECRETS: [(&str, &str); 2] = [
        ("JWT_ACCESS_SECRET", "access-secret-for-tests-01"),
        ("JWT_REFRESH_SECRET", "refresh-secret-for-tests-02"),
    ];

    #[test]
    fn defaults() {
        let config = load(&SECRETS).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.credentials.access_ttl, Duration::from_secs(900));
        assert_eq!(config.credentials.refresh_ttl, Duration::from_secs(604_800));
        assert_eq!(config.rate_limit.retry_after, RetryAfterPolicy::Fixed(60));
        assert_eq!(
            config.rate_limit.eviction,
            EvictionPolicy::IdleFor(Duration::from_secs(3600))
        );
        assert_eq!(config.rate_limit.client_per_minute, 600);
        assert!(config.cors_origins.is_empty());
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn production_requires_secrets() {
        assert!(matches!(
            load(&[]),
            Err(ConfigError::Missing("JWT_ACCESS_SECRET"))
        ));
        assert!(matches!(
            load(&[SECRETS[0]]),
            Err(ConfigError::Missing("JWT_REFRESH_SECRET"))
        ));
    }

    #[test]
    fn development_falls_back() {
        let config = load(&[("APP_ENV", "development")]).unwrap();
        assert!(config.is_development());
        assert_eq!(
            config.credentials.access_secret.expose(),
            DEV_ACCESS_SECRET.as_bytes()
        );
    }

    #[test]
    fn short_secret_rejected() {
        let err = load(&[
            ("JWT_ACCESS_SECRET", "short"),
            ("JWT_REFRESH_SECRET", "refresh-secret-for-tests-02"),
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Credential(CredentialError::WeakSecret { name: "access", .. })
        ));
    }

    #[test]
    fn overrides() {
        let mut vars = SECRETS.to_vec();
        vars.extend([
            ("PORT", "9000"),
            ("JWT_ACCESS_TTL_SECS", "60"),
            ("RATE_LIMIT_IDLE_SECS", "0"),
            ("RATE_LIMIT_RETRY_AFTER", "precise"),
            ("IP_RATE_LIMIT_PER_MINUTE", "30"),
            ("CORS_ALLOWED_ORIGINS", "https://a.example, https://b.example,"),
            ("LOG_FORMAT", "json"),
        ]);
        let config = load(&vars).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.credentials.access_ttl, Duration::from_secs(60));
        assert_eq!(config.rate_limit.eviction, EvictionPolicy::ResetAll);
        assert_eq!(config.rate_limit.retry_after, RetryAfterPolicy::Precise);
        assert_eq!(config.rate_limit.client_per_minute, 30);
        assert_eq!(
            config.cors_origins,
            vec!["https://a.example", "https://b.example"]
        );
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn garbage_numbers_rejected() {
        let mut vars = SECRETS.to_vec();
        vars.push(("PORT", "eighty"));
        assert!(matches!(
            load(&vars),
            Err(ConfigError::Invalid { name: "PORT", .. })
        ));
    }

    #[test]
    fn zero_retry_after_rejected() {
        let mut vars = SECRETS.to_vec();
        vars.push(("RATE_LIMIT_RETRY_AFTER", "0"));
        assert!(matches!(
            load(&vars),
            Err(ConfigError::Invalid { name: "RATE_LIMIT_RETRY_AFTER", .. })
        ));

        let mut vars = SECRETS.to_vec();
        vars.push(("RATE_LIMIT_RETRY_AFTER", "30"));
        assert_eq!(
            load(&vars).unwrap().rate_limit.retry_after,
            RetryAfterPolicy::Fixed(30)
        );
    }

    #[test]
    fn debug_redacts_secrets() {
        let printed = format!("{:?}", load(&SECRETS).unwrap());
        assert!(!printed.contains("access-secret-for-tests"));
    }
}
