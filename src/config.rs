use std::fmt;
use std::time::Duration;

use zeroize::Zeroizing;

use crate::auth::DEFAULT_TOKEN_TTL_SECS;
use crate::provisioning::ProvisioningConfig;

const PLACEHOLDER_SECRET: &str = "CHANGE_ME_JWT_SECRET";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// HMAC key for bearer tokens. Scrubbed from memory on drop.
    pub jwt_secret: Zeroizing<String>,
    /// Token validity window in seconds.
    /// Set via IDGATE_TOKEN_TTL_SECS. Default: 600.
    pub token_ttl_secs: u64,
    pub provisioning: ProvisioningConfig,
    pub log_format: LogFormat,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("jwt_secret", &"****")
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("provisioning", &self.provisioning)
            .field("log_format", &self.log_format)
            .finish()
    }
}

/// Read configuration from the environment (and `.env`, if present).
pub fn load() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();

    let jwt_secret =
        std::env::var("IDGATE_JWT_SECRET").unwrap_or_else(|_| PLACEHOLDER_SECRET.into());

    if jwt_secret == PLACEHOLDER_SECRET {
        let env_mode = std::env::var("IDGATE_ENV")
            .or_else(|_| std::env::var("RUST_ENV"))
            .unwrap_or_default();
        if env_mode == "production" {
            anyhow::bail!(
                "IDGATE_JWT_SECRET is still the insecure placeholder. \
                 Set a proper secret before running in production."
            );
        }
        eprintln!("⚠️  IDGATE_JWT_SECRET is not set — using insecure placeholder. Set a real secret for production.");
    }
    if jwt_secret.is_empty() {
        anyhow::bail!("IDGATE_JWT_SECRET must not be empty");
    }

    Ok(Config {
        host: std::env::var("IDGATE_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
        port: env_or("IDGATE_PORT", 8090),
        jwt_secret: Zeroizing::new(jwt_secret),
        token_ttl_secs: env_or("IDGATE_TOKEN_TTL_SECS", DEFAULT_TOKEN_TTL_SECS),
        provisioning: ProvisioningConfig {
            workers: env_or::<usize>("IDGATE_PROVISION_WORKERS", 1).max(1),
            fabrication_delay: Duration::from_millis(env_or("IDGATE_FABRICATION_DELAY_MS", 0)),
        },
        log_format: match std::env::var("IDGATE_LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            _ => LogFormat::Text,
        },
    })
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_or_falls_back_on_garbage() {
        std::env::set_var("IDGATE_TEST_ENV_OR", "not-a-number");
        assert_eq!(env_or("IDGATE_TEST_ENV_OR", 42u64), 42);
        std::env::set_var("IDGATE_TEST_ENV_OR", "7");
        assert_eq!(env_or("IDGATE_TEST_ENV_OR", 42u64), 7);
        std::env::remove_var("IDGATE_TEST_ENV_OR");
    }

    #[test]
    fn test_debug_redacts_secret() {
        let cfg = Config {
            host: "127.0.0.1".into(),
            port: 8090,
            jwt_secret: Zeroizing::new("super-secret".into()),
            token_ttl_secs: 600,
            provisioning: ProvisioningConfig::default(),
            log_format: LogFormat::Text,
        };
        let printed = format!("{:?}", cfg);
        assert!(!printed.contains("super-secret"));
        assert!(printed.contains("****"));
    }
}
