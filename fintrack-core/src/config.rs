//! Configuration management
//!
//! Everything is read once at startup into an immutable [`Config`] that the
//! services share by reference. Sources are environment variables (a `.env`
//! file is loaded by the binary before this runs):
//!
//! | Env Var                  | Default                                        |
//! |--------------------------|------------------------------------------------|
//! | `KEY_VAULT_URL`          | `https://kv-fintrack-dev.vault.azure.net`      |
//! | `STORAGE_ACCOUNT_URL`    | `https://safintrackdev.blob.core.windows.net/` |
//! | `STORAGE_CONTAINER_NAME` | `raw`                                          |
//! | `ACCOUNT_ALIASES`        | `invoices`                                     |
//! | `HTTP_CLIENT_TIMEOUT`    | `90s`                                          |
//! | `DEBUG`                  | unset                                          |
//! | `FIO_API_URL`            | `https://fioapi.fio.cz`                        |
//! | `ACCOUNT_CONCURRENCY`    | `1`                                            |
//! | `HOST` / `PORT`          | `0.0.0.0` / `8080`                             |

use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result};
use url::Url;

use crate::domain::{parse_account_aliases, AccountAlias};

pub const DEFAULT_KEY_VAULT_URL: &str = "https://kv-fintrack-dev.vault.azure.net";
pub const DEFAULT_STORAGE_ACCOUNT_URL: &str = "https://safintrackdev.blob.core.windows.net/";
pub const DEFAULT_STORAGE_CONTAINER: &str = "raw";
pub const DEFAULT_ACCOUNT_ALIASES: &str = "invoices";
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(90);
pub const DEFAULT_FIO_API_URL: &str = "https://fioapi.fio.cz";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;

/// Something noteworthy that happened while loading configuration
///
/// Loading runs before logging is set up, so warnings are handed back to the
/// caller instead of being logged here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// Variable not set, default used
    Defaulted { key: &'static str, default: String },
    /// Variable set but unusable, default used
    Invalid {
        key: &'static str,
        value: String,
        default: String,
    },
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigWarning::Defaulted { key, default } => {
                write!(f, "{} not set, using default: {}", key, default)
            }
            ConfigWarning::Invalid {
                key,
                value,
                default,
            } => write!(
                f,
                "{} has invalid value {:?}, using default: {}",
                key, value, default
            ),
        }
    }
}

/// Service configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub key_vault_url: Url,
    pub storage_account_url: Url,
    pub storage_container: String,
    /// Effective account set, never empty
    pub accounts: Vec<AccountAlias>,
    pub http_timeout: Duration,
    pub debug: bool,
    pub fio_api_url: Url,
    /// Accounts processed at once; 1 means strictly sequential
    pub account_concurrency: usize,
    pub host: String,
    pub port: u16,
}

impl Config {
    /// Load config from the process environment
    pub fn load() -> Result<(Self, Vec<ConfigWarning>)> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load config through `lookup` (key -> value)
    ///
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<(Self, Vec<ConfigWarning>)>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let mut warnings = Vec::new();

        let mut required = |key: &'static str, default: &str| -> String {
            get(key).unwrap_or_else(|| {
                warnings.push(ConfigWarning::Defaulted {
                    key,
                    default: default.to_string(),
                });
                default.to_string()
            })
        };

        let key_vault_url = required("KEY_VAULT_URL", DEFAULT_KEY_VAULT_URL);
        let storage_account_url = required("STORAGE_ACCOUNT_URL", DEFAULT_STORAGE_ACCOUNT_URL);
        let storage_container = required("STORAGE_CONTAINER_NAME", DEFAULT_STORAGE_CONTAINER);
        let account_aliases = required("ACCOUNT_ALIASES", DEFAULT_ACCOUNT_ALIASES);

        let http_timeout = match get("HTTP_CLIENT_TIMEOUT") {
            Some(value) => match parse_duration(&value).filter(|d| !d.is_zero()) {
                Some(timeout) => timeout,
                None => {
                    warnings.push(ConfigWarning::Invalid {
                        key: "HTTP_CLIENT_TIMEOUT",
                        value,
                        default: format!("{:?}", DEFAULT_HTTP_TIMEOUT),
                    });
                    DEFAULT_HTTP_TIMEOUT
                }
            },
            None => DEFAULT_HTTP_TIMEOUT,
        };

        let account_concurrency = match get("ACCOUNT_CONCURRENCY") {
            Some(value) => match value.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    warnings.push(ConfigWarning::Invalid {
                        key: "ACCOUNT_CONCURRENCY",
                        value,
                        default: "1".to_string(),
                    });
                    1
                }
            },
            None => 1,
        };

        let port = match get("PORT") {
            Some(value) => match value.trim().parse::<u16>() {
                Ok(port) => port,
                Err(_) => {
                    warnings.push(ConfigWarning::Invalid {
                        key: "PORT",
                        value,
                        default: DEFAULT_PORT.to_string(),
                    });
                    DEFAULT_PORT
                }
            },
            None => DEFAULT_PORT,
        };

        let fio_api_url = get("FIO_API_URL").unwrap_or_else(|| DEFAULT_FIO_API_URL.to_string());

        let config = Self {
            key_vault_url: parse_url("KEY_VAULT_URL", &key_vault_url)?,
            storage_account_url: parse_url("STORAGE_ACCOUNT_URL", &storage_account_url)?,
            storage_container,
            accounts: parse_account_aliases(&account_aliases),
            http_timeout,
            debug: get("DEBUG").is_some(),
            fio_api_url: parse_url("FIO_API_URL", &fio_api_url)?,
            account_concurrency,
            host: get("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
        };

        Ok((config, warnings))
    }

    /// Effective settings as display pairs
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        let accounts: Vec<&str> = self.accounts.iter().map(|a| a.as_str()).collect();
        vec![
            ("key_vault_url", self.key_vault_url.to_string()),
            ("storage_account_url", self.storage_account_url.to_string()),
            ("storage_container", self.storage_container.clone()),
            ("accounts", accounts.join(",")),
            ("http_timeout", format!("{:?}", self.http_timeout)),
            ("debug", self.debug.to_string()),
            ("fio_api_url", self.fio_api_url.to_string()),
            ("account_concurrency", self.account_concurrency.to_string()),
            ("listen", format!("{}:{}", self.host, self.port)),
        ]
    }
}

fn parse_url(key: &str, value: &str) -> Result<Url> {
    let url = Url::parse(value).with_context(|| format!("{} is not a valid URL: {}", key, value))?;
    if !matches!(url.scheme(), "http" | "https") {
        anyhow::bail!("{} must use http or https: {}", key, value);
    }
    Ok(url)
}

/// Parse a duration such as "90s", "2m", "1m30s", "1.5h" or "500ms"
///
/// Accepts the units ns, us (µs), ms, s, m and h. A bare "0" is allowed;
/// signs are not.
pub fn parse_duration(input: &str) -> Option<Duration> {
    let mut rest = input.trim();
    if rest.is_empty() {
        return None;
    }
    if rest == "0" {
        return Some(Duration::ZERO);
    }

    let mut total_nanos = 0f64;
    while !rest.is_empty() {
        let num_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if num_len == 0 {
            return None;
        }
        let value: f64 = rest[..num_len].parse().ok()?;
        rest = &rest[num_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let nanos_per_unit = match &rest[..unit_len] {
            "ns" => 1.0,
            "us" | "µs" | "μs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            _ => return None,
        };
        rest = &rest[unit_len..];

        total_nanos += value * nanos_per_unit;
    }

    if !total_nanos.is_finite() || total_nanos > u64::MAX as f64 {
        return None;
    }
    Some(Duration::from_nanos(total_nanos.round() as u64))
}
