use infrastructure::IdPolicy;
use std::env;
use std::str::FromStr;
use tracing::{info, warn};

pub const DEFAULT_PORT: u16 = 3000;

const ENV_PORT: &str = "PORT";
const ENV_ID_POLICY: &str = "ID_POLICY";

/// Runtime settings read from the environment at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub port: u16,
    pub id_policy: IdPolicy,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            id_policy: IdPolicy::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup. Unparsable values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            port: parse_or_default(ENV_PORT, lookup(ENV_PORT), defaults.port),
            id_policy: parse_or_default(ENV_ID_POLICY, lookup(ENV_ID_POLICY), defaults.id_policy),
        }
    }
}

fn parse_or_default<T>(key: &str, raw: Option<String>, default: T) -> T
where
    T: FromStr + std::fmt::Display,
{
    match raw {
        Some(value) => match T::from_str(&value) {
            Ok(parsed) => {
                info!("Using {} {} from environment variable.", key, parsed);
                parsed
            }
            Err(_) => {
                warn!(
                    "Invalid {} value '{}' in environment variable. Using default {}.",
                    key, value, default
                );
                default
            }
        },
        None => {
            info!(
                "{} environment variable not set. Using default {}.",
                key, default
            );
            default
        }
    }
}
