use crate::config::model::{Config, DebugConfig, DEFAULT_API_URL, DEFAULT_PAGE_LIMIT};
use std::env;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set.")]
    Missing(&'static str),

    #[error("Invalid config '{name}'. Expected {expected}.")]
    Invalid {
        name: &'static str,
        expected: &'static str,
    },
}

pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(|name| env::var(name).ok())
}

pub fn load_config_from<F>(lookup: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let api_url = lookup("HOLIDAZE_API_URL")
        .unwrap_or_else(|| DEFAULT_API_URL.to_string())
        .trim_end_matches('/')
        .to_string();
    let api_key = load_required(&lookup, "NOROFF_API_KEY")?;
    let page_limit = load_parsed(&lookup, "HOLIDAZE_PAGE_LIMIT", "a positive integer")?
        .unwrap_or(DEFAULT_PAGE_LIMIT);

    if page_limit == 0 {
        return Err(ConfigError::Invalid {
            name: "HOLIDAZE_PAGE_LIMIT",
            expected: "a positive integer",
        });
    }

    let venue_limit = load_parsed(&lookup, "DEBUG_VENUE_LIMIT", "an integer number")?;

    Ok(Config {
        api_url,
        api_key,
        page_limit,
        debug_config: DebugConfig { venue_limit },
    })
}

fn load_required<F>(lookup: &F, name: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .filter(|value| !value.trim().is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn load_parsed<F, T>(
    lookup: &F,
    name: &'static str,
    expected: &'static str,
) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { name, expected }),
        None => Ok(None),
    }
}
