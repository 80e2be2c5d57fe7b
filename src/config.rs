//! Purpose: Resolve per-invocation settings from flags, environment, and defaults.
//! Exports: `Settings`, `SettingsInput`, `parse_duration`.
//! Role: Builds one immutable settings value that every command receives explicitly.
//! Invariants: Flags win over environment, environment wins over defaults.
//! Invariants: Unparsable `SEE_TIMEOUT` values are ignored; unparsable `--timeout` is a usage error.
use std::time::Duration;

use see_cli::api::{ClientConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT, Error, ErrorKind};

pub(crate) const ENV_BASE_URL: &str = "SEE_BASE_URL";
pub(crate) const ENV_API_KEY: &str = "SEE_API_KEY";
pub(crate) const ENV_TIMEOUT: &str = "SEE_TIMEOUT";

#[derive(Clone, Debug, Default)]
pub(crate) struct SettingsInput {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub timeout: Option<String>,
    pub json: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Settings {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub json: bool,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

impl Settings {
    pub(crate) fn from_process(input: SettingsInput) -> Result<Self, Error> {
        Self::resolve(input, |key| std::env::var(key).ok())
    }

    pub(crate) fn resolve<E>(input: SettingsInput, env: E) -> Result<Self, Error>
    where
        E: Fn(&str) -> Option<String>,
    {
        let base_url = non_blank(input.base_url)
            .or_else(|| non_blank(env(ENV_BASE_URL)))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let api_key = non_blank(input.api_key).or_else(|| non_blank(env(ENV_API_KEY)));
        let timeout = match non_blank(input.timeout) {
            Some(raw) => parse_duration(&raw)?,
            None => env(ENV_TIMEOUT)
                .and_then(|raw| raw.trim().parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_TIMEOUT),
        };
        Ok(Self {
            base_url,
            api_key,
            timeout,
            json: input.json,
        })
    }

    /// Client configuration; fails when no API key was supplied.
    pub(crate) fn client_config(&self) -> Result<ClientConfig, Error> {
        let Some(api_key) = self.api_key.clone() else {
            return Err(Error::new(ErrorKind::Usage)
                .with_message("missing API key: use --api-key or set SEE_API_KEY"));
        };
        Ok(ClientConfig {
            base_url: self.base_url.clone(),
            api_key,
            timeout: self.timeout,
        })
    }
}

pub(crate) fn parse_duration(input: &str) -> Result<Duration, Error> {
    let invalid = || {
        Error::new(ErrorKind::Usage)
            .with_message("invalid duration")
            .with_hint("Use a number plus ms|s|m|h (e.g. 30s).")
    };
    let trimmed = input.trim();
    let split = trimmed.char_indices().find(|(_, ch)| !ch.is_ascii_digit());
    let (num_str, unit) = match split {
        Some((idx, _)) => trimmed.split_at(idx),
        None => ("", ""),
    };
    if num_str.is_empty() || unit.is_empty() {
        return Err(invalid());
    }
    let value: u64 = num_str.parse().map_err(|_| invalid())?;
    let millis = match unit {
        "ms" => value,
        "s" => value.saturating_mul(1_000),
        "m" => value.saturating_mul(60_000),
        "h" => value.saturating_mul(3_600_000),
        _ => return Err(invalid()),
    };
    Ok(Duration::from_millis(millis))
}
