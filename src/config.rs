// Copyright (c) 2026 Adrian Robinson. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.

use crate::enums::Sort;
use crate::traits::ClientError;
use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:9000/api/v1";
pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    /// Page size both views start with.
    pub page_size: u32,
    /// Sort both views start with.
    pub sort: Sort,
    /// Where the credential is persisted. `None` keeps it in memory.
    pub credential_path: Option<PathBuf>,
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            sort: Sort::default(),
            credential_path: None,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ClientConfig {
    /// Reads `MOVIERAMA_*` variables, falling back to defaults for any that
    /// are unset. A set but unparsable variable is an error.
    pub fn from_env() -> Result<Self, ClientError> {
        let defaults = Self::default();

        let page_size: u32 = try_load("MOVIERAMA_PAGE_SIZE", defaults.page_size)?;
        if page_size == 0 {
            return Err(ClientError::Config("MOVIERAMA_PAGE_SIZE must be positive".to_string()));
        }

        Ok(Self {
            base_url: try_load("MOVIERAMA_API_URL", defaults.base_url)?,
            page_size,
            sort: try_load("MOVIERAMA_SORT", defaults.sort)?,
            credential_path: var("MOVIERAMA_CREDENTIAL_PATH").map(PathBuf::from),
            request_timeout: Duration::from_secs(try_load(
                "MOVIERAMA_TIMEOUT_SECS",
                DEFAULT_TIMEOUT_SECS,
            )?),
        })
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn try_load<T>(key: &str, default: T) -> Result<T, ClientError>
where
    T: FromStr + Display,
    T::Err: Display,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| ClientError::Config(format!("invalid {key} value {raw:?}: {e}"))),
        None => {
            tracing::info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::{SortDirection, SortField};

    // Keep every env mutation in this one test.
    #[test]
    fn test_from_env_overrides_and_rejects() {
        env::set_var("MOVIERAMA_API_URL", "http://api.test/v1");
        env::set_var("MOVIERAMA_PAGE_SIZE", "25");
        env::set_var("MOVIERAMA_SORT", "title,asc");
        env::set_var("MOVIERAMA_CREDENTIAL_PATH", "/tmp/movierama-token");
        env::remove_var("MOVIERAMA_TIMEOUT_SECS");

        let config = ClientConfig::from_env().unwrap();
        assert_eq!(config.base_url, "http://api.test/v1");
        assert_eq!(config.page_size, 25);
        assert_eq!(config.sort, Sort::new(SortField::Title, SortDirection::Asc));
        assert_eq!(config.credential_path, Some(PathBuf::from("/tmp/movierama-token")));
        assert_eq!(config.request_timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));

        env::set_var("MOVIERAMA_PAGE_SIZE", "lots");
        assert!(matches!(ClientConfig::from_env(), Err(ClientError::Config(_))));

        env::set_var("MOVIERAMA_PAGE_SIZE", "0");
        assert!(matches!(ClientConfig::from_env(), Err(ClientError::Config(_))));

        for key in [
            "MOVIERAMA_API_URL",
            "MOVIERAMA_PAGE_SIZE",
            "MOVIERAMA_SORT",
            "MOVIERAMA_CREDENTIAL_PATH",
        ] {
            env::remove_var(key);
        }
        assert_eq!(ClientConfig::from_env().unwrap(), ClientConfig::default());
    }
}
