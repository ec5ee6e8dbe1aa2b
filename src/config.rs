// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Settings are read from the environment once at startup. A missing issuer
//! is fatal: it is reported as a [`ConfigError`] from construction, never as
//! a per-token verification failure.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `AUTH0_ISSUER` | Expected `iss` claim; base of the JWKS URL | Required |
//! | `AUTH0_JWKS_URL` | Override for the JWKS URL | `<issuer>.well-known/jwks.json` |
//! | `JWKS_FETCH_TIMEOUT_SECS` | HTTP timeout for JWKS fetches | `10` |
//! | `JWKS_CACHE_TTL_SECS` | Expire cached keys after this many seconds | Never |
//! | `JWKS_REFETCH_INTERVAL_SECS` | Refetch on unknown `kid` once the cache is this old | Disabled |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info` |

use std::time::Duration;

use url::Url;

use crate::telemetry::LogFormat;

pub const ISSUER_ENV: &str = "AUTH0_ISSUER";
pub const JWKS_URL_ENV: &str = "AUTH0_JWKS_URL";
pub const JWKS_FETCH_TIMEOUT_ENV: &str = "JWKS_FETCH_TIMEOUT_SECS";
pub const JWKS_CACHE_TTL_ENV: &str = "JWKS_CACHE_TTL_SECS";
pub const JWKS_REFETCH_INTERVAL_ENV: &str = "JWKS_REFETCH_INTERVAL_SECS";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Default JWKS fetch timeout (10 seconds).
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Fatal startup configuration problems.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Auth0 configuration missing. Please set AUTH0_ISSUER environment variable.")]
    MissingIssuer,
    #[error("invalid URL in {name}: {reason}")]
    InvalidUrl { name: &'static str, reason: String },
    #[error("invalid value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Authentication settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSettings {
    /// Expected issuer, compared byte-for-byte with the `iss` claim
    pub issuer: String,
    /// Key set URL override
    pub jwks_url: Option<String>,
    pub fetch_timeout: Duration,
    pub cache_ttl: Option<Duration>,
    pub refetch_interval: Option<Duration>,
    pub log_format: LogFormat,
}

impl AuthSettings {
    /// Settings for `issuer` with everything else at its default.
    pub fn new(issuer: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            jwks_url: None,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            cache_ttl: None,
            refetch_interval: None,
            log_format: LogFormat::default(),
        }
    }

    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load using `lookup` to read variables. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let issuer = read(ISSUER_ENV).ok_or(ConfigError::MissingIssuer)?;
        let mut settings = Self::new(issuer);

        settings.jwks_url = read(JWKS_URL_ENV);
        if let Some(secs) = read_secs(&read, JWKS_FETCH_TIMEOUT_ENV)? {
            settings.fetch_timeout = secs;
        }
        settings.cache_ttl = read_secs(&read, JWKS_CACHE_TTL_ENV)?;
        settings.refetch_interval = read_secs(&read, JWKS_REFETCH_INTERVAL_ENV)?;
        if let Some(format) = read(LOG_FORMAT_ENV) {
            settings.log_format = format.parse::<LogFormat>().map_err(|_| ConfigError::InvalidValue {
                name: LOG_FORMAT_ENV,
                value: format,
            })?;
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Check the issuer and key set URL.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.issuer.is_empty() {
            return Err(ConfigError::MissingIssuer);
        }
        Url::parse(&self.issuer).map_err(|e| ConfigError::InvalidUrl {
            name: ISSUER_ENV,
            reason: e.to_string(),
        })?;
        Url::parse(&self.jwks_url()).map_err(|e| ConfigError::InvalidUrl {
            name: JWKS_URL_ENV,
            reason: e.to_string(),
        })?;
        Ok(())
    }

    /// The key set URL: the override, or the well-known path under the issuer.
    ///
    /// Issuers normally end in `/`; one is inserted when missing.
    pub fn jwks_url(&self) -> String {
        match &self.jwks_url {
            Some(url) => url.clone(),
            None if self.issuer.ends_with('/') => format!("{}.well-known/jwks.json", self.issuer),
            None => format!("{}/.well-known/jwks.json", self.issuer),
        }
    }
}

fn read_secs<R>(read: &R, name: &'static str) -> Result<Option<Duration>, ConfigError>
where
    R: Fn(&str) -> Option<String>,
{
    read(name)
        .map(|value| {
            value
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| ConfigError::InvalidValue { name, value })
        })
        .transpose()
}
