// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token verification.
//!
//! [`TokenVerifier::verify`] runs the stages in a fixed order:
//!
//! 1. parse the compact token
//! 2. resolve the signing key for its `kid`
//! 3. check the signature over the raw signing input
//! 4. validate `iss` / `exp` and build the [`Identity`]
//!
//! The first failing stage decides the error. Claims are only read after the
//! signature check; the types make the payload unreachable before that.

use std::fmt;

use chrono::{DateTime, Utc};

use super::claims::{Claims, Identity};
use super::error::VerifyError;
use super::jwks::KeyResolver;
use super::signature::verify_signature;
use super::token::ParsedToken;
use crate::config::{AuthSettings, ConfigError};

/// Verification progress, used for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    Parsed,
    KeyResolved,
    SignatureChecked,
    ClaimsValidated,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Start => "start",
            Stage::Parsed => "parsed",
            Stage::KeyResolved => "key_resolved",
            Stage::SignatureChecked => "signature_checked",
            Stage::ClaimsValidated => "claims_validated",
        };
        f.write_str(name)
    }
}

/// Verifies bearer tokens from one issuer.
///
/// Share one instance (e.g. behind an `Arc`) so every caller benefits from
/// the same key cache.
#[derive(Clone)]
pub struct TokenVerifier {
    issuer: String,
    keys: KeyResolver,
}

impl TokenVerifier {
    /// Build a verifier from settings.
    ///
    /// Fails if the issuer is missing or invalid, or the HTTP client cannot
    /// be built. These are startup errors, separate from [`VerifyError`].
    pub fn new(settings: &AuthSettings) -> Result<Self, ConfigError> {
        settings.validate()?;

        let client = reqwest::Client::builder()
            .timeout(settings.fetch_timeout)
            .build()?;

        let mut keys = KeyResolver::new(settings.jwks_url(), client);
        if let Some(ttl) = settings.cache_ttl {
            keys = keys.with_cache_ttl(ttl);
        }
        if let Some(interval) = settings.refetch_interval {
            keys = keys.with_refetch_interval(interval);
        }

        tracing::info!(issuer = %settings.issuer, jwks_url = %keys.jwks_url(), "Token verifier configured");

        Ok(Self::with_key_resolver(settings.issuer.clone(), keys))
    }

    /// Build a verifier around an existing key resolver.
    pub fn with_key_resolver(issuer: impl Into<String>, keys: KeyResolver) -> Self {
        Self {
            issuer: issuer.into(),
            keys,
        }
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn key_resolver(&self) -> &KeyResolver {
        &self.keys
    }

    /// Verify `token` against the current time.
    pub async fn verify(&self, token: &str) -> Result<Identity, VerifyError> {
        self.verify_at(token, Utc::now()).await
    }

    /// Verify `token` treating `now` as the current time.
    pub async fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Identity, VerifyError> {
        let mut stage = Stage::Start;
        let result = self.run(token, now, &mut stage).await;

        match &result {
            Ok(identity) => {
                tracing::debug!(external_id = %identity.external_id(), "Token verified");
            }
            Err(e) => {
                tracing::debug!(%stage, error_code = e.error_code(), "Token rejected");
            }
        }
        result
    }

    async fn run(
        &self,
        token: &str,
        now: DateTime<Utc>,
        stage: &mut Stage,
    ) -> Result<Identity, VerifyError> {
        let parsed = ParsedToken::parse(token)?;
        *stage = Stage::Parsed;

        let key = self.keys.resolve(&parsed.header().kid).await?;
        *stage = Stage::KeyResolved;

        let verified = verify_signature(parsed, &key)?;
        *stage = Stage::SignatureChecked;

        let identity = Claims::from_verified(&verified)?.validate(&self.issuer, now)?;
        *stage = Stage::ClaimsValidated;

        Ok(identity)
    }
}

impl fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("issuer", &self.issuer)
            .field("jwks_url", &self.keys.jwks_url())
            .finish()
    }
}
