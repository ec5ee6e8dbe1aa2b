// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWKS (JSON Web Key Set) fetching and caching.
//!
//! ## Cache lifecycle
//!
//! - Empty at startup; filled by the first lookup
//! - A fetch that yields no usable keys leaves the cache empty
//! - Every fetch replaces the whole key map in one write
//! - Concurrent misses share a single fetch (single-flight gate)
//! - A failed fetch leaves the cache untouched, so the next lookup retries
//!
//! Keys never expire unless a TTL is configured. A minimum refetch interval
//! can be configured so that an unknown `kid` on a populated cache triggers a
//! refetch, which is how rotated keys get picked up.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use jsonwebtoken::Algorithm;
use serde::Deserialize;
use tokio::sync::{Mutex, RwLock};

use super::error::VerifyError;
use super::token::decode_base64url;

/// Signature algorithms accepted for keys in the set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningAlgorithm {
    RS256,
    RS384,
    RS512,
}

impl SigningAlgorithm {
    /// Parse a JOSE `alg` value. Only the RSA PKCS#1 v1.5 family is accepted.
    pub fn from_jose(alg: &str) -> Option<Self> {
        match alg {
            "RS256" => Some(SigningAlgorithm::RS256),
            "RS384" => Some(SigningAlgorithm::RS384),
            "RS512" => Some(SigningAlgorithm::RS512),
            _ => None,
        }
    }

    pub fn as_jose(&self) -> &'static str {
        match self {
            SigningAlgorithm::RS256 => "RS256",
            SigningAlgorithm::RS384 => "RS384",
            SigningAlgorithm::RS512 => "RS512",
        }
    }

    pub(crate) fn jwt_algorithm(&self) -> Algorithm {
        match self {
            SigningAlgorithm::RS256 => Algorithm::RS256,
            SigningAlgorithm::RS384 => Algorithm::RS384,
            SigningAlgorithm::RS512 => Algorithm::RS512,
        }
    }
}

/// A resolved RSA verification key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningKey {
    pub kid: String,
    pub kty: String,
    /// Big-endian modulus without leading zero bytes
    pub modulus: Vec<u8>,
    /// Big-endian public exponent
    pub exponent: Vec<u8>,
    pub algorithm: SigningAlgorithm,
}

/// Key set document as published by the provider.
#[derive(Debug, Deserialize)]
struct JwksDocument {
    keys: Vec<JwkEntry>,
}

/// One key entry. Only `kid` and `kty` are common to every key type; the
/// RSA parameters are checked once the entry is known to be RSA.
#[derive(Debug, Deserialize)]
struct JwkEntry {
    kid: String,
    kty: String,
    #[serde(default)]
    n: Option<String>,
    #[serde(default)]
    e: Option<String>,
    #[serde(default)]
    alg: Option<String>,
}

impl JwkEntry {
    /// Convert to a signing key. `Ok(None)` for entries that can never verify
    /// an RSA signature (non-RSA key types or algorithms).
    fn into_signing_key(self) -> Result<Option<SigningKey>, VerifyError> {
        if self.kty != "RSA" {
            tracing::debug!(kid = %self.kid, kty = %self.kty, "Skipping non-RSA key");
            return Ok(None);
        }

        let algorithm = match self.alg.as_deref() {
            None => SigningAlgorithm::RS256,
            Some(alg) => match SigningAlgorithm::from_jose(alg) {
                Some(algorithm) => algorithm,
                None => {
                    tracing::debug!(kid = %self.kid, alg, "Skipping key with unsupported algorithm");
                    return Ok(None);
                }
            },
        };

        let (Some(n), Some(e)) = (self.n.as_deref(), self.e.as_deref()) else {
            return Err(VerifyError::InvalidResponse(format!(
                "RSA key {} is missing n or e",
                self.kid
            )));
        };
        let mut modulus = decode_base64url(n).map_err(|_| {
            VerifyError::InvalidResponse(format!("key {} has an invalid modulus", self.kid))
        })?;
        let exponent = decode_base64url(e).map_err(|_| {
            VerifyError::InvalidResponse(format!("key {} has an invalid exponent", self.kid))
        })?;

        let leading_zeros = modulus.iter().take_while(|b| **b == 0).count();
        modulus.drain(..leading_zeros);

        Ok(Some(SigningKey {
            kid: self.kid,
            kty: self.kty,
            modulus,
            exponent,
            algorithm,
        }))
    }
}

/// Parse a key set document into a `kid → key` map.
fn parse_key_set(body: &[u8]) -> Result<HashMap<String, SigningKey>, VerifyError> {
    let document: JwksDocument = serde_json::from_slice(body)
        .map_err(|e| VerifyError::InvalidResponse(e.to_string()))?;

    let mut keys = HashMap::with_capacity(document.keys.len());
    for entry in document.keys {
        if let Some(key) = entry.into_signing_key()? {
            keys.insert(key.kid.clone(), key);
        }
    }
    Ok(keys)
}

/// Cached key set.
#[derive(Default)]
struct CacheState {
    keys: HashMap<String, SigningKey>,
    fetched_at: Option<Instant>,
}

impl CacheState {
    /// An empty key map is never fresh, whatever the fetch time.
    fn is_fresh(&self, ttl: Option<Duration>) -> bool {
        if self.keys.is_empty() {
            return false;
        }
        match (self.fetched_at, ttl) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(at), Some(ttl)) => at.elapsed() < ttl,
        }
    }

    fn may_refetch_for_unknown_kid(&self, interval: Option<Duration>) -> bool {
        match (self.fetched_at, interval) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(at), Some(interval)) => at.elapsed() >= interval,
        }
    }
}

/// Key resolver with caching.
///
/// Cheap to clone; clones share the cache.
#[derive(Clone)]
pub struct KeyResolver {
    /// Key set document URL
    jwks_url: String,
    /// Optional cache TTL; `None` keeps keys until `reset`
    cache_ttl: Option<Duration>,
    /// Optional minimum age of the cache before an unknown kid refetches
    refetch_interval: Option<Duration>,
    cache: Arc<RwLock<CacheState>>,
    /// Held while a fetch is in flight
    fetch_gate: Arc<Mutex<()>>,
    client: reqwest::Client,
}

impl KeyResolver {
    /// Create a resolver for the given key set URL using the given HTTP client.
    pub fn new(jwks_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            jwks_url: jwks_url.into(),
            cache_ttl: None,
            refetch_interval: None,
            cache: Arc::new(RwLock::new(CacheState::default())),
            fetch_gate: Arc::new(Mutex::new(())),
            client,
        }
    }

    /// Expire cached keys after `ttl`.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    /// Refetch on an unknown `kid` once the cache is at least `interval` old.
    pub fn with_refetch_interval(mut self, interval: Duration) -> Self {
        self.refetch_interval = Some(interval);
        self
    }

    pub fn jwks_url(&self) -> &str {
        &self.jwks_url
    }

    /// Resolve the key for `kid`, fetching the key set when needed.
    pub async fn resolve(&self, kid: &str) -> Result<SigningKey, VerifyError> {
        if let Some(key) = self.lookup_cached(kid).await? {
            return Ok(key);
        }

        let _gate = self.fetch_gate.lock().await;

        // Another task may have fetched while we waited on the gate.
        if let Some(key) = self.lookup_cached(kid).await? {
            return Ok(key);
        }

        let keys = self.fetch_key_set().await?;
        let found = keys.get(kid).cloned();
        {
            let mut cache = self.cache.write().await;
            cache.keys = keys;
            cache.fetched_at = Some(Instant::now());
        }

        found.ok_or(VerifyError::KeyNotFound)
    }

    /// Look `kid` up in the cache.
    ///
    /// `Ok(None)` means a fetch is needed; `Err(KeyNotFound)` means the cache
    /// is current and a fetch is not allowed.
    async fn lookup_cached(&self, kid: &str) -> Result<Option<SigningKey>, VerifyError> {
        let cache = self.cache.read().await;
        if !cache.is_fresh(self.cache_ttl) {
            return Ok(None);
        }
        if let Some(key) = cache.keys.get(kid) {
            return Ok(Some(key.clone()));
        }
        if cache.may_refetch_for_unknown_kid(self.refetch_interval) {
            Ok(None)
        } else {
            Err(VerifyError::KeyNotFound)
        }
    }

    /// Fetch and parse the key set document.
    async fn fetch_key_set(&self) -> Result<HashMap<String, SigningKey>, VerifyError> {
        tracing::debug!(url = %self.jwks_url, "Fetching JWKS");

        let response = self
            .client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(url = %self.jwks_url, error = %e, "JWKS request failed");
                VerifyError::NetworkError(e.to_string())
            })?;

        if !response.status().is_success() {
            tracing::warn!(url = %self.jwks_url, status = %response.status(), "JWKS endpoint returned an error");
            return Err(VerifyError::InvalidResponse(format!(
                "HTTP {} from JWKS endpoint",
                response.status()
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| VerifyError::NetworkError(e.to_string()))?;

        let keys = parse_key_set(&body).inspect_err(|e| {
            tracing::warn!(url = %self.jwks_url, error = %e, "JWKS document rejected");
        })?;
        tracing::debug!(url = %self.jwks_url, keys = keys.len(), "JWKS cached");
        Ok(keys)
    }

    /// Drop every cached key. The next lookup fetches again.
    pub async fn reset(&self) {
        let mut cache = self.cache.write().await;
        *cache = CacheState::default();
    }

    /// Number of keys currently cached.
    pub async fn cached_key_count(&self) -> usize {
        self.cache.read().await.keys.len()
    }

    /// Check if the key set is currently cached and fresh.
    pub async fn is_cached(&self) -> bool {
        self.cache.read().await.is_fresh(self.cache_ttl)
    }
}
