// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token claims and the identity produced by successful verification.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use super::error::VerifyError;
use super::signature::VerifiedToken;

/// Claims read from a signature-checked payload.
///
/// `iss` and `exp` are required; everything else is read permissively, so an
/// absent or mistyped optional claim is simply `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct Claims {
    /// Issuer
    pub iss: String,
    /// Expiration, seconds since the epoch (may be fractional)
    pub exp: f64,
    /// Subject (external user ID, e.g. `auth0|abc123`)
    pub sub: Option<String>,
    pub email: Option<String>,
    pub email_verified: Option<bool>,
    /// Display name
    pub name: Option<String>,
}

impl Claims {
    /// Extract claims from a verified token.
    pub fn from_verified(token: &VerifiedToken) -> Result<Self, VerifyError> {
        Self::from_payload(token.payload())
    }

    fn from_payload(payload: &Map<String, Value>) -> Result<Self, VerifyError> {
        let iss = payload
            .get("iss")
            .and_then(Value::as_str)
            .ok_or_else(|| VerifyError::InvalidPayload("missing or non-string iss".to_string()))?
            .to_string();
        let exp = payload
            .get("exp")
            .and_then(Value::as_f64)
            .ok_or_else(|| VerifyError::InvalidPayload("missing or non-numeric exp".to_string()))?;

        let string_claim = |name: &str| payload.get(name).and_then(Value::as_str).map(str::to_string);

        Ok(Self {
            iss,
            exp,
            sub: string_claim("sub"),
            email: string_claim("email"),
            email_verified: payload.get("email_verified").and_then(Value::as_bool),
            name: string_claim("name"),
        })
    }

    /// `exp` as a timestamp. `None` when it is outside the representable range.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let millis = (self.exp * 1000.0).floor();
        if !millis.is_finite() || millis.abs() > i64::MAX as f64 {
            return None;
        }
        DateTime::from_timestamp_millis(millis as i64)
    }

    /// Validate issuer and expiry and build the resulting identity.
    ///
    /// The issuer comparison is exact: a trailing slash difference is a
    /// mismatch. The token is expired when `exp` is at or before `now`.
    pub(crate) fn validate(
        self,
        expected_issuer: &str,
        now: DateTime<Utc>,
    ) -> Result<Identity, VerifyError> {
        if self.iss != expected_issuer {
            return Err(VerifyError::IssuerMismatch);
        }

        let expires_at = self
            .expires_at()
            .ok_or_else(|| VerifyError::InvalidPayload("exp is out of range".to_string()))?;
        if expires_at <= now {
            return Err(VerifyError::TokenExpired);
        }

        let external_id = match self.sub {
            Some(sub) if !sub.is_empty() => sub,
            _ => return Err(VerifyError::InvalidPayload("missing sub".to_string())),
        };

        Ok(Identity {
            external_id,
            name: self.name,
            email: self.email,
            email_verified: self.email_verified.unwrap_or(false),
            issuer: self.iss,
            expires_at,
        })
    }
}

/// The verified identity behind a bearer token.
///
/// Only produced by the verifier; fields are read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    external_id: String,
    name: Option<String>,
    email: Option<String>,
    email_verified: bool,
    issuer: String,
    expires_at: DateTime<Utc>,
}

impl Identity {
    /// Provider user ID (`sub`); the key for the caller's user record.
    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn email_verified(&self) -> bool {
        self.email_verified
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Login provider and provider-local ID for subjects shaped like
    /// `google-oauth2|1234`.
    pub fn provider(&self) -> Option<(&str, &str)> {
        self.external_id
            .split_once('|')
            .filter(|(provider, id)| !provider.is_empty() && !id.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ISSUER: &str = "https://issuer.example/";

    fn payload(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn sample() -> Map<String, Value> {
        payload(json!({
            "iss": ISSUER,
            "exp": 1_700_003_600,
            "sub": "auth0|abc",
            "email": "a@b.com",
            "email_verified": true,
            "name": "Ada",
        }))
    }

    #[test]
    fn extracts_identity_fields() {
        let identity = Claims::from_payload(&sample()).unwrap().validate(ISSUER, now()).unwrap();
        assert_eq!(identity.external_id(), "auth0|abc");
        assert_eq!(identity.email(), Some("a@b.com"));
        assert!(identity.email_verified());
        assert_eq!(identity.name(), Some("Ada"));
        assert_eq!(identity.issuer(), ISSUER);
        assert_eq!(identity.expires_at().timestamp(), 1_700_003_600);
        assert_eq!(identity.provider(), Some(("auth0", "abc")));
    }

    #[test]
    fn required_claims_must_be_present_and_typed() {
        for (field, bad) in [("iss", json!(42)), ("exp", json!("soon"))] {
            let mut claims = sample();
            claims.insert(field.to_string(), bad);
            assert!(matches!(
                Claims::from_payload(&claims),
                Err(VerifyError::InvalidPayload(_))
            ));

            claims.remove(field);
            assert!(matches!(
                Claims::from_payload(&claims),
                Err(VerifyError::InvalidPayload(_))
            ));
        }
    }

    #[test]
    fn optional_claims_are_permissive() {
        let mut claims = sample();
        claims.insert("email_verified".to_string(), json!("yes"));
        claims.insert("name".to_string(), json!(["not", "a", "string"]));
        claims.remove("email");

        let identity = Claims::from_payload(&claims).unwrap().validate(ISSUER, now()).unwrap();
        assert!(!identity.email_verified());
        assert_eq!(identity.name(), None);
        assert_eq!(identity.email(), None);
    }

    #[test]
    fn issuer_must_match_exactly() {
        let claims = Claims::from_payload(&sample()).unwrap();
        assert_eq!(
            claims.clone().validate("https://issuer.example", now()),
            Err(VerifyError::IssuerMismatch)
        );
        assert_eq!(
            claims.validate("https://ISSUER.example/", now()),
            Err(VerifyError::IssuerMismatch)
        );
    }

    #[test]
    fn expiry_boundary_is_exclusive() {
        let claims = Claims::from_payload(&sample()).unwrap();
        let at_exp = DateTime::from_timestamp(1_700_003_600, 0).unwrap();
        assert_eq!(claims.clone().validate(ISSUER, at_exp), Err(VerifyError::TokenExpired));

        let just_before = DateTime::from_timestamp(1_700_003_599, 999_000_000).unwrap();
        assert!(claims.validate(ISSUER, just_before).is_ok());
    }

    #[test]
    fn fractional_exp_is_honoured() {
        let mut claims = sample();
        claims.insert("exp".to_string(), json!(1_700_000_000.5));
        let claims = Claims::from_payload(&claims).unwrap();

        assert!(claims.clone().validate(ISSUER, now()).is_ok());
        let later = DateTime::from_timestamp(1_700_000_000, 500_000_000).unwrap();
        assert_eq!(claims.validate(ISSUER, later), Err(VerifyError::TokenExpired));
    }

    #[test]
    fn missing_or_empty_subject_cannot_form_identity() {
        for sub in [None, Some(json!("")), Some(json!(12))] {
            let mut claims = sample();
            match sub {
                Some(value) => claims.insert("sub".to_string(), value),
                None => claims.remove("sub"),
            };
            let result = Claims::from_payload(&claims).unwrap().validate(ISSUER, now());
            assert!(matches!(result, Err(VerifyError::InvalidPayload(_))));
        }
    }

    #[test]
    fn out_of_range_exp_is_invalid_payload() {
        let mut claims = sample();
        claims.insert("exp".to_string(), json!(1e300));
        let result = Claims::from_payload(&claims).unwrap().validate(ISSUER, now());
        assert!(matches!(result, Err(VerifyError::InvalidPayload(_))));
    }

    #[test]
    fn provider_requires_both_halves() {
        let mut claims = sample();
        claims.insert("sub".to_string(), json!("plain-id"));
        let identity = Claims::from_payload(&claims).unwrap().validate(ISSUER, now()).unwrap();
        assert_eq!(identity.provider(), None);
    }
}
