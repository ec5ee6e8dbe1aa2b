// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signature verification over the raw signing input.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::{crypto, DecodingKey};
use serde_json::{Map, Value};

use super::error::VerifyError;
use super::jwks::{SigningAlgorithm, SigningKey};
use super::token::ParsedToken;

/// A token whose signature has been checked against a resolved key.
///
/// This is the only way to get at the payload.
#[derive(Debug)]
pub struct VerifiedToken {
    kid: String,
    payload: Map<String, Value>,
}

impl VerifiedToken {
    pub fn kid(&self) -> &str {
        &self.kid
    }

    pub fn payload(&self) -> &Map<String, Value> {
        &self.payload
    }
}

/// Check the token's signature with `key`.
///
/// Fails with [`VerifyError::SignatureInvalid`] when the header names an
/// algorithm other than the key's, when the signature segment does not
/// decode, or when the RSA check fails.
pub fn verify_signature(
    token: ParsedToken<'_>,
    key: &SigningKey,
) -> Result<VerifiedToken, VerifyError> {
    if let Some(alg) = token.header.alg.as_deref() {
        if SigningAlgorithm::from_jose(alg) != Some(key.algorithm) {
            tracing::debug!(kid = %key.kid, alg, "Header algorithm does not match key");
            return Err(VerifyError::SignatureInvalid);
        }
    }

    let decoding_key = DecodingKey::from_rsa_components(
        &URL_SAFE_NO_PAD.encode(&key.modulus),
        &URL_SAFE_NO_PAD.encode(&key.exponent),
    )
    .map_err(|_| VerifyError::SignatureInvalid)?;

    // Checked over the exact bytes received; the payload is never re-encoded.
    let valid = crypto::verify(
        token.signature,
        token.signing_input.as_bytes(),
        &decoding_key,
        key.algorithm.jwt_algorithm(),
    )
    .unwrap_or(false);
    if !valid {
        return Err(VerifyError::SignatureInvalid);
    }

    Ok(VerifiedToken {
        kid: token.header.kid,
        payload: token.payload,
    })
}
