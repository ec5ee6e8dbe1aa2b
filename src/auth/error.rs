// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.
//!
//! [`VerifyError`] is the closed set of reasons a single token can fail
//! verification. [`AuthError`] is what the HTTP layer rejects a request
//! with: header problems, verification failures and user-domain refusals.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::models::UserDomainError;

/// Why a token failed verification.
///
/// Every variant is terminal; nothing inside the verifier retries.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerifyError {
    /// Token does not split into exactly three segments (or is empty)
    #[error("Token is not a three-segment compact token")]
    InvalidFormat,
    /// Header or payload segment is not valid base64url
    #[error("Token segment is not valid base64url")]
    InvalidBase64,
    /// Header is not a JSON object or lacks a string `kid`
    #[error("Token header is invalid")]
    InvalidHeader,
    /// Payload is not a JSON object or lacks required claims
    #[error("Token payload is invalid: {0}")]
    InvalidPayload(String),
    /// No key in the key set matches the token's `kid`
    #[error("No matching key found in JWKS")]
    KeyNotFound,
    /// Signature check failed
    #[error("Token signature is invalid")]
    SignatureInvalid,
    /// `iss` differs from the configured issuer
    #[error("Token issuer is invalid")]
    IssuerMismatch,
    /// `exp` is at or before the reference time
    #[error("Token has expired")]
    TokenExpired,
    /// Key set could not be fetched
    #[error("Failed to fetch JWKS: {0}")]
    NetworkError(String),
    /// Key set endpoint answered with something that is not a key set
    #[error("Invalid JWKS response: {0}")]
    InvalidResponse(String),
}

impl VerifyError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            VerifyError::InvalidFormat => "invalid_format",
            VerifyError::InvalidBase64 => "invalid_base64",
            VerifyError::InvalidHeader => "invalid_header",
            VerifyError::InvalidPayload(_) => "invalid_payload",
            VerifyError::KeyNotFound => "key_not_found",
            VerifyError::SignatureInvalid => "signature_invalid",
            VerifyError::IssuerMismatch => "issuer_mismatch",
            VerifyError::TokenExpired => "token_expired",
            VerifyError::NetworkError(_) => "network_error",
            VerifyError::InvalidResponse(_) => "invalid_response",
        }
    }

    /// True when the failure is about the key set endpoint rather than the token.
    pub fn is_key_set_failure(&self) -> bool {
        matches!(
            self,
            VerifyError::NetworkError(_) | VerifyError::InvalidResponse(_)
        )
    }
}

/// Request-level authentication error.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No authorization header present
    #[error("Authorization header is required")]
    MissingAuthHeader,
    /// Invalid authorization header format
    #[error("Invalid authorization header format (expected 'Bearer <token>')")]
    InvalidAuthHeader,
    /// Token failed verification
    #[error(transparent)]
    Verification(#[from] VerifyError),
    /// Token was valid but the user may not proceed
    #[error(transparent)]
    Forbidden(#[from] UserDomainError),
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingAuthHeader => "missing_auth_header",
            AuthError::InvalidAuthHeader => "invalid_auth_header",
            AuthError::Verification(e) => e.error_code(),
            AuthError::Forbidden(e) => e.error_code(),
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Verification(e) if e.is_key_set_failure() => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AuthError::MissingAuthHeader
            | AuthError::InvalidAuthHeader
            | AuthError::Verification(_) => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(AuthErrorBody {
            error: self.to_string(),
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}
