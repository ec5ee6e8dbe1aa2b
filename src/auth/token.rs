// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Compact token parsing.
//!
//! A compact token is `header.payload.signature`, each segment base64url.
//! Parsing decodes the header and payload but leaves the signature segment
//! alone; the signing input is kept as the exact text received.

use std::fmt;
use std::str::FromStr;

use base64::{engine::general_purpose::STANDARD, Engine};
use serde_json::{Map, Value};

use super::error::VerifyError;

/// A bearer token as received from the client. Never empty.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    /// Wrap a raw token string.
    ///
    /// Fails with [`VerifyError::InvalidFormat`] for an empty string.
    pub fn new(value: impl Into<String>) -> Result<Self, VerifyError> {
        let value = value.into();
        if value.is_empty() {
            return Err(VerifyError::InvalidFormat);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Token {
    type Err = VerifyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Token::new(s)
    }
}

impl AsRef<str> for Token {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// Token contents stay out of logs and panics.
impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token(<{} bytes>)", self.0.len())
    }
}

/// The fields of the token header the verifier cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenHeader {
    /// Key identifier used to pick the verification key
    pub kid: String,
    /// Declared signing algorithm, if any
    pub alg: Option<String>,
}

/// A token split into its parts, signature not yet checked.
///
/// The payload is deliberately not reachable from here: claims can only be
/// read once the signature has been checked (see `signature::VerifiedToken`).
#[derive(Debug)]
pub struct ParsedToken<'a> {
    pub(crate) header: TokenHeader,
    pub(crate) payload: Map<String, Value>,
    pub(crate) signing_input: &'a str,
    pub(crate) signature: &'a str,
}

impl<'a> ParsedToken<'a> {
    /// Parse a compact token.
    ///
    /// Errors, in the order they are checked:
    /// - [`VerifyError::InvalidFormat`] unless there are exactly three segments
    /// - [`VerifyError::InvalidBase64`] if the header or payload does not decode
    /// - [`VerifyError::InvalidHeader`] if the header is not an object with a string `kid`
    /// - [`VerifyError::InvalidPayload`] if the payload is not a JSON object
    pub fn parse(raw: &'a str) -> Result<Self, VerifyError> {
        let segments: Vec<&str> = raw.split('.').collect();
        let &[header_b64, payload_b64, signature] = segments.as_slice() else {
            return Err(VerifyError::InvalidFormat);
        };

        let header_bytes = decode_base64url(header_b64)?;
        let payload_bytes = decode_base64url(payload_b64)?;

        let header = parse_header(&header_bytes)?;
        let payload = match serde_json::from_slice::<Value>(&payload_bytes) {
            Ok(Value::Object(map)) => map,
            Ok(_) => {
                return Err(VerifyError::InvalidPayload(
                    "payload is not a JSON object".to_string(),
                ))
            }
            Err(e) => return Err(VerifyError::InvalidPayload(e.to_string())),
        };

        let signing_input = &raw[..header_b64.len() + 1 + payload_b64.len()];

        Ok(Self {
            header,
            payload,
            signing_input,
            signature,
        })
    }

    pub fn header(&self) -> &TokenHeader {
        &self.header
    }

    /// The exact `header.payload` text the signature was computed over.
    pub fn signing_input(&self) -> &'a str {
        self.signing_input
    }
}

fn parse_header(bytes: &[u8]) -> Result<TokenHeader, VerifyError> {
    let Ok(Value::Object(header)) = serde_json::from_slice::<Value>(bytes) else {
        return Err(VerifyError::InvalidHeader);
    };

    let kid = header
        .get("kid")
        .and_then(Value::as_str)
        .ok_or(VerifyError::InvalidHeader)?
        .to_string();
    let alg = header.get("alg").and_then(Value::as_str).map(str::to_string);

    Ok(TokenHeader { kid, alg })
}

/// Decode a base64url segment, tolerating missing padding.
///
/// The alphabet is mapped onto standard base64 and padded to a multiple of
/// four before decoding.
pub fn decode_base64url(segment: &str) -> Result<Vec<u8>, VerifyError> {
    let mut normalized: String = segment
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();
    while normalized.len() % 4 != 0 {
        normalized.push('=');
    }

    STANDARD
        .decode(normalized.as_bytes())
        .map_err(|_| VerifyError::InvalidBase64)
}
