// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Verifies bearer tokens issued by an external identity provider (Auth0).
//!
//! ## Verification Flow
//!
//! 1. Client sends `Authorization: Bearer <JWT>`
//! 2. The token is split and its header/payload decoded (`token`)
//! 3. The signing key for the header's `kid` is taken from the JWKS cache,
//!    fetching `<issuer>.well-known/jwks.json` on first use (`jwks`)
//! 4. The RS256 signature is checked over the raw `header.payload` (`signature`)
//! 5. `iss` must equal the configured issuer and `exp` must be in the future (`claims`)
//! 6. The result is an [`Identity`] keyed by the provider's `sub`
//!
//! ## Security
//!
//! - Claims are never read before the signature is confirmed
//! - Token contents are never logged
//! - No clock skew leeway: a token is expired at its `exp`

pub mod claims;
pub mod error;
pub mod extractor;
pub mod jwks;
pub mod signature;
pub mod token;
pub mod verifier;

#[cfg(test)]
pub(crate) mod test_support;

pub use claims::{Claims, Identity};
pub use error::{AuthError, VerifyError};
pub use extractor::{Auth, VerifiedUser};
pub use jwks::{KeyResolver, SigningAlgorithm, SigningKey};
pub use token::Token;
pub use verifier::{Stage, TokenVerifier};
