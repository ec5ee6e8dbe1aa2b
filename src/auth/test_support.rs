// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! RSA key fixtures for unit tests.

use std::sync::OnceLock;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rsa::pkcs1v15::SigningKey as RsaSigningKey;
use rsa::sha2::Sha256;
use rsa::signature::{SignatureEncoding, Signer};
use rsa::traits::PublicKeyParts;
use rsa::RsaPrivateKey;

use super::claims::{Claims, Identity};
use super::jwks::{SigningAlgorithm, SigningKey};

pub const TEST_ISSUER: &str = "https://issuer.example/";

/// Base64url-encode a JSON segment without padding.
pub fn encode_segment(json: &str) -> String {
    URL_SAFE_NO_PAD.encode(json.as_bytes())
}

/// An identity as the verifier would produce it, expiring at `exp`.
pub fn identity(
    sub: &str,
    email: Option<&str>,
    email_verified: bool,
    name: Option<&str>,
    exp: i64,
) -> Identity {
    let claims = Claims {
        iss: TEST_ISSUER.to_string(),
        exp: exp as f64,
        sub: Some(sub.to_string()),
        email: email.map(str::to_string),
        email_verified: Some(email_verified),
        name: name.map(str::to_string),
    };
    let epoch = chrono::DateTime::from_timestamp(0, 0).expect("epoch is representable");
    claims.validate(TEST_ISSUER, epoch).expect("test identity must validate")
}

pub struct TestKey {
    private_key: RsaPrivateKey,
}

impl TestKey {
    /// A fresh 2048-bit key. Slow; prefer [`TestKey::shared`].
    pub fn generate() -> Self {
        let private_key = RsaPrivateKey::new(&mut rand::thread_rng(), 2048)
            .expect("Failed to generate RSA key");
        Self { private_key }
    }

    /// One key per test binary.
    pub fn shared() -> &'static TestKey {
        static KEY: OnceLock<TestKey> = OnceLock::new();
        KEY.get_or_init(TestKey::generate)
    }

    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        RsaSigningKey::<Sha256>::new(self.private_key.clone())
            .sign(message)
            .to_vec()
    }

    /// Build a compact RS256 token over the given header and payload JSON.
    pub fn sign_token(&self, header: &str, payload: &str) -> String {
        let signing_input = format!("{}.{}", encode_segment(header), encode_segment(payload));
        let signature = self.sign(signing_input.as_bytes());
        format!("{signing_input}.{}", URL_SAFE_NO_PAD.encode(signature))
    }

    pub fn modulus_b64(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.private_key.n().to_bytes_be())
    }

    pub fn exponent_b64(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.private_key.e().to_bytes_be())
    }

    pub fn signing_key(&self, kid: &str) -> SigningKey {
        SigningKey {
            kid: kid.to_string(),
            kty: "RSA".to_string(),
            modulus: self.private_key.n().to_bytes_be(),
            exponent: self.private_key.e().to_bytes_be(),
            algorithm: SigningAlgorithm::RS256,
        }
    }

    /// JWKS entry for this key.
    pub fn jwk(&self, kid: &str) -> serde_json::Value {
        serde_json::json!({
            "kid": kid,
            "kty": "RSA",
            "use": "sig",
            "alg": "RS256",
            "n": self.modulus_b64(),
            "e": self.exponent_b64(),
        })
    }
}
