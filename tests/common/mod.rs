// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared fixtures for integration tests: an RSA signing key and a mock
//! key set endpoint.

#![allow(dead_code)]

use std::sync::OnceLock;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use inventory_auth::{AuthSettings, TokenVerifier};
use rsa::pkcs1v15::SigningKey as RsaSigningKey;
use rsa::sha2::Sha256;
use rsa::signature::{SignatureEncoding, Signer};
use rsa::traits::PublicKeyParts;
use rsa::RsaPrivateKey;
use serde_json::{json, Value};
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

pub const TEST_ISSUER: &str = "https://issuer.example/";
pub const JWKS_PATH: &str = "/.well-known/jwks.json";

/// Base64url-encode a JSON segment without padding.
pub fn encode_segment(json: &str) -> String {
    URL_SAFE_NO_PAD.encode(json.as_bytes())
}

/// RSA key used to sign test tokens.
///
/// Same shape as the crate's unit-test `TestKey`, which is not visible to
/// integration tests.
pub struct TestKey {
    private_key: RsaPrivateKey,
}

impl TestKey {
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

    /// JWKS entry for this key.
    pub fn jwk(&self, kid: &str) -> Value {
        json!({
            "kid": kid,
            "kty": "RSA",
            "use": "sig",
            "alg": "RS256",
            "n": self.modulus_b64(),
            "e": self.exponent_b64(),
        })
    }
}

/// Mock identity provider serving a key set.
pub struct MockIssuer {
    pub server: MockServer,
}

impl MockIssuer {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn jwks_url(&self) -> String {
        format!("{}{}", self.server.uri(), JWKS_PATH)
    }

    /// Serve `keys`, expecting exactly `fetches` requests.
    pub async fn serve_keys(&self, keys: Vec<Value>, fetches: u64) {
        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "keys": keys })))
            .expect(fetches)
            .mount(&self.server)
            .await;
    }

    /// Serve `keys` for the next request only.
    pub async fn serve_keys_once(&self, keys: Vec<Value>) {
        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "keys": keys })))
            .up_to_n_times(1)
            .expect(1)
            .mount(&self.server)
            .await;
    }

    /// Answer the next request with `status`.
    pub async fn fail_once(&self, status: u16) {
        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(ResponseTemplate::new(status))
            .up_to_n_times(1)
            .expect(1)
            .mount(&self.server)
            .await;
    }

    /// A verifier for [`TEST_ISSUER`] reading keys from this server.
    pub fn verifier(&self) -> TokenVerifier {
        let mut settings = AuthSettings::new(TEST_ISSUER);
        settings.jwks_url = Some(self.jwks_url());
        TokenVerifier::new(&settings).expect("valid test settings")
    }
}
