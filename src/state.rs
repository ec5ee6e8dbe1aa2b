// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::TokenVerifier;
use crate::config::{AuthSettings, ConfigError};

#[derive(Clone, Debug)]
pub struct AppState {
    pub verifier: Arc<TokenVerifier>,
}

impl AppState {
    pub fn new(verifier: TokenVerifier) -> Self {
        Self {
            verifier: Arc::new(verifier),
        }
    }

    /// Build state from settings; fails on missing or invalid configuration.
    pub fn from_settings(settings: &AuthSettings) -> Result<Self, ConfigError> {
        Ok(Self::new(TokenVerifier::new(settings)?))
    }
}
