// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Inventory Auth - bearer token verification for the inventory service
//!
//! Verifies Auth0-issued RS256 tokens against the issuer's published key set
//! and turns them into an authenticated identity.
//!
//! ## Modules
//!
//! - `auth` - Token parsing, key resolution, signature and claims checks
//! - `models` - User entity and access rules
//! - `config` - Settings loaded from the environment
//! - `telemetry` - Tracing subscriber setup
//! - `api` - HTTP handlers (Axum) exposing the authenticated user
//!
//! ## Usage
//!
//! ```rust,ignore
//! let settings = AuthSettings::from_env()?;
//! telemetry::init_tracing(settings.log_format)?;
//! let verifier = TokenVerifier::new(&settings)?;
//! let identity = verifier.verify(token).await?;
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod state;
pub mod telemetry;

pub use auth::{Identity, TokenVerifier, VerifyError};
pub use config::AuthSettings;
