// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # User Domain Model
//!
//! The [`User`] entity is what the application works with once a token has
//! been verified. It is built from an [`Identity`] and enforces the access
//! rules that sit on top of token validity:
//!
//! - the session (token expiry) must still be current
//! - the provider must have verified the user's email
//!
//! Persisting users is left to the caller; the identifier to key a record on
//! is [`UserIdentifier`] (the provider's `sub`).

use chrono::{DateTime, Utc};

use crate::auth::Identity;

/// Domain errors for the user entity and its value objects.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserDomainError {
    #[error("User identifier cannot be empty")]
    InvalidIdentifier,
    #[error("Email address must contain @ symbol")]
    InvalidEmail,
    #[error("Session expired")]
    SessionExpired,
    #[error("User not verified, cannot access system")]
    UserNotVerified,
}

impl UserDomainError {
    pub fn error_code(&self) -> &'static str {
        match self {
            UserDomainError::InvalidIdentifier => "invalid_identifier",
            UserDomainError::InvalidEmail => "invalid_email",
            UserDomainError::SessionExpired => "session_expired",
            UserDomainError::UserNotVerified => "user_not_verified",
        }
    }
}

// =============================================================================
// Value Objects
// =============================================================================

/// Non-empty external user identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserIdentifier(String);

impl UserIdentifier {
    pub fn new(value: impl Into<String>) -> Result<Self, UserDomainError> {
        let value = value.into();
        if value.is_empty() {
            return Err(UserDomainError::InvalidIdentifier);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Name and email. An email, when present, must contain `@`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl UserProfile {
    pub fn new(name: Option<String>, email: Option<String>) -> Result<Self, UserDomainError> {
        if let Some(email) = &email {
            if !email.contains('@') {
                return Err(UserDomainError::InvalidEmail);
            }
        }
        Ok(Self { name, email })
    }
}

/// What the identity provider asserted about this login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticationInfo {
    pub external_id: String,
    pub is_verified: bool,
    pub expires_at: DateTime<Utc>,
}

// =============================================================================
// User Entity
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub identifier: UserIdentifier,
    pub profile: UserProfile,
    pub authentication: AuthenticationInfo,
    pub registered_at: DateTime<Utc>,
}

impl User {
    /// Build a user from a verified identity.
    pub fn from_identity(
        identity: &Identity,
        registered_at: DateTime<Utc>,
    ) -> Result<Self, UserDomainError> {
        Ok(Self {
            identifier: UserIdentifier::new(identity.external_id())?,
            profile: UserProfile::new(
                identity.name().map(str::to_string),
                identity.email().map(str::to_string),
            )?,
            authentication: AuthenticationInfo {
                external_id: identity.external_id().to_string(),
                is_verified: identity.email_verified(),
                expires_at: identity.expires_at(),
            },
            registered_at,
        })
    }

    /// Build a user and apply the access rules as of `now`.
    ///
    /// Fails with [`UserDomainError::SessionExpired`] once the token has
    /// lapsed and [`UserDomainError::UserNotVerified`] when the provider has
    /// not verified the user's email.
    pub fn authorize(identity: &Identity, now: DateTime<Utc>) -> Result<Self, UserDomainError> {
        let user = Self::from_identity(identity, now)?;

        if user.authentication.expires_at < now {
            return Err(UserDomainError::SessionExpired);
        }
        if !user.authentication.is_verified {
            return Err(UserDomainError::UserNotVerified);
        }

        Ok(user)
    }

    pub fn is_profile_complete(&self) -> bool {
        self.profile.name.is_some() && self.profile.email.is_some()
    }

    pub fn can_access_inventory(&self) -> bool {
        self.authentication.is_verified && self.is_profile_complete()
    }

    /// Name, else email, else a placeholder.
    pub fn display_name(&self) -> &str {
        self.profile
            .name
            .as_deref()
            .or(self.profile.email.as_deref())
            .unwrap_or("Unknown User")
    }
}
