// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User endpoints.

use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::auth::{Auth, Identity, VerifiedUser};
use crate::models::User;

/// Response for GET /v1/users/me
#[derive(Debug, Serialize)]
pub struct UserMeResponse {
    /// Provider user ID (`sub`)
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub email_verified: bool,
    /// Token expiry
    pub expires_at: DateTime<Utc>,
}

impl From<Identity> for UserMeResponse {
    fn from(identity: Identity) -> Self {
        Self {
            user_id: identity.external_id().to_string(),
            name: identity.name().map(str::to_string),
            email: identity.email().map(str::to_string),
            email_verified: identity.email_verified(),
            expires_at: identity.expires_at(),
        }
    }
}

/// Response for GET /v1/users/me/profile
#[derive(Debug, Serialize)]
pub struct UserProfileResponse {
    pub user_id: String,
    pub display_name: String,
    pub profile_complete: bool,
    pub can_access_inventory: bool,
}

impl From<User> for UserProfileResponse {
    fn from(user: User) -> Self {
        Self {
            user_id: user.identifier.to_string(),
            display_name: user.display_name().to_string(),
            profile_complete: user.is_profile_complete(),
            can_access_inventory: user.can_access_inventory(),
        }
    }
}

/// Identity behind the caller's bearer token.
pub async fn get_current_user(Auth(identity): Auth) -> Json<UserMeResponse> {
    Json(identity.into())
}

/// Profile of the caller; requires a current session and a verified email.
pub async fn get_current_profile(VerifiedUser(user): VerifiedUser) -> Json<UserProfileResponse> {
    Json(user.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::test_support::identity;

    #[test]
    fn user_me_response_from_identity() {
        let response: UserMeResponse = identity("auth0|1", Some("a@b.com"), true, None, 2_000).into();
        assert_eq!(response.user_id, "auth0|1");
        assert_eq!(response.email.as_deref(), Some("a@b.com"));
        assert!(response.email_verified);
        assert_eq!(response.expires_at.timestamp(), 2_000);
    }

    #[test]
    fn profile_response_from_user() {
        let id = identity("auth0|1", Some("a@b.com"), true, Some("Ada"), 2_000);
        let user = User::from_identity(&id, DateTime::from_timestamp(0, 0).unwrap()).unwrap();

        let response: UserProfileResponse = user.into();
        assert_eq!(response.display_name, "Ada");
        assert!(response.profile_complete);
        assert!(response.can_access_inventory);
    }
}
