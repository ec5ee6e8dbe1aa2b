// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub mod users;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/users/me", get(users::get_current_user))
        .route("/users/me/profile", get(users::get_current_profile))
        .with_state(state);

    Router::new()
        .nest("/v1", v1_routes)
        .layer(TraceLayer::new_for_http())
}
