// ============================
// crates/backend-lib/src/router.rs
// ============================
//! HTTP router.
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::handlers::auth as handlers;
use crate::storage::UserStore;
use crate::AppState;

/// Create the application router
pub fn create_router<S: UserStore + 'static>(state: Arc<AppState<S>>) -> Router {
    let auth = Router::new()
        .route("/login", post(handlers::login::<S>))
        .route("/logout", post(handlers::logout::<S>))
        .route("/me", get(handlers::me))
        .route("/register", post(handlers::register::<S>))
        .route("/roles", get(handlers::roles::<S>));

    let dashboard = Router::new().route("/session", get(handlers::dashboard_session));

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api/auth", auth)
        .nest("/api/dashboard", dashboard)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
#[path = "router_tests.rs"]
mod tests;
