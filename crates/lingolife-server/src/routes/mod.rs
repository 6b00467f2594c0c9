//! HTTP routes.

pub mod auth;
pub mod dictionary;
pub mod words;

use axum::routing::{get, post, put};
use axum::Router;

use crate::state::AppState;

/// Liveness banner.
pub const BANNER: &str = "LingoLife Backend API is running!";

async fn root() -> &'static str {
    BANNER
}

/// All API routes, without middleware.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/api/words", get(words::list_words).post(words::create_word))
        .route("/api/words/review", get(words::review_candidates))
        .route("/api/words/{id}", put(words::record_outcome))
        .route("/api/dictionary/{provider}", get(dictionary::lookup))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/me", get(auth::me))
}
