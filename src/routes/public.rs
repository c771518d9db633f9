use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints reachable without a token: sign-up, sign-in, the password reset
/// flow and read-only article access.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers.
        .route("/health", get(|| async { "ok" }))
        // POST /register
        // Creates an account and answers with `{ user, token }`.
        .route("/register", post(handlers::register))
        // POST /login
        // Answers with `{ token }` only.
        .route("/login", post(handlers::login))
        // POST /forgot-password
        // Same answer whether or not the email is registered.
        .route("/forgot-password", post(handlers::forgot_password))
        // POST /reset-password
        .route("/reset-password", post(handlers::reset_password))
        // GET /articles?page=N
        // Newest first, ten per page.
        .route("/articles", get(handlers::get_articles))
        // GET /articles/{id}
        .route("/articles/{id}", get(handlers::get_article))
}
