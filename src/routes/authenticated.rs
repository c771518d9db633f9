use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, get, post, put},
};

/// Authenticated Router Module
///
/// Every route here sits behind `auth_middleware`. Handlers receive the
/// resolved `AuthUser` and run owner checks themselves through
/// `access::authorize_owner`.
///
/// Method routers for paths that are also public (`/articles`, `/articles/{id}`)
/// are merged with the public ones by `create_router`; only the methods listed
/// here are guarded.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // --- Session ---
        .route("/logout", post(handlers::logout))
        .route("/verify-token", post(handlers::verify_token))
        // --- Profile ---
        // GET/PUT /me
        .route("/me", get(handlers::get_me).put(handlers::update_profile))
        .route("/update-profile", put(handlers::update_profile))
        // DELETE /delete-account
        // Removes the user with their articles, comments and stored images.
        .route("/delete-account", delete(handlers::delete_account))
        // POST /update-profile-img (multipart: name, email, profile_image)
        .route("/update-profile-img", post(handlers::update_profile_img))
        .route("/profile-image", get(handlers::get_profile_image))
        .route("/delete-profile-image", delete(handlers::delete_profile_image))
        // --- Articles ---
        // POST /articles (multipart: title, content, image)
        .route("/articles", post(handlers::create_article))
        // PUT/DELETE /articles/{id}
        // Owner only.
        .route(
            "/articles/{id}",
            put(handlers::update_article).delete(handlers::delete_article),
        )
        .route("/user-articles", get(handlers::get_user_articles))
        // --- Comments ---
        // {id} is the article id.
        .route("/comment/{id}", post(handlers::add_comment))
        .route("/comments/{id}", get(handlers::get_comments))
        .route(
            "/articles/{id}/comments/{comment_id}",
            put(handlers::update_comment).delete(handlers::delete_comment),
        )
}
