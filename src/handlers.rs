use crate::{
    AppState,
    access::authorize_owner,
    auth::{self, AuthUser},
    error::{AppError, AppResult},
    extract::{AppJson, AppMultipart, AppPath, AppQuery},
    models::{
        Article, ArticleChanges, ArticlePage, ArticleResponse, ArticleUploadForm, AuthResponse,
        Comment, CommentRequest, ForgotPasswordRequest, LoginRequest, MessageResponse, NewArticle,
        NewUser, ProfileImageResponse, ProfileImageUploadForm, RegisterRequest,
        ResetPasswordRequest, TokenResponse, UpdateProfileRequest, UserResponse,
    },
    storage::{Blob, StorageService},
    uploads::{ArticleForm, ImageUpload, ProfileForm},
    validation,
};
use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use chrono::{Duration, Utc};
use serde::Deserialize;
use uuid::Uuid;

/// Articles per listing page.
pub const PER_PAGE: i64 = 10;

const ARTICLE_FOLDER: &str = "articles";
const PROFILE_IMAGE_FOLDER: &str = "profile_images";
const INVALID_RESET_TOKEN: &str = "This password reset token is invalid.";
const RESET_LINK_SENT: &str = "Password reset link sent!";

// --- Query Structs ---

/// PageQuery
///
/// `?page=N`, 1-based. Missing or non-positive values mean the first page;
/// values whose offset would not fit an `i64` are pinned to the last
/// addressable page, which is simply empty.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    pub page: Option<i64>,
}

impl PageQuery {
    fn current(&self) -> i64 {
        self.page.unwrap_or(1).clamp(1, i64::MAX / PER_PAGE)
    }
}

fn article_page(
    articles: Vec<Article>,
    total: i64,
    current_page: i64,
    storage: &dyn StorageService,
) -> ArticlePage {
    let last_page = ((total + PER_PAGE - 1) / PER_PAGE).max(1);
    ArticlePage {
        data: articles
            .into_iter()
            .map(|a| ArticleResponse::from_article(a, storage))
            .collect(),
        current_page,
        per_page: PER_PAGE,
        total,
        last_page,
    }
}

// --- Blob helpers ---

async fn store_image(
    storage: &dyn StorageService,
    folder: &str,
    upload: ImageUpload,
) -> AppResult<String> {
    storage
        .store(folder, Blob::from(upload))
        .await
        .map_err(AppError::Storage)
}

/// Best-effort removal. A failure leaves an orphaned object behind, which is
/// logged but never fails the request.
async fn discard_blob(storage: &dyn StorageService, key: &str) {
    if let Err(e) = storage.delete(key).await {
        tracing::warn!(key = %key, "failed to delete stored object: {}", e);
    }
}

// --- Auth Handlers ---

/// register
///
/// [Public Route] Creates an account and signs the new user in.
/// Answers with both the user and a token; `login` answers with the token only.
#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registered", body = AuthResponse),
        (status = 400, description = "Validation failed")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    AppJson(mut payload): AppJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    payload.name = payload.name.trim().to_string();
    payload.email = payload.email.trim().to_string();

    let mut errors = validation::registration(&payload);
    if errors.get("email").is_none()
        && state.repo.get_user_by_email(&payload.email).await?.is_some()
    {
        errors.add("email", "The email has already been taken.");
    }
    errors.into_result()?;

    let user = state
        .repo
        .create_user(NewUser {
            name: payload.name,
            email: payload.email,
            password_hash: auth::hash_password(&payload.password)?,
        })
        .await?;
    let token = auth::issue_token(&state.config, &user)?;

    tracing::info!(user_id = %user.id, "registered new user");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: UserResponse::from_user(user, state.storage.as_ref()),
            token,
        }),
    ))
}

/// login
///
/// [Public Route] Exchanges credentials for a bearer token.
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    let invalid = || AppError::Unauthorized("Invalid credentials.".to_string());

    let user = state
        .repo
        .get_user_by_email(payload.email.trim())
        .await?
        .ok_or_else(invalid)?;

    if !auth::verify_password(&payload.password, &user.password_hash) {
        return Err(invalid());
    }

    Ok(Json(TokenResponse {
        token: auth::issue_token(&state.config, &user)?,
    }))
}

/// forgot_password
///
/// [Public Route] Starts a password reset. The answer is identical whether or
/// not the email belongs to an account.
#[utoipa::path(
    post,
    path = "/forgot-password",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Accepted", body = MessageResponse),
        (status = 400, description = "Malformed email")
    )
)]
pub async fn forgot_password(
    State(state): State<AppState>,
    AppJson(payload): AppJson<ForgotPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    let email = payload.email.trim();
    let mut errors = validation::FieldErrors::new();
    validation::email(&mut errors, "email", Some(email));
    errors.into_result()?;

    if let Some(user) = state.repo.get_user_by_email(email).await? {
        let token = auth::generate_reset_token();
        state
            .repo
            .put_password_reset(&user.email, &auth::hash_reset_token(&token))
            .await?;

        if let Err(e) = state.mailer.send_reset_link(&user.email, &token).await {
            tracing::warn!(user_id = %user.id, "reset link dispatch failed: {}", e);
        }
    }

    Ok(Json(MessageResponse::new(RESET_LINK_SENT)))
}

/// reset_password
///
/// [Public Route] Completes a reset with the emailed token. Success bumps the
/// user's token version, so every session opened before the reset ends.
#[utoipa::path(
    post,
    path = "/reset-password",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password reset", body = MessageResponse),
        (status = 400, description = "Validation failed or token invalid")
    )
)]
pub async fn reset_password(
    State(state): State<AppState>,
    AppJson(payload): AppJson<ResetPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    validation::reset_password(&payload)?;
    let email = payload.email.trim();
    let invalid = || AppError::BadRequest(INVALID_RESET_TOKEN.to_string());

    let reset = state
        .repo
        .get_password_reset(email)
        .await?
        .ok_or_else(invalid)?;

    let max_age = Duration::minutes(state.config.reset_token_ttl_minutes);
    if Utc::now() - reset.created_at > max_age {
        state.repo.delete_password_reset(email).await?;
        return Err(invalid());
    }
    if !auth::reset_token_matches(payload.token.trim(), &reset.token_hash) {
        return Err(invalid());
    }

    let user = state
        .repo
        .get_user_by_email(email)
        .await?
        .ok_or_else(invalid)?;

    state
        .repo
        .update_password(user.id, auth::hash_password(&payload.password)?)
        .await?;
    state.repo.delete_password_reset(email).await?;

    tracing::info!(user_id = %user.id, "password reset; earlier tokens invalidated");

    Ok(Json(MessageResponse::new(
        "Password has been reset successfully.",
    )))
}

/// logout
///
/// [Authenticated Route] Revokes the presented token until it would have expired.
#[utoipa::path(
    post,
    path = "/logout",
    responses((status = 200, description = "Logged out", body = MessageResponse))
)]
pub async fn logout(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<MessageResponse>> {
    state
        .repo
        .revoke_token(user.token_id, user.expires_at)
        .await?;
    Ok(Json(MessageResponse::new("Logged out successfully.")))
}

/// verify_token
///
/// [Authenticated Route] Reaching the handler means the guard accepted the token.
#[utoipa::path(
    post,
    path = "/verify-token",
    responses(
        (status = 200, description = "Token valid", body = MessageResponse),
        (status = 401, description = "Token invalid or expired")
    )
)]
pub async fn verify_token(_user: AuthUser) -> Json<MessageResponse> {
    Json(MessageResponse::new("Token is valid."))
}

// --- Profile Handlers ---

/// get_me
///
/// [Authenticated Route] The caller's own profile.
#[utoipa::path(
    get,
    path = "/me",
    responses((status = 200, description = "Profile", body = UserResponse))
)]
pub async fn get_me(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<UserResponse>> {
    let profile = authorize_owner(state.repo.get_user(user.id).await?, &user, "User")?;
    Ok(Json(UserResponse::from_user(profile, state.storage.as_ref())))
}

async fn ensure_email_free(
    state: &AppState,
    email: Option<&str>,
    user: &AuthUser,
) -> AppResult<()> {
    let Some(email) = email else {
        return Ok(());
    };
    match state.repo.get_user_by_email(email).await? {
        Some(other) if other.id != user.id => {
            let mut errors = validation::FieldErrors::new();
            errors.add("email", "The email has already been taken.");
            Err(AppError::Validation(errors))
        }
        _ => Ok(()),
    }
}

/// update_profile
///
/// [Authenticated Route] Partial update of name and/or email.
/// Served on both `PUT /me` and `PUT /update-profile`.
#[utoipa::path(
    put,
    path = "/update-profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated", body = UserResponse),
        (status = 400, description = "Validation failed")
    )
)]
pub async fn update_profile(
    user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<UpdateProfileRequest>,
) -> AppResult<Json<UserResponse>> {
    let name = payload.name.map(|n| n.trim().to_string());
    let email = payload.email.map(|e| e.trim().to_string());

    authorize_owner(state.repo.get_user(user.id).await?, &user, "User")?;
    validation::profile(name.as_deref(), email.as_deref()).into_result()?;
    ensure_email_free(&state, email.as_deref(), &user).await?;

    let updated = state
        .repo
        .update_user_profile(user.id, name, email)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found.".to_string()))?;

    Ok(Json(UserResponse::from_user(updated, state.storage.as_ref())))
}

/// delete_account
///
/// [Authenticated Route] Deletes the caller, their articles and comments, then
/// the stored images that belonged to them.
#[utoipa::path(
    delete,
    path = "/delete-account",
    responses((status = 200, description = "Deleted", body = MessageResponse))
)]
pub async fn delete_account(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<MessageResponse>> {
    let account = authorize_owner(state.repo.get_user(user.id).await?, &user, "User")?;
    let mut keys = state.repo.get_article_image_keys(account.id).await?;
    keys.extend(account.profile_image);

    if !state.repo.delete_user(account.id).await? {
        return Err(AppError::NotFound("User not found.".to_string()));
    }
    for key in &keys {
        discard_blob(state.storage.as_ref(), key).await;
    }

    tracing::info!(user_id = %account.id, images = keys.len(), "account deleted");
    Ok(Json(MessageResponse::new("Account deleted successfully.")))
}

/// update_profile_img
///
/// [Authenticated Route] Multipart profile update with an optional new image.
/// The new image is stored and recorded before the previous one is deleted.
#[utoipa::path(
    post,
    path = "/update-profile-img",
    request_body(content = ProfileImageUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Updated", body = ProfileImageResponse),
        (status = 400, description = "Validation failed")
    )
)]
pub async fn update_profile_img(
    user: AuthUser,
    State(state): State<AppState>,
    AppMultipart(multipart): AppMultipart,
) -> AppResult<Json<ProfileImageResponse>> {
    let form = ProfileForm::from_multipart(multipart).await?;
    let name = form.name.map(|n| n.trim().to_string());
    let email = form.email.map(|e| e.trim().to_string());

    let mut account = authorize_owner(state.repo.get_user(user.id).await?, &user, "User")?;

    let mut errors = validation::profile(name.as_deref(), email.as_deref());
    if let Some(upload) = &form.profile_image {
        validation::image(&mut errors, "profile_image", upload);
    }
    errors.into_result()?;
    ensure_email_free(&state, email.as_deref(), &user).await?;

    if name.is_some() || email.is_some() {
        account = state
            .repo
            .update_user_profile(user.id, name, email)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found.".to_string()))?;
    }

    if let Some(upload) = form.profile_image {
        let storage = state.storage.as_ref();
        let new_key = store_image(storage, PROFILE_IMAGE_FOLDER, upload).await?;

        let recorded = state
            .repo
            .set_profile_image(user.id, Some(new_key.clone()))
            .await;
        let updated = match recorded {
            Ok(Some(updated)) => updated,
            Ok(None) => {
                discard_blob(storage, &new_key).await;
                return Err(AppError::NotFound("User not found.".to_string()));
            }
            Err(e) => {
                discard_blob(storage, &new_key).await;
                return Err(e);
            }
        };

        if let Some(old_key) = account.profile_image.as_deref() {
            if storage.exists(old_key).await.unwrap_or(true) {
                discard_blob(storage, old_key).await;
            }
        }
        account = updated;
    }

    Ok(Json(ProfileImageResponse {
        message: Some("Profile updated successfully.".to_string()),
        profile_image: account
            .profile_image
            .as_deref()
            .map(|key| state.storage.url_for(key)),
    }))
}

/// get_profile_image
///
/// [Authenticated Route] URL of the caller's profile image, if one is stored.
#[utoipa::path(
    get,
    path = "/profile-image",
    responses(
        (status = 200, description = "Profile image", body = ProfileImageResponse),
        (status = 404, description = "No profile image")
    )
)]
pub async fn get_profile_image(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<ProfileImageResponse>> {
    let account = authorize_owner(state.repo.get_user(user.id).await?, &user, "User")?;
    let no_image = || AppError::NotFound("No profile image found.".to_string());

    let key = account.profile_image.ok_or_else(no_image)?;
    if !state.storage.exists(&key).await.map_err(AppError::Storage)? {
        return Err(no_image());
    }

    Ok(Json(ProfileImageResponse {
        message: None,
        profile_image: Some(state.storage.url_for(&key)),
    }))
}

/// delete_profile_image
///
/// [Authenticated Route] Removes the stored profile image and clears the key.
#[utoipa::path(
    delete,
    path = "/delete-profile-image",
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 404, description = "No profile image")
    )
)]
pub async fn delete_profile_image(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<MessageResponse>> {
    let account = authorize_owner(state.repo.get_user(user.id).await?, &user, "User")?;
    let no_image = || AppError::NotFound("No profile image found.".to_string());

    let key = account.profile_image.ok_or_else(no_image)?;
    if !state.storage.exists(&key).await.map_err(AppError::Storage)? {
        return Err(no_image());
    }

    state.storage.delete(&key).await.map_err(AppError::Storage)?;
    state.repo.set_profile_image(user.id, None).await?;

    Ok(Json(MessageResponse::new(
        "Profile image deleted successfully.",
    )))
}

// --- Article Handlers ---

/// get_articles
///
/// [Public Route] All articles, newest first, ten per page.
#[utoipa::path(
    get,
    path = "/articles",
    params(PageQuery),
    responses((status = 200, description = "One page of articles", body = ArticlePage))
)]
pub async fn get_articles(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<PageQuery>,
) -> AppResult<Json<ArticlePage>> {
    let current = query.current();
    let (articles, total) = state
        .repo
        .list_articles(PER_PAGE, (current - 1) * PER_PAGE)
        .await?;
    Ok(Json(article_page(
        articles,
        total,
        current,
        state.storage.as_ref(),
    )))
}

/// get_user_articles
///
/// [Authenticated Route] The caller's own articles, paginated like `/articles`.
#[utoipa::path(
    get,
    path = "/user-articles",
    params(PageQuery),
    responses((status = 200, description = "One page of the caller's articles", body = ArticlePage))
)]
pub async fn get_user_articles(
    user: AuthUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<PageQuery>,
) -> AppResult<Json<ArticlePage>> {
    let current = query.current();
    let (articles, total) = state
        .repo
        .list_user_articles(user.id, PER_PAGE, (current - 1) * PER_PAGE)
        .await?;
    Ok(Json(article_page(
        articles,
        total,
        current,
        state.storage.as_ref(),
    )))
}

/// get_article
///
/// [Public Route] A single article.
#[utoipa::path(
    get,
    path = "/articles/{id}",
    params(("id" = Uuid, Path, description = "Article ID")),
    responses(
        (status = 200, description = "Found", body = ArticleResponse),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_article(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<ArticleResponse>> {
    let article = state
        .repo
        .get_article(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Article not found.".to_string()))?;
    Ok(Json(ArticleResponse::from_article(
        article,
        state.storage.as_ref(),
    )))
}

/// create_article
///
/// [Authenticated Route] Multipart create. The owner is always the caller.
#[utoipa::path(
    post,
    path = "/articles",
    request_body(content = ArticleUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Created", body = ArticleResponse),
        (status = 400, description = "Validation failed")
    )
)]
pub async fn create_article(
    user: AuthUser,
    State(state): State<AppState>,
    AppMultipart(multipart): AppMultipart,
) -> AppResult<(StatusCode, Json<ArticleResponse>)> {
    let form = ArticleForm::from_multipart(multipart).await?;
    validation::article(&form)?;

    let storage = state.storage.as_ref();
    let image = match form.image {
        Some(upload) => Some(store_image(storage, ARTICLE_FOLDER, upload).await?),
        None => None,
    };

    let created = state
        .repo
        .create_article(NewArticle {
            user_id: user.id,
            title: form.title.unwrap_or_default().trim().to_string(),
            content: form.content.unwrap_or_default(),
            image: image.clone(),
        })
        .await;

    let article = match created {
        Ok(article) => article,
        Err(e) => {
            if let Some(key) = &image {
                discard_blob(storage, key).await;
            }
            return Err(e);
        }
    };

    tracing::info!(article_id = %article.id, user_id = %user.id, "article created");
    Ok((
        StatusCode::CREATED,
        Json(ArticleResponse::from_article(article, storage)),
    ))
}

/// update_article
///
/// [Authenticated Route] Owner-only multipart update.
///
/// Order of checks: existence (404), ownership (403), then payload validation (400).
/// A replacement image is stored and recorded first; the previous one is only
/// deleted once the row points at the new key.
#[utoipa::path(
    put,
    path = "/articles/{id}",
    params(("id" = Uuid, Path, description = "Article ID")),
    request_body(content = ArticleUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Updated", body = ArticleResponse),
        (status = 403, description = "Not Owner"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_article(
    user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    multipart: Result<AppMultipart, AppError>,
) -> AppResult<Json<ArticleResponse>> {
    let existing = authorize_owner(state.repo.get_article(id).await?, &user, "Article")?;
    // A malformed body only matters once the caller may edit the article.
    let AppMultipart(multipart) = multipart?;
    let form = ArticleForm::from_multipart(multipart).await?;
    validation::article(&form)?;

    let storage = state.storage.as_ref();
    let new_key = match form.image {
        Some(upload) => Some(store_image(storage, ARTICLE_FOLDER, upload).await?),
        None => None,
    };

    let changes = ArticleChanges {
        title: form.title.unwrap_or_default().trim().to_string(),
        content: form.content.unwrap_or_default(),
        image: new_key.clone(),
    };

    let updated = match state.repo.update_article(id, changes).await {
        Ok(Some(article)) => article,
        outcome => {
            if let Some(key) = &new_key {
                discard_blob(storage, key).await;
            }
            return Err(match outcome {
                Err(e) => e,
                _ => AppError::NotFound("Article not found.".to_string()),
            });
        }
    };

    if new_key.is_some() {
        if let Some(old_key) = existing.image.as_deref() {
            discard_blob(storage, old_key).await;
        }
    }

    Ok(Json(ArticleResponse::from_article(updated, storage)))
}

/// delete_article
///
/// [Authenticated Route] Owner-only delete; the article's image goes with it.
#[utoipa::path(
    delete,
    path = "/articles/{id}",
    params(("id" = Uuid, Path, description = "Article ID")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 403, description = "Not Owner"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_article(
    user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    let article = authorize_owner(state.repo.get_article(id).await?, &user, "Article")?;

    if !state.repo.delete_article(article.id).await? {
        return Err(AppError::NotFound("Article not found.".to_string()));
    }
    if let Some(key) = article.image.as_deref() {
        discard_blob(state.storage.as_ref(), key).await;
    }

    Ok(Json(MessageResponse::new("Article deleted successfully.")))
}

// --- Comment Handlers ---

async fn require_article(state: &AppState, id: Uuid) -> AppResult<Article> {
    state
        .repo
        .get_article(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Article not found.".to_string()))
}

/// Looks the comment up and treats one filed under another article as missing.
async fn find_comment(
    state: &AppState,
    article_id: Uuid,
    comment_id: i64,
) -> AppResult<Option<Comment>> {
    Ok(state
        .repo
        .get_comment(comment_id)
        .await?
        .filter(|c| c.article_id == article_id))
}

/// add_comment
///
/// [Authenticated Route] Posts a comment on an article.
#[utoipa::path(
    post,
    path = "/comment/{id}",
    params(("id" = Uuid, Path, description = "Article ID")),
    request_body = CommentRequest,
    responses(
        (status = 201, description = "Comment Added", body = Comment),
        (status = 404, description = "Article Not Found")
    )
)]
pub async fn add_comment(
    user: AuthUser,
    State(state): State<AppState>,
    AppPath(article_id): AppPath<Uuid>,
    AppJson(payload): AppJson<CommentRequest>,
) -> AppResult<(StatusCode, Json<Comment>)> {
    require_article(&state, article_id).await?;
    validation::comment(&payload.body)?;

    let comment = state
        .repo
        .add_comment(article_id, user.id, payload.body.trim().to_string())
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// get_comments
///
/// [Authenticated Route] Comments of an article, oldest first.
#[utoipa::path(
    get,
    path = "/comments/{id}",
    params(("id" = Uuid, Path, description = "Article ID")),
    responses(
        (status = 200, description = "Comments", body = [Comment]),
        (status = 404, description = "Article Not Found")
    )
)]
pub async fn get_comments(
    State(state): State<AppState>,
    AppPath(article_id): AppPath<Uuid>,
) -> AppResult<Json<Vec<Comment>>> {
    require_article(&state, article_id).await?;
    Ok(Json(state.repo.get_comments(article_id).await?))
}

/// update_comment
///
/// [Authenticated Route] Owner-only edit of a comment's body.
#[utoipa::path(
    put,
    path = "/articles/{id}/comments/{comment_id}",
    params(
        ("id" = Uuid, Path, description = "Article ID"),
        ("comment_id" = i64, Path, description = "Comment ID")
    ),
    request_body = CommentRequest,
    responses(
        (status = 200, description = "Updated", body = Comment),
        (status = 403, description = "Not Owner"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_comment(
    user: AuthUser,
    State(state): State<AppState>,
    AppPath((article_id, comment_id)): AppPath<(Uuid, i64)>,
    AppJson(payload): AppJson<CommentRequest>,
) -> AppResult<Json<Comment>> {
    let comment = authorize_owner(
        find_comment(&state, article_id, comment_id).await?,
        &user,
        "Comment",
    )?;
    validation::comment(&payload.body)?;

    let updated = state
        .repo
        .update_comment(comment.id, payload.body.trim().to_string())
        .await?
        .ok_or_else(|| AppError::NotFound("Comment not found.".to_string()))?;
    Ok(Json(updated))
}

/// delete_comment
///
/// [Authenticated Route] Owner-only comment removal.
#[utoipa::path(
    delete,
    path = "/articles/{id}/comments/{comment_id}",
    params(
        ("id" = Uuid, Path, description = "Article ID"),
        ("comment_id" = i64, Path, description = "Comment ID")
    ),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 403, description = "Not Owner"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_comment(
    user: AuthUser,
    State(state): State<AppState>,
    AppPath((article_id, comment_id)): AppPath<(Uuid, i64)>,
) -> AppResult<Json<MessageResponse>> {
    let comment = authorize_owner(
        find_comment(&state, article_id, comment_id).await?,
        &user,
        "Comment",
    )?;

    if !state.repo.delete_comment(comment.id).await? {
        return Err(AppError::NotFound("Comment not found.".to_string()));
    }
    Ok(Json(MessageResponse::new("Comment deleted successfully.")))
}
