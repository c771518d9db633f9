use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::storage::StorageService;

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// The `users` row. Carries the password digest and token version, so it is
/// never serialized; responses go through `UserResponse`.
#[derive(Debug, Clone, FromRow, Default)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    // Unique across all users.
    pub email: String,
    // Argon2id PHC string.
    pub password_hash: String,
    // Storage key of the profile image, resolved to a URL only in responses.
    pub profile_image: Option<String>,
    // Bumped on password reset; tokens carrying an older version are rejected.
    pub token_version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Article
///
/// A row from `articles`, joined with the owner's display name.
#[derive(Debug, Clone, FromRow, Default)]
pub struct Article {
    pub id: Uuid,
    // FK to users.id (owner). Never changes after creation.
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    // Storage key, not a URL.
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    // Loaded via a JOIN in the repository query.
    #[sqlx(default)]
    pub author_name: Option<String>,
}

/// Comment
///
/// A row from `comments`, augmented with the author's name (a join).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Comment {
    pub id: i64,
    pub article_id: Uuid,
    pub user_id: Uuid,
    pub body: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[sqlx(default)]
    pub author_name: Option<String>,
}

/// PasswordReset
///
/// One outstanding reset per email. Only the SHA-256 of the emailed token is kept.
#[derive(Debug, Clone, FromRow)]
pub struct PasswordReset {
    pub email: String,
    pub token_hash: String,
    pub created_at: DateTime<Utc>,
}

// --- Repository Inputs ---

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct NewArticle {
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    pub image: Option<String>,
}

/// ArticleChanges
///
/// Full replacement of the mutable article fields. `image: None` keeps the
/// current key.
#[derive(Debug, Clone)]
pub struct ArticleChanges {
    pub title: String,
    pub content: String,
    pub image: Option<String>,
}

// --- Request Payloads (Input Schemas) ---

/// RegisterRequest
///
/// Input payload for `POST /register`. Missing fields deserialize as empty
/// so that they surface as field-level validation errors.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(default)]
#[ts(export)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(default)]
#[ts(export)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(default)]
#[ts(export)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(default)]
#[ts(export)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub token: String,
    pub password: String,
    pub password_confirmation: Option<String>,
}

/// UpdateProfileRequest
///
/// Partial update payload for `PUT /me` and `PUT /update-profile`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateProfileRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// CommentRequest
///
/// Body of a new or edited comment.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(default)]
#[ts(export)]
pub struct CommentRequest {
    pub body: String,
}

/// ArticleUploadForm
///
/// OpenAPI description of the multipart body accepted by article create/update.
#[derive(ToSchema)]
pub struct ArticleUploadForm {
    pub title: String,
    pub content: String,
    /// jpeg/png/jpg/gif, at most 2048 KiB.
    #[schema(value_type = Option<String>, format = Binary)]
    pub image: Option<Vec<u8>>,
}

/// ProfileImageUploadForm
///
/// OpenAPI description of the multipart body accepted by `POST /update-profile-img`.
#[derive(ToSchema)]
pub struct ProfileImageUploadForm {
    pub name: Option<String>,
    pub email: Option<String>,
    #[schema(value_type = Option<String>, format = Binary)]
    pub profile_image: Option<Vec<u8>>,
}

// --- Response Schemas (Output) ---

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub profile_image_url: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

impl UserResponse {
    pub fn from_user(user: User, storage: &dyn StorageService) -> Self {
        Self {
            profile_image_url: user.profile_image.as_deref().map(|key| storage.url_for(key)),
            id: user.id,
            name: user.name,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ArticleResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub author_name: Option<String>,
    pub title: String,
    pub content: String,
    pub image_url: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

impl ArticleResponse {
    pub fn from_article(article: Article, storage: &dyn StorageService) -> Self {
        Self {
            image_url: article.image.as_deref().map(|key| storage.url_for(key)),
            id: article.id,
            user_id: article.user_id,
            author_name: article.author_name,
            title: article.title,
            content: article.content,
            created_at: article.created_at,
            updated_at: article.updated_at,
        }
    }
}

/// ArticlePage
///
/// One page of an article listing, newest first.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ArticlePage {
    pub data: Vec<ArticleResponse>,
    pub current_page: i64,
    pub per_page: i64,
    pub total: i64,
    pub last_page: i64,
}

/// AuthResponse
///
/// Returned by `POST /register` only; login answers with `TokenResponse`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ProfileImageResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub profile_image: Option<String>,
}
