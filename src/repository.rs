use crate::{
    error::{AppError, AppResult},
    models::{Article, ArticleChanges, Comment, NewArticle, NewUser, PasswordReset, User},
    validation::FieldErrors,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// Repository Trait
///
/// Defines the abstract contract for all persistence operations. Handlers talk to
/// `Arc<dyn Repository>` and never see SQL. Methods here are plain CRUD: ownership
/// is decided by the caller (see `access::authorize_owner`), not by the query.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn create_user(&self, user: NewUser) -> AppResult<User>;
    async fn get_user(&self, id: Uuid) -> AppResult<Option<User>>;
    // Case-insensitive lookup.
    async fn get_user_by_email(&self, email: &str) -> AppResult<Option<User>>;
    // Partial update; `None` keeps the column.
    async fn update_user_profile(
        &self,
        id: Uuid,
        name: Option<String>,
        email: Option<String>,
    ) -> AppResult<Option<User>>;
    async fn set_profile_image(&self, id: Uuid, key: Option<String>) -> AppResult<Option<User>>;
    /// Replaces the digest and bumps `token_version`, invalidating every token
    /// issued before the call.
    async fn update_password(&self, id: Uuid, password_hash: String) -> AppResult<bool>;
    /// Deletes the user together with their articles and comments.
    async fn delete_user(&self, id: Uuid) -> AppResult<bool>;

    // --- Token revocation ---
    async fn revoke_token(&self, jti: Uuid, expires_at: DateTime<Utc>) -> AppResult<()>;
    async fn is_token_revoked(&self, jti: Uuid) -> AppResult<bool>;

    // --- Password resets (one per email) ---
    async fn put_password_reset(&self, email: &str, token_hash: &str) -> AppResult<()>;
    async fn get_password_reset(&self, email: &str) -> AppResult<Option<PasswordReset>>;
    async fn delete_password_reset(&self, email: &str) -> AppResult<()>;

    // --- Articles ---
    // Newest first; returns the page and the total row count.
    async fn list_articles(&self, limit: i64, offset: i64) -> AppResult<(Vec<Article>, i64)>;
    async fn list_user_articles(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> AppResult<(Vec<Article>, i64)>;
    async fn get_article(&self, id: Uuid) -> AppResult<Option<Article>>;
    async fn create_article(&self, article: NewArticle) -> AppResult<Article>;
    async fn update_article(&self, id: Uuid, changes: ArticleChanges)
    -> AppResult<Option<Article>>;
    async fn delete_article(&self, id: Uuid) -> AppResult<bool>;
    // Image keys of every article the user owns, for cleanup on account deletion.
    async fn get_article_image_keys(&self, user_id: Uuid) -> AppResult<Vec<String>>;

    // --- Comments ---
    async fn add_comment(&self, article_id: Uuid, user_id: Uuid, body: String)
    -> AppResult<Comment>;
    // Oldest first.
    async fn get_comments(&self, article_id: Uuid) -> AppResult<Vec<Comment>>;
    async fn get_comment(&self, id: i64) -> AppResult<Option<Comment>>;
    async fn update_comment(&self, id: i64, body: String) -> AppResult<Option<Comment>>;
    async fn delete_comment(&self, id: i64) -> AppResult<bool>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer access across the application state.
pub type RepositoryState = Arc<dyn Repository>;

fn email_taken() -> AppError {
    let mut errors = FieldErrors::new();
    errors.add("email", "The email has already been taken.");
    AppError::Validation(errors)
}

/// Turns a unique-constraint hit on `users.email` into the same validation error
/// the handlers produce, so a registration race still answers 400.
fn map_unique_email(e: sqlx::Error) -> AppError {
    match e.as_database_error() {
        Some(db) if db.is_unique_violation() => email_taken(),
        _ => AppError::Database(e),
    }
}

const USER_COLUMNS: &str =
    "id, name, email, password_hash, profile_image, token_version, created_at, updated_at";

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by PostgreSQL.
/// Schema lives in `migrations/`.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn page(
        &self,
        user_id: Option<Uuid>,
        limit: i64,
        offset: i64,
    ) -> AppResult<(Vec<Article>, i64)> {
        let articles = sqlx::query_as::<_, Article>(
            r#"
            SELECT a.id, a.user_id, a.title, a.content, a.image, a.created_at, a.updated_at,
                   u.name AS author_name
            FROM articles a
            JOIN users u ON u.id = a.user_id
            WHERE ($1::uuid IS NULL OR a.user_id = $1)
            ORDER BY a.created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM articles WHERE ($1::uuid IS NULL OR user_id = $1)",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok((articles, total))
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn create_user(&self, user: NewUser) -> AppResult<User> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (id, name, email, password_hash) VALUES ($1, $2, $3, $4) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(user.name)
        .bind(user.email)
        .bind(user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(map_unique_email)
    }

    async fn get_user(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(
            sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn get_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE lower(email) = lower($1)"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?)
    }

    /// Uses COALESCE so that only the provided fields change.
    async fn update_user_profile(
        &self,
        id: Uuid,
        name: Option<String>,
        email: Option<String>,
    ) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET name = COALESCE($2, name), email = COALESCE($3, email), \
             updated_at = NOW() WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(name)
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_unique_email)
    }

    async fn set_profile_image(&self, id: Uuid, key: Option<String>) -> AppResult<Option<User>> {
        Ok(sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET profile_image = $2, updated_at = NOW() WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(key)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn update_password(&self, id: Uuid, password_hash: String) -> AppResult<bool> {
        let res = sqlx::query(
            "UPDATE users SET password_hash = $2, token_version = token_version + 1, \
             updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected() > 0)
    }

    /// Articles and comments go with the user through `ON DELETE CASCADE`.
    /// Articles and comments go through the FK cascade; the reset row is keyed
    /// by email, so it is removed in the same transaction.
    async fn delete_user(&self, id: Uuid) -> AppResult<bool> {
        let mut tx = self.pool.begin().await?;

        let email: Option<String> =
            sqlx::query_scalar("DELETE FROM users WHERE id = $1 RETURNING email")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        if let Some(email) = &email {
            sqlx::query("DELETE FROM password_resets WHERE email = lower($1)")
                .bind(email)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(email.is_some())
    }

    /// Records the token id and prunes entries whose tokens have expired anyway.
    async fn revoke_token(&self, jti: Uuid, expires_at: DateTime<Utc>) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO revoked_tokens (jti, expires_at) VALUES ($1, $2) \
             ON CONFLICT (jti) DO NOTHING",
        )
        .bind(jti)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        sqlx::query("DELETE FROM revoked_tokens WHERE expires_at < NOW()")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn is_token_revoked(&self, jti: Uuid) -> AppResult<bool> {
        let found: Option<Uuid> =
            sqlx::query_scalar("SELECT jti FROM revoked_tokens WHERE jti = $1")
                .bind(jti)
                .fetch_optional(&self.pool)
                .await?;
        Ok(found.is_some())
    }

    async fn put_password_reset(&self, email: &str, token_hash: &str) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO password_resets (email, token_hash, created_at) VALUES (lower($1), $2, NOW()) \
             ON CONFLICT (email) DO UPDATE SET token_hash = EXCLUDED.token_hash, created_at = NOW()",
        )
        .bind(email)
        .bind(token_hash)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_password_reset(&self, email: &str) -> AppResult<Option<PasswordReset>> {
        Ok(sqlx::query_as::<_, PasswordReset>(
            "SELECT email, token_hash, created_at FROM password_resets WHERE email = lower($1)",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete_password_reset(&self, email: &str) -> AppResult<()> {
        sqlx::query("DELETE FROM password_resets WHERE email = lower($1)")
            .bind(email)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_articles(&self, limit: i64, offset: i64) -> AppResult<(Vec<Article>, i64)> {
        self.page(None, limit, offset).await
    }

    async fn list_user_articles(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> AppResult<(Vec<Article>, i64)> {
        self.page(Some(user_id), limit, offset).await
    }

    async fn get_article(&self, id: Uuid) -> AppResult<Option<Article>> {
        Ok(sqlx::query_as::<_, Article>(
            r#"
            SELECT a.id, a.user_id, a.title, a.content, a.image, a.created_at, a.updated_at,
                   u.name AS author_name
            FROM articles a
            JOIN users u ON u.id = a.user_id
            WHERE a.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    /// Inserts and joins the author's name in one round trip (CTE).
    async fn create_article(&self, article: NewArticle) -> AppResult<Article> {
        Ok(sqlx::query_as::<_, Article>(
            r#"
            WITH inserted AS (
                INSERT INTO articles (id, user_id, title, content, image, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, NOW(), NOW())
                RETURNING id, user_id, title, content, image, created_at, updated_at
            )
            SELECT i.id, i.user_id, i.title, i.content, i.image, i.created_at, i.updated_at,
                   u.name AS author_name
            FROM inserted i JOIN users u ON u.id = i.user_id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(article.user_id)
        .bind(article.title)
        .bind(article.content)
        .bind(article.image)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn update_article(
        &self,
        id: Uuid,
        changes: ArticleChanges,
    ) -> AppResult<Option<Article>> {
        Ok(sqlx::query_as::<_, Article>(
            r#"
            WITH updated AS (
                UPDATE articles
                SET title = $2, content = $3, image = COALESCE($4, image), updated_at = NOW()
                WHERE id = $1
                RETURNING id, user_id, title, content, image, created_at, updated_at
            )
            SELECT d.id, d.user_id, d.title, d.content, d.image, d.created_at, d.updated_at,
                   u.name AS author_name
            FROM updated d JOIN users u ON u.id = d.user_id
            "#,
        )
        .bind(id)
        .bind(changes.title)
        .bind(changes.content)
        .bind(changes.image)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete_article(&self, id: Uuid) -> AppResult<bool> {
        let res = sqlx::query("DELETE FROM articles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn get_article_image_keys(&self, user_id: Uuid) -> AppResult<Vec<String>> {
        Ok(sqlx::query_scalar(
            "SELECT image FROM articles WHERE user_id = $1 AND image IS NOT NULL",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn add_comment(
        &self,
        article_id: Uuid,
        user_id: Uuid,
        body: String,
    ) -> AppResult<Comment> {
        Ok(sqlx::query_as::<_, Comment>(
            r#"
            WITH inserted AS (
                INSERT INTO comments (article_id, user_id, body) VALUES ($1, $2, $3)
                RETURNING id, article_id, user_id, body, created_at
            )
            SELECT i.id, i.article_id, i.user_id, i.body, i.created_at, u.name AS author_name
            FROM inserted i JOIN users u ON u.id = i.user_id
            "#,
        )
        .bind(article_id)
        .bind(user_id)
        .bind(body)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn get_comments(&self, article_id: Uuid) -> AppResult<Vec<Comment>> {
        Ok(sqlx::query_as::<_, Comment>(
            r#"
            SELECT c.id, c.article_id, c.user_id, c.body, c.created_at, u.name AS author_name
            FROM comments c
            JOIN users u ON u.id = c.user_id
            WHERE c.article_id = $1
            ORDER BY c.created_at ASC, c.id ASC
            "#,
        )
        .bind(article_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn get_comment(&self, id: i64) -> AppResult<Option<Comment>> {
        Ok(sqlx::query_as::<_, Comment>(
            r#"
            SELECT c.id, c.article_id, c.user_id, c.body, c.created_at, u.name AS author_name
            FROM comments c
            JOIN users u ON u.id = c.user_id
            WHERE c.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn update_comment(&self, id: i64, body: String) -> AppResult<Option<Comment>> {
        Ok(sqlx::query_as::<_, Comment>(
            r#"
            WITH updated AS (
                UPDATE comments SET body = $2 WHERE id = $1
                RETURNING id, article_id, user_id, body, created_at
            )
            SELECT d.id, d.article_id, d.user_id, d.body, d.created_at, u.name AS author_name
            FROM updated d JOIN users u ON u.id = d.user_id
            "#,
        )
        .bind(id)
        .bind(body)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete_comment(&self, id: i64) -> AppResult<bool> {
        let res = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}

/// InMemoryRepository
///
/// A process-local `Repository` with the same observable behavior as
/// `PostgresRepository`, including the cascade on user deletion. Backs the
/// integration tests and database-less local runs.
#[derive(Default)]
pub struct InMemoryRepository {
    state: Mutex<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    users: HashMap<Uuid, User>,
    // Insertion order doubles as a tie-breaker for equal timestamps.
    articles: Vec<Article>,
    comments: Vec<Comment>,
    next_comment_id: i64,
    resets: HashMap<String, PasswordReset>,
    revoked: HashMap<Uuid, DateTime<Utc>>,
}

impl MemoryState {
    fn email_in_use(&self, email: &str, except: Option<Uuid>) -> bool {
        self.users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(email) && Some(u.id) != except)
    }

    fn author_name(&self, user_id: Uuid) -> Option<String> {
        self.users.get(&user_id).map(|u| u.name.clone())
    }

    fn with_author(&self, mut article: Article) -> Article {
        article.author_name = self.author_name(article.user_id);
        article
    }

    fn comment_with_author(&self, mut comment: Comment) -> Comment {
        comment.author_name = self.author_name(comment.user_id);
        comment
    }

    fn page(&self, user_id: Option<Uuid>, limit: i64, offset: i64) -> (Vec<Article>, i64) {
        let mut matching: Vec<Article> = self
            .articles
            .iter()
            .rev()
            .filter(|a| user_id.is_none_or(|id| a.user_id == id))
            .cloned()
            .collect();
        // Stable sort over the reversed list keeps later inserts first on ties.
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .map(|a| self.with_author(a))
            .collect();
        (page, total)
    }
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn create_user(&self, user: NewUser) -> AppResult<User> {
        let mut state = self.lock();
        if state.email_in_use(&user.email, None) {
            return Err(email_taken());
        }
        let now = Utc::now();
        let created = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            profile_image: None,
            token_version: 0,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_user(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.lock().users.get(&id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self
            .lock()
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn update_user_profile(
        &self,
        id: Uuid,
        name: Option<String>,
        email: Option<String>,
    ) -> AppResult<Option<User>> {
        let mut state = self.lock();
        if let Some(email) = &email {
            if state.email_in_use(email, Some(id)) {
                return Err(email_taken());
            }
        }
        let Some(user) = state.users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = name {
            user.name = name;
        }
        if let Some(email) = email {
            user.email = email;
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn set_profile_image(&self, id: Uuid, key: Option<String>) -> AppResult<Option<User>> {
        let mut state = self.lock();
        Ok(state.users.get_mut(&id).map(|user| {
            user.profile_image = key;
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn update_password(&self, id: Uuid, password_hash: String) -> AppResult<bool> {
        let mut state = self.lock();
        Ok(match state.users.get_mut(&id) {
            Some(user) => {
                user.password_hash = password_hash;
                user.token_version += 1;
                user.updated_at = Utc::now();
                true
            }
            None => false,
        })
    }

    async fn delete_user(&self, id: Uuid) -> AppResult<bool> {
        let mut state = self.lock();
        let Some(user) = state.users.remove(&id) else {
            return Ok(false);
        };
        let removed_articles: Vec<Uuid> = state
            .articles
            .iter()
            .filter(|a| a.user_id == id)
            .map(|a| a.id)
            .collect();
        state.articles.retain(|a| a.user_id != id);
        state
            .comments
            .retain(|c| c.user_id != id && !removed_articles.contains(&c.article_id));
        state.resets.remove(&user.email.to_ascii_lowercase());
        Ok(true)
    }

    async fn revoke_token(&self, jti: Uuid, expires_at: DateTime<Utc>) -> AppResult<()> {
        let mut state = self.lock();
        let now = Utc::now();
        state.revoked.retain(|_, exp| *exp >= now);
        state.revoked.insert(jti, expires_at);
        Ok(())
    }

    async fn is_token_revoked(&self, jti: Uuid) -> AppResult<bool> {
        Ok(self.lock().revoked.contains_key(&jti))
    }

    async fn put_password_reset(&self, email: &str, token_hash: &str) -> AppResult<()> {
        let email = email.to_ascii_lowercase();
        self.lock().resets.insert(
            email.clone(),
            PasswordReset {
                email,
                token_hash: token_hash.to_string(),
                created_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn get_password_reset(&self, email: &str) -> AppResult<Option<PasswordReset>> {
        Ok(self
            .lock()
            .resets
            .get(&email.to_ascii_lowercase())
            .cloned())
    }

    async fn delete_password_reset(&self, email: &str) -> AppResult<()> {
        self.lock().resets.remove(&email.to_ascii_lowercase());
        Ok(())
    }

    async fn list_articles(&self, limit: i64, offset: i64) -> AppResult<(Vec<Article>, i64)> {
        Ok(self.lock().page(None, limit, offset))
    }

    async fn list_user_articles(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> AppResult<(Vec<Article>, i64)> {
        Ok(self.lock().page(Some(user_id), limit, offset))
    }

    async fn get_article(&self, id: Uuid) -> AppResult<Option<Article>> {
        let state = self.lock();
        Ok(state
            .articles
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .map(|a| state.with_author(a)))
    }

    async fn create_article(&self, article: NewArticle) -> AppResult<Article> {
        let mut state = self.lock();
        if !state.users.contains_key(&article.user_id) {
            return Err(AppError::Internal(format!(
                "article owner {} does not exist",
                article.user_id
            )));
        }
        let now = Utc::now();
        let created = Article {
            id: Uuid::new_v4(),
            user_id: article.user_id,
            title: article.title,
            content: article.content,
            image: article.image,
            created_at: now,
            updated_at: now,
            author_name: None,
        };
        state.articles.push(created.clone());
        Ok(state.with_author(created))
    }

    async fn update_article(
        &self,
        id: Uuid,
        changes: ArticleChanges,
    ) -> AppResult<Option<Article>> {
        let mut state = self.lock();
        let Some(article) = state.articles.iter_mut().find(|a| a.id == id) else {
            return Ok(None);
        };
        article.title = changes.title;
        article.content = changes.content;
        if changes.image.is_some() {
            article.image = changes.image;
        }
        article.updated_at = Utc::now();
        let updated = article.clone();
        Ok(Some(state.with_author(updated)))
    }

    async fn delete_article(&self, id: Uuid) -> AppResult<bool> {
        let mut state = self.lock();
        let before = state.articles.len();
        state.articles.retain(|a| a.id != id);
        let removed = state.articles.len() != before;
        if removed {
            state.comments.retain(|c| c.article_id != id);
        }
        Ok(removed)
    }

    async fn get_article_image_keys(&self, user_id: Uuid) -> AppResult<Vec<String>> {
        Ok(self
            .lock()
            .articles
            .iter()
            .filter(|a| a.user_id == user_id)
            .filter_map(|a| a.image.clone())
            .collect())
    }

    async fn add_comment(
        &self,
        article_id: Uuid,
        user_id: Uuid,
        body: String,
    ) -> AppResult<Comment> {
        let mut state = self.lock();
        state.next_comment_id += 1;
        let created = Comment {
            id: state.next_comment_id,
            article_id,
            user_id,
            body,
            created_at: Utc::now(),
            author_name: None,
        };
        state.comments.push(created.clone());
        Ok(state.comment_with_author(created))
    }

    async fn get_comments(&self, article_id: Uuid) -> AppResult<Vec<Comment>> {
        let state = self.lock();
        Ok(state
            .comments
            .iter()
            .filter(|c| c.article_id == article_id)
            .cloned()
            .map(|c| state.comment_with_author(c))
            .collect())
    }

    async fn get_comment(&self, id: i64) -> AppResult<Option<Comment>> {
        let state = self.lock();
        Ok(state
            .comments
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .map(|c| state.comment_with_author(c)))
    }

    async fn update_comment(&self, id: i64, body: String) -> AppResult<Option<Comment>> {
        let mut state = self.lock();
        let Some(comment) = state.comments.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };
        comment.body = body;
        let updated = comment.clone();
        Ok(Some(state.comment_with_author(updated)))
    }

    async fn delete_comment(&self, id: i64) -> AppResult<bool> {
        let mut state = self.lock();
        let before = state.comments.len();
        state.comments.retain(|c| c.id != id);
        Ok(state.comments.len() != before)
    }
}
