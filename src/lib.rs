use axum::{
    Router,
    extract::{DefaultBodyLimit, FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod access;
pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod mailer;
pub mod models;
pub mod repository;
pub mod storage;
pub mod uploads;
pub mod validation;

// Public and guarded route tables.
pub mod routes;
use auth::AuthUser;
use routes::{authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use mailer::{LogMailer, MailerState, MockMailer, WebhookMailer};
pub use repository::{InMemoryRepository, PostgresRepository, RepositoryState};
pub use storage::{MockStorageService, S3StorageClient, StorageState};

/// Largest request body accepted. Kept above the image cap so an oversize
/// image reaches validation and gets a field error instead of a bare 413.
pub const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

/// ApiDoc
///
/// OpenAPI document for every handler, served at `/api-docs/openapi.json`
/// and browsable through Swagger UI at `/swagger-ui`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::register, handlers::login, handlers::forgot_password,
        handlers::reset_password, handlers::logout, handlers::verify_token,
        handlers::get_me, handlers::update_profile, handlers::delete_account,
        handlers::update_profile_img, handlers::get_profile_image,
        handlers::delete_profile_image, handlers::get_articles,
        handlers::get_user_articles, handlers::get_article, handlers::create_article,
        handlers::update_article, handlers::delete_article, handlers::add_comment,
        handlers::get_comments, handlers::update_comment, handlers::delete_comment
    ),
    components(
        schemas(
            models::RegisterRequest, models::LoginRequest, models::ForgotPasswordRequest,
            models::ResetPasswordRequest, models::UpdateProfileRequest, models::CommentRequest,
            models::ArticleUploadForm, models::ProfileImageUploadForm, models::UserResponse,
            models::ArticleResponse, models::ArticlePage, models::AuthResponse,
            models::TokenResponse, models::MessageResponse, models::ProfileImageResponse,
            models::Comment,
        )
    ),
    tags(
        (name = "blog-api", description = "Blog platform REST API")
    )
)]
pub struct ApiDoc;

/// AppState
///
/// Shared, cheaply clonable handle to every collaborator a handler may need.
/// Swapping an implementation (Postgres for in-memory, S3 for the mock) is a
/// matter of building a different `AppState`.
#[derive(Clone)]
pub struct AppState {
    pub repo: RepositoryState,
    pub storage: StorageState,
    /// Delivery of password-reset links.
    pub mailer: MailerState,
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for StorageState {
    fn from_ref(app_state: &AppState) -> StorageState {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for MailerState {
    fn from_ref(app_state: &AppState) -> MailerState {
        app_state.mailer.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Guard for the authenticated routes. Extracting `AuthUser` runs the full
/// token check; a failure rejects with 401 before any handler runs. On success
/// the identity is stored in the request extensions, where the handler's own
/// `AuthUser` argument picks it up without a second lookup.
async fn auth_middleware(auth_user: AuthUser, mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(auth_user);
    next.run(request).await
}

/// create_router
///
/// Assembles routes, the guard, and the observability layers around the given state.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        // Guarded routes. `route_layer` only wraps matched routes, so unknown
        // paths still answer 404 rather than 401.
        .merge(
            authenticated::authenticated_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// Span per request, tagged with the `x-request-id` set by `SetRequestIdLayer`.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
