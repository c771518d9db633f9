#![allow(dead_code)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use blog_api::{
    AppConfig, AppState, create_router,
    mailer::{MailerState, MockMailer},
    repository::{InMemoryRepository, RepositoryState},
    storage::{MockStorageService, StorageState},
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::util::ServiceExt;
use uuid::Uuid;

pub const PASSWORD: &str = "secret123";
const BOUNDARY: &str = "blog-api-test-boundary";

/// TestApp
///
/// The full router over in-memory collaborators. The handles kept here share
/// state with the ones inside the router, so tests can inspect side effects.
#[derive(Clone)]
pub struct TestApp {
    pub router: Router,
    pub repo: Arc<InMemoryRepository>,
    pub storage: MockStorageService,
    pub mailer: MockMailer,
    pub config: AppConfig,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    pub fn with_config(config: AppConfig) -> Self {
        Self::assemble(
            Arc::new(InMemoryRepository::new()),
            MockStorageService::new(),
            MockMailer::new(),
            config,
        )
    }

    /// Same data, but every further `store` fails.
    pub fn with_failing_storage(&self) -> Self {
        Self::assemble(
            self.repo.clone(),
            self.storage.failing_clone(),
            self.mailer.clone(),
            self.config.clone(),
        )
    }

    fn assemble(
        repo: Arc<InMemoryRepository>,
        storage: MockStorageService,
        mailer: MockMailer,
        config: AppConfig,
    ) -> Self {
        let router = create_router(AppState {
            repo: repo.clone() as RepositoryState,
            storage: Arc::new(storage.clone()) as StorageState,
            mailer: Arc::new(mailer.clone()) as MailerState,
            config: config.clone(),
        });
        Self {
            router,
            repo,
            storage,
            mailer,
            config,
        }
    }

    pub async fn call(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.call(request(Method::GET, uri, token).body(Body::empty()).unwrap())
            .await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.call(request(Method::DELETE, uri, token).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post_empty(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.call(request(Method::POST, uri, token).body(Body::empty()).unwrap())
            .await
    }

    pub async fn json(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Value,
    ) -> (StatusCode, Value) {
        self.call(
            request(method, uri, token)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn multipart(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        form: Form,
    ) -> (StatusCode, Value) {
        self.call(
            request(method, uri, token)
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .body(Body::from(form.finish()))
                .unwrap(),
        )
        .await
    }

    /// Registers a user and returns `(token, user id)`.
    pub async fn register(&self, name: &str, email: &str) -> (String, Uuid) {
        let (status, body) = self
            .json(
                Method::POST,
                "/register",
                None,
                json!({
                    "name": name,
                    "email": email,
                    "password": PASSWORD,
                    "password_confirmation": PASSWORD,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        let token = body["token"].as_str().unwrap().to_string();
        let id = body["user"]["id"].as_str().unwrap().parse().unwrap();
        (token, id)
    }

    pub async fn login(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.json(
            Method::POST,
            "/login",
            None,
            json!({ "email": email, "password": password }),
        )
        .await
    }

    /// Creates an article through the API and returns its JSON.
    pub async fn create_article(&self, token: &str, title: &str, image: Option<&[u8]>) -> Value {
        let mut form = Form::new().text("title", title).text("content", "Body text");
        if let Some(bytes) = image {
            form = form.file("image", "cover.png", "image/png", bytes);
        }
        let (status, body) = self
            .multipart(Method::POST, "/articles", Some(token), form)
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body
    }
}

fn request(method: Method, uri: &str, token: Option<&str>) -> axum::http::request::Builder {
    let builder = Request::builder().method(method).uri(uri);
    match token {
        Some(token) => builder.header(header::AUTHORIZATION, format!("Bearer {token}")),
        None => builder,
    }
}

/// Form
///
/// Hand-built `multipart/form-data` body.
#[derive(Default)]
pub struct Form {
    body: Vec<u8>,
}

impl Form {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, filename: &str, content_type: &str, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(bytes);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn finish(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        self.body
    }
}

/// A PNG signature followed by `marker`, enough to pass the content sniff.
pub fn png(marker: &str) -> Vec<u8> {
    let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    bytes.extend_from_slice(marker.as_bytes());
    bytes
}

/// Storage key behind a URL produced by `MockStorageService`.
pub fn key_from_url(url: &Value) -> String {
    url.as_str()
        .unwrap()
        .strip_prefix(&format!("{}/", MockStorageService::BASE_URL))
        .unwrap()
        .to_string()
}
