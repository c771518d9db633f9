use async_trait::async_trait;
use aws_sdk_s3 as s3;
use axum::body::Bytes;
use s3::primitives::ByteStream;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use uuid::Uuid;

/// Blob
///
/// Raw bytes handed to the storage layer together with the metadata needed
/// to name and serve them.
#[derive(Debug, Clone)]
pub struct Blob {
    pub bytes: Bytes,
    pub content_type: String,
    pub extension: String,
}

// 1. StorageService Contract
/// StorageService
///
/// Defines the abstract contract for all interactions with the object storage layer.
/// Handlers only ever hold keys; `url_for` turns a key into a fetchable URL when a
/// response is built, so URLs are never persisted.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Ensures the configured bucket exists. Used in the `Env::Local` setup
    /// to provision the bucket in MinIO.
    async fn ensure_bucket_exists(&self);

    /// Stores the blob under `folder` and returns the generated key.
    async fn store(&self, folder: &str, blob: Blob) -> Result<String, String>;

    /// Removes the object. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), String>;

    async fn exists(&self, key: &str) -> Result<bool, String>;

    fn url_for(&self, key: &str) -> String;
}

/// sanitize_key
///
/// Removes directory navigation components (`..`, `.`) and empty segments from a
/// key so that callers cannot escape their folder.
pub fn sanitize_key(key: &str) -> String {
    key.split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".." && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// object_key
///
/// Builds a fresh `{folder}/{uuid}.{ext}` key. The extension is reduced to its
/// ASCII alphanumerics.
pub fn object_key(folder: &str, extension: &str) -> String {
    let extension: String = extension
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect::<String>()
        .to_ascii_lowercase();
    let extension = if extension.is_empty() {
        "bin".to_string()
    } else {
        extension
    };
    let folder = sanitize_key(folder);
    if folder.is_empty() {
        format!("{}.{}", Uuid::new_v4(), extension)
    } else {
        format!("{}/{}.{}", folder, Uuid::new_v4(), extension)
    }
}

fn join_url(base: &str, key: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), key.trim_start_matches('/'))
}

// 2. The Real Implementation (S3/MinIO)
/// S3StorageClient
///
/// The concrete implementation using the AWS SDK for S3. Works against AWS itself
/// and S3-compatible gateways such as MinIO; `force_path_style(true)` is required
/// for the latter.
#[derive(Clone)]
pub struct S3StorageClient {
    client: s3::Client,
    bucket_name: String,
    public_base_url: String,
}

impl S3StorageClient {
    /// Constructs the S3 client using credentials and configuration from AppConfig.
    pub fn new(
        endpoint: &str,
        region: &str,
        access_key: &str,
        secret_key: &str,
        bucket: &str,
        public_base_url: &str,
    ) -> Self {
        let credentials =
            s3::config::Credentials::new(access_key, secret_key, None, None, "static");

        let config = s3::Config::builder()
            .credentials_provider(credentials)
            .endpoint_url(endpoint)
            .region(s3::config::Region::new(region.to_string()))
            .behavior_version_latest()
            .force_path_style(true)
            .build();

        Self {
            client: s3::Client::from_conf(config),
            bucket_name: bucket.to_string(),
            public_base_url: public_base_url.to_string(),
        }
    }
}

#[async_trait]
impl StorageService for S3StorageClient {
    async fn ensure_bucket_exists(&self) {
        // CreateBucket fails harmlessly when the bucket is already there.
        if let Err(e) = self
            .client
            .create_bucket()
            .bucket(&self.bucket_name)
            .send()
            .await
        {
            tracing::debug!("create_bucket for {}: {}", self.bucket_name, e);
        }
    }

    async fn store(&self, folder: &str, blob: Blob) -> Result<String, String> {
        let key = object_key(folder, &blob.extension);

        self.client
            .put_object()
            .bucket(&self.bucket_name)
            .key(&key)
            .content_type(blob.content_type)
            .body(ByteStream::from(blob.bytes.to_vec()))
            .send()
            .await
            .map_err(|e| e.to_string())?;

        tracing::debug!("stored object {}", key);
        Ok(key)
    }

    async fn delete(&self, key: &str) -> Result<(), String> {
        self.client
            .delete_object()
            .bucket(&self.bucket_name)
            .key(key)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, String> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket_name)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(err) => match err.as_service_error() {
                Some(service_err) if service_err.is_not_found() => Ok(false),
                _ => Err(err.to_string()),
            },
        }
    }

    fn url_for(&self, key: &str) -> String {
        join_url(&self.public_base_url, key)
    }
}

// 3. The Mock Implementation (For Tests)
/// MockStorageService
///
/// In-memory `StorageService`. Clones share the same object map, so a test can
/// keep one handle while the application state owns another.
#[derive(Clone)]
pub struct MockStorageService {
    /// When true, `store` returns a simulated failure.
    pub should_fail: bool,
    objects: Arc<Mutex<HashMap<String, Blob>>>,
}

impl Default for MockStorageService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockStorageService {
    pub const BASE_URL: &'static str = "http://localhost:9000/mock-bucket";

    pub fn new() -> Self {
        Self {
            should_fail: false,
            objects: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::new()
        }
    }

    /// Same object map, but every subsequent `store` fails.
    pub fn failing_clone(&self) -> Self {
        Self {
            should_fail: true,
            objects: Arc::clone(&self.objects),
        }
    }

    pub fn get(&self, key: &str) -> Option<Bytes> {
        self.objects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .map(|blob| blob.bytes.clone())
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .objects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl StorageService for MockStorageService {
    async fn ensure_bucket_exists(&self) {
        // No-op in mock environment.
    }

    async fn store(&self, folder: &str, blob: Blob) -> Result<String, String> {
        if self.should_fail {
            return Err("Mock Storage Error: Simulation requested".to_string());
        }
        let key = object_key(folder, &blob.extension);
        self.objects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.clone(), blob);
        Ok(key)
    }

    async fn delete(&self, key: &str) -> Result<(), String> {
        self.objects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, String> {
        Ok(self
            .objects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key))
    }

    fn url_for(&self, key: &str) -> String {
        join_url(Self::BASE_URL, key)
    }
}

/// StorageState
///
/// The concrete type used to share the storage service access across the application state.
pub type StorageState = Arc<dyn StorageService>;
