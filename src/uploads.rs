use std::collections::HashMap;

use axum::{body::Bytes, extract::Multipart};

use crate::{
    error::{AppError, AppResult},
    storage::Blob,
};

/// ImageUpload
///
/// A file part pulled out of a multipart body. Nothing here is trusted yet;
/// `validation::image` decides whether it may be stored.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl ImageUpload {
    /// Lowercased extension of the client filename, falling back to the
    /// declared MIME type when the filename has none.
    pub fn extension(&self) -> String {
        let from_name = std::path::Path::new(&self.filename)
            .extension()
            .and_then(std::ffi::OsStr::to_str)
            .map(str::to_ascii_lowercase);

        match from_name {
            Some(ext) if !ext.is_empty() => ext,
            _ => match self.content_type.as_str() {
                "image/jpeg" => "jpg".to_string(),
                "image/png" => "png".to_string(),
                "image/gif" => "gif".to_string(),
                _ => "bin".to_string(),
            },
        }
    }
}

impl From<ImageUpload> for Blob {
    fn from(upload: ImageUpload) -> Self {
        Blob {
            extension: upload.extension(),
            content_type: upload.content_type,
            bytes: upload.bytes,
        }
    }
}

/// MultipartFields
///
/// Text parts and file parts of a form, keyed by field name. A part counts
/// as a file when the client sent a filename with it; browsers submit an
/// empty, unnamed part for an untouched file input and those are dropped.
#[derive(Debug, Default)]
pub struct MultipartFields {
    text: HashMap<String, String>,
    files: HashMap<String, ImageUpload>,
}

impl MultipartFields {
    pub async fn read(mut multipart: Multipart) -> AppResult<Self> {
        let mut fields = Self::default();

        while let Some(field) = multipart.next_field().await.map_err(malformed)? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            match field.file_name().map(str::to_string) {
                Some(filename) => {
                    let content_type = field
                        .content_type()
                        .unwrap_or("application/octet-stream")
                        .to_string();
                    let bytes = field.bytes().await.map_err(malformed)?;
                    if filename.is_empty() && bytes.is_empty() {
                        continue;
                    }
                    fields.files.insert(
                        name,
                        ImageUpload {
                            filename,
                            content_type,
                            bytes,
                        },
                    );
                }
                None => {
                    let value = field.text().await.map_err(malformed)?;
                    fields.text.insert(name, value);
                }
            }
        }

        Ok(fields)
    }

    pub fn take_text(&mut self, name: &str) -> Option<String> {
        self.text.remove(name)
    }

    pub fn take_file(&mut self, name: &str) -> Option<ImageUpload> {
        self.files.remove(name)
    }
}

fn malformed(e: axum::extract::multipart::MultipartError) -> AppError {
    tracing::debug!("rejecting multipart body: {}", e);
    AppError::BadRequest("Malformed multipart body.".to_string())
}

/// ArticleForm
///
/// Fields of the multipart body accepted by article create and update.
#[derive(Debug, Default)]
pub struct ArticleForm {
    pub title: Option<String>,
    pub content: Option<String>,
    pub image: Option<ImageUpload>,
}

impl ArticleForm {
    pub async fn from_multipart(multipart: Multipart) -> AppResult<Self> {
        let mut fields = MultipartFields::read(multipart).await?;
        Ok(Self {
            title: fields.take_text("title"),
            content: fields.take_text("content"),
            image: fields.take_file("image"),
        })
    }
}

/// ProfileForm
///
/// Fields of the multipart body accepted by `POST /update-profile-img`.
#[derive(Debug, Default)]
pub struct ProfileForm {
    pub name: Option<String>,
    pub email: Option<String>,
    pub profile_image: Option<ImageUpload>,
}

impl ProfileForm {
    pub async fn from_multipart(multipart: Multipart) -> AppResult<Self> {
        let mut fields = MultipartFields::read(multipart).await?;
        Ok(Self {
            name: fields.take_text("name"),
            email: fields.take_text("email"),
            profile_image: fields.take_file("profile_image"),
        })
    }
}
