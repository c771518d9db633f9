use std::collections::BTreeMap;

use serde::Serialize;

use crate::{
    error::{AppError, AppResult},
    models::{RegisterRequest, ResetPasswordRequest},
    uploads::{ArticleForm, ImageUpload},
};

/// Uploaded images may not exceed 2048 KiB.
pub const MAX_IMAGE_BYTES: usize = 2 * 1024 * 1024;
pub const ALLOWED_IMAGE_EXTENSIONS: [&str; 4] = ["jpeg", "png", "jpg", "gif"];
pub const ALLOWED_IMAGE_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/gif"];
pub const MIN_PASSWORD_CHARS: usize = 6;
pub const MAX_STRING_CHARS: usize = 255;
pub const MAX_COMMENT_CHARS: usize = 5000;

/// FieldErrors
///
/// Field name to human-readable messages, serialized as a plain JSON object.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn into_result(self) -> AppResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self))
        }
    }
}

// --- Field rules ---

pub fn required(errors: &mut FieldErrors, field: &str, value: Option<&str>, max: usize) {
    match value.map(str::trim) {
        None | Some("") => errors.add(field, format!("The {field} field is required.")),
        Some(v) if v.chars().count() > max => errors.add(
            field,
            format!("The {field} field must not be greater than {max} characters."),
        ),
        Some(_) => {}
    }
}

pub fn is_valid_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains("..")
}

pub fn email(errors: &mut FieldErrors, field: &str, value: Option<&str>) {
    required(errors, field, value, MAX_STRING_CHARS);
    if let Some(v) = value.map(str::trim) {
        if !v.is_empty() && !is_valid_email(v) {
            errors.add(field, format!("The {field} field must be a valid email address."));
        }
    }
}

pub fn password(errors: &mut FieldErrors, password: Option<&str>, confirmation: Option<&str>) {
    match password {
        None | Some("") => errors.add("password", "The password field is required."),
        Some(p) => {
            if p.chars().count() < MIN_PASSWORD_CHARS {
                errors.add(
                    "password",
                    format!("The password field must be at least {MIN_PASSWORD_CHARS} characters."),
                );
            }
            if confirmation != Some(p) {
                errors.add("password", "The password field confirmation does not match.");
            }
        }
    }
}

/// Checks the leading bytes against the signatures of the accepted formats.
fn looks_like_image(bytes: &[u8]) -> bool {
    bytes.starts_with(&[0xFF, 0xD8, 0xFF])
        || bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A])
        || bytes.starts_with(b"GIF87a")
        || bytes.starts_with(b"GIF89a")
}

pub fn image(errors: &mut FieldErrors, field: &str, upload: &ImageUpload) {
    if upload.bytes.is_empty() || !looks_like_image(&upload.bytes) {
        errors.add(field, format!("The {field} field must be an image."));
    }
    let declared = upload.content_type.to_ascii_lowercase();
    if !ALLOWED_IMAGE_TYPES.contains(&declared.as_str())
        || !ALLOWED_IMAGE_EXTENSIONS.contains(&upload.extension().as_str())
    {
        errors.add(
            field,
            format!(
                "The {field} field must be a file of type: {}.",
                ALLOWED_IMAGE_EXTENSIONS.join(", ")
            ),
        );
    }
    if upload.bytes.len() > MAX_IMAGE_BYTES {
        errors.add(
            field,
            format!(
                "The {field} field must not be greater than {} kilobytes.",
                MAX_IMAGE_BYTES / 1024
            ),
        );
    }
}

// --- Request validators ---

pub fn registration(req: &RegisterRequest) -> FieldErrors {
    let mut errors = FieldErrors::new();
    required(&mut errors, "name", Some(&req.name), MAX_STRING_CHARS);
    email(&mut errors, "email", Some(&req.email));
    password(
        &mut errors,
        Some(&req.password),
        req.password_confirmation.as_deref(),
    );
    errors
}

pub fn article(form: &ArticleForm) -> AppResult<()> {
    let mut errors = FieldErrors::new();
    required(&mut errors, "title", form.title.as_deref(), MAX_STRING_CHARS);
    required(&mut errors, "content", form.content.as_deref(), usize::MAX);
    if let Some(upload) = &form.image {
        image(&mut errors, "image", upload);
    }
    errors.into_result()
}

/// Profile updates are partial: only the fields present are checked.
pub fn profile(name: Option<&str>, email_value: Option<&str>) -> FieldErrors {
    let mut errors = FieldErrors::new();
    if name.is_some() {
        required(&mut errors, "name", name, MAX_STRING_CHARS);
    }
    if email_value.is_some() {
        email(&mut errors, "email", email_value);
    }
    errors
}

pub fn reset_password(req: &ResetPasswordRequest) -> AppResult<()> {
    let mut errors = FieldErrors::new();
    email(&mut errors, "email", Some(&req.email));
    required(&mut errors, "token", Some(&req.token), usize::MAX);
    password(
        &mut errors,
        Some(&req.password),
        req.password_confirmation.as_deref(),
    );
    errors.into_result()
}

pub fn comment(body: &str) -> AppResult<()> {
    let mut errors = FieldErrors::new();
    required(&mut errors, "body", Some(body), MAX_COMMENT_CHARS);
    errors.into_result()
}
