use uuid::Uuid;

use crate::{
    auth::AuthUser,
    error::{AppError, AppResult},
    models::{Article, Comment, User},
};

/// Anything with a recorded creator that only that creator may change.
pub trait Owned {
    fn owner_id(&self) -> Uuid;
}

impl Owned for Article {
    fn owner_id(&self) -> Uuid {
        self.user_id
    }
}

impl Owned for Comment {
    fn owner_id(&self) -> Uuid {
        self.user_id
    }
}

/// A user record is owned by that user.
impl Owned for User {
    fn owner_id(&self) -> Uuid {
        self.id
    }
}

/// authorize_owner
///
/// The gate in front of every mutation. Existence is checked before ownership,
/// so a missing id is always NotFound whoever asks.
pub fn authorize_owner<T: Owned>(resource: Option<T>, caller: &AuthUser, kind: &str) -> AppResult<T> {
    let resource = resource.ok_or_else(|| AppError::NotFound(format!("{kind} not found.")))?;

    if resource.owner_id() != caller.id {
        tracing::warn!(
            caller = %caller.id,
            owner = %resource.owner_id(),
            "rejected mutation of {} not owned by caller",
            kind.to_lowercase()
        );
        return Err(AppError::Forbidden(format!(
            "You are not allowed to modify this {}.",
            kind.to_lowercase()
        )));
    }

    Ok(resource)
}
