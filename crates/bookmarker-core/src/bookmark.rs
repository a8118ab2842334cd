use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// A validated identifier for a stored bookmark.
///
/// Identifiers must be 3-32 characters long and contain only
/// alphanumeric characters, hyphens, or underscores.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookmarkId(String);

const MIN_LENGTH: usize = 3;
const MAX_LENGTH: usize = 32;

impl BookmarkId {
    /// Creates a new `BookmarkId` after validating the input.
    ///
    /// Valid ids are 3-32 characters and contain only `[a-zA-Z0-9_-]`.
    pub fn new(id: impl Into<String>) -> Result<Self, CoreError> {
        let id = id.into();
        Self::validate(&id)?;
        Ok(Self(id))
    }

    /// Creates a `BookmarkId` without validation.
    ///
    /// Use this only for ids produced by trusted internal sources
    /// (e.g. the key deriver, or rows read back from storage).
    pub fn new_unchecked(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(id: &str) -> Result<(), CoreError> {
        if id.len() < MIN_LENGTH || id.len() > MAX_LENGTH {
            return Err(CoreError::InvalidBookmarkId(format!(
                "length must be between {} and {}, got {}",
                MIN_LENGTH,
                MAX_LENGTH,
                id.len()
            )));
        }

        if !id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(CoreError::InvalidBookmarkId(format!(
                "must contain only alphanumeric characters, hyphens, or underscores: '{}'",
                id
            )));
        }

        Ok(())
    }
}

impl Display for BookmarkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A stored bookmark.
///
/// `id` and `url` are fixed at creation. The remaining fields stay empty
/// until the page metadata has been fetched, and every successful
/// enrichment replaces all four of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    pub id: BookmarkId,
    /// The absolute URL exactly as it was submitted.
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// The Open Graph object type of the page (e.g. `website`, `article`).
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl Bookmark {
    /// Creates a bookmark that carries no metadata yet.
    pub fn new(id: BookmarkId, url: impl Into<String>) -> Self {
        Self {
            id,
            url: url.into(),
            title: None,
            description: None,
            image_url: None,
            kind: None,
        }
    }

    /// Returns `true` once any metadata field has been populated.
    pub fn is_enriched(&self) -> bool {
        self.title.is_some()
            || self.description.is_some()
            || self.image_url.is_some()
            || self.kind.is_some()
    }
}
