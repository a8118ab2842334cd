use crate::bookmark::{Bookmark, BookmarkId};
use crate::error::EventError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use url::Url;

pub const ATTR_ID: &str = "id";
pub const ATTR_URL: &str = "url";
pub const ATTR_TITLE: &str = "title";
pub const ATTR_DESCRIPTION: &str = "description";
pub const ATTR_IMAGE_URL: &str = "imageUrl";
pub const ATTR_TYPE: &str = "type";

/// The kind of row change carried by a [`ChangeEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeKind {
    Insert,
    Modify,
    Remove,
}

/// Snapshot of a row's attributes, keyed by storage attribute name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Image(BTreeMap<String, String>);

impl Image {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Extracts the bookmark key and its URL from the snapshot.
    ///
    /// The URL is returned exactly as stored; it is only parsed to check
    /// that it is absolute.
    pub fn id_and_url(&self) -> Result<(BookmarkId, String), EventError> {
        let id = self
            .get(ATTR_ID)
            .ok_or(EventError::MissingAttribute(ATTR_ID))?;
        let id = BookmarkId::new(id).map_err(|e| EventError::InvalidAttribute {
            name: ATTR_ID,
            reason: e.to_string(),
        })?;

        let url = self
            .get(ATTR_URL)
            .ok_or(EventError::MissingAttribute(ATTR_URL))?;
        Url::parse(url).map_err(|e| EventError::InvalidAttribute {
            name: ATTR_URL,
            reason: e.to_string(),
        })?;

        Ok((id, url.to_string()))
    }
}

impl From<&Bookmark> for Image {
    fn from(bookmark: &Bookmark) -> Self {
        let mut attrs = BTreeMap::new();
        attrs.insert(ATTR_ID.to_string(), bookmark.id.to_string());
        attrs.insert(ATTR_URL.to_string(), bookmark.url.clone());

        let optional = [
            (ATTR_TITLE, &bookmark.title),
            (ATTR_DESCRIPTION, &bookmark.description),
            (ATTR_IMAGE_URL, &bookmark.image_url),
            (ATTR_TYPE, &bookmark.kind),
        ];
        for (name, value) in optional {
            if let Some(value) = value {
                attrs.insert(name.to_string(), value.clone());
            }
        }

        Self(attrs)
    }
}

/// A single row change delivered by the store's change feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    pub event_id: String,
    pub kind: ChangeKind,
    /// Row attributes after the change; absent for removals.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_image: Option<Image>,
}

impl ChangeEvent {
    pub fn new(event_id: impl Into<String>, kind: ChangeKind, new_image: Option<Image>) -> Self {
        Self {
            event_id: event_id.into(),
            kind,
            new_image,
        }
    }

    pub fn insert(event_id: impl Into<String>, bookmark: &Bookmark) -> Self {
        Self::new(event_id, ChangeKind::Insert, Some(bookmark.into()))
    }

    pub fn is_insert(&self) -> bool {
        self.kind == ChangeKind::Insert
    }

    /// Extracts the key and URL of the changed row from its new image.
    pub fn id_and_url(&self) -> Result<(BookmarkId, String), EventError> {
        self.new_image
            .as_ref()
            .ok_or(EventError::MissingImage)?
            .id_and_url()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_from_bookmark_skips_absent_metadata() {
        let bookmark = Bookmark {
            title: Some("Example".to_string()),
            ..Bookmark::new(BookmarkId::new_unchecked("abc"), "https://example.com")
        };

        let image = Image::from(&bookmark);
        assert_eq!(image.get(ATTR_ID), Some("abc"));
        assert_eq!(image.get(ATTR_URL), Some("https://example.com"));
        assert_eq!(image.get(ATTR_TITLE), Some("Example"));
        assert_eq!(image.get(ATTR_DESCRIPTION), None);
    }

    #[test]
    fn id_and_url_keeps_url_verbatim() {
        let event = ChangeEvent::new(
            "1",
            ChangeKind::Insert,
            Some(
                Image::new()
                    .with(ATTR_ID, "abc")
                    .with(ATTR_URL, "https://example.com"),
            ),
        );

        let (id, url) = event.id_and_url().unwrap();
        assert_eq!(id.as_str(), "abc");
        assert_eq!(url, "https://example.com");
    }

    #[test]
    fn id_and_url_rejects_malformed_images() {
        let missing_url = Image::new().with(ATTR_ID, "abc");
        assert!(matches!(
            missing_url.id_and_url(),
            Err(EventError::MissingAttribute(ATTR_URL))
        ));

        let relative_url = Image::new().with(ATTR_ID, "abc").with(ATTR_URL, "/a/b");
        assert!(matches!(
            relative_url.id_and_url(),
            Err(EventError::InvalidAttribute { name: ATTR_URL, .. })
        ));

        let bad_id = Image::new()
            .with(ATTR_ID, "a/b")
            .with(ATTR_URL, "https://example.com");
        assert!(matches!(
            bad_id.id_and_url(),
            Err(EventError::InvalidAttribute { name: ATTR_ID, .. })
        ));

        let removal = ChangeEvent::new("2", ChangeKind::Remove, None);
        assert!(matches!(removal.id_and_url(), Err(EventError::MissingImage)));
    }

    #[test]
    fn deserializes_wire_format() {
        let json = r#"{
            "eventId": "42",
            "kind": "INSERT",
            "newImage": { "id": "abc", "url": "https://example.com" }
        }"#;

        let event: ChangeEvent = serde_json::from_str(json).unwrap();
        assert!(event.is_insert());
        assert_eq!(event.new_image.unwrap().get(ATTR_ID), Some("abc"));
    }
}
