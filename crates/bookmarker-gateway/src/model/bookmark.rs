use bookmarker_core::Bookmark;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct CreateBookmarkRequest {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct CreateBookmarkResponse {
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct BookmarksResponse {
    pub bookmarks: Vec<Bookmark>,
}

#[derive(Debug, Serialize)]
pub struct DeleteBookmarkResponse {
    pub deleted: bool,
}

#[derive(Debug, Serialize)]
pub struct TypesResponse {
    pub types: Vec<String>,
}
