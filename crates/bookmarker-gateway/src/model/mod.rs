mod bookmark;
mod health;

pub use bookmark::{
    BookmarksResponse, CreateBookmarkRequest, CreateBookmarkResponse, DeleteBookmarkResponse,
    TypesResponse,
};
pub use health::HealthResponse;
