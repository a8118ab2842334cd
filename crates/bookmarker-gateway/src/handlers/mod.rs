mod bookmark;
mod health;
mod types;

pub use bookmark::{
    create_bookmark_handler, delete_bookmark_handler, get_bookmark_handler,
    list_bookmarks_handler, preview_bookmark_handler, redirect_handler,
};
pub use health::health_handler;
pub use types::{bookmarks_by_type_handler, list_types_handler};
