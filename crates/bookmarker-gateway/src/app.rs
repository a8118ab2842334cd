use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers::{
    bookmarks_by_type_handler, create_bookmark_handler, delete_bookmark_handler,
    get_bookmark_handler, health_handler, list_bookmarks_handler, list_types_handler,
    preview_bookmark_handler, redirect_handler,
};
use crate::state::AppState;

pub struct App {}

impl App {
    pub fn router(state: AppState) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .route(
                "/bookmarks",
                post(create_bookmark_handler).get(list_bookmarks_handler),
            )
            .route(
                "/bookmarks/{id}",
                get(get_bookmark_handler).delete(delete_bookmark_handler),
            )
            .route("/bookmarks/{id}/preview", get(preview_bookmark_handler))
            .route("/types", get(list_types_handler))
            .route("/types/{kind}", get(bookmarks_by_type_handler))
            .route("/{id}", get(redirect_handler))
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }
}
