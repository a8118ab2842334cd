use crate::error::{ApiError, Result};
use crate::model::{
    BookmarksResponse, CreateBookmarkRequest, CreateBookmarkResponse, DeleteBookmarkResponse,
};
use crate::preview::render_preview;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::header::LOCATION;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use bookmarker_core::{Bookmark, BookmarkId};
use futures::TryStreamExt;
use tracing::{debug, info};

/// Ids that fail validation cannot exist in the store, so they are reported
/// as missing rather than malformed.
fn parse_id(raw: String) -> Result<BookmarkId> {
    BookmarkId::new(raw.as_str()).map_err(|_| ApiError::NotFound(raw))
}

async fn load_bookmark(state: &AppState, raw: String) -> Result<Bookmark> {
    let id = parse_id(raw)?;
    state
        .store()
        .get(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(id.to_string()))
}

pub async fn create_bookmark_handler(
    State(state): State<AppState>,
    Json(request): Json<CreateBookmarkRequest>,
) -> Result<(StatusCode, Json<CreateBookmarkResponse>)> {
    info!(url = %request.url, "add bookmark");
    let id = state.resolver().resolve(&request.url).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateBookmarkResponse { id: id.to_string() }),
    ))
}

pub async fn list_bookmarks_handler(
    State(state): State<AppState>,
) -> Result<Json<BookmarksResponse>> {
    let bookmarks: Vec<Bookmark> = state.store().scan_all().try_collect().await?;
    debug!(count = bookmarks.len(), "listed bookmarks");
    Ok(Json(BookmarksResponse { bookmarks }))
}

pub async fn get_bookmark_handler(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Bookmark>> {
    Ok(Json(load_bookmark(&state, id).await?))
}

pub async fn delete_bookmark_handler(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<DeleteBookmarkResponse>> {
    let id = parse_id(id)?;
    info!(id = %id, "delete bookmark");
    let deleted = state.store().delete(&id).await?;
    Ok(Json(DeleteBookmarkResponse { deleted }))
}

pub async fn preview_bookmark_handler(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Html<String>> {
    let bookmark = load_bookmark(&state, id).await?;
    Ok(Html(render_preview(&bookmark)))
}

pub async fn redirect_handler(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Response> {
    let bookmark = load_bookmark(&state, id).await?;
    Ok((StatusCode::FOUND, [(LOCATION, bookmark.url)]).into_response())
}
