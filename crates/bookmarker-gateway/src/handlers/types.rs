use crate::error::Result;
use crate::model::{BookmarksResponse, TypesResponse};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::Json;
use bookmarker_core::Bookmark;
use futures::TryStreamExt;
use std::collections::BTreeSet;

pub async fn list_types_handler(State(state): State<AppState>) -> Result<Json<TypesResponse>> {
    let types: BTreeSet<String> = state
        .store()
        .scan_all()
        .try_filter_map(|bookmark| async move {
            Ok(bookmark.kind.filter(|kind| !kind.is_empty()))
        })
        .try_collect()
        .await?;

    Ok(Json(TypesResponse {
        types: types.into_iter().collect(),
    }))
}

pub async fn bookmarks_by_type_handler(
    Path(kind): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<BookmarksResponse>> {
    let bookmarks: Vec<Bookmark> = state
        .store()
        .scan_all()
        .try_filter(|bookmark| {
            let matches = bookmark.kind.as_deref() == Some(kind.as_str());
            async move { matches }
        })
        .try_collect()
        .await?;

    Ok(Json(BookmarksResponse { bookmarks }))
}
