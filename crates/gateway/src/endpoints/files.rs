//! # GET /files
//!
//! アップロード先フォルダのファイル一覧。

use std::sync::Arc;

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::config::RelayState;

/// GET /files — 固定フォルダ直下のファイル一覧を返す。
///
/// 失敗時は /upload と同じ分類・同じJSON形式で返す。
pub async fn handle_list_files(State(state): State<Arc<RelayState>>) -> Response {
    match state.storage.list_files(&state.config.folder_id).await {
        Ok(files) => {
            tracing::debug!(count = files.len(), "ファイル一覧を取得");
            Json(files).into_response()
        }
        Err(e) => {
            tracing::error!(error = ?e, "ファイル一覧の取得に失敗");
            e.into_response_with(state.config.debug)
        }
    }
}
