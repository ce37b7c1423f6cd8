//! # POST /upload
//!
//! multipartの `file` パートを検証し、固定フォルダ宛てのメタデータを付けて
//! 本体をDriveへストリーミング転送する。

use std::io;
use std::sync::Arc;

use axum::extract::multipart::{Field, MultipartRejection};
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use drive_relay_types::{DriveFile, FileMetadata, UploadSuccess};
use futures::channel::mpsc;
use futures::{SinkExt, StreamExt};

use crate::config::RelayState;
use crate::error::RelayError;
use crate::storage::MediaUpload;

/// ファイルパートのフィールド名
pub const FILE_FIELD: &str = "file";
/// Content-Typeが無いパートに付けるMIMEタイプ
const DEFAULT_MIME_TYPE: &str = "application/octet-stream";
/// クライアント→Drive間で保持するチャンク数
const CHUNK_BUFFER: usize = 8;

/// POST /upload — ファイルをDriveの共有フォルダへ中継する。
///
/// 1リクエストにつき必ず1つの結果（成功または失敗JSON）を返す。
/// 入力検証に失敗した場合はDriveを呼ばない。
pub async fn handle_upload(
    State(state): State<Arc<RelayState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    match relay_upload(&state, multipart).await {
        Ok(file) => {
            tracing::info!(file_id = %file.id, name = %file.name, "Driveへのアップロードが完了");
            (StatusCode::OK, Json(UploadSuccess::new(file))).into_response()
        }
        Err(e) => {
            if e.status().is_client_error() {
                tracing::warn!(error = %e, "アップロード要求を拒否");
            } else {
                tracing::error!(error = ?e, "アップロードに失敗");
            }
            e.into_response_with(state.config.debug)
        }
    }
}

async fn relay_upload(
    state: &RelayState,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<DriveFile, RelayError> {
    // multipartでないリクエストには file パートが無いものとして扱う
    let mut multipart = multipart.map_err(|rejection| {
        tracing::debug!(%rejection, "multipartとして解釈できないリクエスト");
        RelayError::NoFile
    })?;

    // file という名前のファイルパートまで読み進める。
    // filenameパラメータを持たない同名パートは通常のフォーム値なので読み飛ばす。
    let field = loop {
        match multipart.next_field().await {
            Ok(Some(field))
                if field.name() == Some(FILE_FIELD) && field.file_name().is_some() =>
            {
                break field
            }
            Ok(Some(_)) => continue,
            Ok(None) => return Err(RelayError::NoFile),
            Err(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                return Err(RelayError::PayloadTooLarge(e.body_text()))
            }
            Err(e) => {
                tracing::warn!(error = %e, "multipartボディのパースに失敗");
                return Err(RelayError::NoFile);
            }
        }
    };

    let filename = field.file_name().unwrap_or_default().to_string();
    if filename.is_empty() {
        return Err(RelayError::EmptyFilename);
    }
    let mime_type = field
        .content_type()
        .unwrap_or(DEFAULT_MIME_TYPE)
        .to_string();

    let metadata = FileMetadata::in_folder(filename, state.config.folder_id.as_str());
    tracing::debug!(name = %metadata.name, mime_type = %mime_type, "Driveへ転送開始");

    forward(state, field, metadata, mime_type).await
}

/// パートの本体をチャネル経由でストレージへ流しつつ、Driveの結果を待つ。
/// 本体は一度だけ読まれ、所有権はストレージ呼び出しに移る。
async fn forward(
    state: &RelayState,
    field: Field<'_>,
    metadata: FileMetadata,
    mime_type: String,
) -> Result<DriveFile, RelayError> {
    let (tx, rx) = mpsc::channel(CHUNK_BUFFER);
    let media = MediaUpload {
        mime_type,
        content: rx.boxed(),
    };

    let ((), result) = tokio::join!(
        pump_field(field, tx),
        state.storage.create_file(metadata, media)
    );
    result
}

/// クライアントから届いたチャンクを順に送る。
/// 受信側が閉じた（Drive呼び出しが終わった）時点で打ち切る。
async fn pump_field(mut field: Field<'_>, mut tx: mpsc::Sender<io::Result<Bytes>>) {
    loop {
        let item = match field.chunk().await {
            Ok(Some(chunk)) => Ok(chunk),
            Ok(None) => break,
            Err(e) => Err(io::Error::other(e)),
        };
        let failed = item.is_err();
        if tx.send(item).await.is_err() || failed {
            break;
        }
    }
}
