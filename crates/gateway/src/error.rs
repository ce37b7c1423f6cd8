//! # Relay エラー型
//!
//! 失敗は3種類に分類される。
//! - 入力検証エラー（Drive呼び出し前、400）
//! - Drive APIの構造化エラー（500、`google_error` に詳細を保持）
//! - それ以外の未分類エラー（500）

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use drive_relay_types::UploadFailure;

/// Relayエラー型。
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// `file` パートが存在しない
    #[error("No file provided")]
    NoFile,
    /// `file` パートのファイル名が空
    #[error("Empty filename")]
    EmptyFilename,
    /// リクエストボディが上限を超過
    #[error("{0}")]
    PayloadTooLarge(String),
    /// Drive APIがエラーエンベロープで失敗を返した
    #[error("Google API error")]
    DriveApi {
        /// HTTPステータス
        status: u16,
        /// Drive側のエラーメッセージ（加工しない）
        detail: String,
        /// レスポンスボディ全文
        body: String,
    },
    /// ネットワーク、トークン取得、デコード失敗など
    #[error("{0:#}")]
    Unclassified(#[from] anyhow::Error),
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::NoFile | RelayError::EmptyFilename => StatusCode::BAD_REQUEST,
            RelayError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            RelayError::DriveApi { .. } | RelayError::Unclassified(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// 失敗レスポンスのボディを構築する。`debug` が真ならトレースを付ける。
    pub fn to_failure(&self, debug: bool) -> UploadFailure {
        let mut failure = UploadFailure::new(self.to_string());
        if let RelayError::DriveApi { detail, .. } = self {
            failure = failure.with_google_error(detail.clone());
        }
        if debug {
            if let Some(trace) = self.traceback() {
                failure = failure.with_traceback(trace);
            }
        }
        failure
    }

    fn traceback(&self) -> Option<String> {
        match self {
            RelayError::NoFile | RelayError::EmptyFilename | RelayError::PayloadTooLarge(_) => {
                None
            }
            RelayError::DriveApi { status, body, .. } => {
                Some(format!("Drive API returned HTTP {status}\n{body}"))
            }
            RelayError::Unclassified(e) => Some(format!("{e:?}")),
        }
    }

    /// HTTPレスポンスに変換する。
    pub fn into_response_with(self, debug: bool) -> Response {
        (self.status(), Json(self.to_failure(debug))).into_response()
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        self.into_response_with(false)
    }
}
