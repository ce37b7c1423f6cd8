//! # Drive Relay 共有型定義
//!
//! Relayサーバーとクライアント（テストを含む）が共有するJSONワイヤ型。
//!
//! ## 命名規則
//! - Drive API由来のフィールドはDrive側の表記（`webViewLink`, `createdTime`）をそのまま使う。
//! - Relay独自のフィールドは snake_case（`google_error`）。

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Driveオブジェクト
// ---------------------------------------------------------------------------

/// Driveに作成されたファイルの記述子。`files.create` の `fields=id,name,webViewLink` に対応。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriveFile {
    /// Drive上のファイルID
    pub id: String,
    /// ファイル名
    pub name: String,
    /// ブラウザ閲覧用リンク
    #[serde(rename = "webViewLink", default)]
    pub web_view_link: String,
}

/// フォルダ一覧の1エントリ。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriveFileEntry {
    pub id: String,
    pub name: String,
    #[serde(rename = "webViewLink", default, skip_serializing_if = "Option::is_none")]
    pub web_view_link: Option<String>,
    /// RFC 3339 形式の作成日時
    #[serde(rename = "createdTime", default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<String>,
}

/// `files.list` のレスポンス1ページ分。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DriveFileList {
    #[serde(default)]
    pub files: Vec<DriveFileEntry>,
    #[serde(rename = "nextPageToken", default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

/// アップロード先メタデータ。ファイル名と固定の保存先フォルダの組。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub name: String,
    pub parents: Vec<String>,
}

impl FileMetadata {
    /// 単一フォルダ直下に置くメタデータを構築する。
    pub fn in_folder(name: impl Into<String>, folder_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parents: vec![folder_id.into()],
        }
    }
}

// ---------------------------------------------------------------------------
// /upload レスポンス
// ---------------------------------------------------------------------------

/// /upload 成功レスポンス。`{"success": true, "file": {...}}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadSuccess {
    /// 常に `true`
    pub success: bool,
    pub file: DriveFile,
}

impl UploadSuccess {
    pub fn new(file: DriveFile) -> Self {
        Self {
            success: true,
            file,
        }
    }
}

/// 失敗レスポンス。/upload と /files で共通。
///
/// `google_error` はDrive APIが構造化エラーを返した場合のみ、
/// `traceback` はデバッグモード時のみ出力される。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadFailure {
    /// 常に `false`
    pub success: bool,
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traceback: Option<String>,
}

impl UploadFailure {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            google_error: None,
            traceback: None,
        }
    }

    pub fn with_google_error(mut self, detail: impl Into<String>) -> Self {
        self.google_error = Some(detail.into());
        self
    }

    pub fn with_traceback(mut self, traceback: impl Into<String>) -> Self {
        self.traceback = Some(traceback.into());
        self
    }
}

// ---------------------------------------------------------------------------
// テスト
// ---------------------------------------------------------------------------
