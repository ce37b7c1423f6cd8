//! # Driveストレージ
//!
//! Relayがアップロードを転送するバックエンドの抽象インターフェース。
//! Google Drive実装は `drive` サブモジュールを参照。

pub mod drive;

pub use drive::GoogleDriveStorage;

use bytes::Bytes;
use drive_relay_types::{DriveFile, DriveFileEntry, FileMetadata};
use futures::stream::BoxStream;

use crate::error::RelayError;

/// アップロード内容のバイトストリーム。一度だけ消費される。
pub type MediaStream = BoxStream<'static, Result<Bytes, std::io::Error>>;

/// 転送するファイル本体。
pub struct MediaUpload {
    /// クライアントが申告したMIMEタイプ（内容とは照合しない）
    pub mime_type: String,
    pub content: MediaStream,
}

/// Driveバックエンドの抽象インターフェース。
///
/// 実装は並行リクエストから共有されるため、内部に可変状態を持たないこと。
/// 呼び出しは一回限りで、失敗しても再試行しない。
#[async_trait::async_trait]
pub trait DriveStorage: Send + Sync {
    /// `metadata` の名前・親フォルダで新しいファイルを作成し、`media` の内容を書き込む。
    ///
    /// 同名ファイルが既にあっても上書きせず、別IDのファイルが作られる。
    async fn create_file(
        &self,
        metadata: FileMetadata,
        media: MediaUpload,
    ) -> Result<DriveFile, RelayError>;

    /// フォルダ直下のファイル一覧を返す。
    async fn list_files(&self, folder_id: &str) -> Result<Vec<DriveFileEntry>, RelayError>;
}
