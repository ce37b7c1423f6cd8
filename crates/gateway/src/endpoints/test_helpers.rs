//! # エンドポイントテスト用共通ヘルパー
//!
//! Drive呼び出しを記録するモックストレージと、テスト用Relayサーバーの起動。

use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use drive_relay_types::{DriveFile, DriveFileEntry, FileMetadata};
use futures::TryStreamExt;

use crate::config::{RelayConfig, RelayState, DEFAULT_DRIVE_SCOPE};
use crate::error::RelayError;
use crate::storage::{DriveStorage, MediaUpload};

/// モックが返す結果
pub enum MockOutcome {
    /// 呼び出しごとに新しいIDを採番して成功
    Success,
    /// 固定の記述子で成功
    Fixed(DriveFile),
    /// Drive APIの構造化エラー（詳細文字列）
    ApiError(String),
    /// 未分類エラー
    Failure(String),
}

/// モックが受け取ったアップロード
#[derive(Debug, Clone)]
pub struct ReceivedUpload {
    pub metadata: FileMetadata,
    pub mime_type: String,
    pub content: Vec<u8>,
}

/// テスト用のモックDriveStorage。
/// 本体ストリームを最後まで読み取ってから結果を返す。
pub struct MockDriveStorage {
    outcome: MockOutcome,
    received: Arc<Mutex<Vec<ReceivedUpload>>>,
    next_id: AtomicU64,
    listing: Result<Vec<DriveFileEntry>, String>,
}

impl MockDriveStorage {
    pub fn new(outcome: MockOutcome) -> Self {
        Self {
            outcome,
            received: Arc::new(Mutex::new(Vec::new())),
            next_id: AtomicU64::new(1),
            listing: Ok(Vec::new()),
        }
    }

    /// `list_files` の結果を設定する。`Err` はDrive APIエラーの詳細。
    pub fn with_listing(mut self, listing: Result<Vec<DriveFileEntry>, String>) -> Self {
        self.listing = listing;
        self
    }

    pub fn received(&self) -> Arc<Mutex<Vec<ReceivedUpload>>> {
        self.received.clone()
    }
}

#[async_trait::async_trait]
impl DriveStorage for MockDriveStorage {
    async fn create_file(
        &self,
        metadata: FileMetadata,
        media: MediaUpload,
    ) -> Result<DriveFile, RelayError> {
        let content: Vec<u8> = media
            .content
            .try_fold(Vec::new(), |mut acc, chunk| async move {
                acc.extend_from_slice(&chunk);
                Ok(acc)
            })
            .await
            .map_err(|e| anyhow!(e).context("本体ストリームの読み取りに失敗"))?;

        self.received.lock().unwrap().push(ReceivedUpload {
            metadata: metadata.clone(),
            mime_type: media.mime_type,
            content,
        });

        match &self.outcome {
            MockOutcome::Success => {
                let id = format!("mock-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
                Ok(DriveFile {
                    web_view_link: format!("https://drive.google.com/file/d/{id}/view"),
                    id,
                    name: metadata.name,
                })
            }
            MockOutcome::Fixed(file) => Ok(file.clone()),
            MockOutcome::ApiError(detail) => Err(RelayError::DriveApi {
                status: 403,
                detail: detail.clone(),
                body: serde_json::json!({"error": {"code": 403, "message": detail}}).to_string(),
            }),
            MockOutcome::Failure(message) => Err(RelayError::Unclassified(anyhow!(
                "Drive APIへの送信に失敗: {message}"
            ))),
        }
    }

    async fn list_files(&self, folder_id: &str) -> Result<Vec<DriveFileEntry>, RelayError> {
        assert_eq!(folder_id, "test-folder");
        self.listing.clone().map_err(|detail| RelayError::DriveApi {
            status: 404,
            body: String::new(),
            detail,
        })
    }
}

/// テスト用RelayStateを構築するヘルパー
pub fn test_state(storage: MockDriveStorage, debug: bool) -> Arc<RelayState> {
    Arc::new(RelayState {
        config: RelayConfig {
            credentials_path: PathBuf::from("unused.json"),
            folder_id: "test-folder".to_string(),
            host: IpAddr::from([127, 0, 0, 1]),
            port: 0,
            max_upload_bytes: None,
            debug,
            static_dir: None,
            drive_scope: DEFAULT_DRIVE_SCOPE.to_string(),
            drive_api_base: None,
        },
        storage: Box::new(storage),
    })
}

/// Relayのルーターをランダムポートで起動し、ベースURLを返す。
pub async fn spawn_relay(state: Arc<RelayState>) -> String {
    let app = crate::build_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    format!("http://127.0.0.1:{port}")
}
