//! # Drive Relay Gateway
//!
//! クライアントから受け取った1ファイルをGoogle Driveの共有フォルダへ中継するHTTPサーバー。
//!
//! ## 役割
//! - multipartアップロードの検証（`file` パートの有無、ファイル名）
//! - 固定フォルダ宛てメタデータの付与
//! - サービスアカウントによるDriveへのストリーミング転送（単発、再試行なし）
//! - Driveの結果（成功/構造化エラー/未分類エラー）のJSON化
//!
//! ## API エンドポイント
//! - `GET /` — 死活確認（`STATIC_DIR` 設定時は index.html）
//! - `POST /upload` — ファイル中継
//! - `GET /files` — アップロード先フォルダの一覧

mod auth;
mod config;
mod endpoints;
mod error;
mod storage;

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Request};
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use config::{RelayConfig, RelayState};
use endpoints::{handle_health, handle_list_files, handle_upload};
use error::RelayError;
use storage::GoogleDriveStorage;

/// 上限超過時の `error` 文字列
const LENGTH_LIMIT_MESSAGE: &str = "length limit exceeded";

/// ルーターを構築する。
///
/// `MAX_UPLOAD_BYTES` 設定時はハンドラの手前でボディサイズを制限する。
/// 未設定時はaxumの既定上限も外し、アップロードサイズを制限しない。
pub(crate) fn build_router(state: Arc<RelayState>) -> axum::Router {
    let mut router = axum::Router::new()
        .route("/upload", post(handle_upload))
        .route("/files", get(handle_list_files));

    // index.html が無い静的ディレクトリでも / は死活確認として応答させる
    router = match &state.config.static_dir {
        Some(dir) => {
            let index = dir.join("index.html");
            let router = if index.is_file() {
                router.route_service("/", ServeFile::new(index))
            } else {
                tracing::warn!(dir = %dir.display(), "index.htmlが無いため / は死活メッセージを返します");
                router.route("/", get(handle_health))
            };
            router.fallback_service(ServeDir::new(dir))
        }
        None => router.route("/", get(handle_health)),
    };

    router = router.layer(DefaultBodyLimit::disable());
    if let Some(limit) = state.config.max_upload_bytes {
        router = router
            .layer(RequestBodyLimitLayer::new(limit))
            .layer(middleware::from_fn(payload_too_large_as_json));
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

/// ボディ上限レイヤーが返すテキストの413を、ハンドラと同じ失敗JSONに揃える。
async fn payload_too_large_as_json(request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .is_some_and(|v| v.as_bytes().starts_with(b"application/json"));
    if response.status() == StatusCode::PAYLOAD_TOO_LARGE && !is_json {
        return RelayError::PayloadTooLarge(LENGTH_LIMIT_MESSAGE.to_string()).into_response();
    }
    response
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "drive_relay_gateway=info,tower_http=info".into()),
        )
        .init();

    // 環境変数の読み込み（FOLDER_ID 未設定なら起動しない）
    let config = RelayConfig::from_env()?;
    tracing::info!(
        folder_id = %config.folder_id,
        credentials = %config.credentials_path.display(),
        max_upload_bytes = ?config.max_upload_bytes,
        debug = config.debug,
        "設定を読み込みました"
    );
    if config.debug {
        tracing::warn!("DEBUGが有効です。失敗レスポンスにトレースが含まれます");
    }

    // Driveクライアント（全リクエストで共有）
    let storage = GoogleDriveStorage::from_config(&config, reqwest::Client::new()).await?;

    let addr = config.bind_addr();
    let state = Arc::new(RelayState {
        config,
        storage: Box::new(storage),
    });

    let app = build_router(state);

    tracing::info!("Relayを {} で起動します", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
