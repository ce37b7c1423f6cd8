//! # Google Drive ストレージ実装
//!
//! Drive API v3 を reqwest で直接呼び出す。
//! アップロードは `uploadType=multipart` の単発リクエストで、メタデータJSONと
//! ファイル本体を `multipart/related` ボディとしてストリーミング送信する。

use anyhow::Context;
use bytes::Bytes;
use drive_relay_types::{DriveFile, DriveFileEntry, DriveFileList, FileMetadata};
use futures::stream::{self, Stream, StreamExt};
use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{DriveStorage, MediaStream, MediaUpload};
use crate::auth::ServiceAccountAuth;
use crate::config::RelayConfig;
use crate::error::RelayError;

/// Drive APIのベースURL
pub const DRIVE_API_BASE: &str = "https://www.googleapis.com";

const CREATE_FIELDS: &str = "id,name,webViewLink";
const LIST_FIELDS: &str = "nextPageToken,files(id,name,webViewLink,createdTime)";

/// Drive APIのエラーエンベロープ `{"error": {"code", "message", "errors"}}`。
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// Google Driveによるストレージ実装。
pub struct GoogleDriveStorage {
    auth: ServiceAccountAuth,
    http_client: reqwest::Client,
    /// メタデータAPI（files.list）のベースURL
    api_base: String,
    /// アップロードAPI（files.create）のベースURL
    upload_base: String,
}

impl GoogleDriveStorage {
    pub fn new(auth: ServiceAccountAuth, http_client: reqwest::Client) -> Self {
        Self {
            auth,
            http_client,
            api_base: DRIVE_API_BASE.to_string(),
            upload_base: DRIVE_API_BASE.to_string(),
        }
    }

    /// APIのベースURLを差し替える（テスト・エミュレータ用）。
    pub fn with_base_urls(mut self, api_base: &str, upload_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self.upload_base = upload_base.trim_end_matches('/').to_string();
        self
    }

    /// 設定の鍵ファイルとスコープから構築する。
    pub async fn from_config(
        config: &RelayConfig,
        http_client: reqwest::Client,
    ) -> anyhow::Result<Self> {
        let auth =
            ServiceAccountAuth::from_file(&config.credentials_path, config.drive_scope.clone())
                .await?;
        tracing::info!(
            client_email = %auth.client_email(),
            scope = %config.drive_scope,
            "サービスアカウント鍵を読み込みました"
        );

        let storage = Self::new(auth, http_client);
        Ok(match &config.drive_api_base {
            Some(base) => storage.with_base_urls(base, base),
            None => storage,
        })
    }
}

#[async_trait::async_trait]
impl DriveStorage for GoogleDriveStorage {
    async fn create_file(
        &self,
        metadata: FileMetadata,
        media: MediaUpload,
    ) -> Result<DriveFile, RelayError> {
        let token = self.auth.access_token().await?;

        let boundary = format!("drive-relay-{}", uuid::Uuid::new_v4().simple());
        let metadata_json =
            serde_json::to_string(&metadata).context("メタデータのシリアライズに失敗")?;
        let body = related_body(&boundary, &metadata_json, &media.mime_type, media.content);

        let response = self
            .http_client
            .post(format!("{}/upload/drive/v3/files", self.upload_base))
            .query(&[
                ("uploadType", "multipart"),
                ("fields", CREATE_FIELDS),
                ("supportsAllDrives", "true"),
            ])
            .bearer_auth(token)
            .header(
                CONTENT_TYPE,
                format!("multipart/related; boundary={boundary}"),
            )
            .body(reqwest::Body::wrap_stream(body))
            .send()
            .await
            .context("Drive APIへのアップロード送信に失敗")?;

        read_drive_response(response).await
    }

    async fn list_files(&self, folder_id: &str) -> Result<Vec<DriveFileEntry>, RelayError> {
        let token = self.auth.access_token().await?;
        let query = format!("'{}' in parents", escape_query_literal(folder_id));

        let mut files = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut request = self
                .http_client
                .get(format!("{}/drive/v3/files", self.api_base))
                .query(&[
                    ("q", query.as_str()),
                    ("fields", LIST_FIELDS),
                    ("supportsAllDrives", "true"),
                    ("includeItemsFromAllDrives", "true"),
                ])
                .bearer_auth(&token);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let response = request
                .send()
                .await
                .context("Drive APIへの一覧取得送信に失敗")?;
            let page: DriveFileList = read_drive_response(response).await?;
            files.extend(page.files);

            match page.next_page_token {
                Some(next) if !next.is_empty() => page_token = Some(next),
                _ => break,
            }
        }

        Ok(files)
    }
}

/// `multipart/related` ボディ（メタデータパート + メディアパート）を組み立てる。
/// メディア部分はコピーせずにそのまま流す。
fn related_body(
    boundary: &str,
    metadata_json: &str,
    mime_type: &str,
    content: MediaStream,
) -> impl Stream<Item = Result<Bytes, std::io::Error>> + Send + 'static {
    let head = Bytes::from(format!(
        "--{boundary}\r\n\
         Content-Type: application/json; charset=UTF-8\r\n\r\n\
         {metadata_json}\r\n\
         --{boundary}\r\n\
         Content-Type: {mime_type}\r\n\r\n"
    ));
    let tail = Bytes::from(format!("\r\n--{boundary}--\r\n"));

    stream::once(async move { Ok(head) })
        .chain(content)
        .chain(stream::once(async move { Ok(tail) }))
}

/// Drive APIのレスポンスを読み取る。非2xxは構造化エラーとして分類する。
async fn read_drive_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, RelayError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .context("Drive APIレスポンスの読み取りに失敗")?;

    if !status.is_success() {
        return Err(classify_error(status, body));
    }

    let parsed = serde_json::from_str(&body)
        .with_context(|| format!("Drive APIレスポンスのパースに失敗: {body}"))?;
    Ok(parsed)
}

/// 非2xxレスポンスを `RelayError::DriveApi` に変換する。
/// エラーエンベロープの `message` を詳細として保持し、パースできなければボディ全文を使う。
fn classify_error(status: reqwest::StatusCode, body: String) -> RelayError {
    let detail = match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(envelope) if !envelope.error.message.is_empty() => envelope.error.message,
        _ if !body.trim().is_empty() => body.trim().to_string(),
        _ => status.to_string(),
    };

    RelayError::DriveApi {
        status: status.as_u16(),
        detail,
        body,
    }
}

/// Driveクエリ文字列リテラル内の `\` と `'` をエスケープする。
fn escape_query_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}
