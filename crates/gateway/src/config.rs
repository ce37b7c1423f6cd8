//! # Relay設定・共有状態
//!
//! 環境変数からの設定読み込みとRelayの共有状態の定義。
//! 設定は起動時に一度だけ読み込まれ、以後変更されない。

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use anyhow::{anyhow, Context};

use crate::storage::DriveStorage;

/// サービスアカウント鍵ファイルのデフォルトパス
pub const DEFAULT_CREDENTIALS_PATH: &str = "service-account.json";
/// Drive APIのデフォルトスコープ（Relayが作成したファイルのみ操作可能）
pub const DEFAULT_DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive.file";
/// デフォルト待ち受けポート
pub const DEFAULT_PORT: u16 = 5000;

/// 起動時に確定するRelay設定。
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// サービスアカウント鍵ファイル（`GOOGLE_APPLICATION_CREDENTIALS`）
    pub credentials_path: PathBuf,
    /// アップロード先フォルダID（`FOLDER_ID`、必須）
    pub folder_id: String,
    /// 待ち受けアドレス（`HOST`）
    pub host: IpAddr,
    /// 待ち受けポート（`PORT`）
    pub port: u16,
    /// リクエストボディ上限（`MAX_UPLOAD_BYTES`）。Noneなら無制限。
    pub max_upload_bytes: Option<usize>,
    /// 失敗レスポンスにトレースを含めるか（`DEBUG`）
    pub debug: bool,
    /// `/` で配信する静的ファイルディレクトリ（`STATIC_DIR`）
    pub static_dir: Option<PathBuf>,
    /// OAuthスコープ（`DRIVE_SCOPE`）
    pub drive_scope: String,
    /// Drive APIのベースURL上書き（`DRIVE_API_BASE`、エミュレータ・プロキシ用）
    pub drive_api_base: Option<String>,
}

impl RelayConfig {
    /// プロセス環境変数から構築する。
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 任意のキー参照関数から構築する。空文字列は未設定として扱う。
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let folder_id = get("FOLDER_ID")
            .ok_or_else(|| anyhow!("FOLDER_IDが設定されていません"))?
            .trim()
            .to_string();

        let credentials_path = get("GOOGLE_APPLICATION_CREDENTIALS")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CREDENTIALS_PATH));

        let host = match get("HOST") {
            Some(v) => v
                .trim()
                .parse()
                .with_context(|| format!("HOSTが不正です: {v}"))?,
            None => IpAddr::from([0, 0, 0, 0]),
        };

        let port = match get("PORT") {
            Some(v) => v
                .trim()
                .parse()
                .with_context(|| format!("PORTが不正です: {v}"))?,
            None => DEFAULT_PORT,
        };

        let max_upload_bytes = get("MAX_UPLOAD_BYTES")
            .map(|v| {
                v.trim()
                    .parse::<usize>()
                    .with_context(|| format!("MAX_UPLOAD_BYTESが不正です: {v}"))
            })
            .transpose()?;

        Ok(Self {
            credentials_path,
            folder_id,
            host,
            port,
            max_upload_bytes,
            debug: get("DEBUG").is_some_and(|v| is_truthy(&v)),
            static_dir: get("STATIC_DIR").map(PathBuf::from),
            drive_scope: get("DRIVE_SCOPE").unwrap_or_else(|| DEFAULT_DRIVE_SCOPE.to_string()),
            drive_api_base: get("DRIVE_API_BASE"),
        })
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Relayの共有状態。全リクエストから読み取り専用で共有される。
pub struct RelayState {
    pub config: RelayConfig,
    /// Driveバックエンド（トレイトで抽象化）
    pub storage: Box<dyn DriveStorage>,
}
