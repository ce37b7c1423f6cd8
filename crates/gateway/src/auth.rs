//! # サービスアカウント認証
//!
//! サービスアカウント鍵から yup-oauth2 の認証器を構築し、Drive APIの
//! アクセストークンを取得する。
//!
//! トークンは認証器内部でキャッシュされ、期限切れ前に自動で再取得される。
//! 認証器は全リクエストから並行に共有できる。

use std::path::Path;

use anyhow::{anyhow, Context};
use yup_oauth2::authenticator::DefaultAuthenticator;
use yup_oauth2::{ServiceAccountAuthenticator, ServiceAccountKey};

/// 鍵ファイルに記載される標準のトークンエンドポイント
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// サービスアカウントによるアクセストークン発行器。
pub struct ServiceAccountAuth {
    authenticator: DefaultAuthenticator,
    client_email: String,
    scope: String,
}

impl ServiceAccountAuth {
    /// 鍵ファイルを読み込んで構築する。
    pub async fn from_file(path: &Path, scope: impl Into<String>) -> anyhow::Result<Self> {
        let key = yup_oauth2::read_service_account_key(path)
            .await
            .with_context(|| {
                format!("サービスアカウント鍵の読み込みに失敗: {}", path.display())
            })?;
        Self::new(key, scope).await
    }

    /// 鍵とスコープから構築する。秘密鍵のPEMはここで検証される。
    pub async fn new(key: ServiceAccountKey, scope: impl Into<String>) -> anyhow::Result<Self> {
        let client_email = key.client_email.clone();
        let authenticator = ServiceAccountAuthenticator::builder(key)
            .build()
            .await
            .context("サービスアカウント認証器の構築に失敗")?;

        Ok(Self {
            authenticator,
            client_email,
            scope: scope.into(),
        })
    }

    pub fn client_email(&self) -> &str {
        &self.client_email
    }

    /// アクセストークンを取得する。有効なキャッシュがあればそれを返す。
    pub async fn access_token(&self) -> anyhow::Result<String> {
        let token = self
            .authenticator
            .token(&[self.scope.as_str()])
            .await
            .context("アクセストークンの取得に失敗")?;

        token
            .token()
            .map(str::to_string)
            .ok_or_else(|| anyhow!("トークンエンドポイントがアクセストークンを返しませんでした"))
    }
}
