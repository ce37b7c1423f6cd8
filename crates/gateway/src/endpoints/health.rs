//! # GET /
//!
//! 死活確認。Driveには触れない。

/// 死活確認用の固定メッセージ
pub const LIVENESS_MESSAGE: &str = "✅ File upload service is running!";

/// GET / — プロセスが応答可能であることを返す。
pub async fn handle_health() -> &'static str {
    LIVENESS_MESSAGE
}
