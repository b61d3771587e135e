use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// パスワードリセットトークン
///
/// 平文トークンはメールで送るのみで、DBには SHA-256 ハッシュだけを保存する。
/// 状態は前方向にのみ遷移する: live → consumed / expired / superseded。
/// expired は時刻経過だけで到達する（明示的な遷移処理はない）。
#[derive(Debug, FromRow, Serialize)]
pub struct ResetToken {
    pub id: Uuid,
    pub account_id: Uuid,
    #[serde(skip)]
    pub token_hash: String,
    pub issued_at: OffsetDateTime,
    pub expires_at: OffsetDateTime,
    /// 使用済みなら Some。一度設定されたら二度と戻らない。
    pub consumed_at: Option<OffsetDateTime>,
    /// 同一アカウントに新しいトークンが発行されたら Some。
    pub superseded_at: Option<OffsetDateTime>,
}
