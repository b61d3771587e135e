use sqlx::{PgPool, Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::models::ResetToken;

/// リセットトークンの永続化層
///
/// トークンはハッシュをキーに保存する。読み取りで行を削除することはない。
#[derive(Clone)]
pub struct ResetTokenRepository {
    pool: PgPool,
}

impl ResetTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 新しいトークンを作成し、同一アカウントの既存ライブトークンを置換する
    ///
    /// 同一アカウントへの同時発行を直列化するため、アカウント行をロックした上で
    /// supersede → insert を1トランザクションで行う。完了時点でライブなトークンは
    /// 必ず1件（今回挿入した行）になる。
    pub async fn create_superseding(
        &self,
        account_id: Uuid,
        token_hash: &str,
        issued_at: OffsetDateTime,
        expires_at: OffsetDateTime,
    ) -> Result<ResetToken, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        // アカウント単位の発行順序を保証する行ロック
        sqlx::query("SELECT id FROM accounts WHERE id = $1 FOR UPDATE")
            .bind(account_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            UPDATE reset_tokens
            SET superseded_at = $2
            WHERE account_id = $1
              AND consumed_at IS NULL
              AND superseded_at IS NULL
            "#,
        )
        .bind(account_id)
        .bind(issued_at)
        .execute(&mut *tx)
        .await?;

        let token = sqlx::query_as::<_, ResetToken>(
            r#"
            INSERT INTO reset_tokens (account_id, token_hash, issued_at, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, account_id, token_hash, issued_at, expires_at, consumed_at, superseded_at
            "#,
        )
        .bind(account_id)
        .bind(token_hash)
        .bind(issued_at)
        .bind(expires_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(token)
    }

    /// トークンハッシュでトークンを検索
    ///
    /// # Note
    /// 有効期限・使用済み・置換済みの検証は呼び出し側（Verifier）で行う
    pub async fn find_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<ResetToken>, sqlx::Error> {
        sqlx::query_as::<_, ResetToken>(
            r#"
            SELECT id, account_id, token_hash, issued_at, expires_at, consumed_at, superseded_at
            FROM reset_tokens
            WHERE token_hash = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
    }

    /// トークンを消費する（compare-and-set）
    ///
    /// `consumed_at` が未設定の場合のみ設定する。同一トークンでの同時リセットは
    /// ここで決着し、敗者には false が返る。パスワード更新と同一トランザクションで
    /// 呼ぶこと。
    pub async fn consume(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
        consumed_at: OffsetDateTime,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE reset_tokens
            SET consumed_at = $2
            WHERE id = $1 AND consumed_at IS NULL
            "#,
        )
        .bind(id)
        .bind(consumed_at)
        .execute(&mut **tx)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// 期限切れトークンを削除
    ///
    /// 正しさは保存済みタイムスタンプの判定だけで担保されるため、
    /// これは純粋な掃除処理。
    ///
    /// # Returns
    /// 削除された行数
    pub async fn delete_expired(&self) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM reset_tokens
            WHERE expires_at < NOW()
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
