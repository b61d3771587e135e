use std::sync::Arc;

use sqlx::PgPool;
use time::OffsetDateTime;

use crate::config::Config;
use crate::error::AppError;
use crate::repositories::{AccountRepository, ResetTokenRepository};
use crate::services::MailSender;
use crate::services::credentials::hash_password;
use crate::services::token_issuer::TokenIssuer;
use crate::services::token_verifier::TokenVerifier;

/// パスワードポリシー: 最小文字数
///
/// 追加の強度チェックは外部の共通チェッカーの責務。
pub const MIN_PASSWORD_LEN: usize = 6;

/// パスワードリセットサービス
///
/// リセット要求（トークン発行＋メール）とリセット実行（資格情報更新＋トークン消費）
/// の2操作を提供する。
#[derive(Clone)]
pub struct PasswordResetService {
    db_pool: PgPool,
    account_repo: AccountRepository,
    token_repo: ResetTokenRepository,
    issuer: TokenIssuer,
    verifier: TokenVerifier,
    mail_sender: MailSender,
    config: Arc<Config>,
}

impl PasswordResetService {
    pub fn new(
        db_pool: PgPool,
        account_repo: AccountRepository,
        token_repo: ResetTokenRepository,
        mail_sender: MailSender,
        config: Arc<Config>,
    ) -> Self {
        let issuer = TokenIssuer::new(token_repo.clone(), config.clone());
        let verifier = TokenVerifier::new(token_repo.clone());
        Self {
            db_pool,
            account_repo,
            token_repo,
            issuer,
            verifier,
            mail_sender,
            config,
        }
    }

    /// パスワードリセットをリクエスト
    ///
    /// 未登録メールアドレスには EMAIL_NOT_FOUND を返す（トークンは作成しない）。
    /// メール送信は発行と切り離したベストエフォート: 送信失敗しても
    /// 発行済みトークンは有効なまま。
    ///
    /// # Security
    /// - 平文トークンはログに出力しない
    pub async fn request_reset(&self, email: &str) -> Result<(), AppError> {
        let account = self.account_repo.find_by_email(email).await?;

        let account = match account {
            Some(a) => a,
            None => {
                tracing::info!(email = %email, "リセット要求: 未登録メールアドレス");
                return Err(AppError::EmailNotFound);
            }
        };

        let raw_token = self.issuer.issue(account.id).await?;
        let reset_url = build_reset_url(self.config.reset_url_base.as_deref(), &raw_token);

        // fire-and-forget。配送結果は発行の成否に影響しない
        let mailer = self.mail_sender.clone();
        let to = account.email.clone();
        tokio::spawn(async move {
            if let Err(e) = mailer.send_password_reset_email(&to, &reset_url).await {
                tracing::warn!(error = ?e, "リセットメールの送信に失敗（トークンは有効なまま）");
            }
        });

        tracing::info!(account_id = %account.id, "パスワードリセット要求を受理");

        Ok(())
    }

    /// パスワードをリセット
    ///
    /// 資格情報の更新とトークン消費は同一トランザクションで確定する。
    /// 更新に失敗した場合トークンは消費されず、同じトークンで再試行できる。
    /// 消費は compare-and-set なので、同時実行しても成功は1回だけ。
    ///
    /// # Security
    /// - トークン・新パスワードはログに出力しない
    pub async fn reset_password(&self, raw_token: &str, new_password: &str) -> Result<(), AppError> {
        if new_password.len() < MIN_PASSWORD_LEN {
            return Err(AppError::PasswordTooShort);
        }

        let token = self.verifier.resolve_live(raw_token).await?;

        let password_hash = hash_password(new_password)?;
        let now = OffsetDateTime::now_utc();

        let mut tx = self.db_pool.begin().await?;

        self.account_repo
            .update_password(&mut tx, token.account_id, &password_hash)
            .await?;

        let claimed = self.token_repo.consume(&mut tx, token.id, now).await?;
        if !claimed {
            // 同時実行の相手が先に消費した
            tx.rollback().await?;
            tracing::warn!(token_id = %token.id, "トークンは既に消費済み");
            return Err(AppError::TokenAlreadyUsed);
        }

        tx.commit().await?;

        tracing::info!(account_id = %token.account_id, "パスワードリセット完了");

        Ok(())
    }
}

/// リセットURLを構築
fn build_reset_url(base: Option<&str>, token: &str) -> String {
    match base {
        Some(base) => format!("{}?token={}", base, token),
        None => format!("http://localhost:3000/auth/reset-password?token={}", token),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_reset_url_with_base() {
        let url = build_reset_url(Some("https://example.com/auth/reset-password"), "tok123");
        assert_eq!(url, "https://example.com/auth/reset-password?token=tok123");
    }

    #[test]
    fn test_build_reset_url_default_base() {
        let url = build_reset_url(None, "tok123");
        assert_eq!(url, "http://localhost:3000/auth/reset-password?token=tok123");
    }
}
