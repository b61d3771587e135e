use std::sync::Arc;

use crate::config::Config;
use crate::error::AppError;

/// メール送信サービス
///
/// 配送はベストエフォート。送信失敗してもトークン発行はロールバックされない
/// （呼び出し側が発行と切り離して呼ぶ）。
/// リセットURLには平文トークンが含まれるため、URL自体はログに出力しない。
#[derive(Clone)]
pub struct MailSender {
    #[cfg_attr(not(feature = "email"), allow(dead_code))]
    config: Arc<Config>,
}

impl MailSender {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    /// パスワードリセットリンクを送信
    pub async fn send_password_reset_email(
        &self,
        to: &str,
        reset_url: &str,
    ) -> Result<(), AppError> {
        #[cfg(feature = "email")]
        if self.smtp_configured() {
            return self.send_via_smtp(to, reset_url).await;
        }

        // SMTP未設定（開発環境）: 送信せず受信者のみ記録する
        let _ = reset_url;
        tracing::info!(to = %to, "パスワードリセットメール送信（開発モード・送信スキップ）");

        Ok(())
    }

    #[cfg(feature = "email")]
    fn smtp_configured(&self) -> bool {
        self.config.smtp_host.is_some()
            && self.config.smtp_username.is_some()
            && self.config.smtp_password.is_some()
            && self.config.smtp_from_address.is_some()
    }

    #[cfg(feature = "email")]
    async fn send_via_smtp(&self, to: &str, reset_url: &str) -> Result<(), AppError> {
        use lettre::message::header::ContentType;
        use lettre::transport::smtp::authentication::Credentials;
        use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
        use secrecy::ExposeSecret;

        // smtp_configured() 確認済みのため unwrap ではなく安全に取り出す
        let (Some(host), Some(username), Some(password), Some(from)) = (
            self.config.smtp_host.as_deref(),
            self.config.smtp_username.as_ref(),
            self.config.smtp_password.as_ref(),
            self.config.smtp_from_address.as_deref(),
        ) else {
            return Err(AppError::Internal(anyhow::anyhow!("smtp not configured")));
        };

        let message = Message::builder()
            .from(from
                .parse()
                .map_err(|e| AppError::Internal(anyhow::anyhow!("from address parse: {e}")))?)
            .to(to
                .parse()
                .map_err(|e| AppError::Internal(anyhow::anyhow!("to address parse: {e}")))?)
            .subject("パスワード再設定のご案内")
            .header(ContentType::TEXT_PLAIN)
            .body(format!(
                "以下のリンクからパスワードを再設定してください。\n\n{}\n\nこのリンクの有効期限は1時間です。心当たりがない場合はこのメールを破棄してください。",
                reset_url
            ))
            .map_err(|e| AppError::Internal(anyhow::anyhow!("mail build error: {e}")))?;

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("smtp relay error: {e}")))?
            .port(self.config.smtp_port)
            .credentials(Credentials::new(
                username.expose_secret().clone(),
                password.expose_secret().clone(),
            ))
            .build();

        mailer
            .send(message)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("smtp send error: {e}")))?;

        tracing::info!(to = %to, "パスワードリセットメール送信完了");

        Ok(())
    }
}
