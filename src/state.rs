use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::repositories::{AccountRepository, ResetTokenRepository};
use crate::services::MailSender;

/// アプリケーション共有状態
///
/// axum の State として全ハンドラーで共有される。
/// Clone は必須（axum が内部で clone するため）。
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL コネクションプール
    pub db_pool: PgPool,
    /// アプリケーション設定（Arc で共有）
    pub config: Arc<Config>,
    /// アカウントリポジトリ
    pub account_repo: AccountRepository,
    /// リセットトークンリポジトリ
    pub token_repo: ResetTokenRepository,
    /// メール送信サービス
    pub mail_sender: MailSender,
}

impl AppState {
    /// 新しい AppState を作成
    pub fn new(db_pool: PgPool, config: Config) -> Self {
        let config = Arc::new(config);
        let account_repo = AccountRepository::new(db_pool.clone());
        let token_repo = ResetTokenRepository::new(db_pool.clone());
        let mail_sender = MailSender::new(config.clone());

        Self {
            db_pool,
            config,
            account_repo,
            token_repo,
            mail_sender,
        }
    }
}
