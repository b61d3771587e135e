use std::sync::Arc;

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::config::Config;
use crate::error::AppError;
use crate::repositories::ResetTokenRepository;

/// 32バイトのランダムトークンを生成（URLセーフBase64、パディングなし）
///
/// OSのCSPRNGから取得する。推測不能であることが前提なので、
/// 生成した平文はログに出力しないこと。
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// トークンをSHA-256でハッシュ化（16進文字列）
///
/// DBにはこのハッシュだけを保存する。ストアが漏えいしても
/// 平文トークンは復元できない。
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// トークン発行サービス
///
/// 発行と同時に同一アカウントの既存ライブトークンを置換するため、
/// ライブなトークンは常にアカウントあたり最大1件。
#[derive(Clone)]
pub struct TokenIssuer {
    token_repo: ResetTokenRepository,
    config: Arc<Config>,
}

impl TokenIssuer {
    pub fn new(token_repo: ResetTokenRepository, config: Arc<Config>) -> Self {
        Self { token_repo, config }
    }

    /// アカウントに対して新しいリセットトークンを発行し、平文を返す
    ///
    /// 平文は呼び出し側がリセットリンクに埋め込んでメール送信する。
    /// DBに残るのはハッシュのみ。
    pub async fn issue(&self, account_id: Uuid) -> Result<String, AppError> {
        let raw_token = generate_token();
        let token_hash = hash_token(&raw_token);

        let issued_at = OffsetDateTime::now_utc();
        let expires_at = issued_at + Duration::seconds(self.config.reset_token_ttl_secs);

        self.token_repo
            .create_superseding(account_id, &token_hash, issued_at, expires_at)
            .await?;

        tracing::info!(account_id = %account_id, "リセットトークン発行");

        Ok(raw_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_token_length() {
        // 32バイト → Base64(パディングなし)で43文字
        let token = generate_token();
        assert_eq!(token.len(), 43);
    }

    #[test]
    fn test_generate_token_is_url_safe() {
        let token = generate_token();
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn test_generate_token_unique() {
        let a = generate_token();
        let b = generate_token();
        assert_ne!(a, b);
    }

    #[test]
    fn test_hash_token_known_vector() {
        // SHA-256("abc")
        assert_eq!(
            hash_token("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_hash_token_deterministic() {
        let token = generate_token();
        assert_eq!(hash_token(&token), hash_token(&token));
        assert_ne!(hash_token(&token), token);
    }
}
