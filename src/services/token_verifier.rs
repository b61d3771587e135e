use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::ResetToken;
use crate::repositories::ResetTokenRepository;
use crate::services::token_issuer::hash_token;

/// トークン状態の検証（純粋関数）
///
/// ライブ（未失効・未使用・未置換）なら Ok。判定は保存済みタイムスタンプと
/// リクエスト時刻の比較のみで、状態は一切変更しない。
pub fn check_state(token: &ResetToken, now: OffsetDateTime) -> Result<(), AppError> {
    if now >= token.expires_at {
        return Err(AppError::TokenExpired);
    }
    if token.consumed_at.is_some() {
        return Err(AppError::TokenAlreadyUsed);
    }
    if token.superseded_at.is_some() {
        return Err(AppError::TokenSuperseded);
    }
    Ok(())
}

/// トークン検証サービス
///
/// 読み取り専用。リトライしても副作用はない。
#[derive(Clone)]
pub struct TokenVerifier {
    token_repo: ResetTokenRepository,
}

impl TokenVerifier {
    pub fn new(token_repo: ResetTokenRepository) -> Self {
        Self { token_repo }
    }

    /// 提示されたトークンを検証し、所有アカウントIDを返す
    pub async fn verify(&self, raw_token: &str) -> Result<Uuid, AppError> {
        let token = self.resolve_live(raw_token).await?;
        Ok(token.account_id)
    }

    /// ライブなトークンを解決して返す（Executor が消費対象を特定するために使う）
    pub async fn resolve_live(&self, raw_token: &str) -> Result<ResetToken, AppError> {
        let token_hash = hash_token(raw_token);

        // 偽造・破損トークンはハッシュ不一致として同じ経路に落ちる
        let token = self
            .token_repo
            .find_by_token_hash(&token_hash)
            .await?
            .ok_or(AppError::TokenNotFound)?;

        check_state(&token, OffsetDateTime::now_utc())?;

        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    fn token(
        expired: bool,
        consumed: bool,
        superseded: bool,
        now: OffsetDateTime,
    ) -> ResetToken {
        let issued_at = now - Duration::minutes(30);
        let expires_at = if expired {
            now - Duration::minutes(1)
        } else {
            now + Duration::minutes(30)
        };
        ResetToken {
            id: Uuid::new_v4(),
            account_id: Uuid::new_v4(),
            token_hash: hash_token("dummy"),
            issued_at,
            expires_at,
            consumed_at: consumed.then_some(issued_at + Duration::minutes(5)),
            superseded_at: superseded.then_some(issued_at + Duration::minutes(10)),
        }
    }

    /// (失効, 使用済み, 置換済み) の全組み合わせで、
    /// 3条件すべてが偽のときに限り検証が通る
    #[test]
    fn test_check_state_cross_product() {
        let now = OffsetDateTime::now_utc();
        for expired in [false, true] {
            for consumed in [false, true] {
                for superseded in [false, true] {
                    let t = token(expired, consumed, superseded, now);
                    let result = check_state(&t, now);
                    if !expired && !consumed && !superseded {
                        assert!(result.is_ok());
                    } else {
                        assert!(result.is_err());
                    }
                }
            }
        }
    }

    #[test]
    fn test_check_state_expired() {
        let now = OffsetDateTime::now_utc();
        let t = token(true, false, false, now);
        assert!(matches!(check_state(&t, now), Err(AppError::TokenExpired)));
    }

    #[test]
    fn test_check_state_consumed() {
        let now = OffsetDateTime::now_utc();
        let t = token(false, true, false, now);
        assert!(matches!(
            check_state(&t, now),
            Err(AppError::TokenAlreadyUsed)
        ));
    }

    #[test]
    fn test_check_state_superseded() {
        let now = OffsetDateTime::now_utc();
        let t = token(false, false, true, now);
        assert!(matches!(
            check_state(&t, now),
            Err(AppError::TokenSuperseded)
        ));
    }

    /// TTL(1時間)発行のトークンは61分後には失効している
    #[test]
    fn test_check_state_after_ttl_elapsed() {
        let issued_at = OffsetDateTime::now_utc();
        let t = ResetToken {
            id: Uuid::new_v4(),
            account_id: Uuid::new_v4(),
            token_hash: hash_token("dummy"),
            issued_at,
            expires_at: issued_at + Duration::hours(1),
            consumed_at: None,
            superseded_at: None,
        };
        assert!(check_state(&t, issued_at + Duration::minutes(59)).is_ok());
        assert!(matches!(
            check_state(&t, issued_at + Duration::minutes(61)),
            Err(AppError::TokenExpired)
        ));
    }
}
