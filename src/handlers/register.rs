use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::AppError;
use crate::services::credentials::hash_password;
use crate::services::password_reset::MIN_PASSWORD_LEN;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String, // Deserialize後すぐハッシュ化するためSecretBox不要
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub id: Uuid,
    pub email: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// アカウント登録ハンドラー
///
/// POST /auth/register
///
/// # Security
/// - パスワードはログに出力しない
/// - パスワードは即座にハッシュ化
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>, AppError> {
    // バリデーション
    validate_register_request(&request)?;

    // パスワードハッシュ化
    let password_hash = hash_password(&request.password)?;

    let account = state
        .account_repo
        .create_account(request.email.trim(), &password_hash)
        .await
        .map_err(|e| {
            // UNIQUE制約違反チェック（メールアドレスは大文字小文字を区別せず一意）
            if let sqlx::Error::Database(db_err) = &e
                && db_err.constraint() == Some("accounts_email_key")
            {
                return AppError::EmailAlreadyExists;
            }
            AppError::Database(e)
        })?;

    tracing::info!(account_id = %account.id, "アカウント登録成功");

    Ok(Json(RegisterResponse {
        id: account.id,
        email: account.email,
        created_at: account.created_at,
    }))
}

/// 登録リクエストのバリデーション
fn validate_register_request(request: &RegisterRequest) -> Result<(), AppError> {
    // email: 必須、メール形式
    if request.email.trim().is_empty() {
        return Err(AppError::Validation(
            "メールアドレスは必須です".to_string(),
        ));
    }
    if !request.email.contains('@') {
        return Err(AppError::Validation(
            "有効なメールアドレスを入力してください".to_string(),
        ));
    }
    // password: リセットフローと同じポリシー
    if request.password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::PasswordTooShort);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_validate_empty_email() {
        let result = validate_register_request(&request("", "secret123"));
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_invalid_email() {
        let result = validate_register_request(&request("invalid-email", "secret123"));
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_short_password() {
        let result = validate_register_request(&request("test@example.com", "12345"));
        assert!(matches!(result, Err(AppError::PasswordTooShort)));
    }

    #[test]
    fn test_validate_valid_request() {
        let result = validate_register_request(&request("test@example.com", "secret123"));
        assert!(result.is_ok());
    }
}
