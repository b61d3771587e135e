use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::services::PasswordResetService;
use crate::services::password_reset::MIN_PASSWORD_LEN;
use crate::state::AppState;

// === リセット要求 ===

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct ForgotPasswordResponse {
    pub message: String,
}

/// POST /auth/forgot-password
///
/// 未登録メールアドレスは 404 EMAIL_NOT_FOUND を返す。
/// 登録済みなら、メール配送の成否にかかわらず同じ成功メッセージを返す。
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(request): Json<ForgotPasswordRequest>,
) -> Result<Json<ForgotPasswordResponse>, AppError> {
    // バリデーション（ストアアクセス前に弾く）
    let email = request.email.trim().to_string();
    validate_email(&email)?;

    let service = PasswordResetService::new(
        state.db_pool.clone(),
        state.account_repo.clone(),
        state.token_repo.clone(),
        state.mail_sender.clone(),
        state.config.clone(),
    );
    service.request_reset(&email).await?;

    Ok(Json(ForgotPasswordResponse {
        message: "パスワード再設定用のリンクをメールで送信しました".to_string(),
    }))
}

// === リセット実行 ===

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
    /// クライアント側で確認済みの場合は省略可
    #[serde(default)]
    pub confirm_password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ResetPasswordResponse {
    pub message: String,
}

/// POST /auth/reset-password
///
/// トークン状態による失敗はすべて「無効または期限切れのリンク」に
/// 畳み込まれてクライアントに返る（error.rs 参照）。
///
/// # Security
/// - token, password はログに出力しない
pub async fn reset_password(
    State(state): State<AppState>,
    Json(request): Json<ResetPasswordRequest>,
) -> Result<Json<ResetPasswordResponse>, AppError> {
    // バリデーション（ストアアクセス前に弾く）
    validate_reset_password_request(&request)?;

    let service = PasswordResetService::new(
        state.db_pool.clone(),
        state.account_repo.clone(),
        state.token_repo.clone(),
        state.mail_sender.clone(),
        state.config.clone(),
    );
    service
        .reset_password(request.token.trim(), &request.password)
        .await?;

    Ok(Json(ResetPasswordResponse {
        message: "パスワードを更新しました".to_string(),
    }))
}

/// メールアドレスのバリデーション
fn validate_email(email: &str) -> Result<(), AppError> {
    if email.is_empty() {
        return Err(AppError::Validation(
            "メールアドレスを入力してください".to_string(),
        ));
    }
    if !email.contains('@') {
        return Err(AppError::Validation(
            "有効なメールアドレスを入力してください".to_string(),
        ));
    }
    Ok(())
}

/// リセット実行リクエストのバリデーション
///
/// 検査順: トークン有無 → 確認パスワード一致 → 文字数
fn validate_reset_password_request(request: &ResetPasswordRequest) -> Result<(), AppError> {
    if request.token.trim().is_empty() {
        return Err(AppError::TokenMissing);
    }
    if let Some(confirm) = &request.confirm_password
        && confirm != &request.password
    {
        return Err(AppError::PasswordMismatch);
    }
    if request.password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::PasswordTooShort);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reset_request(token: &str, password: &str, confirm: Option<&str>) -> ResetPasswordRequest {
        ResetPasswordRequest {
            token: token.to_string(),
            password: password.to_string(),
            confirm_password: confirm.map(str::to_string),
        }
    }

    #[test]
    fn test_validate_empty_email() {
        let result = validate_email("");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_invalid_email() {
        let result = validate_email("invalid-email");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_valid_email() {
        let result = validate_email("test@example.com");
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_missing_token() {
        let result = validate_reset_password_request(&reset_request("", "secret123", None));
        assert!(matches!(result, Err(AppError::TokenMissing)));
    }

    #[test]
    fn test_validate_password_mismatch() {
        let result = validate_reset_password_request(&reset_request(
            "valid-token",
            "secret123",
            Some("secret124"),
        ));
        assert!(matches!(result, Err(AppError::PasswordMismatch)));
    }

    /// 5文字は弾かれ、6文字は通る
    #[test]
    fn test_validate_password_length_boundary() {
        let result = validate_reset_password_request(&reset_request("valid-token", "12345", None));
        assert!(matches!(result, Err(AppError::PasswordTooShort)));

        let result = validate_reset_password_request(&reset_request("valid-token", "123456", None));
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_matching_confirmation() {
        let result = validate_reset_password_request(&reset_request(
            "valid-token",
            "secret123",
            Some("secret123"),
        ));
        assert!(result.is_ok());
    }

    /// トークン欠落はパスワード検査より先に判定される
    #[test]
    fn test_validate_missing_token_takes_precedence() {
        let result = validate_reset_password_request(&reset_request("", "123", Some("456")));
        assert!(matches!(result, Err(AppError::TokenMissing)));
    }
}
