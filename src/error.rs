use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("バリデーションエラー: {0}")]
    Validation(String),

    #[error("パスワードが一致しません")]
    PasswordMismatch,

    #[error("パスワードは6文字以上で入力してください")]
    PasswordTooShort,

    #[error("リセットトークンが指定されていません")]
    TokenMissing,

    #[error("このメールアドレスは登録されていません")]
    EmailNotFound,

    #[error("このメールアドレスは既に使用されています")]
    EmailAlreadyExists,

    #[error("トークンが見つかりません")]
    TokenNotFound,

    #[error("トークンの有効期限が切れています")]
    TokenExpired,

    #[error("トークンは既に使用されています")]
    TokenAlreadyUsed,

    #[error("より新しいトークンが発行されています")]
    TokenSuperseded,

    #[error("データベースエラー")]
    Database(#[from] sqlx::Error),

    #[error("内部エラー")]
    Internal(#[from] anyhow::Error),
}

/// エラーレスポンス
///
/// `error` は機械可読コード、`message` は表示用メッセージ。
/// クライアントは EMAIL_NOT_FOUND コードで分岐する。
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            Self::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            Self::PasswordMismatch => (
                StatusCode::BAD_REQUEST,
                "PASSWORD_MISMATCH",
                "パスワードが一致しません".to_string(),
            ),
            Self::PasswordTooShort => (
                StatusCode::BAD_REQUEST,
                "PASSWORD_TOO_SHORT",
                "パスワードは6文字以上で入力してください".to_string(),
            ),
            Self::TokenMissing => (
                StatusCode::BAD_REQUEST,
                "INVALID_TOKEN",
                "無効なリセットリンクです".to_string(),
            ),
            Self::EmailNotFound => (
                StatusCode::NOT_FOUND,
                "EMAIL_NOT_FOUND",
                "このメールアドレスは登録されていません".to_string(),
            ),
            Self::EmailAlreadyExists => (
                StatusCode::CONFLICT,
                "EMAIL_ALREADY_EXISTS",
                "このメールアドレスは既に使用されています".to_string(),
            ),
            // トークン状態系はどの状態で失敗したかを外部に区別させない
            Self::TokenNotFound
            | Self::TokenExpired
            | Self::TokenAlreadyUsed
            | Self::TokenSuperseded => (
                StatusCode::UNAUTHORIZED,
                "INVALID_TOKEN",
                "無効または期限切れのリンクです".to_string(),
            ),
            Self::Database(e) => {
                tracing::error!(error = ?e, "データベースエラー");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "内部エラーが発生しました".to_string(),
                )
            }
            Self::Internal(e) => {
                tracing::error!(error = ?e, "内部エラー");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "内部エラーが発生しました".to_string(),
                )
            }
        };

        (
            status,
            Json(ErrorResponse {
                error: code.to_string(),
                message,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// トークン状態系エラーはすべて同一のステータスに畳み込まれる
    #[test]
    fn test_token_state_errors_collapse_to_unauthorized() {
        for err in [
            AppError::TokenNotFound,
            AppError::TokenExpired,
            AppError::TokenAlreadyUsed,
            AppError::TokenSuperseded,
        ] {
            let response = err.into_response();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn test_email_not_found_is_404() {
        let response = AppError::EmailNotFound.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_validation_errors_are_400() {
        for err in [
            AppError::Validation("dummy".to_string()),
            AppError::PasswordMismatch,
            AppError::PasswordTooShort,
            AppError::TokenMissing,
        ] {
            let response = err.into_response();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }
    }
}
