pub mod credentials;
pub mod email;
pub mod password_reset;
pub mod token_issuer;
pub mod token_verifier;

pub use email::MailSender;
pub use password_reset::PasswordResetService;
pub use token_issuer::TokenIssuer;
pub use token_verifier::TokenVerifier;
