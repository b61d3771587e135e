pub mod account;
pub mod reset_token;

pub use account::AccountRepository;
pub use reset_token::ResetTokenRepository;
