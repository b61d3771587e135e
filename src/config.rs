use secrecy::SecretBox;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub database_url: SecretBox<String>,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,

    // SMTP設定（オプション - email機能有効時のみ使用）
    #[serde(default)]
    pub smtp_host: Option<String>,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    pub smtp_username: Option<SecretBox<String>>,
    pub smtp_password: Option<SecretBox<String>>,
    #[serde(default)]
    pub smtp_from_address: Option<String>,

    // パスワードリセット設定
    /// リセットリンクのベースURL。`?token=...` が付加される
    #[serde(default)]
    pub reset_url_base: Option<String>,
    /// トークンの有効期間（秒）。ユーザー向け文言の「1時間」に合わせる
    #[serde(default = "default_reset_token_ttl_secs")]
    pub reset_token_ttl_secs: i64,
    /// 期限切れ行の掃除間隔（秒）。0で無効
    #[serde(default = "default_expired_sweep_interval_secs")]
    pub expired_sweep_interval_secs: u64,

    // CORS設定
    /// 許可するブラウザオリジン。未設定なら全オリジン許可（開発用）
    #[serde(default)]
    pub allowed_origin: Option<String>,
}

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_SMTP_PORT: u16 = 587;
const DEFAULT_RESET_TOKEN_TTL_SECS: i64 = 3600;
const DEFAULT_EXPIRED_SWEEP_INTERVAL_SECS: u64 = 3600;

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_smtp_port() -> u16 {
    DEFAULT_SMTP_PORT
}

fn default_reset_token_ttl_secs() -> i64 {
    DEFAULT_RESET_TOKEN_TTL_SECS
}

fn default_expired_sweep_interval_secs() -> u64 {
    DEFAULT_EXPIRED_SWEEP_INTERVAL_SECS
}

impl Config {
    pub fn load() -> Result<Self, envy::Error> {
        envy::from_env()
    }
}
