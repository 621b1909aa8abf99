use config::ConfigError;

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub jwt: JwtSettings,
    pub mail: MailSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
}

/// JWT authentication settings
///
/// All validity windows are in seconds. Access tokens are short-lived,
/// refresh tokens long-lived; verification and password-reset tokens sit
/// in between and are only ever sent by email.
#[derive(serde::Deserialize, Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub access_token_expiry: i64,         // e.g., 900 for 15 minutes
    pub refresh_token_expiry: i64,        // e.g., 172800 for 2 days
    pub verification_token_expiry: i64,   // e.g., 86400 for 1 day
    pub password_reset_token_expiry: i64, // e.g., 3600 for 1 hour
    pub issuer: String,
}

impl JwtSettings {
    pub fn access_validity(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.access_token_expiry)
    }

    pub fn refresh_validity(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.refresh_token_expiry)
    }

    pub fn verification_validity(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.verification_token_expiry)
    }

    pub fn password_reset_validity(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.password_reset_token_expiry)
    }
}

/// Outbound mail settings.
///
/// `api_base_url` + `api_key` configure the transactional HTTP provider
/// (primary); `smtp_host` and friends configure the SMTP relay (fallback).
/// Either side may be left unset; with neither configured the mailer runs
/// in no-op mode and only logs.
#[derive(serde::Deserialize, Clone)]
pub struct MailSettings {
    pub api_base_url: Option<String>,
    pub api_key: Option<String>,
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_starttls: bool,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub from_address: String,
    pub from_name: String,
    pub send_timeout_seconds: u64,
    /// Public base URL used to build verification / reset links.
    pub domain: String,
}

pub fn get_configuration() -> Result<Settings, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("configuration").required(false))
        .build()?;
    settings.try_deserialize::<Settings>()
}
