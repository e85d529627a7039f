use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

/// SMTP settings for outgoing mail. `smtp_host == None` means mail is only logged.
#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    pub smtp_host: Option<String>,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub from: String,
    pub welcome_delay_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// `None` runs the server on the in-memory store.
    pub database_url: Option<String>,
    pub jwt: JwtConfig,
    pub mail: MailConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").ok().filter(|v| !v.is_empty());
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "oneboss".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "oneboss-users".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60),
        };
        let mail = MailConfig {
            smtp_host: std::env::var("SMTP_HOST").ok().filter(|v| !v.is_empty()),
            smtp_username: std::env::var("SMTP_USERNAME").ok(),
            smtp_password: std::env::var("SMTP_PASSWORD").ok(),
            from: std::env::var("MAIL_FROM")
                .unwrap_or_else(|_| "OneBoss Team <no-reply@oneboss.local>".into()),
            welcome_delay_secs: std::env::var("WELCOME_DELAY_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(60),
        };
        Ok(Self {
            database_url,
            jwt,
            mail,
        })
    }
}
