use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

use crate::{
    auth::repo::{PgUserRepo, UserRepo},
    config::AppConfig,
    faq::repo::{FaqRepo, PgFaqRepo},
    mail::{self, Mailer},
    memory::MemoryStore,
};

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepo>,
    pub faqs: Arc<dyn FaqRepo>,
    pub mailer: Arc<dyn Mailer>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let mailer = mail::mailer_from_config(&config.mail)?;

        let Some(url) = config.database_url.as_deref() else {
            warn!("DATABASE_URL not set; using in-memory store, data is lost on exit");
            return Ok(Self::in_memory(config, mailer));
        };

        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(url)
            .await
            .context("connect to database")?;

        if let Err(e) = sqlx::migrate!("./migrations").run(&db).await {
            warn!(error = %e, "migration failed; continuing");
        }
        info!("connected to postgres");

        Ok(Self {
            users: Arc::new(PgUserRepo::new(db.clone())),
            faqs: Arc::new(PgFaqRepo::new(db)),
            mailer,
            config,
        })
    }

    pub fn in_memory(config: Arc<AppConfig>, mailer: Arc<dyn Mailer>) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            users: store.clone(),
            faqs: store,
            mailer,
            config,
        }
    }
}

#[cfg(test)]
impl AppState {
    pub fn fake() -> Self {
        Self::fake_with_mailer(Arc::new(mail::testing::RecordingMailer::default()))
    }

    pub fn fake_with_mailer(mailer: Arc<dyn Mailer>) -> Self {
        use crate::config::{JwtConfig, MailConfig};

        let config = Arc::new(AppConfig {
            database_url: None,
            jwt: JwtConfig {
                secret: "test".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 60,
            },
            mail: MailConfig {
                smtp_host: None,
                smtp_username: None,
                smtp_password: None,
                from: "OneBoss Team <no-reply@oneboss.local>".into(),
                welcome_delay_secs: 60,
            },
        });
        Self::in_memory(config, mailer)
    }
}
