//! Outgoing mail and the delayed welcome message sent after registration.
//!
//! Delivery is best-effort: the welcome message lives in a detached task, so a
//! process exit before the delay elapses drops it, and send failures are only
//! logged.

use std::{sync::Arc, time::Duration};

use anyhow::Context;
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    Message, SmtpTransport, Transport,
};
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::config::MailConfig;

pub const WELCOME_SUBJECT: &str = "Welcome to OneBoss!";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: OutgoingMail) -> anyhow::Result<()>;
}

/// SMTP relay transport. The lettre transport is blocking, so sends run on the blocking pool.
pub struct SmtpMailer {
    transport: SmtpTransport,
    from: String,
}

impl SmtpMailer {
    pub fn new(cfg: &MailConfig) -> anyhow::Result<Self> {
        let host = cfg.smtp_host.as_deref().context("SMTP_HOST is not set")?;
        let mut builder = SmtpTransport::relay(host).context("build smtp relay")?;
        if let (Some(user), Some(pass)) = (&cfg.smtp_username, &cfg.smtp_password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }
        Ok(Self {
            transport: builder.build(),
            from: cfg.from.clone(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, mail: OutgoingMail) -> anyhow::Result<()> {
        let message = Message::builder()
            .from(self.from.parse::<Mailbox>().context("parse from address")?)
            .to(mail.to.parse::<Mailbox>().context("parse recipient address")?)
            .subject(mail.subject)
            .header(ContentType::TEXT_HTML)
            .body(mail.html)
            .context("build message")?;

        let transport = self.transport.clone();
        tokio::task::spawn_blocking(move || transport.send(&message))
            .await
            .context("smtp task panicked")?
            .context("smtp send")?;
        Ok(())
    }
}

/// Used when no SMTP relay is configured.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: OutgoingMail) -> anyhow::Result<()> {
        info!(to = %mail.to, subject = %mail.subject, "smtp not configured; mail logged only");
        Ok(())
    }
}

pub fn mailer_from_config(cfg: &MailConfig) -> anyhow::Result<Arc<dyn Mailer>> {
    Ok(match cfg.smtp_host {
        Some(_) => Arc::new(SmtpMailer::new(cfg)?),
        None => Arc::new(LogMailer),
    })
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

pub fn welcome_mail(name: &str, email: &str) -> OutgoingMail {
    let name = escape_html(name);
    let html = format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
  <h2 style="color: #3498db; text-align: center;">Welcome to OneBoss!</h2>
  <p>Hello {name},</p>
  <p>Thank you for registering with OneBoss. We're excited to have you on board!</p>
  <p>If you have any questions, feel free to contact our support team.</p>
  <p>Best regards,<br>The OneBoss Team</p>
</div>"#
    );
    OutgoingMail {
        to: email.to_string(),
        subject: WELCOME_SUBJECT.to_string(),
        html,
    }
}

/// Sends the welcome mail after `delay` on a detached task.
pub fn schedule_welcome(
    mailer: Arc<dyn Mailer>,
    name: &str,
    email: &str,
    delay: Duration,
) -> JoinHandle<()> {
    let mail = welcome_mail(name, email);
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        let to = mail.to.clone();
        match mailer.send(mail).await {
            Ok(()) => info!(email = %to, "welcome email sent"),
            Err(e) => error!(error = %format!("{e:#}"), email = %to, "failed to send welcome email"),
        }
    })
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingMailer;
    use super::*;

    #[test]
    fn welcome_mail_is_personalised() {
        let m = welcome_mail("Meera", "meera@example.com");
        assert_eq!(m.to, "meera@example.com");
        assert_eq!(m.subject, WELCOME_SUBJECT);
        assert!(m.html.contains("Hello Meera,"));
    }

    #[test]
    fn welcome_mail_escapes_name() {
        let m = welcome_mail(r#"<b>"Tom" & Jerry</b>"#, "tj@example.com");
        assert!(m.html.contains("Hello &lt;b&gt;&quot;Tom&quot; &amp; Jerry&lt;/b&gt;,"));
        assert!(!m.html.contains("<b>"));
    }

    #[tokio::test(start_paused = true)]
    async fn welcome_waits_for_delay() {
        let mailer = Arc::new(RecordingMailer::default());
        let handle = schedule_welcome(
            mailer.clone(),
            "Meera",
            "meera@example.com",
            Duration::from_secs(60),
        );

        tokio::time::sleep(Duration::from_secs(59)).await;
        assert!(mailer.sent.lock().await.is_empty());

        handle.await.unwrap();
        let sent = mailer.sent.lock().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "meera@example.com");
    }

    #[tokio::test(start_paused = true)]
    async fn send_failure_is_swallowed() {
        let mailer = Arc::new(RecordingMailer {
            fail: true,
            ..Default::default()
        });
        let handle = schedule_welcome(mailer, "X", "x@example.com", Duration::from_secs(1));
        assert!(handle.await.is_ok());
    }

    #[test]
    fn log_mailer_without_smtp_host() {
        let cfg = MailConfig {
            smtp_host: None,
            smtp_username: None,
            smtp_password: None,
            from: "OneBoss Team <no-reply@oneboss.local>".into(),
            welcome_delay_secs: 60,
        };
        assert!(mailer_from_config(&cfg).is_ok());
        assert!(SmtpMailer::new(&cfg).is_err());
    }
}
