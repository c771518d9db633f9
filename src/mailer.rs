use async_trait::async_trait;
use std::sync::{Arc, Mutex, PoisonError};

/// ResetMailer
///
/// Out-of-band delivery of password-reset links. The forgot-password handler
/// never reports the outcome to the caller, so implementations only need to
/// say whether the hand-off worked.
#[async_trait]
pub trait ResetMailer: Send + Sync {
    async fn send_reset_link(&self, email: &str, token: &str) -> Result<(), String>;
}

pub type MailerState = Arc<dyn ResetMailer>;

/// The link the user receives: `{base}?token=..&email=..`.
pub fn reset_link(base: &str, email: &str, token: &str) -> String {
    let mut url = match reqwest::Url::parse(base) {
        Ok(url) => url,
        Err(_) => return format!("{base}?token={token}"),
    };
    url.query_pairs_mut()
        .append_pair("token", token)
        .append_pair("email", email);
    url.to_string()
}

/// WebhookMailer
///
/// Posts `{ email, reset_url }` as JSON to a mail-sending webhook.
pub struct WebhookMailer {
    client: reqwest::Client,
    webhook_url: String,
    reset_url_base: String,
}

impl WebhookMailer {
    pub fn new(webhook_url: &str, reset_url_base: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            webhook_url: webhook_url.to_string(),
            reset_url_base: reset_url_base.to_string(),
        }
    }
}

#[async_trait]
impl ResetMailer for WebhookMailer {
    async fn send_reset_link(&self, email: &str, token: &str) -> Result<(), String> {
        let response = self
            .client
            .post(&self.webhook_url)
            .json(&serde_json::json!({
                "email": email,
                "reset_url": reset_link(&self.reset_url_base, email, token),
            }))
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(format!("mail webhook answered {}", response.status()))
        }
    }
}

/// LogMailer
///
/// Local-development stand-in: writes the reset link to the log instead of
/// sending it anywhere.
pub struct LogMailer {
    reset_url_base: String,
}

impl LogMailer {
    pub fn new(reset_url_base: &str) -> Self {
        Self {
            reset_url_base: reset_url_base.to_string(),
        }
    }
}

#[async_trait]
impl ResetMailer for LogMailer {
    async fn send_reset_link(&self, email: &str, token: &str) -> Result<(), String> {
        tracing::info!(
            recipient = %email,
            reset_url = %reset_link(&self.reset_url_base, email, token),
            "password reset link (not sent: no MAIL_WEBHOOK_URL configured)"
        );
        Ok(())
    }
}

/// MockMailer
///
/// Records every dispatch so tests can fish the plain token back out.
#[derive(Clone, Default)]
pub struct MockMailer {
    sent: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(email, token)` pairs in dispatch order.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last_token_for(&self, email: &str) -> Option<String> {
        self.sent()
            .into_iter()
            .rev()
            .find(|(to, _)| to.eq_ignore_ascii_case(email))
            .map(|(_, token)| token)
    }
}

#[async_trait]
impl ResetMailer for MockMailer {
    async fn send_reset_link(&self, email: &str, token: &str) -> Result<(), String> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((email.to_string(), token.to_string()));
        Ok(())
    }
}
