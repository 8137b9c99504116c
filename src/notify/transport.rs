//! Push notification transport.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use super::error::NotifyError;
use super::message::Notification;

/// Connection timeout for HTTP requests.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Something that can deliver a notification.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Deliver one notification. Success means the server accepted it.
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Build the publish URL for a topic on an ntfy server.
///
/// # Errors
///
/// Returns an error if the server is not a valid absolute URL.
pub fn topic_url(server: &str, topic: &str) -> Result<Url, NotifyError> {
    let mut base = server.trim().to_string();
    if !base.ends_with('/') {
        base.push('/');
    }
    let parse_err = |source| NotifyError::InvalidUrl {
        url: format!("{base}{topic}"),
        source,
    };
    Url::parse(&base)
        .and_then(|b| b.join(topic.trim().trim_start_matches('/')))
        .map_err(parse_err)
}

/// ntfy HTTP transport: `POST <server>/<topic>` with the message as body.
#[derive(Debug, Clone)]
pub struct NtfyTransport {
    client: Client,
    url: Url,
}

impl NtfyTransport {
    /// Create a transport for `topic` on `server`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the HTTP client cannot be built.
    pub fn new(server: &str, topic: &str, timeout: Duration) -> Result<Self, NotifyError> {
        let url = topic_url(server, topic)?;
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT.min(timeout))
            .timeout(timeout)
            .build()
            .map_err(NotifyError::Client)?;
        Ok(Self { client, url })
    }

    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl Transport for NtfyTransport {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(self.url.clone())
            .header("Title", notification.title.as_str())
            .header("Priority", notification.priority.to_string())
            .header("Tags", notification.tags.join(","))
            .body(notification.message.clone())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    NotifyError::Timeout
                } else {
                    NotifyError::RequestFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(NotifyError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}
