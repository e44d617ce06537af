use async_trait::async_trait;

use crate::core::{join_endpoint, Configuration};
use crate::error::Result;
use crate::store::PendingEvent;

/// Credentials obtained from the initialization handshake.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    /// Bearer token sent with every request after the handshake.
    pub access_token: String,
    pub user_id: String,
    pub base_url: String,
}

impl Session {
    pub fn new(config: &Configuration, access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            user_id: config.user_id.clone(),
            base_url: config.base_url.clone(),
        }
    }

    /// `base_url` joined with `path`, without doubled slashes.
    pub fn endpoint(&self, path: &str) -> String {
        join_endpoint(&self.base_url, path)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"[REDACTED]")
            .field("user_id", &self.user_id)
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Network capability the SDK core needs from the backend.
///
/// [`HttpTransport`](crate::http::HttpTransport) is the default; hosts and
/// tests may supply their own.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Run the initialization handshake for `config`.
    async fn authenticate(&self, config: &Configuration) -> Result<Session>;

    /// Deliver one event. `Ok` only for a 2xx answer.
    async fn send_event(&self, session: &Session, event: &PendingEvent) -> Result<()>;

    /// Fetch the raw campaign feed for `screen`.
    async fn fetch_campaign_feed(
        &self,
        session: &Session,
        screen: &str,
    ) -> Result<serde_json::Value>;
}
