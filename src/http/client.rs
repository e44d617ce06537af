use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};

use super::transport::{Session, Transport};
use crate::core::{CampaignKitOptions, Configuration};
use crate::error::{CampaignKitError, ErrorCode, ErrorSanitizationConfig, Result};
use crate::store::PendingEvent;

pub const AUTH_PATH: &str = "/validate-account";
pub const TRACK_EVENT_PATH: &str = "/track-event";
pub const CAMPAIGNS_PATH: &str = "/campaigns";

#[derive(Debug, Serialize)]
struct AuthRequest<'a> {
    account_id: &'a str,
    app_id: &'a str,
    user_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct AuthResponse {
    #[serde(alias = "accessToken")]
    access_token: String,
}

#[derive(Debug, Serialize)]
struct CampaignFeedRequest<'a> {
    user_id: &'a str,
    screen: &'a str,
}

/// [`Transport`] over HTTPS with bearer-token auth.
///
/// Every call is a single attempt; retrying failed deliveries is the job of
/// the pending-event queue, not the transport.
pub struct HttpTransport {
    client: Client,
    user_agent: String,
    sanitization: ErrorSanitizationConfig,
}

impl HttpTransport {
    pub fn new(options: &CampaignKitOptions) -> Result<Self> {
        let client = Client::builder()
            .timeout(options.request_timeout)
            .build()
            .map_err(|e| {
                CampaignKitError::with_source(
                    ErrorCode::NetworkError,
                    "Failed to create HTTP client",
                    e,
                )
            })?;

        Ok(Self {
            client,
            user_agent: options.user_agent.clone(),
            sanitization: options.error_sanitization.clone(),
        })
    }

    fn authorized(&self, request: RequestBuilder, session: &Session) -> RequestBuilder {
        request
            .bearer_auth(&session.access_token)
            .header("User-Agent", &self.user_agent)
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response> {
        let response = request.send().await.map_err(|e| self.convert_error(e))?;

        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(self.status_to_error(status, &body))
        }
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        let body = response.text().await.map_err(|e| {
            CampaignKitError::with_source(
                ErrorCode::HttpInvalidResponse,
                "Failed to read response",
                e,
            )
        })?;

        serde_json::from_str(&body).map_err(|e| {
            CampaignKitError::with_source(
                ErrorCode::HttpInvalidResponse,
                format!("Failed to parse response: {}", e),
                e,
            )
        })
    }

    fn status_to_error(&self, status: StatusCode, body: &str) -> CampaignKitError {
        let (code, category) = classify_status(status);
        CampaignKitError::new_sanitized(
            code,
            format!("{}: {} - {}", category, status.as_u16(), body),
            &self.sanitization,
        )
    }

    fn convert_error(&self, error: reqwest::Error) -> CampaignKitError {
        let (code, message) = if error.is_timeout() {
            (ErrorCode::HttpTimeout, "Request timed out".to_string())
        } else if error.is_connect() {
            (ErrorCode::HttpNetworkError, "Connection failed".to_string())
        } else {
            (ErrorCode::NetworkError, error.to_string())
        };
        CampaignKitError::with_source_sanitized(code, message, error, &self.sanitization)
    }
}

fn classify_status(status: StatusCode) -> (ErrorCode, &'static str) {
    match status {
        StatusCode::BAD_REQUEST => (ErrorCode::HttpBadRequest, "Client Error"),
        StatusCode::UNAUTHORIZED => (ErrorCode::HttpUnauthorized, "Authentication Error"),
        StatusCode::FORBIDDEN => (ErrorCode::HttpForbidden, "Authorization Error"),
        StatusCode::NOT_FOUND => (ErrorCode::HttpNotFound, "Not Found"),
        StatusCode::TOO_MANY_REQUESTS => (ErrorCode::HttpRateLimited, "Rate Limited"),
        s if s.is_server_error() => (ErrorCode::HttpServerError, "Server Error"),
        s if s.is_client_error() => (ErrorCode::HttpBadRequest, "Client Error"),
        // 1xx/3xx that reqwest did not resolve
        _ => (ErrorCode::HttpInvalidResponse, "Unexpected Status"),
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn authenticate(&self, config: &Configuration) -> Result<Session> {
        let request = self
            .client
            .post(config.endpoint(AUTH_PATH))
            .header("User-Agent", &self.user_agent)
            .json(&AuthRequest {
                account_id: &config.account_id,
                app_id: &config.app_id,
                user_id: &config.user_id,
            });

        let response = self.send(request).await?;
        let auth: AuthResponse = self.read_json(response).await?;

        Ok(Session::new(config, auth.access_token))
    }

    async fn send_event(&self, session: &Session, event: &PendingEvent) -> Result<()> {
        let request = self
            .authorized(self.client.post(session.endpoint(TRACK_EVENT_PATH)), session)
            .json(event);

        self.send(request).await?;
        Ok(())
    }

    async fn fetch_campaign_feed(
        &self,
        session: &Session,
        screen: &str,
    ) -> Result<serde_json::Value> {
        let request = self
            .authorized(self.client.post(session.endpoint(CAMPAIGNS_PATH)), session)
            .json(&CampaignFeedRequest {
                user_id: &session.user_id,
                screen,
            });

        let response = self.send(request).await?;
        self.read_json(response).await
    }
}
