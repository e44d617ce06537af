use reqwest::Url;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{CampaignKitError, ErrorCode, ErrorSanitizationConfig, Result};

pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_READY_POLL_INTERVAL: Duration = Duration::from_millis(100);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_USER_AGENT: &str = concat!("CampaignKit-Rust/", env!("CARGO_PKG_VERSION"));

/// Account credentials supplied by the host app.
///
/// Written once per SDK lifetime; see [`crate::CampaignKit::configure`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    pub account_id: String,
    pub app_id: String,
    pub user_id: String,
    pub base_url: String,
}

impl Configuration {
    pub fn new(
        account_id: impl Into<String>,
        app_id: impl Into<String>,
        user_id: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            app_id: app_id.into(),
            user_id: user_id.into(),
            base_url: base_url.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let required = [
            ("account_id", &self.account_id),
            ("app_id", &self.app_id),
            ("user_id", &self.user_id),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(CampaignKitError::config_error(
                    ErrorCode::ConfigMissingRequired,
                    format!("{} is required", name),
                ));
            }
        }

        let url = Url::parse(&self.base_url).map_err(|e| {
            CampaignKitError::with_source(
                ErrorCode::ConfigInvalidUrl,
                format!("Invalid base URL: {}", self.base_url),
                e,
            )
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(CampaignKitError::config_error(
                ErrorCode::ConfigInvalidUrl,
                format!("Unsupported base URL scheme: {}", url.scheme()),
            ));
        }

        Ok(())
    }

    /// `base_url` joined with `path`, without doubled slashes.
    pub fn endpoint(&self, path: &str) -> String {
        join_endpoint(&self.base_url, path)
    }
}

pub(crate) fn join_endpoint(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// SDK tuning knobs. Everything has a default.
#[derive(Debug, Clone)]
pub struct CampaignKitOptions {
    /// How long dependent calls wait for initialization before degrading.
    pub ready_timeout: Duration,
    /// Poll period of the readiness wait.
    pub ready_poll_interval: Duration,
    /// How long the handshake may run before the SDK is marked failed.
    /// `None` uses `ready_timeout`.
    pub init_timeout: Option<Duration>,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
    /// Directory holding the pending-event log.
    pub storage_path: PathBuf,
    pub user_agent: String,
    pub error_sanitization: ErrorSanitizationConfig,
}

impl Default for CampaignKitOptions {
    fn default() -> Self {
        Self {
            ready_timeout: DEFAULT_READY_TIMEOUT,
            ready_poll_interval: DEFAULT_READY_POLL_INTERVAL,
            init_timeout: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            storage_path: std::env::temp_dir().join("campaignkit"),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            error_sanitization: ErrorSanitizationConfig::default(),
        }
    }
}

impl CampaignKitOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handshake_timeout(&self) -> Duration {
        self.init_timeout.unwrap_or(self.ready_timeout)
    }

    pub fn validate(&self) -> Result<()> {
        if self.ready_timeout.is_zero() {
            return Err(CampaignKitError::config_error(
                ErrorCode::ConfigInvalidInterval,
                "Ready timeout must be positive",
            ));
        }

        if self.init_timeout.is_some_and(|timeout| timeout.is_zero()) {
            return Err(CampaignKitError::config_error(
                ErrorCode::ConfigInvalidInterval,
                "Init timeout must be positive",
            ));
        }

        if self.ready_poll_interval.is_zero() {
            return Err(CampaignKitError::config_error(
                ErrorCode::ConfigInvalidInterval,
                "Ready poll interval must be positive",
            ));
        }

        if self.request_timeout.is_zero() {
            return Err(CampaignKitError::config_error(
                ErrorCode::ConfigInvalidInterval,
                "Request timeout must be positive",
            ));
        }

        Ok(())
    }

    pub fn builder() -> CampaignKitOptionsBuilder {
        CampaignKitOptionsBuilder::new()
    }
}

pub struct CampaignKitOptionsBuilder {
    options: CampaignKitOptions,
}

impl CampaignKitOptionsBuilder {
    pub fn new() -> Self {
        Self {
            options: CampaignKitOptions::default(),
        }
    }

    pub fn ready_timeout(mut self, timeout: Duration) -> Self {
        self.options.ready_timeout = timeout;
        self
    }

    pub fn ready_poll_interval(mut self, interval: Duration) -> Self {
        self.options.ready_poll_interval = interval;
        self
    }

    pub fn init_timeout(mut self, timeout: Duration) -> Self {
        self.options.init_timeout = Some(timeout);
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.options.request_timeout = timeout;
        self
    }

    pub fn storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.options.storage_path = path.into();
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.options.user_agent = user_agent.into();
        self
    }

    pub fn error_sanitization(mut self, config: ErrorSanitizationConfig) -> Self {
        self.options.error_sanitization = config;
        self
    }

    pub fn build(self) -> CampaignKitOptions {
        self.options
    }
}

impl Default for CampaignKitOptionsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
