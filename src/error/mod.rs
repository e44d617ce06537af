use thiserror::Error;

pub mod sanitizer;

pub use sanitizer::{sanitize_message, ErrorSanitizationConfig, SanitizedMessage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Initialization errors
    InitNoRuntime,
    InitTimeout,

    // Configuration errors
    ConfigMissingRequired,
    ConfigInvalidUrl,
    ConfigInvalidInterval,

    // Network errors
    NetworkError,

    // HTTP errors
    HttpBadRequest,
    HttpUnauthorized,
    HttpForbidden,
    HttpNotFound,
    HttpRateLimited,
    HttpServerError,
    HttpTimeout,
    HttpNetworkError,
    HttpInvalidResponse,

    // Storage errors
    StorageReadError,
    StorageWriteError,
    StorageLockError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InitNoRuntime => "INIT_NO_RUNTIME",
            ErrorCode::InitTimeout => "INIT_TIMEOUT",
            ErrorCode::ConfigMissingRequired => "CONFIG_MISSING_REQUIRED",
            ErrorCode::ConfigInvalidUrl => "CONFIG_INVALID_URL",
            ErrorCode::ConfigInvalidInterval => "CONFIG_INVALID_INTERVAL",
            ErrorCode::NetworkError => "NETWORK_ERROR",
            ErrorCode::HttpBadRequest => "HTTP_BAD_REQUEST",
            ErrorCode::HttpUnauthorized => "HTTP_UNAUTHORIZED",
            ErrorCode::HttpForbidden => "HTTP_FORBIDDEN",
            ErrorCode::HttpNotFound => "HTTP_NOT_FOUND",
            ErrorCode::HttpRateLimited => "HTTP_RATE_LIMITED",
            ErrorCode::HttpServerError => "HTTP_SERVER_ERROR",
            ErrorCode::HttpTimeout => "HTTP_TIMEOUT",
            ErrorCode::HttpNetworkError => "HTTP_NETWORK_ERROR",
            ErrorCode::HttpInvalidResponse => "HTTP_INVALID_RESPONSE",
            ErrorCode::StorageReadError => "STORAGE_READ_ERROR",
            ErrorCode::StorageWriteError => "STORAGE_WRITE_ERROR",
            ErrorCode::StorageLockError => "STORAGE_LOCK_ERROR",
        }
    }

    /// Whether a later attempt of the same operation may succeed.
    ///
    /// Failed event deliveries are queued regardless; this only decides how
    /// loudly the failure is logged.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ErrorCode::InitTimeout
                | ErrorCode::NetworkError
                | ErrorCode::HttpTimeout
                | ErrorCode::HttpNetworkError
                | ErrorCode::HttpServerError
                | ErrorCode::HttpRateLimited
        )
    }
}

#[derive(Error, Debug)]
#[error("[{code}] {message}")]
pub struct CampaignKitError {
    pub code: ErrorCode,
    pub message: String,
    /// The original unsanitized message, if preservation is enabled.
    original_message: Option<String>,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl CampaignKitError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            original_message: None,
            source: None,
        }
    }

    /// Create a new error with sanitization applied.
    pub fn new_sanitized(
        code: ErrorCode,
        message: impl Into<String>,
        config: &ErrorSanitizationConfig,
    ) -> Self {
        let msg = message.into();
        let sanitized_msg = SanitizedMessage::new(&msg, config);
        Self {
            code,
            message: sanitized_msg.sanitized,
            original_message: sanitized_msg.original,
            source: None,
        }
    }

    pub fn with_source(
        code: ErrorCode,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            original_message: None,
            source: Some(Box::new(source)),
        }
    }

    /// Create a new error with source and sanitization applied.
    pub fn with_source_sanitized(
        code: ErrorCode,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
        config: &ErrorSanitizationConfig,
    ) -> Self {
        let msg = message.into();
        let sanitized_msg = SanitizedMessage::new(&msg, config);
        Self {
            code,
            message: sanitized_msg.sanitized,
            original_message: sanitized_msg.original,
            source: Some(Box::new(source)),
        }
    }

    /// Get the original unsanitized message if available.
    pub fn original_message(&self) -> Option<&str> {
        self.original_message.as_deref()
    }

    pub fn config_error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::new(code, message)
    }

    pub fn storage_error(
        code: ErrorCode,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::with_source(code, message, source)
    }

    pub fn no_runtime() -> Self {
        Self::new(
            ErrorCode::InitNoRuntime,
            "CampaignKit must be created from within a Tokio runtime.",
        )
    }

    pub fn is_recoverable(&self) -> bool {
        self.code.is_recoverable()
    }

    pub fn is_config_error(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::ConfigMissingRequired
                | ErrorCode::ConfigInvalidUrl
                | ErrorCode::ConfigInvalidInterval
        )
    }

    pub fn is_network_error(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::NetworkError
                | ErrorCode::HttpBadRequest
                | ErrorCode::HttpUnauthorized
                | ErrorCode::HttpForbidden
                | ErrorCode::HttpNotFound
                | ErrorCode::HttpRateLimited
                | ErrorCode::HttpServerError
                | ErrorCode::HttpTimeout
                | ErrorCode::HttpNetworkError
                | ErrorCode::HttpInvalidResponse
        )
    }

    pub fn is_storage_error(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::StorageReadError | ErrorCode::StorageWriteError | ErrorCode::StorageLockError
        )
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

pub type Result<T> = std::result::Result<T, CampaignKitError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_includes_code() {
        let error = CampaignKitError::new(ErrorCode::HttpServerError, "Server Error: 503");
        assert_eq!(format!("{}", error), "[HTTP_SERVER_ERROR] Server Error: 503");
    }

    #[test]
    fn test_new_sanitized_redacts_token() {
        let config = ErrorSanitizationConfig::default();
        let error = CampaignKitError::new_sanitized(
            ErrorCode::HttpUnauthorized,
            "Rejected Bearer abc.def.ghi",
            &config,
        );
        assert_eq!(error.message, "Rejected Bearer [REDACTED]");
        assert!(error.original_message().is_none());
    }

    #[test]
    fn test_new_sanitized_with_preservation() {
        let config = ErrorSanitizationConfig::with_preservation();
        let original = "Failed to connect to 192.168.1.1";
        let error = CampaignKitError::new_sanitized(ErrorCode::NetworkError, original, &config);
        assert_eq!(error.message, "Failed to connect to [IP]");
        assert_eq!(error.original_message(), Some(original));
    }

    #[test]
    fn test_with_source_sanitized_keeps_source() {
        let config = ErrorSanitizationConfig::default();
        let source = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let error = CampaignKitError::with_source_sanitized(
            ErrorCode::StorageWriteError,
            "Failed writing /data/campaignkit/events.json",
            source,
            &config,
        );
        assert_eq!(error.message, "Failed writing [PATH]");
        assert!(error.source.is_some());
    }

    #[test]
    fn test_error_categories() {
        assert!(CampaignKitError::new(ErrorCode::ConfigInvalidUrl, "bad").is_config_error());
        assert!(CampaignKitError::new(ErrorCode::HttpTimeout, "slow").is_network_error());
        assert!(CampaignKitError::new(ErrorCode::StorageLockError, "busy").is_storage_error());
        assert!(CampaignKitError::new(ErrorCode::HttpRateLimited, "slow down").is_recoverable());
        assert!(!CampaignKitError::no_runtime().is_recoverable());
    }
}
