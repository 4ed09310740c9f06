use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Fetch failed for {url}: {message}")]
    TransportError {
        url: String,
        status: Option<u16>,
        message: String,
    },

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Parser '{strategy}' failed: {message}")]
    ParseError { strategy: String, message: String },

    #[error("Invalid price token '{token}': {reason}")]
    InvalidToken { token: String, reason: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Extraction,
    Storage,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::TransportError { .. } | EtlError::HttpError(_) => ErrorCategory::Network,
            EtlError::ParseError { .. } | EtlError::InvalidToken { .. } => {
                ErrorCategory::Extraction
            }
            EtlError::CsvError(_) | EtlError::IoError(_) | EtlError::SerializationError(_) => {
                ErrorCategory::Storage
            }
            EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // 單一場館失敗不影響整體執行
            ErrorCategory::Extraction => ErrorSeverity::Low,
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Storage => ErrorSeverity::Critical,
        }
    }

    /// 是否應該在單一場館層級被吸收 (不中止整體執行)
    pub fn is_venue_recoverable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Network | ErrorCategory::Extraction
        )
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            EtlError::TransportError { status: Some(_), .. } => {
                "The page responded with an error status; check that the venue URL is still valid"
            }
            EtlError::TransportError { .. } | EtlError::HttpError(_) => {
                "Check network connectivity or raise fetch.timeout_seconds"
            }
            EtlError::ParseError { .. } => {
                "The page layout may have changed; switch the venue to generic_price_scan"
            }
            EtlError::InvalidToken { .. } => "The token was ignored; no action needed",
            EtlError::CsvError(_) | EtlError::IoError(_) => {
                "Check that output.output_path exists and is writable"
            }
            EtlError::SerializationError(_) => {
                "The history file may be corrupt; restore it from a backup"
            }
            EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => "Fix the configuration file and run again",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => format!("Could not reach a venue page: {}", self),
            ErrorCategory::Extraction => format!("Could not read prices from a page: {}", self),
            ErrorCategory::Storage => format!("Could not read or write price data: {}", self),
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
