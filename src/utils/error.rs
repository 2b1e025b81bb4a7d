use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV export error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Io,
    Data,
    Config,
}

impl EtlError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::ApiError(_) => ErrorSeverity::Medium,
            Self::IoError(_) => ErrorSeverity::Critical,
            Self::SerializationError(_) | Self::CsvError(_) | Self::ProcessingError { .. } => {
                ErrorSeverity::High
            }
            Self::UrlError(_)
            | Self::ConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => ErrorSeverity::High,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ApiError(_) => ErrorCategory::Network,
            Self::IoError(_) => ErrorCategory::Io,
            Self::SerializationError(_) | Self::CsvError(_) | Self::ProcessingError { .. } => {
                ErrorCategory::Data
            }
            Self::UrlError(_)
            | Self::ConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => ErrorCategory::Config,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::ApiError(_) => {
                "Check network connectivity and that the catalogue endpoint is reachable, then re-run"
            }
            Self::IoError(_) => "Check that the target directory exists and is writable",
            Self::SerializationError(_) => {
                "Inspect the input file; the endpoint may have returned non-JSON output"
            }
            Self::CsvError(_) => "Check the CSV output path and available disk space",
            Self::ProcessingError { .. } => {
                "Verify the input file was produced by 'rc-etl fetch' or pass --key explicitly"
            }
            Self::UrlError(_)
            | Self::ConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => {
                "Fix the flagged option or config file entry and re-run"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        self.to_string()
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
