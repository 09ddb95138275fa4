//! Application error types
//!
//! Library layers (clients / services) return [`AppResult`]; the orchestration
//! layer wraps these in `anyhow` with context before reporting.

use thiserror::Error;

/// Top-level application error
#[derive(Debug, Error)]
pub enum AppError {
    /// Remote form API errors
    #[error("API error: {0}")]
    Api(#[from] ApiError),
    /// Filesystem errors
    #[error("file error: {0}")]
    File(#[from] FileError),
    /// Configuration errors
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// Remote form API errors
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport level failure (DNS, TLS, timeout, ...)
    #[error("request to {endpoint} failed: {source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// Non-success HTTP status
    #[error("{endpoint} returned HTTP {status}")]
    BadStatus { endpoint: String, status: u16 },
    /// Body was not the JSON shape we expected
    #[error("malformed payload from {endpoint}: {message}")]
    MalformedPayload { endpoint: String, message: String },
    /// JSON decoding failed
    #[error("JSON parse failed: {0}")]
    JsonParseFailed(#[source] serde_json::Error),
}

/// Filesystem errors
#[derive(Debug, Error)]
pub enum FileError {
    #[error("cannot create directory {path}: {source}")]
    CreateDirFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot write {path}: {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot move {from} -> {to}: {source}")]
    RenameFailed {
        from: String,
        to: String,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot read {path}: {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV write failed: {0}")]
    Csv(#[source] csv::Error),
    /// io error without path information
    #[error("I/O error: {0}")]
    Io(#[source] std::io::Error),
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {var_name} = '{value}' is not a valid {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    #[error("cannot parse forms file {path}: {source}")]
    FormsFileInvalid {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("forms file {path} lists no markets")]
    NoMarkets { path: String },
}

// ========== conversions from common error types ==========

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::File(FileError::Io(err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Api(ApiError::JsonParseFailed(err))
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::File(FileError::Csv(err))
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::Config(ConfigError::FormsFileInvalid {
            path: String::new(),
            source: err,
        })
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        let endpoint = err
            .url()
            .map(|u| u.to_string())
            .unwrap_or_else(|| "<unknown>".to_string());
        AppError::Api(ApiError::RequestFailed {
            endpoint,
            source: Box::new(err),
        })
    }
}

// ========== convenience constructors ==========

impl AppError {
    pub fn api_request_failed(
        endpoint: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Api(ApiError::RequestFailed {
            endpoint: endpoint.into(),
            source: Box::new(source),
        })
    }

    pub fn bad_status(endpoint: impl Into<String>, status: u16) -> Self {
        AppError::Api(ApiError::BadStatus {
            endpoint: endpoint.into(),
            status,
        })
    }

    pub fn malformed(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Api(ApiError::MalformedPayload {
            endpoint: endpoint.into(),
            message: message.into(),
        })
    }

    pub fn create_dir_failed(path: &std::path::Path, source: std::io::Error) -> Self {
        AppError::File(FileError::CreateDirFailed {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn write_failed(path: &std::path::Path, source: std::io::Error) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn rename_failed(
        from: &std::path::Path,
        to: &std::path::Path,
        source: std::io::Error,
    ) -> Self {
        AppError::File(FileError::RenameFailed {
            from: from.display().to_string(),
            to: to.display().to_string(),
            source,
        })
    }

    pub fn read_failed(path: &std::path::Path, source: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.display().to_string(),
            source,
        })
    }
}

/// Application result type
pub type AppResult<T> = Result<T, AppError>;
