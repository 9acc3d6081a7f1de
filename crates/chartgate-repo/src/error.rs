//! Error types for repository operations

use chartgate_kube::KubeError;
use thiserror::Error;

/// Repository operation errors
#[derive(Debug, Error)]
pub enum RepoError {
    // ============ Resolution Errors ============
    #[error("repository '{name}' not found as a cluster or namespace '{namespace}' registration")]
    RepositoryNotFound { name: String, namespace: String },

    #[error("no repository registration matches chart reference {reference} in namespace '{namespace}'")]
    Resolution { reference: String, namespace: String },

    #[error("invalid chart reference: {0}")]
    InvalidReference(#[from] chartgate_core::CoreError),

    // ============ Cluster Errors ============
    #[error("cluster lookup failed: {0}")]
    Cluster(#[from] KubeError),

    // ============ Authentication Errors ============
    #[error("failed to fetch credentials: {message}")]
    Credential { message: String },

    #[error("Authentication required for {url}")]
    AuthRequired { url: String },

    #[error("Authentication failed: {message}")]
    AuthFailed { message: String },

    // ============ Network Errors ============
    #[error("HTTP error: {status} - {message}")]
    HttpError { status: u16, message: String },

    #[error("Network error: {message}")]
    NetworkError { message: String },

    #[error("Invalid TLS configuration: {message}")]
    InvalidTls { message: String },

    #[error("chart archive at {url} exceeds the {limit} byte limit")]
    TooLarge { url: String, limit: u64 },

    // ============ OCI Errors ============
    #[error("OCI registry error: {message}")]
    OciError { message: String },

    #[error("Invalid OCI reference: {reference}")]
    InvalidOciReference { reference: String },

    // ============ IO Errors ============
    #[error("Cache error: {message}")]
    CacheError { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for repository operations
pub type Result<T> = std::result::Result<T, RepoError>;

impl RepoError {
    pub(crate) fn credential(message: impl Into<String>) -> Self {
        RepoError::Credential {
            message: message.into(),
        }
    }

    /// A requested object (registration, chart) does not exist
    pub fn is_not_found(&self) -> bool {
        match self {
            RepoError::RepositoryNotFound { .. } => true,
            RepoError::HttpError { status, .. } => *status == 404,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for RepoError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() {
            RepoError::NetworkError {
                message: format!("Connection failed: {}", e),
            }
        } else if let Some(status) = e.status() {
            RepoError::HttpError {
                status: status.as_u16(),
                message: e.to_string(),
            }
        } else {
            RepoError::NetworkError {
                message: e.to_string(),
            }
        }
    }
}

impl From<url::ParseError> for RepoError {
    fn from(e: url::ParseError) -> Self {
        RepoError::NetworkError {
            message: format!("Invalid URL: {}", e),
        }
    }
}
