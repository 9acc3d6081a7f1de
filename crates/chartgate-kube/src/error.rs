//! Error types for chartgate-kube

use thiserror::Error;

/// Result type for chartgate-kube operations
pub type Result<T> = std::result::Result<T, KubeError>;

/// Errors that can occur talking to the cluster
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum KubeError {
    /// Kubernetes API error
    #[error("Kubernetes API error: {0}")]
    Api(#[from] kube::Error),

    /// Install status object not found
    #[error("install status '{name}' not found in namespace '{namespace}'")]
    StatusNotFound { name: String, namespace: String },

    /// Install status object already exists
    #[error("install status '{name}' already exists in namespace '{namespace}'")]
    StatusAlreadyExists { name: String, namespace: String },

    /// Storage error
    #[error("storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Compression error
    #[error("compression error: {0}")]
    Compression(String),
}

impl From<serde_json::Error> for KubeError {
    fn from(e: serde_json::Error) -> Self {
        KubeError::Serialization(e.to_string())
    }
}

impl KubeError {
    /// Check if this is a Kubernetes 404 Not Found error
    pub fn is_not_found(&self) -> bool {
        match self {
            KubeError::Api(kube::Error::Api(resp)) => resp.code == 404,
            KubeError::StatusNotFound { .. } => true,
            _ => false,
        }
    }

    /// Check if this is a conflict error (409)
    pub fn is_conflict(&self) -> bool {
        match self {
            KubeError::Api(kube::Error::Api(resp)) => resp.code == 409,
            KubeError::StatusAlreadyExists { .. } => true,
            _ => false,
        }
    }

    /// Build an API error response, as returned by the API server
    pub fn api(code: u16, reason: &str, message: impl Into<String>) -> Self {
        KubeError::Api(kube::Error::Api(kube::core::ErrorResponse {
            status: "Failure".to_string(),
            message: message.into(),
            reason: reason.to_string(),
            code,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_detection() {
        assert!(KubeError::api(404, "NotFound", "secrets \"x\" not found").is_not_found());
        assert!(!KubeError::api(500, "InternalError", "boom").is_not_found());
        assert!(
            KubeError::StatusNotFound {
                name: "web".to_string(),
                namespace: "default".to_string(),
            }
            .is_not_found()
        );
    }

    #[test]
    fn test_json_errors_wrap() {
        let err: KubeError = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
        assert!(matches!(err, KubeError::Serialization(_)));
    }

    #[test]
    fn test_conflict_detection() {
        assert!(KubeError::api(409, "AlreadyExists", "exists").is_conflict());
        assert!(!KubeError::Storage("x".to_string()).is_conflict());
    }
}
