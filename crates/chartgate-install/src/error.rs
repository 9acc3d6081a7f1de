//! Install error types
//!
//! Each variant names the pipeline stage that failed; [`InstallError::kind`]
//! maps it onto the coarse taxonomy callers branch on.

use chartgate_core::CoreError;
use chartgate_kube::KubeError;
use chartgate_repo::RepoError;
use std::fmt;
use thiserror::Error;

use crate::engine::EngineError;

/// Result type for install operations
pub type Result<T> = std::result::Result<T, InstallError>;

/// Coarse error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidReference,
    Resolution,
    NotFound,
    ClusterApi,
    CredentialFetch,
    ChartLocate,
    ChartLoad,
    InstallExecution,
    Configuration,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidReference => "invalid-reference",
            ErrorKind::Resolution => "resolution",
            ErrorKind::NotFound => "not-found",
            ErrorKind::ClusterApi => "cluster-api",
            ErrorKind::CredentialFetch => "credential-fetch",
            ErrorKind::ChartLocate => "chart-locate",
            ErrorKind::ChartLoad => "chart-load",
            ErrorKind::InstallExecution => "install-execution",
            ErrorKind::Configuration => "configuration",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Install pipeline errors
#[derive(Debug, Error)]
pub enum InstallError {
    #[error("{0}")]
    InvalidReference(#[source] CoreError),

    #[error("error resolving chart repository: {0}")]
    Resolution(#[source] RepoError),

    #[error("error getting repository connection config: {0}")]
    Connection(#[source] RepoError),

    #[error("error staging repository credentials: {0}")]
    Credentials(#[source] RepoError),

    #[error("error locating chart: {0}")]
    Locate(#[source] EngineError),

    #[error("error loading chart: {0}")]
    Load(#[source] EngineError),

    #[error("error running chart install: {0}")]
    Run(#[source] EngineError),

    #[error("error writing install status: {0}")]
    Status(#[source] KubeError),

    #[error("invalid configuration: {message}")]
    Config { message: String },
}

fn repo_kind(e: &RepoError, default: ErrorKind) -> ErrorKind {
    match e {
        RepoError::InvalidReference(_) => ErrorKind::InvalidReference,
        RepoError::Cluster(_) => ErrorKind::ClusterApi,
        RepoError::RepositoryNotFound { .. } => ErrorKind::NotFound,
        RepoError::Credential { .. } => ErrorKind::CredentialFetch,
        _ => default,
    }
}

impl InstallError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            InstallError::InvalidReference(_) => ErrorKind::InvalidReference,
            InstallError::Resolution(e) => repo_kind(e, ErrorKind::Resolution),
            InstallError::Connection(e) => repo_kind(e, ErrorKind::Resolution),
            InstallError::Credentials(e) => repo_kind(e, ErrorKind::CredentialFetch),
            InstallError::Locate(_) => ErrorKind::ChartLocate,
            InstallError::Load(_) => ErrorKind::ChartLoad,
            InstallError::Run(_) => ErrorKind::InstallExecution,
            InstallError::Status(_) => ErrorKind::ClusterApi,
            InstallError::Config { .. } => ErrorKind::Configuration,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_reference_message() {
        let err = InstallError::InvalidReference(CoreError::InvalidReference {
            reference: "ftp://x/y.tgz".to_string(),
        });
        assert_eq!(err.kind(), ErrorKind::InvalidReference);
        assert_eq!(
            err.to_string(),
            "invalid chart URL: ftp://x/y.tgz, must be oci:// URL or http(s)://*.tgz"
        );
    }

    #[test]
    fn test_kind_mapping() {
        let not_found = InstallError::Connection(RepoError::RepositoryNotFound {
            name: "stable".to_string(),
            namespace: "default".to_string(),
        });
        assert_eq!(not_found.kind(), ErrorKind::NotFound);
        assert!(not_found.is_not_found());

        let cluster = InstallError::Resolution(RepoError::Cluster(KubeError::api(
            500,
            "InternalError",
            "etcd unavailable",
        )));
        assert_eq!(cluster.kind(), ErrorKind::ClusterApi);

        let unmatched = InstallError::Resolution(RepoError::Resolution {
            reference: "oci://r/c".to_string(),
            namespace: "default".to_string(),
        });
        assert_eq!(unmatched.kind(), ErrorKind::Resolution);

        let locate = InstallError::Locate(EngineError::Execution("boom".to_string()));
        assert_eq!(locate.kind(), ErrorKind::ChartLocate);
        assert!(locate.to_string().starts_with("error locating chart: "));
    }
}
