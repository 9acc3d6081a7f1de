//! CLI error types with exit code handling

use chartgate_core::CoreError;
use chartgate_install::{ErrorKind, InstallError};
use chartgate_kube::KubeError;
use chartgate_repo::RepoError;
use miette::Diagnostic;
use thiserror::Error;

use crate::exit_codes;

const REGISTRATION_HELP: &str = "register the repository with a HelmChartRepository or ProjectHelmChartRepository resource";

/// CLI error type carrying its exit code
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    #[error("{message}")]
    #[diagnostic(
        code(chartgate::cli::reference),
        help("use oci://<registry>/<path>/<chart>[:tag] or http(s)://<host>/<path>/<chart>-<version>.tgz")
    )]
    InvalidReference { message: String },

    #[error("{message}")]
    #[diagnostic(code(chartgate::cli::not_found))]
    NotFound {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("Cluster error: {message}")]
    #[diagnostic(code(chartgate::cli::cluster))]
    Cluster { message: String },

    #[error("{message}")]
    #[diagnostic(code(chartgate::cli::credentials))]
    Credentials { message: String },

    /// Locating, loading or running a chart failed
    #[error("{message}")]
    #[diagnostic(code(chartgate::cli::chart))]
    Chart { message: String },

    #[error("{message}")]
    #[diagnostic(code(chartgate::cli::config))]
    Config { message: String },

    #[error("IO error: {message}")]
    #[diagnostic(code(chartgate::cli::io))]
    Io { message: String },

    #[error("Internal error: {message}")]
    #[diagnostic(code(chartgate::cli::internal))]
    Internal { message: String },
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidReference { .. } => exit_codes::INVALID_REFERENCE,
            CliError::NotFound { .. } => exit_codes::NOT_FOUND,
            CliError::Cluster { .. } => exit_codes::CLUSTER_ERROR,
            CliError::Credentials { .. } => exit_codes::CREDENTIAL_ERROR,
            CliError::Config { .. } => exit_codes::CONFIG_ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Chart { .. } | CliError::Internal { .. } => exit_codes::ERROR,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    fn not_registered(message: String) -> Self {
        Self::NotFound {
            message,
            help: Some(REGISTRATION_HELP.to_string()),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::internal(err.to_string())
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidReference { .. } => CliError::InvalidReference {
                message: err.to_string(),
            },
            other => CliError::Chart {
                message: other.to_string(),
            },
        }
    }
}

impl From<KubeError> for CliError {
    fn from(err: KubeError) -> Self {
        match err {
            KubeError::StatusNotFound { .. } => CliError::NotFound {
                message: err.to_string(),
                help: None,
            },
            other => CliError::Cluster {
                message: other.to_string(),
            },
        }
    }
}

impl From<RepoError> for CliError {
    fn from(err: RepoError) -> Self {
        let message = err.to_string();
        match err {
            RepoError::InvalidReference(_) | RepoError::InvalidOciReference { .. } => {
                CliError::InvalidReference { message }
            }
            RepoError::RepositoryNotFound { .. } | RepoError::Resolution { .. } => {
                CliError::not_registered(message)
            }
            RepoError::Cluster(_) => CliError::Cluster { message },
            RepoError::Credential { .. } => CliError::Credentials { message },
            RepoError::Io(_) => CliError::Io { message },
            _ => CliError::Chart { message },
        }
    }
}

impl From<InstallError> for CliError {
    fn from(err: InstallError) -> Self {
        let message = err.to_string();
        match err.kind() {
            ErrorKind::InvalidReference => CliError::InvalidReference { message },
            ErrorKind::Resolution | ErrorKind::NotFound => CliError::not_registered(message),
            ErrorKind::ClusterApi => CliError::Cluster { message },
            ErrorKind::CredentialFetch => CliError::Credentials { message },
            ErrorKind::Configuration => CliError::Config { message },
            ErrorKind::ChartLocate | ErrorKind::ChartLoad | ErrorKind::InstallExecution => {
                CliError::Chart { message }
            }
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
