//! chartgate Kube - Kubernetes integration
//!
//! - **Registrations**: `HelmChartRepository` / `ProjectHelmChartRepository` custom resources
//! - **Cluster access**: the `ClusterClient` trait and its `kube` implementation
//! - **Status objects**: install progress records persisted as Secrets
//! - **Mock cluster**: in-memory implementation for tests

pub mod cluster;
pub mod error;
pub mod mock;
pub mod registration;
pub mod status;

pub use cluster::{ClusterClient, KubeCluster};
pub use error::{KubeError, Result};
pub use mock::{MockCluster, OperationCounts};
pub use registration::{
    ConfigMapNameReference, ConnectionConfig, ConnectionConfigNamespaceScoped,
    HelmChartRepository, HelmChartRepositorySpec, ProjectHelmChartRepository,
    ProjectHelmChartRepositorySpec, REGISTRATION_GROUP, SecretNameReference,
};
pub use status::{
    InstallStatus, SecretStatusStore, StatusStore, decode_status, encode_status, status_labels,
};
