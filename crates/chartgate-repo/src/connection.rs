//! Repository connection resolution
//!
//! A repository name is looked up as a cluster-scoped registration first, then
//! as a registration in the caller's namespace.

use chartgate_kube::{
    ClusterClient, ConfigMapNameReference, ConnectionConfig, ConnectionConfigNamespaceScoped,
    SecretNameReference,
};

use crate::error::{RepoError, Result};

/// Connection settings of a resolved repository, tagged by scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryConnection {
    ClusterScoped {
        repository: String,
        config: ConnectionConfig,
    },
    NamespaceScoped {
        repository: String,
        namespace: String,
        config: ConnectionConfigNamespaceScoped,
    },
}

impl RepositoryConnection {
    /// Registration name
    pub fn repository(&self) -> &str {
        match self {
            Self::ClusterScoped { repository, .. } | Self::NamespaceScoped { repository, .. } => {
                repository
            }
        }
    }

    pub fn url(&self) -> &str {
        match self {
            Self::ClusterScoped { config, .. } => &config.url,
            Self::NamespaceScoped { config, .. } => &config.url,
        }
    }

    pub fn is_cluster_scoped(&self) -> bool {
        matches!(self, Self::ClusterScoped { .. })
    }

    pub fn ca(&self) -> Option<&ConfigMapNameReference> {
        match self {
            Self::ClusterScoped { config, .. } => config.ca.as_ref(),
            Self::NamespaceScoped { config, .. } => config.ca.as_ref(),
        }
    }

    pub fn tls_client_config(&self) -> Option<&SecretNameReference> {
        match self {
            Self::ClusterScoped { config, .. } => config.tls_client_config.as_ref(),
            Self::NamespaceScoped { config, .. } => config.tls_client_config.as_ref(),
        }
    }

    pub fn basic_auth_config(&self) -> Option<&SecretNameReference> {
        match self {
            Self::ClusterScoped { config, .. } => config.basic_auth_config.as_ref(),
            Self::NamespaceScoped { config, .. } => config.basic_auth_config.as_ref(),
        }
    }

    /// Always false for cluster-scoped repositories
    pub fn pass_credentials_all(&self) -> bool {
        match self {
            Self::ClusterScoped { .. } => false,
            Self::NamespaceScoped { config, .. } => config.pass_credentials_all,
        }
    }

    /// Namespace holding the referenced Secrets and ConfigMaps
    pub fn credentials_namespace<'a>(&'a self, config_namespace: &'a str) -> &'a str {
        match self {
            Self::ClusterScoped { .. } => config_namespace,
            Self::NamespaceScoped { namespace, .. } => namespace,
        }
    }
}

/// Find the connection settings of `repository_name`
///
/// Disabled registrations are still returned; the disabled flag only affects
/// reference resolution.
pub async fn resolve_connection(
    cluster: &dyn ClusterClient,
    repository_name: &str,
    namespace: &str,
) -> Result<RepositoryConnection> {
    if let Some(repo) = cluster.get_cluster_repository(repository_name).await? {
        tracing::debug!(repository = repository_name, "using cluster-scoped repository");
        return Ok(RepositoryConnection::ClusterScoped {
            repository: repository_name.to_string(),
            config: repo.spec.connection_config,
        });
    }

    if let Some(repo) = cluster
        .get_namespace_repository(namespace, repository_name)
        .await?
    {
        tracing::debug!(
            repository = repository_name,
            namespace,
            "using namespace-scoped repository"
        );
        return Ok(RepositoryConnection::NamespaceScoped {
            repository: repository_name.to_string(),
            namespace: namespace.to_string(),
            config: repo.spec.connection_config,
        });
    }

    Err(RepoError::RepositoryNotFound {
        name: repository_name.to_string(),
        namespace: namespace.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chartgate_kube::{HelmChartRepository, MockCluster, ProjectHelmChartRepository};

    #[tokio::test]
    async fn test_cluster_scope_takes_precedence() {
        let cluster = MockCluster::new()
            .with_cluster_repository(HelmChartRepository::for_url(
                "charts",
                "https://cluster.example.com",
            ))
            .with_namespace_repository(ProjectHelmChartRepository::for_url(
                "team-a",
                "charts",
                "https://team.example.com",
            ));

        let conn = resolve_connection(&cluster, "charts", "team-a").await.unwrap();
        assert!(conn.is_cluster_scoped());
        assert_eq!(conn.url(), "https://cluster.example.com");
        assert_eq!(conn.credentials_namespace("chartgate-config"), "chartgate-config");
        // Namespace lookup never happens
        assert_eq!(cluster.operation_counts().gets, 1);
    }

    #[tokio::test]
    async fn test_namespace_fallback() {
        let mut repo =
            ProjectHelmChartRepository::for_url("team-a", "team", "oci://registry.example.com/a");
        repo.spec.connection_config.pass_credentials_all = true;
        let cluster = MockCluster::new().with_namespace_repository(repo);

        let conn = resolve_connection(&cluster, "team", "team-a").await.unwrap();
        assert!(!conn.is_cluster_scoped());
        assert_eq!(conn.repository(), "team");
        assert!(conn.pass_credentials_all());
        assert_eq!(conn.credentials_namespace("chartgate-config"), "team-a");
    }

    #[tokio::test]
    async fn test_not_found() {
        let cluster = MockCluster::new().with_namespace_repository(
            ProjectHelmChartRepository::for_url("team-a", "team", "oci://r/a"),
        );

        let err = resolve_connection(&cluster, "team", "team-b").await.unwrap_err();
        assert!(matches!(err, RepoError::RepositoryNotFound { .. }));
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_cluster_failure_propagates() {
        let cluster = MockCluster::new();
        cluster.fail_reads("forbidden");

        let err = resolve_connection(&cluster, "team", "team-a").await.unwrap_err();
        assert!(matches!(err, RepoError::Cluster(_)));
    }
}
