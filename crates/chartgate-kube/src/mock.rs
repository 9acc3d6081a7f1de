//! In-memory cluster for testing
//!
//! `MockCluster` implements both `ClusterClient` and `StatusStore` so the
//! resolution pipeline and the install orchestrator can be exercised without
//! a Kubernetes cluster.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::ResourceExt;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::cluster::ClusterClient;
use crate::error::{KubeError, Result};
use crate::registration::{HelmChartRepository, ProjectHelmChartRepository};
use crate::status::{InstallStatus, StatusStore};

type Key = (String, String);

fn key(namespace: &str, name: &str) -> Key {
    (namespace.to_string(), name.to_string())
}

#[derive(Default)]
struct State {
    cluster_repositories: BTreeMap<String, HelmChartRepository>,
    namespace_repositories: BTreeMap<Key, ProjectHelmChartRepository>,
    secrets: BTreeMap<Key, Secret>,
    config_maps: BTreeMap<Key, ConfigMap>,
    statuses: BTreeMap<Key, InstallStatus>,
    /// Every status written, in order
    status_writes: Vec<InstallStatus>,
    /// Message returned by every cluster read while set
    read_failure: Option<String>,
}

/// Counts of operations performed for testing assertions
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OperationCounts {
    pub gets: usize,
    pub lists: usize,
    pub creates: usize,
    pub updates: usize,
    pub deletes: usize,
}

impl OperationCounts {
    pub fn total(&self) -> usize {
        self.gets + self.lists + self.creates + self.updates + self.deletes
    }
}

/// In-memory `ClusterClient` and `StatusStore`
#[derive(Clone, Default)]
pub struct MockCluster {
    state: Arc<RwLock<State>>,
    operations: Arc<RwLock<OperationCounts>>,
}

impl MockCluster {
    /// Create an empty cluster
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    fn count(&self, f: impl FnOnce(&mut OperationCounts)) {
        let mut ops = self.operations.write().unwrap_or_else(|e| e.into_inner());
        f(&mut ops);
    }

    fn check_reads(&self) -> Result<()> {
        match &self.read().read_failure {
            Some(message) => Err(KubeError::api(500, "InternalError", message.clone())),
            None => Ok(()),
        }
    }

    /// Add a cluster-scoped repository registration
    pub fn with_cluster_repository(self, repository: HelmChartRepository) -> Self {
        self.write()
            .cluster_repositories
            .insert(repository.name_any(), repository);
        self
    }

    /// Add a namespace-scoped repository registration
    pub fn with_namespace_repository(self, repository: ProjectHelmChartRepository) -> Self {
        let namespace = repository.namespace().unwrap_or_default();
        self.write()
            .namespace_repositories
            .insert(key(&namespace, &repository.name_any()), repository);
        self
    }

    /// Add a Secret with the given data entries
    pub fn with_secret<K, V>(
        self,
        namespace: &str,
        name: &str,
        entries: impl IntoIterator<Item = (K, V)>,
    ) -> Self
    where
        K: Into<String>,
        V: Into<Vec<u8>>,
    {
        let data = entries
            .into_iter()
            .map(|(k, v)| (k.into(), k8s_openapi::ByteString(v.into())))
            .collect();
        let secret = Secret {
            metadata: object_meta(namespace, name),
            data: Some(data),
            ..Default::default()
        };
        self.write().secrets.insert(key(namespace, name), secret);
        self
    }

    /// Add a ConfigMap with the given data entries
    pub fn with_config_map<K, V>(
        self,
        namespace: &str,
        name: &str,
        entries: impl IntoIterator<Item = (K, V)>,
    ) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let data = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        let config_map = ConfigMap {
            metadata: object_meta(namespace, name),
            data: Some(data),
            ..Default::default()
        };
        self.write()
            .config_maps
            .insert(key(namespace, name), config_map);
        self
    }

    /// Make every cluster read fail with an internal server error
    pub fn fail_reads(&self, message: impl Into<String>) {
        self.write().read_failure = Some(message.into());
    }

    /// Get operation counts for assertions
    pub fn operation_counts(&self) -> OperationCounts {
        self.operations
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Reset operation counts
    pub fn reset_counts(&self) {
        self.count(|ops| *ops = OperationCounts::default());
    }

    /// Current status object, bypassing operation counts
    pub fn status(&self, namespace: &str, name: &str) -> Option<InstallStatus> {
        self.read().statuses.get(&key(namespace, name)).cloned()
    }

    /// Every status written through `create` and `update`, oldest first
    pub fn status_writes(&self) -> Vec<InstallStatus> {
        self.read().status_writes.clone()
    }

    pub fn status_count(&self) -> usize {
        self.read().statuses.len()
    }
}

fn object_meta(namespace: &str, name: &str) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: Some(namespace.to_string()),
        ..Default::default()
    }
}

#[async_trait]
impl ClusterClient for MockCluster {
    async fn list_cluster_repositories(&self) -> Result<Vec<HelmChartRepository>> {
        self.count(|ops| ops.lists += 1);
        self.check_reads()?;
        Ok(self.read().cluster_repositories.values().cloned().collect())
    }

    async fn get_cluster_repository(&self, name: &str) -> Result<Option<HelmChartRepository>> {
        self.count(|ops| ops.gets += 1);
        self.check_reads()?;
        Ok(self.read().cluster_repositories.get(name).cloned())
    }

    async fn list_namespace_repositories(
        &self,
        namespace: &str,
    ) -> Result<Vec<ProjectHelmChartRepository>> {
        self.count(|ops| ops.lists += 1);
        self.check_reads()?;
        Ok(self
            .read()
            .namespace_repositories
            .iter()
            .filter(|((ns, _), _)| ns == namespace)
            .map(|(_, repo)| repo.clone())
            .collect())
    }

    async fn get_namespace_repository(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<ProjectHelmChartRepository>> {
        self.count(|ops| ops.gets += 1);
        self.check_reads()?;
        Ok(self
            .read()
            .namespace_repositories
            .get(&key(namespace, name))
            .cloned())
    }

    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<Secret>> {
        self.count(|ops| ops.gets += 1);
        self.check_reads()?;
        Ok(self.read().secrets.get(&key(namespace, name)).cloned())
    }

    async fn get_config_map(&self, namespace: &str, name: &str) -> Result<Option<ConfigMap>> {
        self.count(|ops| ops.gets += 1);
        self.check_reads()?;
        Ok(self.read().config_maps.get(&key(namespace, name)).cloned())
    }
}

#[async_trait]
impl StatusStore for MockCluster {
    async fn create(&self, status: &InstallStatus) -> Result<()> {
        self.count(|ops| ops.creates += 1);

        let mut state = self.write();
        let k = key(&status.namespace, &status.name);
        if state.statuses.contains_key(&k) {
            return Err(KubeError::StatusAlreadyExists {
                name: status.name.clone(),
                namespace: status.namespace.clone(),
            });
        }
        state.statuses.insert(k, status.clone());
        state.status_writes.push(status.clone());
        Ok(())
    }

    async fn get(&self, namespace: &str, name: &str) -> Result<InstallStatus> {
        self.count(|ops| ops.gets += 1);

        self.read()
            .statuses
            .get(&key(namespace, name))
            .cloned()
            .ok_or_else(|| KubeError::StatusNotFound {
                name: name.to_string(),
                namespace: namespace.to_string(),
            })
    }

    async fn update(&self, status: &InstallStatus) -> Result<()> {
        self.count(|ops| ops.updates += 1);

        let mut state = self.write();
        state
            .statuses
            .insert(key(&status.namespace, &status.name), status.clone());
        state.status_writes.push(status.clone());
        Ok(())
    }

    async fn delete(&self, namespace: &str, name: &str) -> Result<()> {
        self.count(|ops| ops.deletes += 1);

        self.write().statuses.remove(&key(namespace, name));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chartgate_core::ReleaseStatus;

    #[tokio::test]
    async fn test_registrations_and_counts() {
        let cluster = MockCluster::new()
            .with_cluster_repository(HelmChartRepository::for_url(
                "stable",
                "https://charts.example.com",
            ))
            .with_namespace_repository(ProjectHelmChartRepository::for_url(
                "team-a",
                "team",
                "oci://registry.example.com/team-a",
            ));

        assert_eq!(cluster.list_cluster_repositories().await.unwrap().len(), 1);
        assert_eq!(cluster.list_namespace_repositories("team-a").await.unwrap().len(), 1);
        assert!(cluster.list_namespace_repositories("team-b").await.unwrap().is_empty());
        assert!(cluster.get_cluster_repository("stable").await.unwrap().is_some());
        assert!(cluster.get_namespace_repository("team-b", "team").await.unwrap().is_none());

        let counts = cluster.operation_counts();
        assert_eq!(counts.lists, 3);
        assert_eq!(counts.gets, 2);
        assert_eq!(counts.total(), 5);

        cluster.reset_counts();
        assert_eq!(cluster.operation_counts().total(), 0);
    }

    #[tokio::test]
    async fn test_secret_and_config_map() {
        let cluster = MockCluster::new()
            .with_secret("cfg", "auth", [("username", "admin"), ("password", "s3cret")])
            .with_config_map("cfg", "ca", [("ca-bundle.crt", "-----BEGIN CERTIFICATE-----")]);

        let secret = cluster.get_secret("cfg", "auth").await.unwrap().unwrap();
        let data = secret.data.unwrap();
        assert_eq!(data["username"].0, b"admin");

        let cm = cluster.get_config_map("cfg", "ca").await.unwrap().unwrap();
        assert!(cm.data.unwrap().contains_key("ca-bundle.crt"));

        assert!(cluster.get_secret("other", "auth").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_read_failure_injection() {
        let cluster = MockCluster::new();
        cluster.fail_reads("connection refused");

        let err = cluster.list_cluster_repositories().await.unwrap_err();
        assert!(matches!(err, KubeError::Api(_)));
        assert!(err.to_string().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_status_lifecycle() {
        let cluster = MockCluster::new();
        let mut status = InstallStatus::pending("web", "default", 1, "oci://r/web:1.0.0");

        cluster.create(&status).await.unwrap();
        let err = cluster.create(&status).await.unwrap_err();
        assert!(err.is_conflict());

        status.mark_failed("boom");
        cluster.update(&status).await.unwrap();
        assert_eq!(
            StatusStore::get(&cluster, "default", "web").await.unwrap().status,
            ReleaseStatus::Failed
        );

        cluster.delete("default", "web").await.unwrap();
        cluster.delete("default", "web").await.unwrap();
        assert!(!cluster.exists("default", "web").await.unwrap());

        let writes = cluster.status_writes();
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[0].status, ReleaseStatus::PendingInstall);
        assert_eq!(writes[1].status, ReleaseStatus::Failed);
    }
}
