//! Read access to the cluster objects the resolution pipeline depends on

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use kube::api::{Api, ListParams};
use kube::Client;

use crate::error::{KubeError, Result};
use crate::registration::{HelmChartRepository, ProjectHelmChartRepository};

/// Cluster reads performed during resolution and authentication staging
///
/// Lookups of a single object return `Ok(None)` when the object does not
/// exist; errors are reserved for transport and authorization failures.
#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// All cluster-scoped repository registrations
    async fn list_cluster_repositories(&self) -> Result<Vec<HelmChartRepository>>;

    /// A cluster-scoped repository registration by name
    async fn get_cluster_repository(&self, name: &str) -> Result<Option<HelmChartRepository>>;

    /// All namespace-scoped repository registrations in `namespace`
    async fn list_namespace_repositories(
        &self,
        namespace: &str,
    ) -> Result<Vec<ProjectHelmChartRepository>>;

    /// A namespace-scoped repository registration by name
    async fn get_namespace_repository(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<ProjectHelmChartRepository>>;

    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<Secret>>;

    async fn get_config_map(&self, namespace: &str, name: &str) -> Result<Option<ConfigMap>>;
}

/// `ClusterClient` backed by the Kubernetes API
#[derive(Clone)]
pub struct KubeCluster {
    client: Client,
}

impl KubeCluster {
    /// Connect using the default kubeconfig / in-cluster configuration
    pub async fn new() -> Result<Self> {
        let client = Client::try_default().await?;
        Ok(Self { client })
    }

    /// Create with an existing client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

/// A missing CRD answers list calls with 404; treat it as "no registrations"
fn empty_on_missing<T>(result: std::result::Result<Vec<T>, kube::Error>) -> Result<Vec<T>> {
    match result {
        Ok(items) => Ok(items),
        Err(kube::Error::Api(e)) if e.code == 404 => Ok(Vec::new()),
        Err(e) => Err(KubeError::Api(e)),
    }
}

#[async_trait]
impl ClusterClient for KubeCluster {
    async fn list_cluster_repositories(&self) -> Result<Vec<HelmChartRepository>> {
        let api: Api<HelmChartRepository> = Api::all(self.client.clone());
        let result = api.list(&ListParams::default()).await.map(|list| list.items);
        empty_on_missing(result)
    }

    async fn get_cluster_repository(&self, name: &str) -> Result<Option<HelmChartRepository>> {
        let api: Api<HelmChartRepository> = Api::all(self.client.clone());
        Ok(api.get_opt(name).await?)
    }

    async fn list_namespace_repositories(
        &self,
        namespace: &str,
    ) -> Result<Vec<ProjectHelmChartRepository>> {
        let api: Api<ProjectHelmChartRepository> =
            Api::namespaced(self.client.clone(), namespace);
        let result = api.list(&ListParams::default()).await.map(|list| list.items);
        empty_on_missing(result)
    }

    async fn get_namespace_repository(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<ProjectHelmChartRepository>> {
        let api: Api<ProjectHelmChartRepository> =
            Api::namespaced(self.client.clone(), namespace);
        Ok(api.get_opt(name).await?)
    }

    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<Secret>> {
        let api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        Ok(api.get_opt(name).await?)
    }

    async fn get_config_map(&self, namespace: &str, name: &str) -> Result<Option<ConfigMap>> {
        let api: Api<ConfigMap> = Api::namespaced(self.client.clone(), namespace);
        Ok(api.get_opt(name).await?)
    }
}
