//! Repository registration custom resources
//!
//! Two registration kinds describe where charts come from:
//! - `HelmChartRepository` (cluster-scoped): credentials live in the
//!   configuration namespace
//! - `ProjectHelmChartRepository` (namespaced): credentials live next to the
//!   registration

use kube::CustomResource;
use kube::ResourceExt;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// API group of the registration resources
pub const REGISTRATION_GROUP: &str = "helm.example.io";

/// Reference to a Secret by name
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, Eq, JsonSchema)]
pub struct SecretNameReference {
    pub name: String,
}

/// Reference to a ConfigMap by name
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, Eq, JsonSchema)]
pub struct ConfigMapNameReference {
    pub name: String,
}

/// Connection settings of a cluster-scoped repository
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionConfig {
    /// Repository URL (HTTP(S) or OCI)
    pub url: String,

    /// ConfigMap holding the CA bundle (key `ca-bundle.crt`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca: Option<ConfigMapNameReference>,

    /// Secret holding the client certificate and key (keys `tls.crt`, `tls.key`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_client_config: Option<SecretNameReference>,

    /// Secret holding basic auth credentials (keys `username`, `password`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basic_auth_config: Option<SecretNameReference>,
}

/// Connection settings of a namespace-scoped repository
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionConfigNamespaceScoped {
    /// Repository URL (HTTP(S) or OCI)
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca: Option<ConfigMapNameReference>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_client_config: Option<SecretNameReference>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basic_auth_config: Option<SecretNameReference>,

    /// Send credentials to every host, not only the repository host
    #[serde(default)]
    pub pass_credentials_all: bool,
}

/// Cluster-scoped chart repository registration
#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[kube(
    group = "helm.example.io",
    version = "v1beta1",
    kind = "HelmChartRepository",
    plural = "helmchartrepositories"
)]
#[serde(rename_all = "camelCase")]
pub struct HelmChartRepositorySpec {
    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Disabled repositories are ignored during resolution
    #[serde(default)]
    pub disabled: bool,

    pub connection_config: ConnectionConfig,
}

/// Namespace-scoped chart repository registration
#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[kube(
    group = "helm.example.io",
    version = "v1beta1",
    kind = "ProjectHelmChartRepository",
    plural = "projecthelmchartrepositories",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct ProjectHelmChartRepositorySpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub disabled: bool,

    pub connection_config: ConnectionConfigNamespaceScoped,
}

impl HelmChartRepository {
    /// Registration for `url` without credentials
    pub fn for_url(name: &str, url: &str) -> Self {
        Self::new(
            name,
            HelmChartRepositorySpec {
                connection_config: ConnectionConfig {
                    url: url.to_string(),
                    ..Default::default()
                },
                ..Default::default()
            },
        )
    }

    pub fn url(&self) -> &str {
        &self.spec.connection_config.url
    }

    pub fn registration_name(&self) -> String {
        self.name_any()
    }
}

impl ProjectHelmChartRepository {
    /// Registration for `url` in `namespace` without credentials
    pub fn for_url(namespace: &str, name: &str, url: &str) -> Self {
        let mut repo = Self::new(
            name,
            ProjectHelmChartRepositorySpec {
                connection_config: ConnectionConfigNamespaceScoped {
                    url: url.to_string(),
                    ..Default::default()
                },
                ..Default::default()
            },
        );
        repo.metadata.namespace = Some(namespace.to_string());
        repo
    }

    pub fn url(&self) -> &str {
        &self.spec.connection_config.url
    }

    pub fn registration_name(&self) -> String {
        self.name_any()
    }
}
