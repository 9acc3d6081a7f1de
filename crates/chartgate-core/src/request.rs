//! Boundary payloads constructed by callers of the installer

use serde::{Deserialize, Serialize};

use crate::chart::Values;

/// A chart install request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstallRequest {
    /// Release name
    #[serde(default)]
    pub name: String,

    /// Target namespace
    #[serde(default)]
    pub namespace: String,

    /// Chart reference (OCI reference or HTTP(S) archive URL)
    #[serde(default)]
    pub chart_url: String,

    /// Explicit version; for direct URL installs, used when `chart_url` carries no tag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart_version: Option<String>,

    /// Values overriding the chart defaults
    #[serde(default)]
    pub values: Values,

    /// Status object version
    #[serde(default)]
    pub version: u32,

    /// Pre-resolved catalog entry (`<chart>--<repository>`)
    #[serde(
        default,
        rename = "indexEntry",
        skip_serializing_if = "Option::is_none"
    )]
    pub index_entry: Option<String>,
}

impl InstallRequest {
    pub fn new(
        name: impl Into<String>,
        namespace: impl Into<String>,
        chart_url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            chart_url: chart_url.into(),
            ..Default::default()
        }
    }

    pub fn with_values(mut self, values: Values) -> Self {
        self.values = values;
        self
    }

    pub fn with_chart_version(mut self, version: impl Into<String>) -> Self {
        self.chart_version = Some(version.into());
        self
    }

    pub fn with_index_entry(mut self, entry: impl Into<String>) -> Self {
        self.index_entry = Some(entry.into());
        self
    }

    /// Explicit version, ignoring empty strings sent by loosely-typed clients
    pub fn explicit_version(&self) -> Option<&str> {
        self.chart_version.as_deref().filter(|v| !v.is_empty())
    }

    /// Index entry, ignoring empty strings
    pub fn catalog_entry(&self) -> Option<&str> {
        self.index_entry.as_deref().filter(|e| !e.is_empty())
    }
}

/// A chart verification request (dry-run and validation flows)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerifierRequest {
    #[serde(default)]
    pub chart_url: String,

    #[serde(default)]
    pub values: Values,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_from_json() {
        let json = r#"{
            "name": "argocd",
            "namespace": "gitops",
            "chart_url": "https://example.com/charts/argo-cd-9.4.1.tgz",
            "values": {"server": {"replicas": 2}},
            "version": 1,
            "indexEntry": "argo-cd--community"
        }"#;

        let request: InstallRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.name, "argocd");
        assert_eq!(request.namespace, "gitops");
        assert_eq!(request.version, 1);
        assert_eq!(request.catalog_entry(), Some("argo-cd--community"));
        assert_eq!(request.explicit_version(), None);
        assert_eq!(request.values["server"]["replicas"], 2);
    }

    #[test]
    fn test_empty_optional_fields_are_ignored() {
        let json = r#"{"name": "x", "chart_url": "oci://h/c", "chart_version": "", "indexEntry": ""}"#;
        let request: InstallRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.explicit_version(), None);
        assert_eq!(request.catalog_entry(), None);
    }

    #[test]
    fn test_request_serializes_wire_names() {
        let request = InstallRequest::new("web", "default", "oci://ghcr.io/org/nginx")
            .with_chart_version("1.0.0")
            .with_index_entry("nginx--org");
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["chart_url"], "oci://ghcr.io/org/nginx");
        assert_eq!(json["chart_version"], "1.0.0");
        assert_eq!(json["indexEntry"], "nginx--org");
    }

    #[test]
    fn test_verifier_request() {
        let request: VerifierRequest =
            serde_json::from_str(r#"{"chart_url": "oci://h/c:1.0.0", "values": {}}"#).unwrap();
        assert_eq!(request.chart_url, "oci://h/c:1.0.0");
        assert!(request.values.is_empty());
    }
}
