//! Chart model (Helm-compatible `Chart.yaml`) and resolved chart descriptors

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::reference::chart_version_from_url;

/// Annotation recording the reference a chart was installed from
pub const CHART_URL_ANNOTATION: &str = "chart_url";

/// Separator between chart and repository name in an index entry key
pub const INDEX_ENTRY_SEPARATOR: &str = "--";

/// Chart values document
pub type Values = serde_json::Map<String, serde_json::Value>;

/// Chart metadata, as found in `Chart.yaml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,

    /// Chart name
    #[serde(default)]
    pub name: String,

    /// Chart version (SemVer by convention, not enforced)
    #[serde(default)]
    pub version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kube_version: Option<String>,

    /// `application` or `library`
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub chart_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

impl ChartMetadata {
    /// Parse `Chart.yaml` content
    pub fn from_yaml(content: &str) -> crate::Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Parsed SemVer version, when the chart follows the convention
    pub fn semver(&self) -> Option<semver::Version> {
        semver::Version::parse(self.version.trim_start_matches('v')).ok()
    }
}

/// A file carried inside a chart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartFile {
    /// Path relative to the chart root
    pub name: String,
    pub data: Vec<u8>,
}

/// A loaded chart
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Chart {
    pub metadata: ChartMetadata,

    /// Default values from `values.yaml`
    pub values: Values,

    /// Files under `templates/`
    pub templates: Vec<ChartFile>,

    /// Every other file in the chart
    pub files: Vec<ChartFile>,
}

impl Chart {
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn version(&self) -> &str {
        &self.metadata.version
    }

    /// Record the reference the chart was installed from
    pub fn annotate_source(&mut self, reference: &str) {
        self.metadata
            .annotations
            .insert(CHART_URL_ANNOTATION.to_string(), reference.to_string());
    }

    /// Reference recorded by [`Chart::annotate_source`]
    pub fn source(&self) -> Option<&str> {
        self.metadata
            .annotations
            .get(CHART_URL_ANNOTATION)
            .map(String::as_str)
    }
}

/// Resolved descriptor of the chart an install operates on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartInfo {
    /// Name of the repository registration owning the chart
    pub repository_name: String,

    /// Chart name
    pub name: String,

    /// Resolved chart version, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Where the chart is fetched from (the original reference)
    pub location: String,
}

impl ChartInfo {
    /// Build from a pre-resolved catalog entry (`<chart>--<repository>`)
    ///
    /// Trusts the caller's catalog lookup: nothing is fetched or validated.
    /// An entry without a separator is taken as a bare repository name.
    pub fn from_index_entry(index_entry: &str, reference: &str) -> Self {
        let (name, repository_name) = match index_entry.rsplit_once(INDEX_ENTRY_SEPARATOR) {
            Some((chart, repository)) => (chart.to_string(), repository.to_string()),
            None => (
                crate::ChartReference::parse(reference)
                    .ok()
                    .and_then(|r| r.chart_name())
                    .unwrap_or_default(),
                index_entry.to_string(),
            ),
        };

        Self {
            repository_name,
            name,
            version: chart_version_from_url(reference),
            location: reference.to_string(),
        }
    }
}
