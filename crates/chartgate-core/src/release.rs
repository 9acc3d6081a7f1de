//! Release types returned by the chart engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::chart::{ChartMetadata, Values};

/// Release status (Helm-compatible names)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReleaseStatus {
    #[default]
    Unknown,
    Deployed,
    Uninstalled,
    Superseded,
    Failed,
    Uninstalling,
    PendingInstall,
    PendingUpgrade,
    PendingRollback,
}

impl ReleaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReleaseStatus::Unknown => "unknown",
            ReleaseStatus::Deployed => "deployed",
            ReleaseStatus::Uninstalled => "uninstalled",
            ReleaseStatus::Superseded => "superseded",
            ReleaseStatus::Failed => "failed",
            ReleaseStatus::Uninstalling => "uninstalling",
            ReleaseStatus::PendingInstall => "pending-install",
            ReleaseStatus::PendingUpgrade => "pending-upgrade",
            ReleaseStatus::PendingRollback => "pending-rollback",
        }
    }

    /// Parse a status label value, mapping anything unrecognised to `Unknown`
    pub fn from_label(value: &str) -> Self {
        match value {
            "deployed" => ReleaseStatus::Deployed,
            "uninstalled" => ReleaseStatus::Uninstalled,
            "superseded" => ReleaseStatus::Superseded,
            "failed" => ReleaseStatus::Failed,
            "uninstalling" => ReleaseStatus::Uninstalling,
            "pending-install" => ReleaseStatus::PendingInstall,
            "pending-upgrade" => ReleaseStatus::PendingUpgrade,
            "pending-rollback" => ReleaseStatus::PendingRollback,
            _ => ReleaseStatus::Unknown,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(
            self,
            ReleaseStatus::PendingInstall
                | ReleaseStatus::PendingUpgrade
                | ReleaseStatus::PendingRollback
        )
    }
}

impl fmt::Display for ReleaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Release lifecycle information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseInfo {
    pub status: ReleaseStatus,

    #[serde(default)]
    pub description: String,

    pub first_deployed: DateTime<Utc>,

    pub last_deployed: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ReleaseInfo {
    pub fn new(status: ReleaseStatus, description: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            status,
            description: description.into(),
            first_deployed: now,
            last_deployed: now,
            notes: None,
        }
    }
}

/// An installed release
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Release {
    pub name: String,

    pub namespace: String,

    /// Revision (1 for a fresh install)
    pub version: u32,

    /// Metadata of the chart the release was installed from
    pub chart: ChartMetadata,

    pub info: ReleaseInfo,

    /// User-supplied values
    #[serde(default)]
    pub config: Values,

    /// Rendered manifest
    #[serde(default)]
    pub manifest: String,
}

impl Release {
    pub fn new(
        name: impl Into<String>,
        namespace: impl Into<String>,
        chart: ChartMetadata,
        info: ReleaseInfo,
    ) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            version: 1,
            chart,
            info,
            config: Values::new(),
            manifest: String::new(),
        }
    }

    pub fn status(&self) -> ReleaseStatus {
        self.info.status
    }
}
