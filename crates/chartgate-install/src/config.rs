//! Installer configuration
//!
//! Stored in `~/.config/chartgate/config.yaml`

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{InstallError, Result};

/// Default namespace holding credentials of cluster-scoped repositories
pub const DEFAULT_CONFIG_NAMESPACE: &str = "chartgate-config";

/// Installer settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InstallerConfig {
    /// Remove staged credential files when an install finishes
    pub file_cleanup: bool,

    /// How long a failed status object stays visible before deletion
    #[serde(with = "humantime_serde")]
    pub failed_status_ttl: Duration,

    /// Namespace holding credentials of cluster-scoped repositories
    pub config_namespace: String,

    /// Chart download cache; `<cache>/chartgate/charts` when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,

    pub insecure_skip_tls_verify: bool,
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            file_cleanup: true,
            failed_status_ttl: Duration::from_secs(15),
            config_namespace: DEFAULT_CONFIG_NAMESPACE.to_string(),
            cache_dir: None,
            insecure_skip_tls_verify: false,
        }
    }
}

impl InstallerConfig {
    /// Load configuration from default location
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| InstallError::Config {
            message: format!("failed to read {}: {}", path.display(), e),
        })?;
        serde_yaml::from_str(&content).map_err(|e| InstallError::Config {
            message: format!("failed to parse {}: {}", path.display(), e),
        })
    }

    /// Get default configuration path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| InstallError::Config {
            message: "Could not determine config directory".to_string(),
        })?;
        Ok(config_dir.join("chartgate").join("config.yaml"))
    }

    pub fn with_file_cleanup(mut self, enabled: bool) -> Self {
        self.file_cleanup = enabled;
        self
    }

    pub fn with_failed_status_ttl(mut self, ttl: Duration) -> Self {
        self.failed_status_ttl = ttl;
        self
    }

    pub fn with_config_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.config_namespace = namespace.into();
        self
    }
}
