//! Install status objects
//!
//! The asynchronous install path reports progress through a status object
//! keyed by namespace and release name. Callers poll it; the background task
//! is the only writer after creation.
//!
//! Payloads are stored the way Helm stores releases: JSON, gzip-compressed,
//! then base64-encoded.

mod secrets;

pub use secrets::SecretStatusStore;

use async_trait::async_trait;
use chartgate_core::ReleaseStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{Read, Write};

use crate::error::{KubeError, Result};

/// Label identifying objects owned by chartgate
pub const MANAGED_BY_LABEL: &str = "app.kubernetes.io/managed-by";
pub const MANAGED_BY_VALUE: &str = "chartgate";
pub const STATUS_LABEL: &str = "chartgate.io/status";
pub const VERSION_LABEL: &str = "chartgate.io/version";

/// Progress record of an install
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallStatus {
    /// Release name, also the object name
    pub name: String,

    pub namespace: String,

    pub version: u32,

    pub status: ReleaseStatus,

    #[serde(default)]
    pub description: String,

    /// Chart reference the install was requested for
    #[serde(default)]
    pub chart_url: String,

    pub updated_at: DateTime<Utc>,
}

impl InstallStatus {
    /// A fresh `pending-install` record; a zero version becomes 1
    pub fn pending(
        name: impl Into<String>,
        namespace: impl Into<String>,
        version: u32,
        chart_url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            version: version.max(1),
            status: ReleaseStatus::PendingInstall,
            description: "Initial install underway".to_string(),
            chart_url: chart_url.into(),
            updated_at: Utc::now(),
        }
    }

    /// Record a failed install. Failed records always carry version 1.
    pub fn mark_failed(&mut self, description: impl Into<String>) {
        self.version = 1;
        self.status = ReleaseStatus::Failed;
        self.description = description.into();
        self.updated_at = Utc::now();
    }

    pub fn is_failed(&self) -> bool {
        self.status == ReleaseStatus::Failed
    }

    pub fn is_pending(&self) -> bool {
        self.status.is_pending()
    }
}

/// Persistence of install status objects
#[async_trait]
pub trait StatusStore: Send + Sync {
    /// Create a status object; fails if one already exists
    async fn create(&self, status: &InstallStatus) -> Result<()>;

    /// Get the status object for a release
    async fn get(&self, namespace: &str, name: &str) -> Result<InstallStatus>;

    /// Overwrite the status object, creating it if it is gone
    async fn update(&self, status: &InstallStatus) -> Result<()>;

    /// Delete the status object. Deleting a missing object succeeds.
    async fn delete(&self, namespace: &str, name: &str) -> Result<()>;

    /// Check if a status object exists
    async fn exists(&self, namespace: &str, name: &str) -> Result<bool> {
        match self.get(namespace, name).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// Encode a status for storage (serialize + gzip + base64)
#[must_use = "encoded data should be used for storage"]
pub fn encode_status(status: &InstallStatus) -> Result<String> {
    let json = serde_json::to_vec(status)?;
    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder
        .write_all(&json)
        .map_err(|e| KubeError::Compression(e.to_string()))?;
    let compressed = encoder
        .finish()
        .map_err(|e| KubeError::Compression(e.to_string()))?;
    Ok(base64::Engine::encode(
        &base64::engine::general_purpose::STANDARD,
        &compressed,
    ))
}

/// Decode a stored status (base64 + gunzip + deserialize)
#[must_use = "decoded status should be used"]
pub fn decode_status(data: &str) -> Result<InstallStatus> {
    let decoded = base64::Engine::decode(&base64::engine::general_purpose::STANDARD, data)
        .map_err(|e| KubeError::Serialization(format!("base64 decode error: {}", e)))?;
    let mut decoder = flate2::read::GzDecoder::new(decoded.as_slice());
    let mut json = Vec::new();
    decoder
        .read_to_end(&mut json)
        .map_err(|e| KubeError::Compression(e.to_string()))?;
    Ok(serde_json::from_slice(&json)?)
}

/// Labels applied to status objects
#[must_use = "labels should be applied to resources"]
pub fn status_labels(status: &InstallStatus) -> BTreeMap<String, String> {
    let mut labels = BTreeMap::new();
    labels.insert(MANAGED_BY_LABEL.to_string(), MANAGED_BY_VALUE.to_string());
    labels.insert(STATUS_LABEL.to_string(), status.status.as_str().to_string());
    labels.insert(VERSION_LABEL.to_string(), status.version.to_string());
    labels
}
