//! Authentication staging
//!
//! Repository registrations reference their TLS and auth material by Secret
//! and ConfigMap name. Staging fetches that material and turns it into chart
//! path options: PEM payloads are written to temporary files, basic auth is
//! copied verbatim.
//!
//! Staged files are owned by a [`StagedFiles`] guard that removes them on drop
//! when cleanup is enabled.

use chartgate_kube::ClusterClient;
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use std::fmt;
use std::io::Write;
use std::path::PathBuf;

use crate::connection::RepositoryConnection;
use crate::error::{RepoError, Result};

/// Secret key holding the client certificate
pub const TLS_CERT_KEY: &str = "tls.crt";
/// Secret key holding the client private key
pub const TLS_KEY_KEY: &str = "tls.key";
/// ConfigMap key holding the CA bundle
pub const CA_BUNDLE_KEY: &str = "ca-bundle.crt";
pub const USERNAME_KEY: &str = "username";
pub const PASSWORD_KEY: &str = "password";

/// Options used to locate a chart
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ChartPathOptions {
    /// Chart version to fetch
    pub version: Option<String>,

    /// URL of the repository serving the chart
    pub repo_url: Option<String>,

    /// PEM CA bundle used to verify the server
    pub ca_file: Option<PathBuf>,

    /// PEM client certificate
    pub cert_file: Option<PathBuf>,

    /// PEM client private key
    pub key_file: Option<PathBuf>,

    pub username: Option<String>,

    pub password: Option<String>,

    /// Send basic auth to every host, including redirect targets
    pub pass_credentials_all: bool,

    pub insecure_skip_tls_verify: bool,
}

impl ChartPathOptions {
    pub fn with_version(mut self, version: Option<String>) -> Self {
        self.version = version;
        self
    }

    pub fn basic_auth(&self) -> Option<(&str, &str)> {
        match (&self.username, &self.password) {
            (Some(u), Some(p)) => Some((u.as_str(), p.as_str())),
            (Some(u), None) => Some((u.as_str(), "")),
            _ => None,
        }
    }

    pub fn has_client_identity(&self) -> bool {
        self.cert_file.is_some() && self.key_file.is_some()
    }
}

impl fmt::Debug for ChartPathOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChartPathOptions")
            .field("version", &self.version)
            .field("repo_url", &self.repo_url)
            .field("ca_file", &self.ca_file)
            .field("cert_file", &self.cert_file)
            .field("key_file", &self.key_file)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("pass_credentials_all", &self.pass_credentials_all)
            .field("insecure_skip_tls_verify", &self.insecure_skip_tls_verify)
            .finish()
    }
}

/// Temporary credential files owned by one install call
#[derive(Debug)]
pub struct StagedFiles {
    files: Vec<PathBuf>,
    cleanup: bool,
}

impl StagedFiles {
    /// Create an empty guard; `cleanup` decides whether files are removed on drop
    pub fn new(cleanup: bool) -> Self {
        Self {
            files: Vec::new(),
            cleanup,
        }
    }

    pub fn push(&mut self, path: PathBuf) {
        self.files.push(path);
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn cleanup_enabled(&self) -> bool {
        self.cleanup
    }

    /// Create an empty temporary file and take ownership of it
    fn create(&mut self, suffix: &str) -> Result<(std::fs::File, PathBuf)> {
        let file = tempfile::Builder::new()
            .prefix("chartgate-")
            .suffix(suffix)
            .tempfile()?;
        let (file, path) = file.keep().map_err(|e| RepoError::Io(e.error))?;
        self.push(path.clone());
        Ok((file, path))
    }

    /// Write `data` to a new staged file
    pub fn write(&mut self, suffix: &str, data: &[u8]) -> Result<PathBuf> {
        let (mut file, path) = self.create(suffix)?;
        file.write_all(data)?;
        file.flush()?;
        Ok(path)
    }
}

impl Drop for StagedFiles {
    fn drop(&mut self) {
        if !self.cleanup {
            return;
        }
        for path in self.files.drain(..) {
            if let Err(e) = std::fs::remove_file(&path) {
                tracing::debug!(path = %path.display(), error = %e, "failed to remove staged file");
            }
        }
    }
}

fn secret_value(secret: &Secret, key: &str) -> Option<Vec<u8>> {
    secret
        .data
        .as_ref()
        .and_then(|d| d.get(key))
        .map(|v| v.0.clone())
        .or_else(|| {
            secret
                .string_data
                .as_ref()
                .and_then(|d| d.get(key))
                .map(|v| v.as_bytes().to_vec())
        })
}

fn config_map_value(config_map: &ConfigMap, key: &str) -> Option<Vec<u8>> {
    config_map
        .data
        .as_ref()
        .and_then(|d| d.get(key))
        .map(|v| v.as_bytes().to_vec())
        .or_else(|| {
            config_map
                .binary_data
                .as_ref()
                .and_then(|d| d.get(key))
                .map(|v| v.0.clone())
        })
}

fn require(value: Option<Vec<u8>>, kind: &str, namespace: &str, name: &str, key: &str) -> Result<Vec<u8>> {
    match value {
        None => Err(RepoError::credential(format!(
            "key '{}' missing from {} {}/{}",
            key, kind, namespace, name
        ))),
        Some(v) if v.is_empty() => Err(RepoError::credential(format!(
            "key '{}' of {} {}/{} is empty",
            key, kind, namespace, name
        ))),
        Some(v) => Ok(v),
    }
}

async fn fetch_secret(cluster: &dyn ClusterClient, namespace: &str, name: &str) -> Result<Secret> {
    cluster
        .get_secret(namespace, name)
        .await
        .map_err(|e| RepoError::credential(format!("failed to get secret {}/{}: {}", namespace, name, e)))?
        .ok_or_else(|| RepoError::credential(format!("secret {}/{} not found", namespace, name)))
}

async fn fetch_config_map(
    cluster: &dyn ClusterClient,
    namespace: &str,
    name: &str,
) -> Result<ConfigMap> {
    cluster
        .get_config_map(namespace, name)
        .await
        .map_err(|e| {
            RepoError::credential(format!("failed to get config map {}/{}: {}", namespace, name, e))
        })?
        .ok_or_else(|| RepoError::credential(format!("config map {}/{} not found", namespace, name)))
}

/// Fetch the connection's TLS and auth material into `options`
///
/// Every file is pushed into `staged` as soon as it exists, so a failure
/// part-way through leaves everything created so far under the guard.
pub async fn stage_authentication(
    cluster: &dyn ClusterClient,
    connection: &RepositoryConnection,
    options: &mut ChartPathOptions,
    staged: &mut StagedFiles,
    config_namespace: &str,
) -> Result<()> {
    let namespace = connection.credentials_namespace(config_namespace);

    if let Some(tls) = connection.tls_client_config() {
        let secret = fetch_secret(cluster, namespace, &tls.name).await?;
        let cert = require(secret_value(&secret, TLS_CERT_KEY), "secret", namespace, &tls.name, TLS_CERT_KEY)?;
        let key = require(secret_value(&secret, TLS_KEY_KEY), "secret", namespace, &tls.name, TLS_KEY_KEY)?;

        options.cert_file = Some(staged.write(".crt", &cert)?);
        options.key_file = Some(staged.write(".key", &key)?);
        tracing::debug!(repository = connection.repository(), "staged TLS client config");
    }

    if let Some(ca) = connection.ca() {
        let config_map = fetch_config_map(cluster, namespace, &ca.name).await?;
        let bundle = require(
            config_map_value(&config_map, CA_BUNDLE_KEY),
            "config map",
            namespace,
            &ca.name,
            CA_BUNDLE_KEY,
        )?;

        options.ca_file = Some(staged.write(".pem", &bundle)?);
        tracing::debug!(repository = connection.repository(), "staged CA bundle");
    }

    if let Some(auth) = connection.basic_auth_config() {
        let secret = fetch_secret(cluster, namespace, &auth.name).await?;
        let username = require(secret_value(&secret, USERNAME_KEY), "secret", namespace, &auth.name, USERNAME_KEY)?;
        let password = require(secret_value(&secret, PASSWORD_KEY), "secret", namespace, &auth.name, PASSWORD_KEY)?;

        options.username = Some(utf8(username, USERNAME_KEY)?);
        options.password = Some(utf8(password, PASSWORD_KEY)?);
    }

    options.pass_credentials_all = connection.pass_credentials_all();
    Ok(())
}

fn utf8(value: Vec<u8>, key: &str) -> Result<String> {
    String::from_utf8(value)
        .map_err(|_| RepoError::credential(format!("key '{}' is not valid UTF-8", key)))
}
