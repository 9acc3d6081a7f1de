//! Chart locating
//!
//! Downloads a chart archive for a reference and returns its path on disk.
//! Archives are cached under a directory keyed by the SHA-256 of the
//! reference, the requested version and the credentials used to fetch it, so
//! repeated installs of the same chart skip the network. Only pinned
//! references are served from the cache: an OCI reference without a digest
//! or a non-`latest` tag, or an archive URL without a version in its
//! filename, is downloaded on every call.

use chartgate_core::{ChartReference, ReferenceKind};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

use crate::credentials::ChartPathOptions;
use crate::error::{RepoError, Result};
use crate::http::HttpChartClient;
use crate::oci::{OciChartClient, parse_reference};

const ARCHIVE_NAME: &str = "chart.tgz";

/// Default chart cache directory (`<cache>/chartgate/charts`)
pub fn default_cache_dir() -> Result<PathBuf> {
    let cache_dir = dirs::cache_dir().ok_or_else(|| RepoError::CacheError {
        message: "Could not determine cache directory".to_string(),
    })?;
    Ok(cache_dir.join("chartgate").join("charts"))
}

/// Cache key of a reference, version and credential fingerprint
pub fn cache_key(reference: &str, version: Option<&str>, credentials: Option<&str>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(reference.as_bytes());
    if let Some(version) = version {
        hasher.update(b"\0v");
        hasher.update(version.as_bytes());
    }
    if let Some(credentials) = credentials {
        hasher.update(b"\0c");
        hasher.update(credentials.as_bytes());
    }
    hex::encode(hasher.finalize())
}

/// Fingerprint of the credentials in `options`, `None` for anonymous access
///
/// Staged credential files live at random paths, so the file contents are
/// hashed rather than their names.
pub fn credential_fingerprint(options: &ChartPathOptions) -> Result<Option<String>> {
    let files = [&options.ca_file, &options.cert_file, &options.key_file];
    let anonymous = files.iter().all(|f| f.is_none())
        && options.username.is_none()
        && options.password.is_none()
        && !options.insecure_skip_tls_verify
        && !options.pass_credentials_all;
    if anonymous {
        return Ok(None);
    }

    let mut hasher = Sha256::new();
    for (tag, file) in [b"ca", b"ct", b"ky"].iter().zip(files) {
        hasher.update(tag);
        if let Some(path) = file {
            hasher.update(std::fs::read(path)?);
        }
        hasher.update(b"\0");
    }
    for (tag, value) in [(b"us", &options.username), (b"pw", &options.password)] {
        hasher.update(tag);
        if let Some(value) = value {
            hasher.update(value.as_bytes());
        }
        hasher.update(b"\0");
    }
    hasher.update([
        u8::from(options.insecure_skip_tls_verify),
        u8::from(options.pass_credentials_all),
    ]);
    Ok(Some(hex::encode(hasher.finalize())))
}

/// True when `reference` names immutable content that may be served from cache
fn is_pinned(reference: &ChartReference, version: Option<&str>) -> bool {
    match reference.kind() {
        ReferenceKind::HttpArchive => reference.version().is_some(),
        ReferenceKind::Oci => {
            if reference.is_digest_pinned() {
                return true;
            }
            match version.map(str::to_string).or_else(|| reference.version()) {
                Some(tag) => tag != "latest",
                None => false,
            }
        }
    }
}

/// Downloads and caches chart archives
#[derive(Debug, Clone)]
pub struct ChartLocator {
    cache_dir: PathBuf,
}

impl ChartLocator {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    /// Locator using [`default_cache_dir`]
    pub fn with_default_cache() -> Result<Self> {
        Ok(Self::new(default_cache_dir()?))
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Path a reference is cached at for a credential fingerprint
    pub fn cached_path(
        &self,
        reference: &str,
        version: Option<&str>,
        credentials: Option<&str>,
    ) -> PathBuf {
        self.cache_dir
            .join(cache_key(reference, version, credentials))
            .join(ARCHIVE_NAME)
    }

    /// Locate the chart archive of `reference`, downloading it if needed
    pub async fn locate(&self, reference: &str, options: &ChartPathOptions) -> Result<PathBuf> {
        let parsed = ChartReference::parse(reference)?;
        let version = options.version.as_deref().filter(|v| !v.is_empty());
        let fingerprint = credential_fingerprint(options)?;
        let target = self.cached_path(reference, version, fingerprint.as_deref());

        if is_pinned(&parsed, version) && target.is_file() {
            tracing::debug!(reference, path = %target.display(), "chart cache hit");
            return Ok(target);
        }

        let data = match parsed.kind() {
            ReferenceKind::HttpArchive => HttpChartClient::new(options)?.get_bytes(reference).await?,
            ReferenceKind::Oci => {
                let oci_ref = parse_reference(reference, version)?;
                OciChartClient::new(options)?.pull(&oci_ref).await?
            }
        };

        store(&target, &data)?;
        tracing::debug!(reference, path = %target.display(), bytes = data.len(), "chart downloaded");
        Ok(target)
    }
}

/// Write an archive next to its final path, then move it into place
fn store(target: &Path, data: &[u8]) -> Result<()> {
    let dir = target.parent().ok_or_else(|| RepoError::CacheError {
        message: format!("invalid cache path {}", target.display()),
    })?;
    std::fs::create_dir_all(dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    std::io::Write::write_all(&mut tmp, data)?;
    tmp.persist(target).map_err(|e| RepoError::Io(e.error))?;
    Ok(())
}
