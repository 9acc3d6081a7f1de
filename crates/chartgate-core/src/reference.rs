//! Chart reference classification
//!
//! A chart reference is either an OCI reference (`oci://registry/repo/chart:tag`,
//! optionally pinned with `@sha256:...`) or a direct HTTP(S) archive URL whose
//! path ends in `.tgz` or `.tar.gz`. Anything else is rejected.
//!
//! Versions are recovered from the reference itself:
//!
//! ```text
//! oci://registry/repo/chart:1.0.0                  -> 1.0.0
//! oci://registry/repo/chart@sha256:...             -> (none, digests are not versions)
//! https://example.com/charts/argo-cd-9.4.1.tgz     -> 9.4.1
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

use crate::error::{CoreError, Result};

/// Matches `-<semver>.tgz` / `-<semver>.tar.gz` at the end of an archive filename
static CHART_VERSION_RE: Lazy<Regex> = Lazy::new(|| {
    let core = r"[0-9]+\.[0-9]+\.[0-9]+";
    let id = r"[a-zA-Z0-9-]+";
    let prerelease = format!(r"(?:-{id}(?:\.{id})*)?");
    let build = format!(r"(?:\+{id}(?:\.{id})*)?");
    Regex::new(&format!(r"-({core}{prerelease}{build})\.(?:tgz|tar\.gz)$"))
        .expect("chart version pattern is valid")
});

const ARCHIVE_EXTENSIONS: [&str; 2] = [".tgz", ".tar.gz"];

/// Kind of a valid chart reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReferenceKind {
    /// `oci://` registry reference
    Oci,
    /// `http://` or `https://` URL pointing at a chart archive
    HttpArchive,
}

impl ReferenceKind {
    /// Classify a parsed URL, returning `None` for unsupported references
    fn classify(url: &Url) -> Option<Self> {
        match url.scheme() {
            "oci" => Some(ReferenceKind::Oci),
            "http" | "https" => ARCHIVE_EXTENSIONS
                .iter()
                .any(|ext| url.path().ends_with(ext))
                .then_some(ReferenceKind::HttpArchive),
            _ => None,
        }
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceKind::Oci => write!(f, "oci"),
            ReferenceKind::HttpArchive => write!(f, "http-archive"),
        }
    }
}

/// Returns true for `oci://<ref>` or `http(s)://...` with a path ending in
/// `.tgz` or `.tar.gz` (query parameters allowed)
pub fn is_valid_chart_url(raw: &str) -> bool {
    Url::parse(raw)
        .ok()
        .and_then(|url| ReferenceKind::classify(&url))
        .is_some()
}

/// Extract the chart version embedded in a chart URL
///
/// For OCI URLs the version is the tag after the last `:` of the path. The
/// authority is never scanned, so a registry port is not mistaken for a tag.
/// For HTTP(S) archives the version is parsed from the filename using the
/// `<name>-<version>.tgz` convention.
pub fn chart_version_from_url(raw: &str) -> Option<String> {
    let url = Url::parse(raw).ok()?;
    version_from_parsed(&url)
}

fn version_from_parsed(url: &Url) -> Option<String> {
    let path = url.path();
    match url.scheme() {
        "oci" => {
            if path.contains('@') {
                return None;
            }
            let (_, tag) = path.rsplit_once(':')?;
            (!tag.is_empty()).then(|| tag.to_string())
        }
        "http" | "https" => {
            let (_, filename) = path.rsplit_once('/')?;
            CHART_VERSION_RE
                .captures(filename)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string())
        }
        _ => None,
    }
}

/// A validated chart reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartReference {
    raw: String,
    url: Url,
    kind: ReferenceKind,
}

impl ChartReference {
    /// Parse and classify a chart reference
    pub fn parse(raw: &str) -> Result<Self> {
        let invalid = || CoreError::InvalidReference {
            reference: raw.to_string(),
        };
        let url = Url::parse(raw).map_err(|_| invalid())?;
        let kind = ReferenceKind::classify(&url).ok_or_else(invalid)?;
        Ok(Self {
            raw: raw.to_string(),
            url,
            kind,
        })
    }

    /// The reference exactly as supplied
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn kind(&self) -> ReferenceKind {
        self.kind
    }

    pub fn is_oci(&self) -> bool {
        self.kind == ReferenceKind::Oci
    }

    /// OCI reference pinned by content digest
    pub fn is_digest_pinned(&self) -> bool {
        self.is_oci() && self.url.path().contains('@')
    }

    /// Version embedded in the reference, if any
    pub fn version(&self) -> Option<String> {
        version_from_parsed(&self.url)
    }

    /// Chart name derived from the last path segment
    pub fn chart_name(&self) -> Option<String> {
        let segment = self.url.path().rsplit('/').next().filter(|s| !s.is_empty())?;
        let name = match self.kind {
            ReferenceKind::Oci => {
                let segment = segment.split('@').next().unwrap_or(segment);
                segment.split(':').next().unwrap_or(segment)
            }
            ReferenceKind::HttpArchive => match CHART_VERSION_RE.find(segment) {
                Some(m) => &segment[..m.start()],
                None => ARCHIVE_EXTENSIONS
                    .iter()
                    .find_map(|ext| segment.strip_suffix(ext))
                    .unwrap_or(segment),
            },
        };
        (!name.is_empty()).then(|| name.to_string())
    }
}

impl FromStr for ChartReference {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ChartReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_chart_urls() {
        assert!(is_valid_chart_url("oci://ghcr.io/org/charts/nginx:1.0.0"));
        assert!(is_valid_chart_url("oci://ghcr.io/org/charts/nginx"));
        assert!(is_valid_chart_url("https://example.com/charts/nginx-1.0.0.tgz"));
        assert!(is_valid_chart_url("http://example.com/charts/nginx-1.0.0.tar.gz"));
        assert!(is_valid_chart_url(
            "https://example.com/charts/nginx-1.0.0.tgz?token=abc"
        ));
    }

    #[test]
    fn test_invalid_chart_urls() {
        assert!(!is_valid_chart_url("ftp://x/y.zip"));
        assert!(!is_valid_chart_url("ftp://example.com/nginx-1.0.0.tgz"));
        assert!(!is_valid_chart_url("https://example.com/charts/no-version-here.zip"));
        assert!(!is_valid_chart_url("https://example.com/charts/index.yaml"));
        // Extension in the query does not count
        assert!(!is_valid_chart_url("https://example.com/download?file=nginx.tgz"));
        assert!(!is_valid_chart_url("nginx-1.0.0.tgz"));
        assert!(!is_valid_chart_url(""));
        assert!(!is_valid_chart_url("not a url"));
    }

    #[test]
    fn test_oci_version() {
        assert_eq!(
            chart_version_from_url("oci://host/repo/chart:1.2.3").as_deref(),
            Some("1.2.3")
        );
        assert_eq!(
            chart_version_from_url("oci://ghcr.io/org/chart:v2.0.0-beta.1").as_deref(),
            Some("v2.0.0-beta.1")
        );
    }

    #[test]
    fn test_oci_registry_port_is_not_a_tag() {
        assert_eq!(chart_version_from_url("oci://localhost:5000/repo/chart"), None);
        assert_eq!(
            chart_version_from_url("oci://localhost:5000/repo/chart:0.4.0").as_deref(),
            Some("0.4.0")
        );
    }

    #[test]
    fn test_oci_digest_has_no_version() {
        assert_eq!(
            chart_version_from_url("oci://host/repo/chart@sha256:abcd0123"),
            None
        );
        assert_eq!(
            chart_version_from_url("oci://host/repo/chart:1.0.0@sha256:abcd0123"),
            None
        );
    }

    #[test]
    fn test_oci_empty_tag() {
        assert_eq!(chart_version_from_url("oci://host/repo/chart:"), None);
    }

    #[test]
    fn test_http_version_from_filename() {
        assert_eq!(
            chart_version_from_url("https://example.com/charts/argo-cd-9.4.1.tgz").as_deref(),
            Some("9.4.1")
        );
        assert_eq!(
            chart_version_from_url(
                "https://example.com/charts/argo-cd-9.4.1-rc.1+build5.tar.gz"
            )
            .as_deref(),
            Some("9.4.1-rc.1+build5")
        );
        assert_eq!(
            chart_version_from_url("https://example.com/charts/nginx-15.0.0.tgz?sig=xyz")
                .as_deref(),
            Some("15.0.0")
        );
    }

    #[test]
    fn test_http_without_version() {
        assert_eq!(
            chart_version_from_url("https://example.com/charts/no-version-here.zip"),
            None
        );
        assert_eq!(chart_version_from_url("https://example.com/charts/nginx.tgz"), None);
        assert_eq!(chart_version_from_url("https://example.com/charts/nginx-1.2.tgz"), None);
    }

    #[test]
    fn test_other_schemes_have_no_version() {
        assert_eq!(chart_version_from_url("ftp://example.com/nginx-1.0.0.tgz"), None);
        assert_eq!(chart_version_from_url("::not-a-url::"), None);
    }

    #[test]
    fn test_reference_parse() {
        let oci = ChartReference::parse("oci://ghcr.io/org/charts/nginx:1.0.0").unwrap();
        assert_eq!(oci.kind(), ReferenceKind::Oci);
        assert_eq!(oci.version().as_deref(), Some("1.0.0"));
        assert_eq!(oci.chart_name().as_deref(), Some("nginx"));
        assert!(!oci.is_digest_pinned());

        let http: ChartReference = "https://example.com/charts/argo-cd-9.4.1.tgz"
            .parse()
            .unwrap();
        assert_eq!(http.kind(), ReferenceKind::HttpArchive);
        assert_eq!(http.chart_name().as_deref(), Some("argo-cd"));
        assert_eq!(http.to_string(), "https://example.com/charts/argo-cd-9.4.1.tgz");
    }

    #[test]
    fn test_reference_parse_rejects_unsupported() {
        let err = ChartReference::parse("ftp://x/y.zip").unwrap_err();
        assert!(matches!(err, CoreError::InvalidReference { .. }));
        insta::assert_snapshot!(
            err.to_string(),
            @"invalid chart URL: ftp://x/y.zip, must be oci:// URL or http(s)://*.tgz"
        );
    }

    #[test]
    fn test_chart_name_edge_cases() {
        let pinned = ChartReference::parse("oci://host/repo/chart@sha256:abcd").unwrap();
        assert!(pinned.is_digest_pinned());
        assert_eq!(pinned.chart_name().as_deref(), Some("chart"));
        assert_eq!(pinned.version(), None);

        let unversioned = ChartReference::parse("https://example.com/nginx.tar.gz").unwrap();
        assert_eq!(unversioned.chart_name().as_deref(), Some("nginx"));
    }
}
