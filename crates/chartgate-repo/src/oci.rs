//! OCI registry chart pull

use oci_distribution::Reference;
use oci_distribution::client::{Certificate, CertificateEncoding, Client, ClientConfig, ClientProtocol};
use oci_distribution::secrets::RegistryAuth;

use crate::credentials::ChartPathOptions;
use crate::error::{RepoError, Result};

/// Media types for Helm charts in OCI
pub mod media_types {
    /// Helm chart config
    pub const HELM_CONFIG: &str = "application/vnd.cncf.helm.config.v1+json";
    /// Helm chart content layer
    pub const HELM_CONTENT: &str = "application/vnd.cncf.helm.chart.content.v1.tar+gzip";
}

/// Parse an `oci://` chart reference, applying `version` as the tag when the
/// reference carries neither tag nor digest
///
/// A tagged reference whose tag differs from a non-empty `version` is
/// rejected. A digest pins the content, so `version` is ignored.
pub fn parse_reference(reference: &str, version: Option<&str>) -> Result<Reference> {
    let clean = reference.trim_start_matches("oci://");
    let parsed = Reference::try_from(clean).map_err(|e| RepoError::InvalidOciReference {
        reference: format!("{}: {}", reference, e),
    })?;

    // `Reference` defaults a missing tag to "latest"; detect it on the raw text
    let last_segment = clean.rsplit('/').next().unwrap_or(clean);
    let has_digest = last_segment.contains('@');
    let has_tag = last_segment.contains(':');

    match version.filter(|v| !v.is_empty()) {
        None => Ok(parsed),
        Some(_) if has_digest => Ok(parsed),
        Some(v) if !has_tag => Ok(Reference::with_tag(
            parsed.registry().to_string(),
            parsed.repository().to_string(),
            v.to_string(),
        )),
        Some(v) if parsed.tag() == Some(v) => Ok(parsed),
        Some(v) => Err(RepoError::InvalidOciReference {
            reference: format!(
                "{}: tag {} does not match requested version {}",
                reference,
                parsed.tag().unwrap_or_default(),
                v
            ),
        }),
    }
}

/// OCI client configured from chart path options
pub struct OciChartClient {
    client: Client,
    auth: RegistryAuth,
}

impl OciChartClient {
    pub fn new(options: &ChartPathOptions) -> Result<Self> {
        let mut extra_root_certificates = Vec::new();
        if let Some(ca_file) = &options.ca_file {
            extra_root_certificates.push(Certificate {
                encoding: CertificateEncoding::Pem,
                data: std::fs::read(ca_file)?,
            });
        }

        if options.has_client_identity() {
            tracing::warn!("OCI registries do not support client certificates, ignoring TLS client config");
        }

        let config = ClientConfig {
            protocol: ClientProtocol::Https,
            accept_invalid_certificates: options.insecure_skip_tls_verify,
            extra_root_certificates,
            ..Default::default()
        };

        let auth = match options.basic_auth() {
            Some((username, password)) => {
                RegistryAuth::Basic(username.to_string(), password.to_string())
            }
            None => RegistryAuth::Anonymous,
        };

        Ok(Self {
            client: Client::new(config),
            auth,
        })
    }

    /// Pull the chart content layer of `reference`
    pub async fn pull(&self, reference: &Reference) -> Result<Vec<u8>> {
        tracing::debug!(reference = %reference, "pulling chart from registry");

        let image_data = self
            .client
            .pull(
                reference,
                &self.auth,
                vec![media_types::HELM_CONFIG, media_types::HELM_CONTENT],
            )
            .await
            .map_err(|e| RepoError::OciError {
                message: format!("Failed to pull {}: {}", reference, e),
            })?;

        let chart_layer = image_data
            .layers
            .into_iter()
            .find(|l| l.media_type == media_types::HELM_CONTENT)
            .ok_or_else(|| RepoError::OciError {
                message: "No chart content layer found in manifest".to_string(),
            })?;

        Ok(chart_layer.data)
    }
}
