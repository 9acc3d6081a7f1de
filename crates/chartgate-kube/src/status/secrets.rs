//! Kubernetes Secrets status store
//!
//! One Secret per release, named after the release, holding the encoded
//! status under the `release` key.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::{Api, DeleteParams, PostParams};
use kube::Client;
use std::collections::BTreeMap;

use super::{decode_status, encode_status, status_labels, InstallStatus, StatusStore};
use crate::error::{KubeError, Result};

/// Secret type of status objects
pub const STATUS_SECRET_TYPE: &str = "chartgate.io/install-status.v1";

const DATA_KEY: &str = "release";

/// Status store over Kubernetes Secrets
#[derive(Clone)]
pub struct SecretStatusStore {
    client: Client,
}

impl SecretStatusStore {
    /// Create a store using the default kubeconfig
    pub async fn new() -> Result<Self> {
        let client = Client::try_default().await?;
        Ok(Self { client })
    }

    /// Create with an existing client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    fn secrets_api(&self, namespace: &str) -> Api<Secret> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn build_secret(status: &InstallStatus, encoded: &str) -> Secret {
        let mut data = BTreeMap::new();
        data.insert(
            DATA_KEY.to_string(),
            k8s_openapi::ByteString(encoded.as_bytes().to_vec()),
        );

        Secret {
            metadata: ObjectMeta {
                name: Some(status.name.clone()),
                namespace: Some(status.namespace.clone()),
                labels: Some(status_labels(status)),
                ..Default::default()
            },
            type_: Some(STATUS_SECRET_TYPE.to_string()),
            data: Some(data),
            ..Default::default()
        }
    }

    fn parse_secret(secret: &Secret) -> Result<InstallStatus> {
        let data = secret
            .data
            .as_ref()
            .and_then(|d| d.get(DATA_KEY))
            .ok_or_else(|| KubeError::Storage("Secret missing 'release' data".to_string()))?;

        let encoded = String::from_utf8(data.0.clone())
            .map_err(|e| KubeError::Storage(format!("Invalid UTF-8 in secret: {}", e)))?;

        decode_status(&encoded)
    }
}

#[async_trait]
impl StatusStore for SecretStatusStore {
    async fn create(&self, status: &InstallStatus) -> Result<()> {
        let api = self.secrets_api(&status.namespace);
        let secret = Self::build_secret(status, &encode_status(status)?);

        match api.create(&PostParams::default(), &secret).await {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(e)) if e.code == 409 => Err(KubeError::StatusAlreadyExists {
                name: status.name.clone(),
                namespace: status.namespace.clone(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn get(&self, namespace: &str, name: &str) -> Result<InstallStatus> {
        match self.secrets_api(namespace).get(name).await {
            Ok(secret) => Self::parse_secret(&secret),
            Err(kube::Error::Api(e)) if e.code == 404 => Err(KubeError::StatusNotFound {
                name: name.to_string(),
                namespace: namespace.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn update(&self, status: &InstallStatus) -> Result<()> {
        let api = self.secrets_api(&status.namespace);
        let secret = Self::build_secret(status, &encode_status(status)?);

        match api.replace(&status.name, &PostParams::default(), &secret).await {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(e)) if e.code == 404 => {
                api.create(&PostParams::default(), &secret).await?;
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, namespace: &str, name: &str) -> Result<()> {
        match self
            .secrets_api(namespace)
            .delete(name, &DeleteParams::default())
            .await
        {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(e)) if e.code == 404 => {
                tracing::debug!(namespace, name, "status object already gone");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_shape() {
        let status = InstallStatus::pending("web", "team-a", 1, "oci://r/web:1.0.0");
        let encoded = encode_status(&status).unwrap();
        let secret = SecretStatusStore::build_secret(&status, &encoded);

        assert_eq!(secret.metadata.name.as_deref(), Some("web"));
        assert_eq!(secret.metadata.namespace.as_deref(), Some("team-a"));
        assert_eq!(secret.type_.as_deref(), Some(STATUS_SECRET_TYPE));
        assert_eq!(
            secret
                .metadata
                .labels
                .as_ref()
                .and_then(|l| l.get("chartgate.io/status"))
                .map(String::as_str),
            Some("pending-install")
        );

        let parsed = SecretStatusStore::parse_secret(&secret).unwrap();
        assert_eq!(parsed, status);
    }

    #[test]
    fn test_parse_secret_without_payload() {
        let secret = Secret::default();
        let err = SecretStatusStore::parse_secret(&secret).unwrap_err();
        assert!(matches!(err, KubeError::Storage(_)));
    }
}
