//! HTTP(S) chart archive download
//!
//! Redirects are followed manually so basic auth is only sent to the origin
//! of the requested URL, unless the repository opts into passing credentials
//! to every host.

use url::Url;

use crate::credentials::ChartPathOptions;
use crate::error::{RepoError, Result};

const MAX_REDIRECTS: u32 = 10;

/// Largest archive accepted from a server (100 MiB)
pub const MAX_ARCHIVE_SIZE: u64 = 100 * 1024 * 1024;

/// Check if two URLs are same-origin
pub fn same_origin(a: &Url, b: &Url) -> bool {
    a.scheme() == b.scheme()
        && a.host() == b.host()
        && a.port_or_known_default() == b.port_or_known_default()
}

/// HTTP client configured from chart path options
pub struct HttpChartClient {
    client: reqwest::Client,
    basic_auth: Option<(String, String)>,
    pass_credentials_all: bool,
    max_size: u64,
}

impl HttpChartClient {
    pub fn new(options: &ChartPathOptions) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(std::time::Duration::from_secs(60))
            .danger_accept_invalid_certs(options.insecure_skip_tls_verify);

        if let Some(ca_file) = &options.ca_file {
            let pem = std::fs::read(ca_file)?;
            let certs = reqwest::Certificate::from_pem_bundle(&pem).map_err(|e| {
                RepoError::InvalidTls {
                    message: format!("CA bundle {}: {}", ca_file.display(), e),
                }
            })?;
            for cert in certs {
                builder = builder.add_root_certificate(cert);
            }
        }

        if let (Some(cert_file), Some(key_file)) = (&options.cert_file, &options.key_file) {
            let mut pem = std::fs::read(cert_file)?;
            pem.push(b'\n');
            pem.extend(std::fs::read(key_file)?);
            let identity = reqwest::Identity::from_pem(&pem).map_err(|e| RepoError::InvalidTls {
                message: format!("client certificate: {}", e),
            })?;
            builder = builder.identity(identity);
        }

        let client = builder.build().map_err(|e| RepoError::NetworkError {
            message: e.to_string(),
        })?;

        Ok(Self {
            client,
            basic_auth: options
                .basic_auth()
                .map(|(u, p)| (u.to_string(), p.to_string())),
            pass_credentials_all: options.pass_credentials_all,
            max_size: MAX_ARCHIVE_SIZE,
        })
    }

    /// Override the largest accepted response body
    pub fn with_max_size(mut self, max_size: u64) -> Self {
        self.max_size = max_size;
        self
    }

    /// Download `url`, following redirects
    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let original = Url::parse(url)?;
        let mut current = original.clone();
        let mut redirects = 0;

        loop {
            let mut request = self.client.get(current.clone());

            if let Some((username, password)) = &self.basic_auth {
                if self.pass_credentials_all || same_origin(&original, &current) {
                    request = request.basic_auth(username, Some(password));
                } else {
                    tracing::warn!(
                        from = %original,
                        to = %current,
                        "cross-origin redirect, credentials not forwarded"
                    );
                }
            }

            let response = request.send().await?;
            let status = response.status();

            if status.is_redirection() {
                redirects += 1;
                if redirects > MAX_REDIRECTS {
                    return Err(RepoError::NetworkError {
                        message: format!("Too many redirects (max {})", MAX_REDIRECTS),
                    });
                }

                let location = response
                    .headers()
                    .get(reqwest::header::LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .ok_or_else(|| RepoError::NetworkError {
                        message: "Redirect without Location header".to_string(),
                    })?;
                current = current.join(location)?;
                continue;
            }

            if status == reqwest::StatusCode::UNAUTHORIZED {
                return Err(RepoError::AuthRequired {
                    url: current.to_string(),
                });
            }
            if status == reqwest::StatusCode::FORBIDDEN {
                return Err(RepoError::AuthFailed {
                    message: format!("Access denied to {}", current),
                });
            }
            if !status.is_success() {
                return Err(RepoError::HttpError {
                    status: status.as_u16(),
                    message: format!("Request to {} failed", current),
                });
            }

            return self.read_body(response, &current).await;
        }
    }

    async fn read_body(&self, mut response: reqwest::Response, url: &Url) -> Result<Vec<u8>> {
        let too_large = || RepoError::TooLarge {
            url: url.to_string(),
            limit: self.max_size,
        };
        if response.content_length().is_some_and(|len| len > self.max_size) {
            return Err(too_large());
        }

        let mut data = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| RepoError::NetworkError {
            message: e.to_string(),
        })? {
            if (data.len() + chunk.len()) as u64 > self.max_size {
                return Err(too_large());
            }
            data.extend_from_slice(&chunk);
        }
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_same_origin() {
        assert!(same_origin(&url("https://example.com/a"), &url("https://example.com/b")));
        assert!(same_origin(&url("https://example.com:443/a"), &url("https://example.com/b")));
        assert!(!same_origin(&url("https://example.com/a"), &url("https://other.com/a")));
        assert!(!same_origin(&url("https://example.com/a"), &url("http://example.com/a")));
        assert!(!same_origin(&url("https://example.com/a"), &url("https://example.com:8443/a")));
    }

    #[tokio::test]
    async fn test_download_with_basic_auth() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/charts/nginx-1.0.0.tgz"))
            // admin:s3cret
            .and(header("authorization", "Basic YWRtaW46czNjcmV0"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"archive".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let options = ChartPathOptions {
            username: Some("admin".to_string()),
            password: Some("s3cret".to_string()),
            ..Default::default()
        };
        let client = HttpChartClient::new(&options).unwrap();
        let data = client
            .get_bytes(&format!("{}/charts/nginx-1.0.0.tgz", server.uri()))
            .await
            .unwrap();
        assert_eq!(data, b"archive");
    }

    #[tokio::test]
    async fn test_credentials_not_forwarded_cross_origin() {
        let origin = MockServer::start().await;
        let mirror = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/nginx-1.0.0.tgz"))
            .respond_with(
                ResponseTemplate::new(302)
                    .insert_header("Location", format!("{}/blob/nginx-1.0.0.tgz", mirror.uri())),
            )
            .mount(&origin)
            .await;

        Mock::given(method("GET"))
            .and(path("/blob/nginx-1.0.0.tgz"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&mirror)
            .await;
        Mock::given(method("GET"))
            .and(path("/blob/nginx-1.0.0.tgz"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"mirrored".to_vec()))
            .mount(&mirror)
            .await;

        let options = ChartPathOptions {
            username: Some("admin".to_string()),
            password: Some("s3cret".to_string()),
            ..Default::default()
        };
        let client = HttpChartClient::new(&options).unwrap();
        let data = client
            .get_bytes(&format!("{}/nginx-1.0.0.tgz", origin.uri()))
            .await
            .unwrap();
        assert_eq!(data, b"mirrored");
    }

    #[tokio::test]
    async fn test_http_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/private-1.0.0.tgz"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = HttpChartClient::new(&ChartPathOptions::default()).unwrap();

        let err = client
            .get_bytes(&format!("{}/private-1.0.0.tgz", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::AuthRequired { .. }));

        let err = client
            .get_bytes(&format!("{}/missing-1.0.0.tgz", server.uri()))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_oversized_archive_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/huge-1.0.0.tgz"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; 64]))
            .mount(&server)
            .await;

        let client = HttpChartClient::new(&ChartPathOptions::default())
            .unwrap()
            .with_max_size(16);
        let err = client
            .get_bytes(&format!("{}/huge-1.0.0.tgz", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::TooLarge { limit: 16, .. }));

        let client = HttpChartClient::new(&ChartPathOptions::default())
            .unwrap()
            .with_max_size(64);
        let data = client
            .get_bytes(&format!("{}/huge-1.0.0.tgz", server.uri()))
            .await
            .unwrap();
        assert_eq!(data.len(), 64);
    }
}
