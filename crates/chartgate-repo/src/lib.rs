//! chartgate Repo - Repository resolution and chart download
//!
//! This crate turns chart references into fetchable chart sources:
//! - **Resolution**: map a reference or repository name to its registration
//! - **Credentials**: stage TLS and auth material referenced by a registration
//! - **Locate**: download chart archives over HTTP(S) or from OCI registries
//!
//! ## Example
//!
//! ```rust,ignore
//! use chartgate_repo::{ChartLocator, ChartPathOptions, StagedFiles};
//!
//! let connection = resolve_connection(&cluster, "stable", "default").await?;
//! let mut options = ChartPathOptions::default();
//! let mut staged = StagedFiles::new(true);
//! stage_authentication(&cluster, &connection, &mut options, &mut staged, "chartgate-config").await?;
//!
//! let path = ChartLocator::with_default_cache()?
//!     .locate("oci://ghcr.io/org/charts/nginx:15.0.0", &options)
//!     .await?;
//! ```

pub mod connection;
pub mod credentials;
pub mod error;
pub mod http;
pub mod locate;
pub mod oci;
pub mod resolver;

pub use connection::{RepositoryConnection, resolve_connection};
pub use credentials::{ChartPathOptions, StagedFiles, stage_authentication};
pub use error::{RepoError, Result};
pub use http::HttpChartClient;
pub use locate::{ChartLocator, cache_key, credential_fingerprint, default_cache_dir};
pub use oci::OciChartClient;
pub use resolver::resolve_chart_info;
