//! chartgate Core - Core types for chart resolution and installation
//!
//! This crate provides the foundational types used throughout chartgate:
//! - `ChartReference`: Validation and classification of chart references (OCI / HTTP archive)
//! - `Chart`: The loaded chart model (Helm-compatible `Chart.yaml`)
//! - `ChartInfo`: The resolved descriptor of the chart an install operates on
//! - `InstallRequest`: The boundary payload for install operations
//! - `Release`: Result of a chart install

pub mod archive;
pub mod chart;
pub mod error;
pub mod reference;
pub mod release;
pub mod request;

pub use archive::{load_archive, load_chart, load_dir};
pub use chart::{
    CHART_URL_ANNOTATION, Chart, ChartFile, ChartInfo, ChartMetadata, INDEX_ENTRY_SEPARATOR,
    Values,
};
pub use error::{CoreError, Result};
pub use reference::{ChartReference, ReferenceKind, chart_version_from_url, is_valid_chart_url};
pub use release::{Release, ReleaseInfo, ReleaseStatus};
pub use request::{InstallRequest, VerifierRequest};
