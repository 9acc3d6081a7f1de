//! Chart engine primitives
//!
//! The installer drives a chart through three primitives: locate (fetch the
//! chart to local disk), load (parse it) and run (template and apply it).

use async_trait::async_trait;
use chartgate_core::{Chart, CoreError, Release, Values, load_chart};
use chartgate_repo::{ChartLocator, ChartPathOptions, RepoError};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised by a chart engine
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Locate(#[from] RepoError),

    #[error(transparent)]
    Load(#[from] CoreError),

    #[error("{0}")]
    Execution(String),
}

/// Parameters of a single install run
#[derive(Debug, Clone, Default)]
pub struct InstallAction {
    pub release_name: String,

    pub namespace: String,

    /// Options the chart was located with
    pub chart_path_options: ChartPathOptions,

    /// Status object version to install as
    pub version: u32,
}

/// Locate, load and run primitives
#[async_trait]
pub trait ChartEngine: Send + Sync {
    /// Fetch `reference` to local disk and return its path
    async fn locate_chart(
        &self,
        reference: &str,
        options: &ChartPathOptions,
    ) -> Result<PathBuf, EngineError>;

    /// Load a located chart
    fn load(&self, path: &Path) -> Result<Chart, EngineError> {
        Ok(load_chart(path)?)
    }

    /// Install the chart with user values
    async fn run(
        &self,
        action: &InstallAction,
        chart: &Chart,
        values: &Values,
    ) -> Result<Release, EngineError>;
}

/// Engine that locates and loads charts but has no release runtime
///
/// Suitable for resolution and pull flows; `run` always fails.
#[derive(Debug, Clone)]
pub struct LocatorEngine {
    locator: ChartLocator,
}

impl LocatorEngine {
    pub fn new(locator: ChartLocator) -> Self {
        Self { locator }
    }

    pub fn locator(&self) -> &ChartLocator {
        &self.locator
    }
}

#[async_trait]
impl ChartEngine for LocatorEngine {
    async fn locate_chart(
        &self,
        reference: &str,
        options: &ChartPathOptions,
    ) -> Result<PathBuf, EngineError> {
        Ok(self.locator.locate(reference, options).await?)
    }

    async fn run(
        &self,
        action: &InstallAction,
        chart: &Chart,
        _values: &Values,
    ) -> Result<Release, EngineError> {
        Err(EngineError::Execution(format!(
            "no release runtime configured to install {} as {}/{}",
            chart.name(),
            action.namespace,
            action.release_name
        )))
    }
}
