//! chartgate Install - Chart install orchestration
//!
//! Turns an [`InstallRequest`](chartgate_core::InstallRequest) into a release:
//! - **Synchronous**: [`Installer::install`] and [`Installer::install_from_url`]
//! - **Background**: [`Installer::install_async`], observed through an install status object
//! - **Collaborators**: [`ChartEngine`] for locate/load/run, [`MetricsSink`] for install events

pub mod config;
pub mod engine;
pub mod error;
pub mod installer;
pub mod metrics;

pub use config::{DEFAULT_CONFIG_NAMESPACE, InstallerConfig};
pub use engine::{ChartEngine, EngineError, InstallAction, LocatorEngine};
pub use error::{ErrorKind, InstallError, Result};
pub use installer::{Installer, PreparedChart};
pub use metrics::{CountingMetrics, MetricsSink, TracingMetrics};
