//! Install orchestration
//!
//! Every install walks the same linear pipeline:
//!
//! ```text
//! validate → resolve chart info → resolve connection → stage credentials
//!   → configure path options → locate → load → annotate → run → metrics
//! ```
//!
//! `install` runs it inline. `install_async` runs everything up to credential
//! staging inline, records a `pending-install` status object and hands the
//! rest to a background task that reports failure through the status object.
//! Nothing is retried.

use chartgate_core::{Chart, ChartInfo, ChartReference, InstallRequest, Release};
use chartgate_kube::{ClusterClient, InstallStatus, StatusStore};
use chartgate_repo::{
    ChartPathOptions, StagedFiles, resolve_chart_info, resolve_connection, stage_authentication,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::config::InstallerConfig;
use crate::engine::{ChartEngine, EngineError, InstallAction};
use crate::error::{InstallError, Result};
use crate::metrics::{self, MetricsSink, TracingMetrics};

/// A chart fetched through the repository path, ready to run
#[derive(Debug)]
pub struct PreparedChart {
    pub info: ChartInfo,

    /// Where the chart was located on disk
    pub path: PathBuf,

    /// Loaded chart, annotated with its source reference
    pub chart: Chart,

    pub options: ChartPathOptions,

    /// Credential files the chart was fetched with
    pub staged: StagedFiles,
}

/// Output of the inline resolution stages
struct Resolved {
    info: ChartInfo,
    options: ChartPathOptions,
    staged: StagedFiles,
}

/// Stages after credential staging; cheap to clone into a background task
#[derive(Clone)]
struct Pipeline {
    engine: Arc<dyn ChartEngine>,
    metrics: Arc<dyn MetricsSink>,
}

impl Pipeline {
    /// locate → load → annotate
    async fn fetch(&self, reference: &str, options: &ChartPathOptions) -> Result<(PathBuf, Chart)> {
        tracing::debug!(reference, version = ?options.version, "locating chart");
        let path = self
            .engine
            .locate_chart(reference, options)
            .await
            .map_err(InstallError::Locate)?;

        tracing::debug!(path = %path.display(), "loading chart");
        // Loading reads and decompresses the archive; keep it off the async workers
        let engine = Arc::clone(&self.engine);
        let load_path = path.clone();
        let mut chart = tokio::task::spawn_blocking(move || engine.load(&load_path))
            .await
            .map_err(|e| {
                InstallError::Load(EngineError::Execution(format!("chart load task failed: {}", e)))
            })?
            .map_err(InstallError::Load)?;
        chart.annotate_source(reference);
        Ok((path, chart))
    }

    /// fetch → run → metrics
    async fn execute(&self, request: &InstallRequest, options: &ChartPathOptions) -> Result<Release> {
        let (_, chart) = self.fetch(&request.chart_url, options).await?;

        let action = InstallAction {
            release_name: request.name.clone(),
            namespace: request.namespace.clone(),
            chart_path_options: options.clone(),
            version: request.version,
        };

        tracing::debug!(release = %request.name, namespace = %request.namespace, chart = chart.name(), "running install");
        let release = self
            .engine
            .run(&action, &chart, &request.values)
            .await
            .map_err(InstallError::Run)?;

        metrics::emit(self.metrics.as_ref(), chart.name(), chart.version());
        tracing::info!(
            release = %release.name,
            namespace = %release.namespace,
            chart = chart.name(),
            version = chart.version(),
            "chart installed"
        );
        Ok(release)
    }
}

/// Chart install orchestrator
pub struct Installer {
    cluster: Arc<dyn ClusterClient>,
    status: Arc<dyn StatusStore>,
    pipeline: Pipeline,
    config: InstallerConfig,
}

impl Installer {
    pub fn new(
        cluster: Arc<dyn ClusterClient>,
        status: Arc<dyn StatusStore>,
        engine: Arc<dyn ChartEngine>,
    ) -> Self {
        Self {
            cluster,
            status,
            pipeline: Pipeline {
                engine,
                metrics: Arc::new(TracingMetrics),
            },
            config: InstallerConfig::default(),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.pipeline.metrics = metrics;
        self
    }

    pub fn with_config(mut self, config: InstallerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &InstallerConfig {
        &self.config
    }

    /// validate → chart info → connection → credentials → path options
    async fn resolve(&self, request: &InstallRequest) -> Result<Resolved> {
        ChartReference::parse(&request.chart_url).map_err(InstallError::InvalidReference)?;

        let info = match request.catalog_entry() {
            Some(entry) => ChartInfo::from_index_entry(entry, &request.chart_url),
            None => resolve_chart_info(self.cluster.as_ref(), &request.chart_url, &request.namespace)
                .await
                .map_err(InstallError::Resolution)?,
        };
        tracing::debug!(
            repository = %info.repository_name,
            chart = %info.name,
            version = ?info.version,
            "resolved chart info"
        );

        let connection = resolve_connection(self.cluster.as_ref(), &info.repository_name, &request.namespace)
            .await
            .map_err(InstallError::Connection)?;

        let mut options = ChartPathOptions {
            insecure_skip_tls_verify: self.config.insecure_skip_tls_verify,
            ..Default::default()
        };
        let mut staged = StagedFiles::new(self.config.file_cleanup);
        stage_authentication(
            self.cluster.as_ref(),
            &connection,
            &mut options,
            &mut staged,
            &self.config.config_namespace,
        )
        .await
        .map_err(InstallError::Credentials)?;

        options.version = info
            .version
            .clone()
            .or_else(|| request.explicit_version().map(String::from));
        options.repo_url = Some(connection.url().to_string());

        Ok(Resolved {
            info,
            options,
            staged,
        })
    }

    /// Install a chart from a registered repository, blocking until done
    pub async fn install(&self, request: &InstallRequest) -> Result<Release> {
        let resolved = self.resolve(request).await?;
        let result = self.pipeline.execute(request, &resolved.options).await;
        drop(resolved.staged);
        result
    }

    /// Install in the background; poll the returned status object for progress
    pub async fn install_async(&self, request: &InstallRequest) -> Result<InstallStatus> {
        let (status, _handle) = self.install_detached(request).await?;
        Ok(status)
    }

    /// Like [`Installer::install_async`], also returning the background task
    pub async fn install_detached(
        &self,
        request: &InstallRequest,
    ) -> Result<(InstallStatus, JoinHandle<()>)> {
        let resolved = self.resolve(request).await?;

        let status = InstallStatus::pending(
            &request.name,
            &request.namespace,
            request.version,
            &request.chart_url,
        );
        self.status
            .create(&status)
            .await
            .map_err(InstallError::Status)?;

        let task = BackgroundInstall {
            pipeline: self.pipeline.clone(),
            store: Arc::clone(&self.status),
            request: request.clone(),
            status: status.clone(),
            failed_status_ttl: self.config.failed_status_ttl,
        };
        let handle = tokio::spawn(task.run(resolved.options, resolved.staged));

        Ok((status, handle))
    }

    /// Install straight from an archive or OCI URL, skipping repository lookup
    /// and credential staging
    pub async fn install_from_url(&self, request: &InstallRequest) -> Result<Release> {
        let reference =
            ChartReference::parse(&request.chart_url).map_err(InstallError::InvalidReference)?;

        let options = ChartPathOptions {
            version: request
                .explicit_version()
                .map(String::from)
                .or_else(|| reference.version()),
            insecure_skip_tls_verify: self.config.insecure_skip_tls_verify,
            ..Default::default()
        };
        self.pipeline.execute(request, &options).await
    }

    /// Resolve, stage and fetch a chart without running it
    pub async fn prepare(&self, request: &InstallRequest) -> Result<PreparedChart> {
        let resolved = self.resolve(request).await?;
        let (path, chart) = self
            .pipeline
            .fetch(&request.chart_url, &resolved.options)
            .await?;

        Ok(PreparedChart {
            info: resolved.info,
            path,
            chart,
            options: resolved.options,
            staged: resolved.staged,
        })
    }
}

/// State moved into the background install task
struct BackgroundInstall {
    pipeline: Pipeline,
    store: Arc<dyn StatusStore>,
    request: InstallRequest,
    status: InstallStatus,
    failed_status_ttl: Duration,
}

impl BackgroundInstall {
    async fn run(self, options: ChartPathOptions, staged: StagedFiles) {
        let result = self.pipeline.execute(&self.request, &options).await;

        let err = match result {
            Ok(_) => return,
            Err(e) => e,
        };

        tracing::warn!(
            release = %self.status.name,
            namespace = %self.status.namespace,
            kind = %err.kind(),
            error = %err,
            "background install failed"
        );

        let mut failed = self.status;
        failed.mark_failed(err.to_string());
        if let Err(e) = self.store.update(&failed).await {
            tracing::warn!(release = %failed.name, error = %e, "failed to record install failure");
        }
        drop(staged);

        tokio::time::sleep(self.failed_status_ttl).await;

        if let Err(e) = self.store.delete(&failed.namespace, &failed.name).await {
            tracing::warn!(release = %failed.name, error = %e, "failed to delete failed install status");
        }
    }
}
