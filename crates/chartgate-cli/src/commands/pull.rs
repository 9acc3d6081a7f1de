//! Pull command - fetch a chart archive through its registered repository

use chartgate_core::{ChartReference, InstallRequest};
use chartgate_install::{Installer, InstallerConfig, LocatorEngine};
use chartgate_kube::{KubeCluster, SecretStatusStore};
use chartgate_repo::{ChartLocator, ChartPathOptions};
use console::style;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::Result;

/// Options of the pull command
#[derive(Debug)]
pub struct PullArgs<'a> {
    pub reference: &'a str,
    pub namespace: &'a str,
    pub version: Option<&'a str>,
    pub index_entry: Option<&'a str>,
    pub output: Option<&'a Path>,

    /// Fetch the URL as-is, without repository lookup or credentials
    pub direct: bool,
}

pub async fn run(config: &InstallerConfig, args: PullArgs<'_>) -> Result<()> {
    let reference = ChartReference::parse(args.reference)?;
    let locator = match &config.cache_dir {
        Some(dir) => ChartLocator::new(dir),
        None => ChartLocator::with_default_cache()?,
    };

    let (path, name, version) = if args.direct {
        let options = ChartPathOptions {
            version: args
                .version
                .map(String::from)
                .or_else(|| reference.version()),
            insecure_skip_tls_verify: config.insecure_skip_tls_verify,
            ..Default::default()
        };
        let path = locator.locate(args.reference, &options).await?;
        let name = reference.chart_name().unwrap_or_else(|| "chart".to_string());
        (path, name, options.version)
    } else {
        let cluster = KubeCluster::new().await?;
        let status = SecretStatusStore::with_client(cluster.client().clone());
        let installer = Installer::new(
            Arc::new(cluster),
            Arc::new(status),
            Arc::new(LocatorEngine::new(locator)),
        )
        .with_config(config.clone());

        let mut request = InstallRequest::new("", args.namespace, args.reference);
        request.chart_version = args.version.map(String::from);
        request.index_entry = args.index_entry.map(String::from);

        let prepared = installer.prepare(&request).await?;
        println!(
            "Resolved {} from repository {}",
            style(prepared.chart.name()).cyan(),
            style(&prepared.info.repository_name).green()
        );
        let version = Some(prepared.chart.version().to_string()).filter(|v| !v.is_empty());
        (prepared.path.clone(), prepared.chart.name().to_string(), version)
    };

    let dest = args
        .output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| archive_name(&name, version.as_deref()));
    std::fs::copy(&path, &dest)?;
    println!("Saved to {}", dest.display());

    Ok(())
}

fn archive_name(name: &str, version: Option<&str>) -> PathBuf {
    match version {
        Some(version) => PathBuf::from(format!("{name}-{version}.tgz")),
        None => PathBuf::from(format!("{name}.tgz")),
    }
}
