//! Resolve command - show which registered repository serves a chart reference

use chartgate_core::{ChartInfo, ChartReference};
use chartgate_kube::KubeCluster;
use chartgate_repo::{resolve_chart_info, resolve_connection};
use console::style;
use serde::Serialize;

use crate::error::Result;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Resolution {
    chart: ChartInfo,
    repository_url: String,
    scope: &'static str,
}

pub async fn run(
    reference: &str,
    namespace: &str,
    index_entry: Option<&str>,
    output_json: bool,
) -> Result<()> {
    // Reject bad references before connecting to the cluster
    ChartReference::parse(reference)?;

    let cluster = KubeCluster::new().await?;
    let chart = match index_entry {
        Some(entry) => ChartInfo::from_index_entry(entry, reference),
        None => resolve_chart_info(&cluster, reference, namespace).await?,
    };
    let connection = resolve_connection(&cluster, &chart.repository_name, namespace).await?;

    let resolution = Resolution {
        repository_url: connection.url().to_string(),
        scope: if connection.is_cluster_scoped() {
            "cluster"
        } else {
            "namespace"
        },
        chart,
    };

    if output_json {
        println!("{}", serde_json::to_string_pretty(&resolution)?);
        return Ok(());
    }

    println!(
        "{} {}",
        style("Chart").cyan().bold(),
        resolution.chart.location
    );
    println!();
    println!("  {}: {}", style("Name").dim(), resolution.chart.name);
    println!(
        "  {}: {}",
        style("Version").dim(),
        resolution.chart.version.as_deref().unwrap_or("-")
    );
    println!(
        "  {}: {} ({}-scoped)",
        style("Repository").dim(),
        style(&resolution.chart.repository_name).green(),
        resolution.scope
    );
    println!("  {}: {}", style("URL").dim(), resolution.repository_url);

    Ok(())
}
