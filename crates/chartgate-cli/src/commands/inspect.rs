//! Inspect command - classify a chart reference without touching the network

use chartgate_core::{ChartReference, ReferenceKind};
use console::style;
use serde::Serialize;

use crate::error::Result;

/// What a reference says about the chart it points at
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReferenceReport {
    reference: String,
    kind: ReferenceKind,
    chart: Option<String>,
    version: Option<String>,
    digest_pinned: bool,
}

impl From<&ChartReference> for ReferenceReport {
    fn from(reference: &ChartReference) -> Self {
        Self {
            reference: reference.as_str().to_string(),
            kind: reference.kind(),
            chart: reference.chart_name(),
            version: reference.version(),
            digest_pinned: reference.is_digest_pinned(),
        }
    }
}

pub fn run(reference: &str, output_json: bool) -> Result<()> {
    let parsed = ChartReference::parse(reference)?;
    let report = ReferenceReport::from(&parsed);

    if output_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{} {}", style("Reference").cyan().bold(), report.reference);
    println!();
    println!("  {}: {}", style("Kind").dim(), report.kind);
    println!(
        "  {}: {}",
        style("Chart").dim(),
        report.chart.as_deref().unwrap_or("-")
    );
    println!(
        "  {}: {}",
        style("Version").dim(),
        report.version.as_deref().unwrap_or("-")
    );
    if report.digest_pinned {
        println!("  {}: yes", style("Digest pinned").dim());
    }

    Ok(())
}
