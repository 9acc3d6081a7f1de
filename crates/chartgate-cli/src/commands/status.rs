//! Status command - show the install status object of a release

use chartgate_core::ReleaseStatus;
use chartgate_kube::{SecretStatusStore, StatusStore};
use console::style;

use crate::error::Result;

pub async fn run(name: &str, namespace: &str, output_json: bool) -> Result<()> {
    let store = SecretStatusStore::new().await?;
    let status = store.get(namespace, name).await?;

    if output_json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    let status_style = match status.status {
        ReleaseStatus::Deployed => style(status.status.as_str()).green(),
        ReleaseStatus::Failed => style(status.status.as_str()).red(),
        s if s.is_pending() => style(s.as_str()).yellow(),
        s => style(s.as_str()).dim(),
    };

    println!("{}", style("INSTALL STATUS").bold().underlined());
    println!("  Name:        {}", style(&status.name).cyan());
    println!("  Namespace:   {}", style(&status.namespace).yellow());
    println!("  Version:     {}", status.version);
    println!("  Status:      {}", status_style);
    println!("  Chart:       {}", status.chart_url);
    println!(
        "  Updated:     {}",
        status.updated_at.format("%Y-%m-%d %H:%M:%S")
    );
    if !status.description.is_empty() {
        println!("  Description: {}", status.description);
    }

    Ok(())
}
