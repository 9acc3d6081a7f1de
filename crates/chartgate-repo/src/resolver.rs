//! Chart info resolution
//!
//! Maps a chart reference to the repository registration that serves it by
//! URL prefix. Repository indexes are never fetched.

use chartgate_core::{ChartInfo, ChartReference, chart_version_from_url};
use chartgate_kube::ClusterClient;

use crate::error::{RepoError, Result};

/// Length of the registration URL if it covers `reference`
fn match_len(repository_url: &str, reference: &str) -> Option<usize> {
    let base = repository_url.trim_end_matches('/');
    if base.is_empty() {
        return None;
    }
    match reference.strip_prefix(base) {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => Some(base.len()),
        _ => None,
    }
}

/// Longest-matching registration among `(name, url)` candidates
fn best_match<'a>(
    candidates: impl Iterator<Item = (String, &'a str)>,
    reference: &str,
) -> Option<String> {
    let mut best: Option<(usize, String)> = None;
    for (name, url) in candidates {
        let Some(len) = match_len(url, reference) else {
            continue;
        };
        // Ties go to the lexicographically smaller name for determinism
        let better = match &best {
            None => true,
            Some((best_len, best_name)) => {
                len > *best_len || (len == *best_len && name < *best_name)
            }
        };
        if better {
            best = Some((len, name));
        }
    }
    best.map(|(_, name)| name)
}

/// Resolve which registration serves `reference`
///
/// Cluster-scoped registrations are consulted first, then registrations in
/// `namespace`. Disabled registrations are skipped.
pub async fn resolve_chart_info(
    cluster: &dyn ClusterClient,
    reference: &str,
    namespace: &str,
) -> Result<ChartInfo> {
    let parsed = ChartReference::parse(reference)?;

    let cluster_repos = cluster.list_cluster_repositories().await?;
    let mut repository = best_match(
        cluster_repos
            .iter()
            .filter(|r| !r.spec.disabled)
            .map(|r| (r.registration_name(), r.url())),
        reference,
    );

    if repository.is_none() {
        let namespace_repos = cluster.list_namespace_repositories(namespace).await?;
        repository = best_match(
            namespace_repos
                .iter()
                .filter(|r| !r.spec.disabled)
                .map(|r| (r.registration_name(), r.url())),
            reference,
        );
    }

    let repository_name = repository.ok_or_else(|| RepoError::Resolution {
        reference: reference.to_string(),
        namespace: namespace.to_string(),
    })?;

    tracing::debug!(reference, repository = %repository_name, "resolved chart repository");

    Ok(ChartInfo {
        repository_name,
        name: parsed.chart_name().unwrap_or_default(),
        version: chart_version_from_url(reference),
        location: reference.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chartgate_kube::{HelmChartRepository, MockCluster, ProjectHelmChartRepository};

    #[test]
    fn test_match_len() {
        assert_eq!(match_len("https://c.io/stable", "https://c.io/stable/nginx-1.0.0.tgz"), Some(19));
        assert_eq!(match_len("https://c.io/stable/", "https://c.io/stable/nginx-1.0.0.tgz"), Some(19));
        assert_eq!(match_len("https://c.io/stable", "https://c.io/stable-x/nginx-1.0.0.tgz"), None);
        assert_eq!(match_len("oci://r.io/org", "oci://r.io/org"), Some(14));
        assert_eq!(match_len("", "oci://r.io/org"), None);
    }

    fn catalog() -> MockCluster {
        let mut disabled = HelmChartRepository::for_url("disabled", "https://charts.example.com/stable/deep");
        disabled.spec.disabled = true;

        MockCluster::new()
            .with_cluster_repository(HelmChartRepository::for_url(
                "stable",
                "https://charts.example.com/stable",
            ))
            .with_cluster_repository(HelmChartRepository::for_url(
                "root",
                "https://charts.example.com",
            ))
            .with_cluster_repository(disabled)
            .with_namespace_repository(ProjectHelmChartRepository::for_url(
                "team-a",
                "team",
                "oci://registry.example.com/team-a",
            ))
    }

    #[tokio::test]
    async fn test_longest_cluster_match_wins() {
        let cluster = catalog();
        let info = resolve_chart_info(
            &cluster,
            "https://charts.example.com/stable/deep/argo-cd-9.4.1.tgz",
            "team-a",
        )
        .await
        .unwrap();

        assert_eq!(info.repository_name, "stable");
        assert_eq!(info.name, "argo-cd");
        assert_eq!(info.version.as_deref(), Some("9.4.1"));
        assert_eq!(info.location, "https://charts.example.com/stable/deep/argo-cd-9.4.1.tgz");
        // Cluster scope matched: namespace scope is never listed
        assert_eq!(cluster.operation_counts().lists, 1);
    }

    #[tokio::test]
    async fn test_namespace_scope_fallback() {
        let cluster = catalog();
        let info = resolve_chart_info(&cluster, "oci://registry.example.com/team-a/redis:7.2.0", "team-a")
            .await
            .unwrap();

        assert_eq!(info.repository_name, "team");
        assert_eq!(info.name, "redis");
        assert_eq!(info.version.as_deref(), Some("7.2.0"));
    }

    #[tokio::test]
    async fn test_no_match() {
        let cluster = catalog();
        let err = resolve_chart_info(&cluster, "oci://registry.example.com/team-a/redis:7.2.0", "team-b")
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::Resolution { .. }));
    }

    #[tokio::test]
    async fn test_invalid_reference_makes_no_calls() {
        let cluster = catalog();
        let err = resolve_chart_info(&cluster, "ftp://example.com/chart.tgz", "default")
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::InvalidReference(_)));
        assert_eq!(cluster.operation_counts().total(), 0);
    }

    #[tokio::test]
    async fn test_resolution_is_deterministic() {
        let cluster = catalog();
        let reference = "https://charts.example.com/stable/nginx-15.0.0.tgz";
        let first = resolve_chart_info(&cluster, reference, "team-a").await.unwrap();
        let second = resolve_chart_info(&cluster, reference, "team-a").await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_cluster_failure() {
        let cluster = catalog();
        cluster.fail_reads("connection refused");
        let err = resolve_chart_info(&cluster, "oci://registry.example.com/team-a/redis:7.2.0", "team-a")
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::Cluster(_)));
    }
}
