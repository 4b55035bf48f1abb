use log::{debug, info};
use reqwest::Method;

use super::core::SentryClient;
use crate::error::Result;
use crate::providers::sentry::types::Issue;

/// Base query for every issue listing; callers override by key.
pub fn base_params(project: &str) -> Vec<(String, String)> {
    [
        ("project", project),
        ("statsPeriod", "24h"),
        ("limit", "100"),
        ("sort", "freq"),
        ("environment", "production"),
        ("expand[]", "owners"),
        ("expand[]", "inbox"),
        ("shortIdLookup", "1"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// Every base pair whose key appears in `overrides` is replaced by the
/// override values.
pub fn merge_params(
    mut base: Vec<(String, String)>,
    overrides: &[(&str, &str)],
) -> Vec<(String, String)> {
    base.retain(|(key, _)| !overrides.iter().any(|(k, _)| k == key));
    base.extend(
        overrides
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string())),
    );
    base
}

impl SentryClient {
    /// Fetches one page of issues for the configured project.
    pub async fn fetch_issues(&self, overrides: &[(&str, &str)]) -> Result<Vec<Issue>> {
        let params = merge_params(base_params(self.project()), overrides);
        debug!("Issue query parameters: {params:?}");

        let response = self.request(Method::GET, &["issues"], &params).await?;
        let issues = response.json::<Vec<Issue>>().await?;

        info!("Fetched {} issues", issues.len());
        Ok(issues)
    }
}
