use reqwest::{Method, StatusCode};
use serde::Deserialize;

use super::core::SentryClient;
use crate::error::Result;
use crate::summary::Summary;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummarizeResponse {
    whats_wrong: Option<String>,
    possible_cause: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum SummarizeOutcome {
    Ready(Summary),
    RateLimited,
    Failed(StatusCode),
}

impl SentryClient {
    /// One call to the issue summarize endpoint. Status handling is left to
    /// the caller, so this never retries.
    pub async fn summarize_issue(&self, issue_id: &str) -> Result<SummarizeOutcome> {
        let response = self
            .send_once(Method::POST, &["issues", issue_id, "summarize"])
            .await?;

        match response.status() {
            StatusCode::OK => {
                let body = response.json::<SummarizeResponse>().await?;
                Ok(SummarizeOutcome::Ready(Summary::from_raw(
                    body.whats_wrong.as_deref(),
                    body.possible_cause.as_deref(),
                )))
            }
            StatusCode::TOO_MANY_REQUESTS => Ok(SummarizeOutcome::RateLimited),
            status => Ok(SummarizeOutcome::Failed(status)),
        }
    }
}
