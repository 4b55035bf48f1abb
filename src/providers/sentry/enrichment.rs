use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::{stream, StreamExt};
use log::{error, info, warn};

use super::client::{SentryClient, SummarizeOutcome};
use super::types::Issue;
use crate::cache::SummaryCache;
use crate::language::LanguageDetector;
use crate::providers::together::Translator;
use crate::rate_limit::{RateCategory, RateLimiter};
use crate::summary::{is_not_available, Summary};

pub const BATCH_SIZE: usize = 5;
const MAX_CONCURRENCY: usize = 5;

/// Produces translated summaries for issues, reading and filling the
/// persistent summary cache.
pub struct SummaryEnricher {
    client: Arc<SentryClient>,
    cache: Arc<SummaryCache>,
    limiter: Arc<RateLimiter>,
    translator: Arc<dyn Translator>,
    detector: Arc<dyn LanguageDetector>,
    batch_pause: Duration,
}

impl SummaryEnricher {
    pub fn new(
        client: Arc<SentryClient>,
        cache: Arc<SummaryCache>,
        limiter: Arc<RateLimiter>,
        translator: Arc<dyn Translator>,
        detector: Arc<dyn LanguageDetector>,
        batch_pause: Duration,
    ) -> Self {
        Self {
            client,
            cache,
            limiter,
            translator,
            detector,
            batch_pause,
        }
    }

    pub async fn get_issue_summary(&self, issue_id: &str) -> Summary {
        let fetched = loop {
            if let Some(cached) = self.cache.get(issue_id) {
                return cached.into();
            }

            self.limiter.acquire(RateCategory::Summary).await;

            match self.client.summarize_issue(issue_id).await {
                Ok(SummarizeOutcome::Ready(summary)) => break summary,
                Ok(SummarizeOutcome::RateLimited) => {
                    let window = self.limiter.limit(RateCategory::Summary).window;
                    warn!("Summary endpoint rate limited for issue {issue_id}, waiting {window:?}");
                    tokio::time::sleep(window).await;
                    self.limiter.reset(RateCategory::Summary).await;
                }
                Ok(SummarizeOutcome::Failed(status)) => {
                    error!("Summary for issue {issue_id} failed with status {status}");
                    return Summary::unavailable();
                }
                Err(e) => {
                    error!("Summary for issue {issue_id} failed: {e}");
                    return Summary::unavailable();
                }
            }
        };

        let summary = Summary {
            whats_wrong: self.localize(fetched.whats_wrong).await,
            possible_cause: self.localize(fetched.possible_cause).await,
        };

        if let Err(e) = self.cache.insert(
            issue_id,
            summary.whats_wrong.clone(),
            summary.possible_cause.clone(),
        ) {
            warn!("Could not persist summary for issue {issue_id}: {e}");
        }

        summary
    }

    async fn localize(&self, text: String) -> String {
        if is_not_available(&text) || self.detector.is_target_language(&text) {
            return text;
        }
        self.translator.translate(&text).await
    }

    /// Enriches issues in batches of [`BATCH_SIZE`]; a batch finishes
    /// completely before the next one starts.
    pub async fn enrich_all(&self, issues: &[Issue]) -> HashMap<String, Summary> {
        let mut summaries = HashMap::with_capacity(issues.len());
        let total_batches = issues.len().div_ceil(BATCH_SIZE);

        for (index, batch) in issues.chunks(BATCH_SIZE).enumerate() {
            if index > 0 && !self.batch_pause.is_zero() {
                tokio::time::sleep(self.batch_pause).await;
            }
            info!(
                "Enriching batch {}/{total_batches} ({} issues)",
                index + 1,
                batch.len()
            );

            let results: Vec<(String, Summary)> = stream::iter(batch)
                .map(|issue| async move {
                    (issue.id.clone(), self.get_issue_summary(&issue.id).await)
                })
                .buffer_unordered(batch.len().min(MAX_CONCURRENCY))
                .collect()
                .await;

            summaries.extend(results);
        }

        summaries
    }
}
