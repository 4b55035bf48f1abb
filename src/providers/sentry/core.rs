use std::sync::Arc;

use chrono::{Local, Utc};
use indexmap::IndexMap;
use log::{info, warn};

use super::client::SentryClient;
use super::enrichment::SummaryEnricher;
use super::priority::PriorityResolver;
use super::types::{Issue, Priority};
use crate::cache::SummaryCache;
use crate::config::Config;
use crate::error::Result;
use crate::language::LanguageDetector;
use crate::providers::together::Translator;
use crate::rate_limit::RateLimiter;
use crate::report::{IssueRecord, Report, Sheet};
use crate::retry::RetryPolicy;
use crate::summary::Summary;

struct SheetQuery {
    name: &'static str,
    query: &'static str,
    accepts: &'static [Priority],
}

const MEDIUM_OR_HIGH: &[Priority] = &[Priority::Medium, Priority::High];

const SHEET_QUERIES: [SheetQuery; 4] = [
    SheetQuery {
        name: "Erros_Med_Alta",
        query: "is:unresolved level:error priority:[medium,high]",
        accepts: MEDIUM_OR_HIGH,
    },
    SheetQuery {
        name: "Alta_Prioridade",
        query: "is:unresolved priority:high",
        accepts: &[Priority::High],
    },
    SheetQuery {
        name: "Baixa_Prioridade",
        query: "is:unresolved priority:low",
        accepts: &[Priority::Low],
    },
    SheetQuery {
        name: "Nao_Erros",
        query: "is:unresolved !level:error priority:[medium,high]",
        accepts: MEDIUM_OR_HIGH,
    },
];

pub struct SentryProvider {
    client: Arc<SentryClient>,
    priorities: PriorityResolver,
    enricher: SummaryEnricher,
}

impl SentryProvider {
    /// Wires up the components, checks the token against the organization
    /// and project, then runs the startup priority fetch.
    pub async fn connect(
        config: &Config,
        cache: Arc<SummaryCache>,
        limiter: Arc<RateLimiter>,
        translator: Arc<dyn Translator>,
        detector: Arc<dyn LanguageDetector>,
    ) -> Result<Self> {
        let client = Arc::new(Self::client(config)?);
        client.check_access().await?;
        let priorities = PriorityResolver::load(client.clone(), config.priority_capacity).await?;
        let enricher = SummaryEnricher::new(
            client.clone(),
            cache,
            limiter,
            translator,
            detector,
            config.batch_pause,
        );

        Ok(Self::from_parts(client, priorities, enricher))
    }

    /// Raw JSON of one unresolved issue, for inspecting the fields the
    /// API returns.
    pub async fn sample_issue(config: &Config) -> Result<Option<serde_json::Value>> {
        let client = Self::client(config)?;
        client.check_access().await?;
        client.fetch_sample_issue().await
    }

    fn client(config: &Config) -> Result<SentryClient> {
        let retry = RetryPolicy::new(config.max_retries, config.retry_base_delay);
        SentryClient::new(&config.sentry, retry)
    }

    pub fn from_parts(
        client: Arc<SentryClient>,
        priorities: PriorityResolver,
        enricher: SummaryEnricher,
    ) -> Self {
        Self {
            client,
            priorities,
            enricher,
        }
    }

    pub async fn generate_multi_sheet_report(&self) -> Result<Report> {
        info!(
            "Starting report generation for project: {}",
            self.client.project()
        );
        let report_date = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let mut sheets = IndexMap::with_capacity(SHEET_QUERIES.len());

        for sheet in &SHEET_QUERIES {
            info!("Building sheet {} ({})", sheet.name, sheet.query);
            let issues = self.client.fetch_issues(&[("query", sheet.query)]).await?;
            if issues.is_empty() {
                warn!("No issues found for sheet {}", sheet.name);
            }

            let rows = self.build_rows(&issues, sheet.accepts, &report_date).await;
            let built = Sheet::new(rows);
            if built.is_empty() {
                info!("Sheet {} is empty, keeping header only", sheet.name);
            } else {
                info!("Sheet {} has {} issues", sheet.name, built.len());
            }
            sheets.insert(sheet.name.to_string(), built);
        }

        Ok(Report {
            provider: "Sentry".to_string(),
            project: self.client.project().to_string(),
            generated_at: Utc::now(),
            sheets,
        })
    }

    async fn build_rows(
        &self,
        issues: &[Issue],
        accepts: &[Priority],
        report_date: &str,
    ) -> Vec<IssueRecord> {
        let mut kept = Vec::with_capacity(issues.len());
        for issue in issues {
            let priority = self
                .priorities
                .priority_for(&issue.title, issue.reported_priority())
                .await;
            if accepts.contains(&priority) {
                kept.push(issue.clone());
            }
        }

        let mut summaries = self.enricher.enrich_all(&kept).await;

        kept.into_iter()
            .map(|issue| {
                let summary = summaries
                    .remove(&issue.id)
                    .unwrap_or_else(Summary::unavailable);
                to_record(issue, summary, report_date)
            })
            .collect()
    }
}

fn to_record(issue: Issue, summary: Summary, report_date: &str) -> IssueRecord {
    IssueRecord {
        report_date: report_date.to_string(),
        title: issue.title,
        count: issue.count,
        users_affected: issue.user_count,
        environment: issue.environment.unwrap_or_else(|| "all".to_string()),
        status: issue.status.unwrap_or_else(|| "unknown".to_string()),
        level: issue.level.unwrap_or_else(|| "unknown".to_string()),
        first_seen: issue.first_seen,
        last_seen: issue.last_seen,
        short_id: issue.short_id.unwrap_or_default(),
        culprit: issue.culprit.unwrap_or_default(),
        permalink: issue.permalink,
        what_happened: summary.whats_wrong,
        possible_cause: summary.possible_cause,
    }
}
