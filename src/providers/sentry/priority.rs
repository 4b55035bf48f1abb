use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, info, warn};
use moka::policy::EvictionPolicy;
use moka::sync::Cache;

use super::client::SentryClient;
use super::types::Priority;
use crate::error::Result;

const BULK_QUERY: &[(&str, &str)] = &[("query", "is:unresolved")];

/// Title to priority lookup, filled from one bulk issue listing.
///
/// Resolution order: bulk cache, the issue's own reported priority, one lazy
/// refresh of the bulk cache per run, then `Low`.
pub struct PriorityResolver {
    client: Arc<SentryClient>,
    by_title: Cache<String, Priority>,
    refreshed: AtomicBool,
}

impl PriorityResolver {
    pub fn new(client: Arc<SentryClient>, capacity: u64) -> Self {
        let by_title = Cache::builder()
            .max_capacity(capacity)
            .eviction_policy(EvictionPolicy::lru())
            .build();

        Self {
            client,
            by_title,
            refreshed: AtomicBool::new(false),
        }
    }

    /// Builds the resolver and runs the startup bulk fetch. A failure here
    /// is fatal for the run.
    pub async fn load(client: Arc<SentryClient>, capacity: u64) -> Result<Self> {
        let resolver = Self::new(client, capacity);
        let loaded = resolver.populate().await?;
        info!("Priority cache populated with {loaded} titles");
        Ok(resolver)
    }

    #[cfg(test)]
    pub fn insert(&self, title: impl Into<String>, priority: Priority) {
        self.by_title.insert(title.into(), priority);
    }

    pub async fn priority_for(&self, title: &str, reported: Option<Priority>) -> Priority {
        if let Some(priority) = self.by_title.get(title) {
            return priority;
        }
        if let Some(priority) = reported {
            return priority;
        }

        if !self.refreshed.swap(true, Ordering::SeqCst) {
            debug!("Priority cache miss for '{title}', refreshing once");
            if let Err(e) = self.populate().await {
                warn!("Priority cache refresh failed: {e}");
            }
            if let Some(priority) = self.by_title.get(title) {
                return priority;
            }
        }

        debug!("No priority known for '{title}', defaulting to low");
        Priority::Low
    }

    async fn populate(&self) -> Result<usize> {
        let issues = self.client.fetch_issues(BULK_QUERY).await?;
        let mut loaded = 0;
        for issue in issues {
            if let Some(priority) = issue.reported_priority() {
                self.by_title.insert(issue.title, priority);
                loaded += 1;
            }
        }
        Ok(loaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use crate::retry::RetryPolicy;
    use mockito::{Matcher, Server, ServerGuard};
    use std::time::Duration;

    fn client(server: &ServerGuard) -> Arc<SentryClient> {
        Arc::new(
            SentryClient::new(
                &test_config(&server.url()).sentry,
                RetryPolicy::new(0, Duration::ZERO),
            )
            .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_load_populates_from_bulk_query() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/organizations/acme/issues/")
            .match_query(Matcher::UrlEncoded("query".into(), "is:unresolved".into()))
            .with_status(200)
            .with_body(
                r#"[
                    {"id": "1", "title": "A", "priority": "high"},
                    {"id": "2", "title": "B", "priority": "medium"},
                    {"id": "3", "title": "C"}
                ]"#,
            )
            .expect(1)
            .create_async()
            .await;

        let resolver = PriorityResolver::load(client(&server), 10).await.unwrap();

        assert_eq!(resolver.priority_for("A", None).await, Priority::High);
        assert_eq!(resolver.priority_for("B", Some(Priority::Low)).await, Priority::Medium);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_load_failure_is_fatal() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/organizations/acme/issues/")
            .match_query(Matcher::Any)
            .with_status(500)
            .create_async()
            .await;

        assert!(PriorityResolver::load(client(&server), 10).await.is_err());
    }

    #[tokio::test]
    async fn test_reported_priority_used_without_network() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/organizations/acme/issues/")
            .match_query(Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let resolver = PriorityResolver::new(client(&server), 10);

        assert_eq!(
            resolver.priority_for("Unknown", Some(Priority::Medium)).await,
            Priority::Medium
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_miss_refreshes_at_most_once_then_defaults_low() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/organizations/acme/issues/")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"[{"id": "9", "title": "Late", "priority": "high"}]"#)
            .expect(1)
            .create_async()
            .await;

        let resolver = PriorityResolver::new(client(&server), 10);

        assert_eq!(resolver.priority_for("Late", None).await, Priority::High);
        assert_eq!(resolver.priority_for("Missing", None).await, Priority::Low);
        assert_eq!(resolver.priority_for("AlsoMissing", None).await, Priority::Low);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_failed_refresh_degrades_to_low() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/organizations/acme/issues/")
            .match_query(Matcher::Any)
            .with_status(503)
            .create_async()
            .await;

        let resolver = PriorityResolver::new(client(&server), 10);

        assert_eq!(resolver.priority_for("A", None).await, Priority::Low);
    }

    #[tokio::test]
    async fn test_inserted_entry_wins_over_reported() {
        let server = Server::new_async().await;
        let resolver = PriorityResolver::new(client(&server), 10);
        resolver.insert("A", Priority::High);

        assert_eq!(resolver.priority_for("A", Some(Priority::Low)).await, Priority::High);
    }
}
