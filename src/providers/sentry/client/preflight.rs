use log::info;
use reqwest::Method;
use serde::Deserialize;

use super::core::SentryClient;
use super::issues::{base_params, merge_params};
use crate::error::Result;

#[derive(Debug, Clone, Deserialize)]
pub struct OrganizationInfo {
    pub slug: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectInfo {
    #[serde(default)]
    pub id: String,
    pub slug: String,
    #[serde(default)]
    pub name: String,
}

impl SentryClient {
    pub async fn fetch_organization(&self) -> Result<OrganizationInfo> {
        let url = self.api_url(&["organizations", self.org()])?;
        self.get_json(url).await
    }

    pub async fn fetch_project(&self) -> Result<ProjectInfo> {
        let url = self.api_url(&["projects", self.org(), self.project()])?;
        self.get_json(url).await
    }

    /// Confirms the token can read both the organization and the project
    /// before any report query runs.
    pub async fn check_access(&self) -> Result<(OrganizationInfo, ProjectInfo)> {
        let organization = self.fetch_organization().await?;
        let project = self.fetch_project().await?;
        info!(
            "Connected to organization {} ({}), project {} ({})",
            organization.slug, organization.name, project.slug, project.name
        );
        Ok((organization, project))
    }

    /// First unresolved issue as raw JSON, with every field the API sent.
    pub async fn fetch_sample_issue(&self) -> Result<Option<serde_json::Value>> {
        let params = merge_params(
            base_params(self.project()),
            &[("query", "is:unresolved"), ("limit", "1")],
        );
        let response = self.request(Method::GET, &["issues"], &params).await?;
        let issues = response.json::<Vec<serde_json::Value>>().await?;
        Ok(issues.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use crate::error::SentryLensError;
    use crate::retry::RetryPolicy;
    use mockito::{Matcher, Server};
    use std::time::Duration;

    fn client(base_url: &str) -> SentryClient {
        SentryClient::new(
            &test_config(base_url).sentry,
            RetryPolicy::new(0, Duration::ZERO),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_check_access_reads_organization_and_project() {
        let mut server = Server::new_async().await;
        let org = server
            .mock("GET", "/organizations/acme/")
            .match_header("authorization", "Bearer test-token")
            .with_status(200)
            .with_body(r#"{"slug": "acme", "name": "Acme Corp"}"#)
            .expect(1)
            .create_async()
            .await;
        let project = server
            .mock("GET", "/projects/acme/1283350/")
            .with_status(200)
            .with_body(r#"{"id": "1283350", "slug": "backend", "name": "Backend"}"#)
            .expect(1)
            .create_async()
            .await;

        let (organization, info) = client(&server.url()).check_access().await.unwrap();

        assert_eq!(organization.name, "Acme Corp");
        assert_eq!(info.slug, "backend");
        org.assert_async().await;
        project.assert_async().await;
    }

    #[tokio::test]
    async fn test_bad_token_fails_without_retry() {
        let mut server = Server::new_async().await;
        let org = server
            .mock("GET", "/organizations/acme/")
            .with_status(401)
            .with_body(r#"{"detail": "Invalid token"}"#)
            .expect(1)
            .create_async()
            .await;
        let project = server
            .mock("GET", "/projects/acme/1283350/")
            .expect(0)
            .create_async()
            .await;

        let err = client(&server.url()).check_access().await.unwrap_err();

        match err {
            SentryLensError::Api { status, body } => {
                assert_eq!(status, 401);
                assert!(body.contains("Invalid token"));
            }
            other => panic!("expected API error, got {other:?}"),
        }
        org.assert_async().await;
        project.assert_async().await;
    }

    #[tokio::test]
    async fn test_sample_issue_keeps_every_field() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/organizations/acme/issues/")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("query".into(), "is:unresolved".into()),
                Matcher::UrlEncoded("limit".into(), "1".into()),
            ]))
            .with_status(200)
            .with_body(r#"[{"id": "7", "title": "A", "metadata": {"initial_priority": 50}}]"#)
            .create_async()
            .await;

        let sample = client(&server.url())
            .fetch_sample_issue()
            .await
            .unwrap()
            .unwrap();

        assert_eq!(sample["metadata"]["initial_priority"], 50);
    }

    #[tokio::test]
    async fn test_sample_issue_none_when_project_is_clean() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/organizations/acme/issues/")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let sample = client(&server.url()).fetch_sample_issue().await.unwrap();

        assert!(sample.is_none());
    }
}
