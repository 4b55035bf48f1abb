use log::debug;
use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use url::Url;

use crate::auth::Token;
use crate::config::SentryConfig;
use crate::error::{Result, SentryLensError};
use crate::retry::RetryPolicy;

pub struct SentryClient {
    client: Client,
    api_url: Url,
    org: String,
    project: String,
    token: Token,
    retry: RetryPolicy,
}

impl SentryClient {
    pub fn new(config: &SentryConfig, retry: RetryPolicy) -> Result<Self> {
        let client = Client::builder()
            .user_agent("SentryLens/0.1.0")
            .build()
            .map_err(|e| SentryLensError::Config(format!("Failed to create HTTP client: {e}")))?;

        let api_url = Url::parse(&config.base_url)
            .map_err(|e| SentryLensError::Config(format!("Invalid base URL: {e}")))?;
        if api_url.cannot_be_a_base() {
            return Err(SentryLensError::Config(format!(
                "Base URL cannot carry a path: {api_url}"
            )));
        }

        Ok(Self {
            client,
            api_url,
            org: config.org.clone(),
            project: config.project.clone(),
            token: config.token.clone(),
            retry,
        })
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn auth_request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request.bearer_auth(self.token.as_str())
    }

    pub fn org(&self) -> &str {
        &self.org
    }

    /// `{base}/{segments...}/`
    pub fn api_url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.api_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|()| SentryLensError::Config("Invalid API URL".to_string()))?;
            path.pop_if_empty().extend(segments).push("");
        }
        Ok(url)
    }

    /// `{base}/organizations/{org}/{segments...}/`
    pub fn org_url(&self, segments: &[&str]) -> Result<Url> {
        let mut full = Vec::with_capacity(segments.len() + 2);
        full.push("organizations");
        full.push(self.org.as_str());
        full.extend_from_slice(segments);
        self.api_url(&full)
    }

    /// Sends one authenticated request, retrying transient failures with
    /// exponential backoff. Non-2xx responses count as transient.
    pub async fn request(
        &self,
        method: Method,
        segments: &[&str],
        params: &[(String, String)],
    ) -> Result<Response> {
        let url = self.org_url(segments)?;

        self.retry
            .run(|attempt| {
                let method = method.clone();
                let url = url.clone();
                let request = self.auth_request(
                    self.client
                        .request(method.clone(), url.clone())
                        .query(params),
                );
                async move {
                    debug!("{method} {url} (attempt {})", attempt + 1);
                    let response = request.send().await?;
                    let status = response.status();
                    if !status.is_success() {
                        let body = response.text().await.unwrap_or_default();
                        return Err(SentryLensError::Api { status, body });
                    }
                    Ok(response)
                }
            })
            .await
    }

    /// Single attempt; non-2xx responses become [`SentryLensError::Api`].
    pub async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        debug!("GET {url}");
        let response = self
            .auth_request(self.client.get(url))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SentryLensError::Api { status, body });
        }
        Ok(response.json::<T>().await?)
    }

    /// Single attempt, no status handling; callers inspect the response.
    pub async fn send_once(&self, method: Method, segments: &[&str]) -> Result<Response> {
        let url = self.org_url(segments)?;
        debug!("{method} {url}");
        let response = self
            .auth_request(self.client.request(method, url))
            .send()
            .await?;
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use mockito::Server;
    use std::time::Duration;

    fn client(base_url: &str) -> SentryClient {
        SentryClient::new(
            &test_config(base_url).sentry,
            RetryPolicy::new(3, Duration::from_millis(1)),
        )
        .unwrap()
    }

    #[test]
    fn test_org_url_appends_segments_with_trailing_slash() {
        let client = client("https://us.sentry.io/api/0");

        let url = client.org_url(&["issues", "42", "summarize"]).unwrap();

        assert_eq!(
            url.as_str(),
            "https://us.sentry.io/api/0/organizations/acme/issues/42/summarize/"
        );
    }

    #[test]
    fn test_org_url_handles_base_with_trailing_slash() {
        let client = client("https://sentry.example.com/api/0/");

        let url = client.org_url(&["issues"]).unwrap();

        assert_eq!(
            url.as_str(),
            "https://sentry.example.com/api/0/organizations/acme/issues/"
        );
    }

    #[test]
    fn test_api_url_builds_project_path() {
        let client = client("https://us.sentry.io/api/0");

        let url = client.api_url(&["projects", "acme", "1283350"]).unwrap();

        assert_eq!(
            url.as_str(),
            "https://us.sentry.io/api/0/projects/acme/1283350/"
        );
    }

    #[tokio::test]
    async fn test_request_sends_bearer_token() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/organizations/acme/issues/")
            .match_header("authorization", "Bearer test-token")
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let response = client(&server.url())
            .request(Method::GET, &["issues"], &[])
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_request_retries_server_errors_then_succeeds() {
        let mut server = Server::new_async().await;
        let failing = server
            .mock("GET", "/organizations/acme/issues/")
            .with_status(502)
            .expect(2)
            .create_async()
            .await;
        let ok = server
            .mock("GET", "/organizations/acme/issues/")
            .with_status(200)
            .with_body("[]")
            .expect(1)
            .create_async()
            .await;

        let response = client(&server.url())
            .request(Method::GET, &["issues"], &[])
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        failing.assert_async().await;
        ok.assert_async().await;
    }

    #[tokio::test]
    async fn test_request_gives_up_after_max_retries() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/organizations/acme/issues/")
            .with_status(503)
            .with_body("unavailable")
            .expect(4)
            .create_async()
            .await;

        let err = client(&server.url())
            .request(Method::GET, &["issues"], &[])
            .await
            .unwrap_err();

        match err {
            SentryLensError::Api { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "unavailable");
            }
            other => panic!("expected API error, got {other:?}"),
        }
        mock.assert_async().await;
    }
}
