//! Meraki dashboard API client
//!
//! Only the three read operations the report needs are exposed, behind the
//! [`DashboardApi`] trait so the fetcher can be driven by a fake in tests.
//! List endpoints are followed through their `Link: <...>; rel=next` headers, and
//! `429 Too Many Requests` responses are retried after the advertised `Retry-After`.

use crate::config::DashboardConfig;
use crate::error::DashboardError;
use crate::models::{ClientApplicationUsage, Network, Organization};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, LINK, RETRY_AFTER};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

const USER_AGENT: &str = concat!("meraki-app-usage/", env!("CARGO_PKG_VERSION"));
const DEFAULT_RETRY_AFTER_SECS: u64 = 1;

#[async_trait]
pub trait DashboardApi: Send + Sync {
    async fn organizations(&self) -> Result<Vec<Organization>, DashboardError>;

    async fn organization_networks(&self, organization_id: &str) -> Result<Vec<Network>, DashboardError>;

    /// Application usage for one client on one network over the last `timespan_secs`.
    async fn client_application_usage(
        &self,
        network_id: &str,
        client_mac: &str,
        timespan_secs: u64,
    ) -> Result<Vec<ClientApplicationUsage>, DashboardError>;
}

pub struct MerakiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    per_page: u32,
    max_retries: usize,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Vec<String>,
}

impl MerakiClient {
    pub fn new(config: &DashboardConfig) -> Result<Self, DashboardError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            per_page: config.per_page,
            max_retries: config.max_retries,
        })
    }

    async fn send(&self, url: &str, query: &[(&str, String)]) -> Result<Response, DashboardError> {
        let mut attempt = 0;
        loop {
            let response = self
                .http
                .get(url)
                .bearer_auth(&self.api_key)
                .query(query)
                .send()
                .await?;

            let status = response.status();
            if status == StatusCode::TOO_MANY_REQUESTS && attempt < self.max_retries {
                attempt += 1;
                let wait = retry_after(response.headers());
                warn!(url, attempt, wait_secs = wait.as_secs(), "Dashboard rate limit hit, retrying");
                tokio::time::sleep(wait).await;
                continue;
            }

            if status.is_success() {
                return Ok(response);
            }

            let body = response.text().await.unwrap_or_default();
            return Err(error_from_body(status, &body));
        }
    }

    /// GET every page of a list endpoint.
    async fn get_all<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Vec<(&str, String)>,
    ) -> Result<Vec<T>, DashboardError> {
        let mut url = format!("{}{}", self.base_url, path);
        let mut query = query;
        let mut items = Vec::new();

        loop {
            let response = self.send(&url, &query).await?;
            let next = next_link(response.headers());
            let page: Vec<T> = response
                .json()
                .await
                .map_err(|e| DashboardError::Decode(e.to_string()))?;
            debug!(url = %url, items = page.len(), "Fetched dashboard page");
            items.extend(page);

            match next {
                // The next link already carries every query parameter
                Some(next) if next != url => {
                    url = next;
                    query.clear();
                }
                _ => break,
            }
        }

        Ok(items)
    }
}

#[async_trait]
impl DashboardApi for MerakiClient {
    async fn organizations(&self) -> Result<Vec<Organization>, DashboardError> {
        self.get_all("/organizations", vec![("perPage", self.per_page.to_string())])
            .await
    }

    async fn organization_networks(&self, organization_id: &str) -> Result<Vec<Network>, DashboardError> {
        self.get_all(
            &format!("/organizations/{}/networks", organization_id),
            vec![("perPage", self.per_page.to_string())],
        )
        .await
    }

    async fn client_application_usage(
        &self,
        network_id: &str,
        client_mac: &str,
        timespan_secs: u64,
    ) -> Result<Vec<ClientApplicationUsage>, DashboardError> {
        self.get_all(
            &format!("/networks/{}/clients/applicationUsage", network_id),
            vec![
                ("clients", client_mac.to_string()),
                ("timespan", timespan_secs.to_string()),
                ("perPage", self.per_page.to_string()),
            ],
        )
        .await
    }
}

/// Build an error from a non-success response body of the form `{"errors": ["..."]}`.
fn error_from_body(status: StatusCode, body: &str) -> DashboardError {
    let messages = serde_json::from_str::<ErrorBody>(body)
        .map(|parsed| parsed.errors)
        .unwrap_or_default();

    let first_is_not_found = messages
        .first()
        .map(|message| message.to_lowercase().contains("not found"))
        .unwrap_or(false);

    let message = if messages.is_empty() {
        body.trim().to_string()
    } else {
        messages.join("; ")
    };

    if first_is_not_found {
        return DashboardError::NotFound(message);
    }

    DashboardError::Api {
        status: status.as_u16(),
        message,
    }
}

fn retry_after(headers: &HeaderMap) -> Duration {
    let secs = headers
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
    Duration::from_secs(secs)
}

/// Extract the `rel=next` target from a `Link` header.
fn next_link(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(LINK)?.to_str().ok()?;
    value.split(',').find_map(|part| {
        let mut pieces = part.split(';');
        let target = pieces.next()?.trim();
        let is_next = pieces.any(|param| {
            let param = param.trim().replace('"', "");
            param.eq_ignore_ascii_case("rel=next")
        });
        if is_next {
            target
                .strip_prefix('<')
                .and_then(|t| t.strip_suffix('>'))
                .map(str::to_string)
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_not_found_body() {
        let error = error_from_body(StatusCode::BAD_REQUEST, r#"{"errors":["Client not found"]}"#);
        assert!(error.is_not_found());
    }

    #[test]
    fn test_other_error_body() {
        let error = error_from_body(StatusCode::BAD_REQUEST, r#"{"errors":["Invalid timespan"]}"#);
        match error {
            DashboardError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Invalid timespan");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_bare_404_is_an_api_error() {
        let error = error_from_body(StatusCode::NOT_FOUND, "");
        assert!(!error.is_not_found());
        assert!(matches!(error, DashboardError::Api { status: 404, .. }));
    }

    #[test]
    fn test_next_link() {
        let mut headers = HeaderMap::new();
        headers.insert(
            LINK,
            HeaderValue::from_static(
                "<https://api.meraki.com/api/v1/organizations?perPage=3>; rel=first, \
                 <https://api.meraki.com/api/v1/organizations?perPage=3&startingAfter=9>; rel=next",
            ),
        );
        assert_eq!(
            next_link(&headers).as_deref(),
            Some("https://api.meraki.com/api/v1/organizations?perPage=3&startingAfter=9")
        );
    }

    #[test]
    fn test_next_link_absent() {
        let mut headers = HeaderMap::new();
        headers.insert(LINK, HeaderValue::from_static("<https://x/a>; rel=\"first\""));
        assert_eq!(next_link(&headers), None);
        assert_eq!(next_link(&HeaderMap::new()), None);
    }

    #[test]
    fn test_retry_after_default() {
        assert_eq!(retry_after(&HeaderMap::new()), Duration::from_secs(1));
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("3"));
        assert_eq!(retry_after(&headers), Duration::from_secs(3));
    }
}
