use std::{future::Future, pin::Pin, time::Duration};

use anyhow::{anyhow, Context, Result};
use log::{info, warn};
use reqwest::{header::HeaderName, header::HeaderValue, Client, Method, Request};

use crate::config::{EndpointConfig, HttpMethod};

const USER_AGENT: &str = concat!("omnia-panel/", env!("CARGO_PKG_VERSION"));

pub type NotifyFuture = Pin<Box<dyn Future<Output = Result<()>> + Send + 'static>>;

/// Outbound notification to the external playback system.
///
/// The returned future is driven on a detached task; its error is logged
/// and never reaches the coordinator's state.
pub trait Notifier: Send + Sync + 'static {
    fn notify(&self, endpoint: &EndpointConfig) -> NotifyFuture;
}

#[derive(Clone)]
pub struct HttpNotifier {
    client: Client,
    timeout: Duration,
}

impl HttpNotifier {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client, timeout })
    }

    pub fn build_request(&self, endpoint: &EndpointConfig) -> Result<Request> {
        let method = match endpoint.method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
        };

        let mut builder = self
            .client
            .request(method, endpoint.url.as_str())
            .timeout(self.timeout);

        for (name, value) in &endpoint.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| anyhow!("invalid header name '{name}': {e}"))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| anyhow!("invalid header value for '{name}': {e}"))?;
            builder = builder.header(name, value);
        }

        if endpoint.method == HttpMethod::Post {
            let body = endpoint
                .body
                .clone()
                .unwrap_or(serde_json::Value::Null);
            builder = builder.body(serde_json::to_vec(&body)?);
        }

        builder
            .build()
            .with_context(|| format!("Failed to build request for {}", endpoint.url))
    }
}

impl Notifier for HttpNotifier {
    fn notify(&self, endpoint: &EndpointConfig) -> NotifyFuture {
        let client = self.client.clone();
        let request = self.build_request(endpoint);
        let url = endpoint.url.clone();

        Box::pin(async move {
            let response = client
                .execute(request?)
                .await
                .with_context(|| format!("Request to {url} failed"))?;

            let status = response.status();
            if status.is_success() {
                info!("Notified {url} ({status})");
            } else {
                warn!("Notification to {url} returned {status}");
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde_json::json;

    use super::*;

    fn notifier() -> HttpNotifier {
        HttpNotifier::new(Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn post_carries_headers_and_json_body() {
        let endpoint = EndpointConfig {
            url: "http://localhost:8080/api/play/a".into(),
            method: HttpMethod::Post,
            headers: BTreeMap::from([
                ("Content-Type".into(), "application/json".into()),
                ("X-Panel".into(), "lobby".into()),
            ]),
            body: Some(json!({ "action": "play", "segment": "a" })),
        };

        let request = notifier().build_request(&endpoint).unwrap();
        assert_eq!(request.method(), Method::POST);
        assert_eq!(request.url().as_str(), "http://localhost:8080/api/play/a");
        assert_eq!(request.headers()["content-type"], "application/json");
        assert_eq!(request.headers()["x-panel"], "lobby");
        assert_eq!(request.timeout(), Some(&Duration::from_secs(5)));

        let bytes = request.body().and_then(|b| b.as_bytes()).unwrap();
        let sent: serde_json::Value = serde_json::from_slice(bytes).unwrap();
        assert_eq!(sent, json!({ "action": "play", "segment": "a" }));
    }

    #[test]
    fn get_has_no_body_even_when_configured() {
        let endpoint = EndpointConfig {
            url: "http://localhost:8080/api/play/a?x=1".into(),
            method: HttpMethod::Get,
            headers: BTreeMap::new(),
            body: Some(json!({ "ignored": true })),
        };

        let request = notifier().build_request(&endpoint).unwrap();
        assert_eq!(request.method(), Method::GET);
        assert!(request.body().is_none());
    }

    #[test]
    fn invalid_header_name_is_reported() {
        let endpoint = EndpointConfig {
            url: "http://localhost:8080/".into(),
            method: HttpMethod::Get,
            headers: BTreeMap::from([("bad header".into(), "x".into())]),
            body: None,
        };
        assert!(notifier().build_request(&endpoint).is_err());
    }

    #[tokio::test]
    async fn unreachable_endpoint_resolves_to_error() {
        let endpoint = EndpointConfig {
            url: "http://127.0.0.1:1/unreachable".into(),
            method: HttpMethod::Get,
            headers: BTreeMap::new(),
            body: None,
        };
        assert!(notifier().notify(&endpoint).await.is_err());
    }
}
