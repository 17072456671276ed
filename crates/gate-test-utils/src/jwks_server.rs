//! Mock JWKS endpoint built on `wiremock`.
//!
//! Each `serve_*` call replaces whatever the server answered before, so a
//! test can rotate keys or break the endpoint mid-run.

use crate::crypto_fixtures::{jwks_json, TestKeypair};
use serde_json::Value;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Path the mock serves the key set document on.
pub const JWKS_PATH: &str = "/.well-known/jwks.json";

pub struct MockJwksServer {
    server: MockServer,
}

impl MockJwksServer {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Full URL of the JWKS endpoint.
    pub fn jwks_url(&self) -> String {
        format!("{}{}", self.server.uri(), JWKS_PATH)
    }

    pub fn server(&self) -> &MockServer {
        &self.server
    }

    /// Publish `keys`.
    pub async fn serve_keys(&self, keys: &[&TestKeypair]) {
        self.mount(ResponseTemplate::new(200).set_body_json(jwks_json(keys)), None)
            .await;
    }

    /// Publish `keys` and fail verification unless fetched exactly `fetches` times.
    pub async fn serve_keys_expecting(&self, keys: &[&TestKeypair], fetches: u64) {
        self.mount(
            ResponseTemplate::new(200).set_body_json(jwks_json(keys)),
            Some(fetches),
        )
        .await;
    }

    /// Serve an arbitrary JSON body with status 200.
    pub async fn serve_json(&self, body: Value) {
        self.mount(ResponseTemplate::new(200).set_body_json(body), None)
            .await;
    }

    /// Serve an empty body with `status`, expecting `fetches` requests if given.
    pub async fn serve_status(&self, status: u16, fetches: Option<u64>) {
        self.mount(ResponseTemplate::new(status), fetches).await;
    }

    /// Publish `keys` after `delay`.
    pub async fn serve_delayed(&self, keys: &[&TestKeypair], delay: Duration) {
        self.mount(
            ResponseTemplate::new(200)
                .set_body_json(jwks_json(keys))
                .set_delay(delay),
            None,
        )
        .await;
    }

    /// Number of requests the endpoint has received.
    pub async fn fetch_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map(|requests| requests.len())
            .unwrap_or(0)
    }

    /// Panic unless every `expect` set so far was met.
    pub async fn verify(&self) {
        self.server.verify().await;
    }

    async fn mount(&self, response: ResponseTemplate, fetches: Option<u64>) {
        self.server.reset().await;

        let mock = Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(response);
        let mock = match fetches {
            Some(n) => mock.expect(n),
            None => mock,
        };
        mock.mount(&self.server).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_serves_published_keys() {
        let jwks = MockJwksServer::start().await;
        let keypair = TestKeypair::primary("k1");
        jwks.serve_keys_expecting(&[&keypair], 1).await;

        let body: Value = reqwest::get(jwks.jwks_url())
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(body["keys"][0]["kid"], "k1");
        assert_eq!(jwks.fetch_count().await, 1);
        jwks.verify().await;
    }

    #[tokio::test]
    async fn test_serve_status_replaces_keys() {
        let jwks = MockJwksServer::start().await;
        jwks.serve_keys(&[&TestKeypair::primary("k1")]).await;
        jwks.serve_status(500, None).await;

        let response = reqwest::get(jwks.jwks_url()).await.unwrap();
        assert_eq!(response.status().as_u16(), 500);
    }
}
