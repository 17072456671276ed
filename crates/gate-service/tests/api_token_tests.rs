//! Static API-token integration tests for `/api/v1/ping`.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use gate_test_utils::TestGateServer;
use std::collections::HashMap;

fn token_vars(token: Option<&str>) -> HashMap<String, String> {
    let mut vars = HashMap::from([("API_SECURITY_ENABLED".to_string(), "true".to_string())]);
    if let Some(token) = token {
        vars.insert("API_TOKEN".to_string(), token.to_string());
    }
    vars
}

async fn ping_status(
    server: &TestGateServer,
    authorization: Option<&str>,
) -> Result<u16, anyhow::Error> {
    let mut request = reqwest::Client::new().get(format!("{}/api/v1/ping", server.url()));
    if let Some(value) = authorization {
        request = request.header("authorization", value);
    }
    Ok(request.send().await?.status().as_u16())
}

#[tokio::test]
async fn test_matching_token_is_accepted() -> Result<(), anyhow::Error> {
    let server = TestGateServer::spawn(&token_vars(Some("s3cret-token"))).await?;

    let response = reqwest::Client::new()
        .get(format!("{}/api/v1/ping", server.url()))
        .bearer_auth("s3cret-token")
        .send()
        .await?;

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["status"], "ok");

    Ok(())
}

#[tokio::test]
async fn test_token_without_bearer_prefix_is_accepted() -> Result<(), anyhow::Error> {
    let server = TestGateServer::spawn(&token_vars(Some("s3cret-token"))).await?;

    assert_eq!(ping_status(&server, Some("s3cret-token")).await?, 200);

    Ok(())
}

#[tokio::test]
async fn test_wrong_or_missing_token_is_rejected() -> Result<(), anyhow::Error> {
    let server = TestGateServer::spawn(&token_vars(Some("s3cret-token"))).await?;

    for value in [None, Some("Bearer wrong"), Some("Bearer s3cret-token-2"), Some("Bearer s3cret")] {
        assert_eq!(ping_status(&server, value).await?, 401, "header {value:?}");
    }

    Ok(())
}

#[tokio::test]
async fn test_enabled_without_token_rejects_everything() -> Result<(), anyhow::Error> {
    let server = TestGateServer::spawn(&token_vars(None)).await?;

    assert_eq!(ping_status(&server, None).await?, 401);
    assert_eq!(ping_status(&server, Some("Bearer anything")).await?, 401);

    Ok(())
}

#[tokio::test]
async fn test_disabled_security_allows_ping() -> Result<(), anyhow::Error> {
    let server = TestGateServer::spawn(&HashMap::new()).await?;

    assert_eq!(ping_status(&server, None).await?, 200);

    Ok(())
}
