// Drives the retriever against a mocked identity service:
//  - tenant credential exchange, cached across calls
//  - short-lived tokens refreshed on every call
//  - issuer exchange (glcs / glp) request shapes
//  - passed-in token never touching the network

use base64::Engine;
use httpmock::prelude::*;

use crate::handler::{Context, TokenHandler, TokenRetriever};
use crate::tests::common::{fast_settings, json, tenant_credentials, token_json};
use crate::config::credentials::CredentialConfig;

#[tokio::test]
async fn tenant_exchange_is_cached_between_calls() {
    let server = MockServer::start_async().await;
    let token_mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/iam/v1/token")
                .header("content-type", "application/json")
                .json_body(json!({
                    "tenant_id": "t1",
                    "client_id": "c1",
                    "client_secret": "s1",
                    "grant_type": "client_credentials"
                }));
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"access_token":"abc123","expires_in":3600}"#);
        })
        .await;

    let credentials = tenant_credentials(&server.url("/api/iam/"));
    let retriever = TokenRetriever::from_config(credentials, &fast_settings()).unwrap();
    let ctx = Context::background();

    assert_eq!(retriever.retrieve(&ctx).await.unwrap(), "abc123");
    assert_eq!(retriever.retrieve(&ctx).await.unwrap(), "abc123");

    token_mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn token_inside_guard_window_is_refreshed_on_every_call() {
    let server = MockServer::start_async().await;
    let token_mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/token");
            then.status(200).body(token_json("short-lived", 30));
        })
        .await;

    let retriever = TokenRetriever::from_config(tenant_credentials(&server.base_url()), &fast_settings()).unwrap();
    let ctx = Context::background();

    for _ in 0..3 {
        assert_eq!(retriever.retrieve(&ctx).await.unwrap(), "short-lived");
    }

    token_mock.assert_calls_async(3).await;
}

#[tokio::test]
async fn jwt_exp_is_used_when_expires_in_is_missing() {
    let engine = base64::engine::general_purpose::URL_SAFE_NO_PAD;
    let exp = chrono::Utc::now().timestamp() + 3600;
    let jwt = format!(
        "{}.{}.sig",
        engine.encode(r#"{"alg":"none"}"#),
        engine.encode(format!(r#"{{"exp":{}}}"#, exp))
    );

    let server = MockServer::start_async().await;
    let token_mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/token");
            then.status(200).json_body(json!({"access_token": jwt, "token_type": "Bearer"}));
        })
        .await;

    let retriever = TokenRetriever::from_config(tenant_credentials(&server.base_url()), &fast_settings()).unwrap();
    let ctx = Context::background();

    let first = retriever.retrieve(&ctx).await.unwrap();
    let second = retriever.retrieve(&ctx).await.unwrap();
    assert_eq!(first, second);

    token_mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn issuer_glcs_posts_form_with_scope() {
    let server = MockServer::start_async().await;
    let token_mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/token")
                .header("content-type", "application/x-www-form-urlencoded")
                .body("client_id=c1&client_secret=s1&grant_type=client_credentials&scope=hpe-tenant");
            then.status(200)
                .json_body(json!({"access_token": "issuer-glcs", "expires_in": 3600, "token_type": "Bearer", "scope": "hpe-tenant"}));
        })
        .await;

    let credentials = CredentialConfig::new(server.base_url(), "", "c1", "s1", "glcs");
    let retriever = TokenRetriever::from_config(credentials, &fast_settings()).unwrap();

    assert_eq!(retriever.retrieve(&Context::background()).await.unwrap(), "issuer-glcs");
    token_mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn issuer_glp_posts_form_to_service_url() {
    let server = MockServer::start_async().await;
    let token_mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/oauth2/token")
                .body("client_id=c1&client_secret=s1&grant_type=client_credentials");
            then.status(200).body(token_json("issuer-glp", 3600));
        })
        .await;

    let credentials = CredentialConfig::new(server.url("/oauth2/token/"), "", "c1", "s1", "glp");
    let retriever = TokenRetriever::from_config(credentials, &fast_settings()).unwrap();

    assert_eq!(retriever.retrieve(&Context::background()).await.unwrap(), "issuer-glp");
    token_mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn passed_in_token_never_contacts_identity_service() {
    let server = MockServer::start_async().await;
    let token_mock = server
        .mock_async(|when, then| {
            when.any_request();
            then.status(200).body(token_json("generated", 3600));
        })
        .await;

    let credentials = tenant_credentials(&server.base_url()).with_static_token("passed-in-token");
    let retriever = TokenRetriever::from_config(credentials, &fast_settings()).unwrap();
    let ctx = Context::background();

    for _ in 0..10 {
        assert_eq!(retriever.retrieve(&ctx).await.unwrap(), "passed-in-token");
    }

    token_mock.assert_calls_async(0).await;
}

#[tokio::test]
async fn retrieve_fn_shares_one_handler() {
    let server = MockServer::start_async().await;
    let token_mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/token");
            then.status(200).body(token_json("shared", 3600));
        })
        .await;

    let retrieve = TokenRetriever::from_config(tenant_credentials(&server.base_url()), &fast_settings())
        .unwrap()
        .into_retrieve_fn();

    let mut lookup = std::collections::HashMap::new();
    lookup.insert(crate::TOKEN_RETRIEVE_FUNC_KEY, retrieve);

    let retrieve = lookup.get("tokenRetrieveFunc").unwrap();
    assert_eq!(retrieve(Context::background()).await.unwrap(), "shared");
    assert_eq!(retrieve(Context::background()).await.unwrap(), "shared");

    token_mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn extreme_expires_in_is_cached_not_fatal() {
    let server = MockServer::start_async().await;
    let token_mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/token");
            then.status(200).body(r#"{"access_token":"abc","expires_in":9223372036854775807}"#);
        })
        .await;

    let retriever = TokenRetriever::from_config(tenant_credentials(&server.base_url()), &fast_settings()).unwrap();
    let ctx = Context::background();

    assert_eq!(retriever.retrieve(&ctx).await.unwrap(), "abc");
    assert_eq!(retriever.retrieve(&ctx).await.unwrap(), "abc");

    token_mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn insecure_transport_completes_exchange() {
    let server = MockServer::start_async().await;
    let token_mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/token");
            then.status(200).body(token_json("insecure-ok", 3600));
        })
        .await;

    let credentials = tenant_credentials(&server.base_url()).with_insecure(true);
    assert!(credentials.iam_insecure);
    let handler = TokenHandler::new(credentials, &fast_settings()).unwrap();
    let retriever = TokenRetriever::new(handler);

    assert_eq!(retriever.retrieve(&Context::background()).await.unwrap(), "insecure-ok");
    token_mock.assert_calls_async(1).await;
}
