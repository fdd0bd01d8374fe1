mod common;

use std::sync::Arc;

use oauth_service::{
    AccessToken, MemoryTokenStore, OAuth1Proxy, OAuthService, ReqwestClient, RequestOptions,
    TokenStore,
};

use common::{MockApiServer, get_header, parse_form_body};

fn oauth1_service(base_api_url: String) -> OAuthService<OAuth1Proxy<ReqwestClient>> {
    let store: Arc<dyn TokenStore> = Arc::new(MemoryTokenStore::with_token(
        AccessToken::new("user-token").with_extra_param("oauth_token_secret", "user-secret"),
    ));
    OAuthService::new(
        OAuth1Proxy::new(
            ReqwestClient::new(),
            store.clone(),
            "consumer-key",
            "consumer-secret",
        ),
        store,
        base_api_url,
    )
}

#[tokio::test]
async fn get_request_carries_an_oauth_authorization_header() {
    let server = MockApiServer::start().await;
    server
        .mock_json("GET", "/1/account.json", serde_json::json!({"id": 1}))
        .await;

    let service = oauth1_service(format!("{}/1", server.url()));
    let result = service
        .make_signed_request("/account.json", &RequestOptions::new())
        .await
        .expect("signed OAuth1 GET should succeed");
    assert_eq!(result["id"], 1);

    let received = server.received().await;
    let auth = get_header(&received[0], "Authorization").expect("missing Authorization header");
    assert!(auth.starts_with("OAuth "));
    assert!(auth.contains("oauth_consumer_key=\"consumer-key\""));
    assert!(auth.contains("oauth_token=\"user-token\""));
    assert!(auth.contains("oauth_signature_method=\"HMAC-SHA1\""));
    assert!(auth.contains("oauth_signature=\""));
    assert!(auth.contains("oauth_nonce=\""));
    assert!(auth.contains("oauth_timestamp=\""));
}

#[tokio::test]
async fn post_request_signs_and_sends_form_data() {
    let server = MockApiServer::start().await;
    server
        .mock_json("POST", "/1/update.json", serde_json::json!({"ok": true}))
        .await;

    let service = oauth1_service(format!("{}/1", server.url()));
    let options = RequestOptions::new().data("status", "hello & goodbye");
    service
        .make_signed_request("/update.json", &options)
        .await
        .unwrap();

    let received = server.received().await;
    assert_eq!(received[0].method.as_str(), "POST");

    let auth = get_header(&received[0], "Authorization").unwrap();
    assert!(auth.starts_with("OAuth "));

    let body = parse_form_body(&received[0]);
    assert!(body.contains(&("status".into(), "hello & goodbye".into())));
}

#[tokio::test]
async fn each_request_uses_a_fresh_nonce() {
    let server = MockApiServer::start().await;
    server
        .mock_json("GET", "/1/account.json", serde_json::json!({}))
        .await;

    let service = oauth1_service(format!("{}/1", server.url()));
    service
        .make_signed_request("/account.json", &RequestOptions::new())
        .await
        .unwrap();
    service
        .make_signed_request("/account.json", &RequestOptions::new())
        .await
        .unwrap();

    let received = server.received().await;
    let nonce = |i: usize| {
        let auth = get_header(&received[i], "Authorization").unwrap();
        let start = auth.find("oauth_nonce=\"").unwrap() + "oauth_nonce=\"".len();
        auth[start..].split('"').next().unwrap().to_string()
    };
    assert_ne!(nonce(0), nonce(1));
}
