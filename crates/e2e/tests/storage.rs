//! End-to-end storage scenarios

use wiregrant_e2e::spawn_service;

#[tokio::test]
async fn put_is_idempotent_over_http() {
    let service = spawn_service(&[]).await;
    let client = reqwest::Client::new();

    let body = serde_json::json!({ "content": "same bytes every time" });

    let first: serde_json::Value = client
        .post(service.url("/storage/put"))
        .json(&body)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let second: serde_json::Value = client
        .post(service.url("/storage/put"))
        .json(&body)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(first["contentAddress"], second["contentAddress"]);
}

#[tokio::test]
async fn put_then_get_round_trips() {
    let service = spawn_service(&[]).await;
    let client = reqwest::Client::new();

    let response: serde_json::Value = client
        .post(service.url("/storage/put"))
        .json(&serde_json::json!({ "content": "published document" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let address = response["contentAddress"].as_str().unwrap();

    let fetched = client
        .get(service.url(&format!("/storage/get/{}", address)))
        .send()
        .await
        .unwrap();
    assert_eq!(fetched.status(), 200);
    assert_eq!(fetched.text().await.unwrap(), "published document");
}

#[tokio::test]
async fn missing_content_is_client_visible() {
    let service = spawn_service(&[]).await;
    let client = reqwest::Client::new();

    // Empty body field
    let response = client
        .post(service.url("/storage/put"))
        .json(&serde_json::json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    // Unknown address
    let response = client
        .get(service.url(&format!("/storage/get/{}", "0".repeat(64))))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn gateway_url_is_derivable_without_fetching() {
    let service = spawn_service(&[]).await;
    let client = reqwest::Client::new();

    let response: serde_json::Value = client
        .get(service.url("/storage/gateway/QmExampleAddress"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(response["contentAddress"], "QmExampleAddress");
    assert_eq!(
        response["gatewayUrl"],
        "http://gateway.test/ipfs/QmExampleAddress"
    );
}
