//! End-to-end identity scenarios

use wiregrant_e2e::{spawn_service, TestSigner};

#[tokio::test]
async fn resolve_returns_registered_address() {
    let signer = TestSigner::new();
    let service = spawn_service(&[("alice.eth", signer.address())]).await;
    let client = reqwest::Client::new();

    let response = client
        .get(service.url("/identity/resolve/alice.eth"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["name"], "alice.eth");
    assert_eq!(
        body["address"].as_str().unwrap(),
        signer.address().to_checksum()
    );
}

#[tokio::test]
async fn unregistered_name_is_a_client_error() {
    let service = spawn_service(&[]).await;
    let client = reqwest::Client::new();

    let response = client
        .get(service.url("/identity/resolve/ghost.eth"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("not registered"));
}

#[tokio::test]
async fn malformed_name_is_a_client_error() {
    let service = spawn_service(&[]).await;
    let client = reqwest::Client::new();

    let response = client
        .get(service.url("/identity/resolve/single-label"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn ownership_check_compares_registry_owner() {
    let signer = TestSigner::new();
    let other = TestSigner::new();
    let service = spawn_service(&[("alice.eth", signer.address())]).await;
    let client = reqwest::Client::new();

    let response = client
        .post(service.url("/identity/verify-ownership"))
        .json(&serde_json::json!({
            "name": "alice.eth",
            "address": signer.address().to_checksum(),
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["isOwner"], true);

    let response = client
        .post(service.url("/identity/verify-ownership"))
        .json(&serde_json::json!({
            "name": "alice.eth",
            "address": other.address().to_checksum(),
        }))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["isOwner"], false);

    // Missing fields
    let response = client
        .post(service.url("/identity/verify-ownership"))
        .json(&serde_json::json!({ "name": "alice.eth" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn signature_check_accepts_owner_and_flags_others() {
    let signer = TestSigner::new();
    let mallory = TestSigner::new();
    let service = spawn_service(&[("alice.eth", signer.address())]).await;
    let client = reqwest::Client::new();

    let message = "auth:alice.eth";

    let response = client
        .post(service.url("/identity/verify-signature"))
        .json(&serde_json::json!({
            "name": "alice.eth",
            "message": message,
            "signature": signer.sign_personal(message),
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["isValid"], true);

    let response = client
        .post(service.url("/identity/verify-signature"))
        .json(&serde_json::json!({
            "name": "alice.eth",
            "message": message,
            "signature": mallory.sign_personal(message),
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["isValid"], false);
}

#[tokio::test]
async fn truncated_signature_is_a_field_error() {
    let signer = TestSigner::new();
    let service = spawn_service(&[("alice.eth", signer.address())]).await;
    let client = reqwest::Client::new();

    let message = "auth:alice.eth";
    let mut signature = signer.sign_personal(message);
    signature.truncate(signature.len() - 8);

    let response = client
        .post(service.url("/identity/verify-signature"))
        .json(&serde_json::json!({
            "name": "alice.eth",
            "message": message,
            "signature": signature,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}
