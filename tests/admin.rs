//! Administrative API over a real listener.

use reqwest::StatusCode;
use serde_json::{json, Value};

mod common;
use common::{client, config_for, start_gateway, start_upstream, Reply};

#[tokio::test]
async fn test_mock_short_circuits_upstream() {
    let upstream = start_upstream(Reply::json(r#"{"from":"upstream"}"#)).await;
    let gateway = start_gateway(config_for(&upstream.url())).await;

    let res = client()
        .post(gateway.url("/_admin/mock"))
        .json(&json!({"path": "/bcw3d", "status": 200, "body": {"ok": true}}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await.unwrap(), json!({"ok": true}));

    let res = client().get(gateway.url("/bcw3d?x=1")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], "application/json");
    assert_eq!(res.text().await.unwrap(), r#"{"ok":true}"#);

    assert!(upstream.captured().is_empty());
    assert!(gateway.store.recent().is_empty());
}

#[tokio::test]
async fn test_mock_clear_restores_proxying() {
    let upstream = start_upstream(Reply::json(r#"{"from":"upstream"}"#)).await;
    let gateway = start_gateway(config_for(&upstream.url())).await;

    client()
        .post(gateway.url("/_admin/mock"))
        .json(&json!({"path": "/bcw3d", "status": 503, "headers": {"x-mock": "1"}, "body": "down"}))
        .send()
        .await
        .unwrap();

    let res = client().get(gateway.url("/bcw3d")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(res.headers()["x-mock"], "1");
    assert_eq!(res.text().await.unwrap(), "down");

    let mocks: Value = client()
        .get(gateway.url("/_admin/mocks"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(mocks["/bcw3d"]["status"], 503);

    let res = client()
        .post(gateway.url("/_admin/mock/clear"))
        .json(&json!({"path": "/bcw3d"}))
        .send()
        .await
        .unwrap();
    assert_eq!(
        res.json::<Value>().await.unwrap(),
        json!({"ok": true, "removed": true})
    );

    let res = client().get(gateway.url("/bcw3d")).send().await.unwrap();
    assert_eq!(res.text().await.unwrap(), r#"{"from":"upstream"}"#);
    assert_eq!(upstream.captured().len(), 1);
}

#[tokio::test]
async fn test_mock_without_path_rejected() {
    let upstream = start_upstream(Reply::json("{}")).await;
    let gateway = start_gateway(config_for(&upstream.url())).await;

    let res = client()
        .post(gateway.url("/_admin/mock"))
        .json(&json!({"status": 200, "body": "x"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(gateway.store.mocks().is_empty());

    let res = client()
        .post(gateway.url("/_admin/mock/clear"))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_recent_and_request_lookup() {
    let upstream = start_upstream(Reply::json(r#"{"n":1}"#)).await;
    let gateway = start_gateway(config_for(&upstream.url())).await;

    let mut ids = Vec::new();
    for i in 0..3 {
        let res = client()
            .get(gateway.url(&format!("/bcw3d/{}", i)))
            .send()
            .await
            .unwrap();
        ids.push(res.headers()["x-request-id"].to_str().unwrap().to_string());
    }

    let recent: Value = client()
        .get(gateway.url("/_admin/recent?limit=2"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(recent["count"], 2);
    assert_eq!(recent["recent"][0]["url"], "/bcw3d/2");
    assert_eq!(recent["recent"][1]["url"], "/bcw3d/1");

    let res = client()
        .get(gateway.url(&format!("/_admin/request/{}", ids[0])))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let entry: Value = res.json().await.unwrap();
    assert_eq!(entry["url"], "/bcw3d/0");
    assert_eq!(entry["target"], "block_city");
    assert_eq!(entry["response_body"], r#"{"n":1}"#);

    let res = client()
        .get(gateway.url("/_admin/request/does-not-exist"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_recent_limit_capped() {
    let upstream = start_upstream(Reply::json("{}")).await;
    let mut config = config_for(&upstream.url());
    config.store.recent_limit = 2;
    let gateway = start_gateway(config).await;

    for _ in 0..4 {
        client().get(gateway.url("/bcw3d")).send().await.unwrap();
    }

    let recent: Value = client()
        .get(gateway.url("/_admin/recent?limit=100"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(recent["count"], 2);
}

#[tokio::test]
async fn test_api_key_required_when_configured() {
    let upstream = start_upstream(Reply::json("{}")).await;
    let mut config = config_for(&upstream.url());
    config.admin.api_key = Some("s3cret".into());
    let gateway = start_gateway(config).await;

    let res = client().get(gateway.url("/_admin/recent")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client()
        .get(gateway.url("/_admin/recent"))
        .bearer_auth("wrong")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client()
        .get(gateway.url("/_admin/recent"))
        .bearer_auth("s3cret")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_disabled_admin_is_proxied() {
    let upstream = start_upstream(Reply::json(r#"{"upstream":true}"#)).await;
    let mut config = config_for(&upstream.url());
    config.admin.enabled = false;
    let gateway = start_gateway(config).await;

    let res = client().get(gateway.url("/_admin/recent")).send().await.unwrap();
    assert_eq!(res.text().await.unwrap(), r#"{"upstream":true}"#);
    assert_eq!(upstream.captured()[0].path, "/_admin/recent");
}

#[tokio::test]
async fn test_malformed_admin_body_uses_error_shape() {
    let upstream = start_upstream(Reply::json("{}")).await;
    let gateway = start_gateway(config_for(&upstream.url())).await;

    let res = client()
        .post(gateway.url("/_admin/mock"))
        .body("path=/bcw3d")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert!(body["error"].is_string());

    let res = client()
        .post(gateway.url("/_admin/mock/clear"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert!(body["error"].is_string());

    assert!(gateway.store.mocks().is_empty());
    assert!(upstream.captured().is_empty());
}
