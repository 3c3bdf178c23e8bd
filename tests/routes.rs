mod common;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use poll_schema::handlers::AppState;
use poll_schema::{db, routes, CoinStore, Config};
use serde_json::Value;
use tower::ServiceExt;

/// A router over a pool that never connects; only paths that fail before
/// touching the database are exercised with it.
fn offline_app() -> Router {
    let config = Config {
        database_url: "postgres://nobody@127.0.0.1:1/unused".to_string(),
        ..Config::default()
    };
    let pool = db::create_lazy_pool(&config).expect("lazy pool");
    routes::create_routes(AppState::new(CoinStore::new(pool)))
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("failed to build request")
}

async fn json_body(resp: axum::response::Response) -> Value {
    let body = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    serde_json::from_slice(&body).expect("response body was not json")
}

#[tokio::test]
async fn blank_user_is_bad_request() {
    let resp = offline_app()
        .oneshot(post_json(
            "/api/vote",
            r#"{"coin_symbol":"BTCUSDT","user_id":"  "}"#,
        ))
        .await
        .expect("request failed");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = json_body(resp).await;
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap_or_default()
        .contains("user_id"));
}

#[tokio::test]
async fn empty_selection_is_bad_request() {
    let resp = offline_app()
        .oneshot(post_json("/api/admin/select-coins", r#"{"symbols":[]}"#))
        .await
        .expect("request failed");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_fields_use_api_error_body() {
    let resp = offline_app()
        .oneshot(post_json("/api/vote", r#"{"coin_symbol":"BTCUSDT"}"#))
        .await
        .expect("request failed");

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(resp).await;
    assert_eq!(body["error"]["code"], "UNPROCESSABLE_ENTITY");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap_or_default()
        .contains("user_id"));
}

#[tokio::test]
async fn malformed_json_uses_api_error_body() {
    let resp = offline_app()
        .oneshot(post_json("/api/vote", "{not json"))
        .await
        .expect("request failed");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = json_body(resp).await;
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
    assert!(body["error"]["message"].is_string());
}

#[tokio::test]
async fn wrong_content_type_uses_api_error_body() {
    let resp = offline_app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/admin/select-coins")
                .header("content-type", "text/plain")
                .body(Body::from(r#"{"symbols":["BTCUSDT"]}"#))
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");

    assert_eq!(resp.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    let body = json_body(resp).await;
    assert_eq!(body["error"]["code"], "UNSUPPORTED_MEDIA_TYPE");
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let resp = offline_app()
        .oneshot(
            Request::builder()
                .uri("/api/nope")
                .body(Body::empty())
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn vote_flow_over_http() {
    let Some(db) = common::migrated_db().await else {
        return;
    };
    let app = routes::create_routes(AppState::new(CoinStore::new(db.pool.clone())));

    let resp = app
        .clone()
        .oneshot(post_json(
            "/api/admin/select-coins",
            r#"{"symbols":["BTCUSDT","ETHUSDT"]}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let vote = r#"{"coin_symbol":"BTCUSDT","user_id":"alice"}"#;
    let resp = app.clone().oneshot(post_json("/api/vote", vote)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["status"], "Vote recorded");

    let resp = app.clone().oneshot(post_json("/api/vote", vote)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body = json_body(resp).await;
    assert_eq!(body["error"]["code"], "ALREADY_VOTED");
    assert_eq!(body["error"]["message"], "Already voted");

    let resp = app
        .clone()
        .oneshot(post_json(
            "/api/vote",
            r#"{"coin_symbol":"DOGEUSDT","user_id":"alice"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = app
        .clone()
        .oneshot(Request::builder().uri("/api/poll").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["coins"].as_array().map(Vec::len), Some(2));
    assert_eq!(body["votes"]["BTCUSDT"], 1);

    let resp = app
        .oneshot(Request::builder().uri("/api/poll/top").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let body = json_body(resp).await;
    assert_eq!(body[0]["symbol"], "BTCUSDT");
    assert_eq!(body[0]["votes"], 1);

    db.teardown().await;
}
