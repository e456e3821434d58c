//! HTTP-level tests for the message and health endpoints, driven through the
//! router with in-memory gateways.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use colloquy_app::{build_router, AppState};
use colloquy_core::config::DispatchConfig;
use colloquy_dispatch::{Gateways, Readiness, TurnOrchestrator};
use colloquy_gateways::mock::{
    MockDialogGateway, MockKnowledgeGateway, MockLanguageGateway, ScriptedReply,
};
use colloquy_gateways::{GatewayError, Passage};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

fn app(dialog: Arc<MockDialogGateway>, readiness: Readiness) -> axum::Router {
    let gateways = Gateways {
        dialog,
        knowledge: Arc::new(MockKnowledgeGateway::with_passages(vec![Passage::new(
            "Q: what is a qubit?\nA: a unit of quantum information",
            0.9,
        )])),
        language: Arc::new(MockLanguageGateway::with_keywords(&["qubit"])),
    };
    let turns = TurnOrchestrator::new(gateways, Arc::new(readiness), &DispatchConfig::default());
    build_router(Arc::new(AppState::new(turns)))
}

fn ready() -> Readiness {
    Readiness::ready("ws-1", MockKnowledgeGateway::params())
}

fn post_message(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/message")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn read_json(resp: axum::response::Response) -> Value {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn message_round_trip_answers_from_passages() {
    let dialog = Arc::new(MockDialogGateway::new());
    dialog.push_reply(ScriptedReply::lookup("rnr"));

    let resp = app(dialog, ready())
        .oneshot(post_message(json!({
            "input": { "text": "what is a qubit ABCDE1234F" },
            "context": { "conversation_id": "c-1" }
        })))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = read_json(resp).await;
    assert_eq!(body["output"]["text"], json!(["a unit of quantum information"]));
    assert_eq!(body["context"]["inputQuery"], "what is a qubit 1111111111");
    assert_eq!(body["context"]["field"], 0);
    assert_eq!(body["context"]["conversation_id"], "c-1");
    assert_eq!(body["context"]["colloquy_schema"], 1);
}

#[tokio::test]
async fn dialog_failure_maps_to_status_and_error_body() {
    let dialog = Arc::new(MockDialogGateway::new());
    dialog.fail_next(GatewayError::Status {
        code: 404,
        message: "Resource not found".into(),
    });

    let resp = app(dialog, ready())
        .oneshot(post_message(json!({ "input": { "text": "hello" } })))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body = read_json(resp).await;
    assert_eq!(body["code"], 404);
    assert!(body["error"].as_str().unwrap().contains("Resource not found"));
}

#[tokio::test]
async fn transport_failure_is_internal_error() {
    let dialog = Arc::new(MockDialogGateway::new());
    dialog.fail_next(GatewayError::Transport("connection refused".into()));

    let resp = app(dialog, ready())
        .oneshot(post_message(json!({ "input": { "text": "hello" } })))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(read_json(resp).await["code"], 500);
}

#[tokio::test]
async fn initializing_workspace_still_answers_ok() {
    let resp = app(Arc::new(MockDialogGateway::new()), Readiness::new())
        .oneshot(post_message(json!({})))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = read_json(resp).await;
    assert_eq!(
        body["output"]["text"],
        json!(["Assistant initialization in progress. Please try again."])
    );
}

#[tokio::test]
async fn health_reports_readiness() {
    let resp = app(Arc::new(MockDialogGateway::new()), ready())
        .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = read_json(resp).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["dialog_ready"], true);
    assert_eq!(body["search_ready"], true);
    assert!(body.get("setup_error").is_none());

    let readiness = Readiness::new();
    readiness.record_setup_error("bad credentials");
    let resp = app(Arc::new(MockDialogGateway::new()), readiness)
        .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let body = read_json(resp).await;
    assert_eq!(body["status"], "failed");
    assert_eq!(body["setup_error"], "bad credentials");
    assert_eq!(body["dialog_ready"], false);
}

#[tokio::test]
async fn malformed_body_is_rejected() {
    let resp = app(Arc::new(MockDialogGateway::new()), ready())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/message")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(resp.status().is_client_error());
}
