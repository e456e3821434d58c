use std::sync::Arc;

use colloquy_core::config::DispatchConfig;
use colloquy_core::{MessageRequest, MessageResponse};
use colloquy_dispatch::passage::{INITIALIZING_REPLY, SEARCH_APOLOGY};
use colloquy_dispatch::turn::{ASSISTANT_INITIALIZING, SETUP_FAILED_PREFIX};
use colloquy_dispatch::{Gateways, Readiness, TurnOrchestrator};
use colloquy_gateways::mock::{
    MockDialogGateway, MockKnowledgeGateway, MockLanguageGateway, ScriptedReply,
};
use colloquy_gateways::{GatewayError, Passage};
use serde_json::{json, Value};

struct Harness {
    dialog: Arc<MockDialogGateway>,
    knowledge: Arc<MockKnowledgeGateway>,
    language: Arc<MockLanguageGateway>,
    turns: TurnOrchestrator,
}

fn harness(readiness: Readiness) -> Harness {
    let dialog = Arc::new(MockDialogGateway::new());
    let knowledge = Arc::new(MockKnowledgeGateway::with_passages(vec![Passage::new(
        "Q: what is a qubit?\nA: a unit of quantum information",
        0.9,
    )]));
    let language = Arc::new(MockLanguageGateway::with_keywords(&["qubit"]));
    let gateways = Gateways {
        dialog: dialog.clone(),
        knowledge: knowledge.clone(),
        language: language.clone(),
    };
    let turns = TurnOrchestrator::new(gateways, Arc::new(readiness), &DispatchConfig::default());
    Harness {
        dialog,
        knowledge,
        language,
        turns,
    }
}

fn ready() -> Readiness {
    Readiness::ready("ws-1", MockKnowledgeGateway::params())
}

fn request(text: &str, context: Value) -> MessageRequest {
    serde_json::from_value(json!({ "input": { "text": text }, "context": context })).unwrap()
}

fn context_json(resp: &MessageResponse) -> Value {
    serde_json::to_value(&resp.context).unwrap()
}

#[tokio::test]
async fn qubit_question_end_to_end() {
    let h = harness(ready());
    h.dialog.push_reply(ScriptedReply::lookup("rnr"));

    let resp = h
        .turns
        .handle(request("what is a qubit ABCDE1234F", json!({})))
        .await
        .unwrap();

    let sent = h.dialog.turns();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].input, "what is a qubit 1111111111");
    assert_eq!(sent[0].workspace_id, "ws-1");
    assert_eq!(resp.output.text, vec!["a unit of quantum information"]);
    assert_eq!(
        resp.context.input_query.as_deref(),
        Some("what is a qubit 1111111111")
    );
    assert_eq!(resp.context.field, 0);
    assert_eq!(resp.context.key.as_deref(), Some("qubit"));
    assert_eq!(
        h.language.inputs(),
        vec!["what is a qubit 1111111111".to_string()]
    );
}

#[tokio::test]
async fn rejected_only_answer_exhausts_and_resets() {
    let h = harness(ready());
    h.dialog.push_reply(ScriptedReply::lookup("rnr"));
    let first = h
        .turns
        .handle(request("what is a qubit ABCDE1234F", json!({})))
        .await
        .unwrap();

    let mut ctx = context_json(&first);
    ctx["isRelevant"] = json!(false);
    let second = h.turns.handle(request("no", ctx)).await.unwrap();

    assert_eq!(second.output.text, vec![SEARCH_APOLOGY]);
    assert!(second.context.input_query.is_none());
    assert_eq!(second.context.field, 0);
    assert!(second.context.key.is_none());
    assert!(second.context.new_passage.is_none());
    assert!(second.context.pending_lookup().is_none());
    assert_eq!(
        h.knowledge.queries(),
        vec![
            "what is a qubit 1111111111".to_string(),
            "what is a qubit 1111111111".to_string()
        ]
    );
}

#[tokio::test]
async fn accepted_answer_can_become_dialog_node() {
    let h = harness(ready());
    h.dialog.push_reply(ScriptedReply::lookup("rnr"));
    let first = h
        .turns
        .handle(request("what is a qubit", json!({})))
        .await
        .unwrap();

    let mut ctx = context_json(&first);
    ctx["isRelevant"] = json!(true);
    h.dialog.push_reply(ScriptedReply::text("Glad that helped."));
    let accepted = h.turns.handle(request("yes", ctx)).await.unwrap();
    assert_eq!(accepted.output.text, vec!["Glad that helped."]);
    assert!(accepted.context.input_query.is_none());
    assert_eq!(accepted.context.key.as_deref(), Some("qubit"));

    h.dialog.push_reply(ScriptedReply::lookup("update_dialogue"));
    let saved = h
        .turns
        .handle(request("save it", context_json(&accepted)))
        .await
        .unwrap();

    let nodes = h.dialog.dialog_nodes();
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0].title, "qubit");
    assert_eq!(nodes[0].output.text, "a unit of quantum information");
    assert!(saved.context.key.is_none());
    assert!(saved.context.new_passage.is_none());
}

#[tokio::test]
async fn workspace_not_ready_skips_dialog() {
    let h = harness(Readiness::new());

    let resp = h
        .turns
        .handle(request("hello", json!({ "conversation_id": "c-1" })))
        .await
        .unwrap();

    assert_eq!(resp.output.text, vec![ASSISTANT_INITIALIZING]);
    assert_eq!(resp.context.extra["conversation_id"], "c-1");
    assert!(h.dialog.turns().is_empty());
}

#[tokio::test]
async fn setup_error_wins_over_everything() {
    let readiness = ready();
    readiness.record_setup_error("Discovery rejected credentials");
    let h = harness(readiness);

    let resp = h.turns.handle(request("hello", json!({}))).await.unwrap();

    assert_eq!(
        resp.output.text,
        vec![format!("{SETUP_FAILED_PREFIX} Discovery rejected credentials")]
    );
    assert!(h.dialog.turns().is_empty());
}

#[tokio::test]
async fn search_not_ready_answers_initializing() {
    let readiness = Readiness::new();
    readiness.publish_workspace("ws-1".into());
    let h = harness(readiness);
    h.dialog.push_reply(ScriptedReply::lookup("rnr"));

    let resp = h.turns.handle(request("what is a qubit", json!({}))).await.unwrap();

    assert_eq!(resp.output.text, vec![INITIALIZING_REPLY]);
    assert!(resp.context.pending_lookup().is_none());
    assert!(h.knowledge.queries().is_empty());
}

#[tokio::test]
async fn empty_input_is_a_no_op() {
    let h = harness(ready());
    let inbound = json!({ "conversation_id": "c-2", "field": 3, "inputQuery": "q" });

    let resp = h.turns.handle(request("   ", inbound)).await.unwrap();

    assert!(resp.output.text.is_empty());
    assert_eq!(resp.context.field, 3);
    assert_eq!(resp.context.input_query.as_deref(), Some("q"));
    assert!(h.dialog.turns().is_empty());
}

#[tokio::test]
async fn opening_turn_without_input_reaches_the_engine() {
    let h = harness(ready());
    h.dialog.push_reply(ScriptedReply::text("Hello, ask me about quantum computing."));

    let resp = h.turns.handle(MessageRequest::default()).await.unwrap();

    let turns = h.dialog.turns();
    assert_eq!(turns.len(), 1);
    assert_eq!(turns[0].input, "");
    assert_eq!(turns[0].workspace_id, "ws-1");
    assert_eq!(resp.output.text, vec!["Hello, ask me about quantum computing.".to_string()]);
    assert_eq!(h.language.calls(), 0);
}

#[tokio::test]
async fn dialog_failure_keeps_its_status() {
    let h = harness(ready());
    h.dialog.fail_next(GatewayError::Status {
        code: 503,
        message: "Service Unavailable".into(),
    });

    let err = h.turns.handle(request("hello", json!({}))).await.unwrap_err();

    assert_eq!(err.status_code(), 503);
}

#[tokio::test]
async fn cached_keywords_feed_topic_verification() {
    let h = harness(ready());
    h.dialog.push_reply(ScriptedReply::lookup("verify_topic_name"));
    let inbound = json!({
        "nlu_output": { "keywords": [{ "text": "entanglement", "relevance": 0.8 }] }
    });

    let resp = h.turns.handle(request("is that a topic", inbound)).await.unwrap();

    assert_eq!(resp.context.key.as_deref(), Some("entanglement"));
    assert_eq!(h.language.calls(), 0);
}
