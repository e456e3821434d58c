//! In-memory gateway implementations for testing.

use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, RwLock};

use async_trait::async_trait;
use colloquy_core::{Analysis, ConversationContext, Keyword, MessageInput, MessageResponse};
use serde_json::{Map, Value};

use crate::error::{GatewayError, GatewayResult};
use crate::traits::{DialogGateway, KnowledgeGateway, LanguageGateway};
use crate::types::{CatalogItem, DialogNode, Passage, SearchParams};

/// What the mock dialog engine answers on its next turn.
#[derive(Debug, Clone, Default)]
pub struct ScriptedReply {
    pub lookup: Option<String>,
    pub text: Vec<String>,
    /// Context fields the engine sets on this turn.
    pub set: Map<String, Value>,
}

impl ScriptedReply {
    pub fn lookup(tag: &str) -> Self {
        Self {
            lookup: Some(tag.to_string()),
            ..Default::default()
        }
    }

    pub fn text(line: &str) -> Self {
        Self {
            text: vec![line.to_string()],
            ..Default::default()
        }
    }

    pub fn with_field(mut self, name: &str, value: Value) -> Self {
        self.set.insert(name.to_string(), value);
        self
    }
}

/// A turn as the mock dialog engine received it.
#[derive(Debug, Clone)]
pub struct RecordedTurn {
    pub workspace_id: String,
    pub input: String,
    pub context: ConversationContext,
}

pub struct MockDialogGateway {
    script: Mutex<VecDeque<ScriptedReply>>,
    turns: Mutex<Vec<RecordedTurn>>,
    intents: RwLock<Vec<CatalogItem>>,
    entities: RwLock<Vec<CatalogItem>>,
    values: RwLock<HashMap<String, Vec<String>>>,
    nodes: RwLock<Vec<DialogNode>>,
    workspaces: RwLock<Vec<(String, String)>>,
    failure: Mutex<Option<GatewayError>>,
    next_id: AtomicU64,
}

impl Default for MockDialogGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDialogGateway {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            turns: Mutex::new(Vec::new()),
            intents: RwLock::new(Vec::new()),
            entities: RwLock::new(Vec::new()),
            values: RwLock::new(HashMap::new()),
            nodes: RwLock::new(Vec::new()),
            workspaces: RwLock::new(Vec::new()),
            failure: Mutex::new(None),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn push_reply(&self, reply: ScriptedReply) {
        self.script.lock().unwrap().push_back(reply);
    }

    /// Make the next call of any kind fail with this error.
    pub fn fail_next(&self, err: GatewayError) {
        *self.failure.lock().unwrap() = Some(err);
    }

    pub fn add_intent(&self, name: &str, description: Option<&str>) {
        self.intents.write().unwrap().push(CatalogItem::new(name, description));
    }

    pub fn add_entity(&self, name: &str, description: Option<&str>) {
        self.entities.write().unwrap().push(CatalogItem::new(name, description));
    }

    pub fn add_value(&self, entity: &str, value: &str) {
        self.values
            .write()
            .unwrap()
            .entry(entity.to_string())
            .or_default()
            .push(value.to_string());
    }

    pub fn add_workspace(&self, name: &str, id: &str) {
        self.workspaces
            .write()
            .unwrap()
            .push((name.to_string(), id.to_string()));
    }

    pub fn intents(&self) -> Vec<CatalogItem> {
        self.intents.read().unwrap().clone()
    }

    pub fn entities(&self) -> Vec<CatalogItem> {
        self.entities.read().unwrap().clone()
    }

    pub fn values(&self, entity: &str) -> Vec<String> {
        self.values
            .read()
            .unwrap()
            .get(entity)
            .cloned()
            .unwrap_or_default()
    }

    pub fn dialog_nodes(&self) -> Vec<DialogNode> {
        self.nodes.read().unwrap().clone()
    }

    pub fn turns(&self) -> Vec<RecordedTurn> {
        self.turns.lock().unwrap().clone()
    }

    pub fn workspace_names(&self) -> Vec<String> {
        self.workspaces
            .read()
            .unwrap()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    fn check_failure(&self) -> GatewayResult<()> {
        match self.failure.lock().unwrap().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn apply_fields(
    context: ConversationContext,
    fields: &Map<String, Value>,
) -> GatewayResult<ConversationContext> {
    if fields.is_empty() {
        return Ok(context);
    }
    let mut raw = serde_json::to_value(context)?;
    if let Value::Object(map) = &mut raw {
        for (k, v) in fields {
            map.insert(k.clone(), v.clone());
        }
    }
    Ok(serde_json::from_value(raw)?)
}

#[async_trait]
impl DialogGateway for MockDialogGateway {
    async fn send_turn(
        &self,
        workspace_id: &str,
        input: &str,
        context: ConversationContext,
    ) -> GatewayResult<MessageResponse> {
        self.check_failure()?;
        self.turns.lock().unwrap().push(RecordedTurn {
            workspace_id: workspace_id.to_string(),
            input: input.to_string(),
            context: context.clone(),
        });

        let reply = self.script.lock().unwrap().pop_front().unwrap_or_default();
        let mut context = apply_fields(context, &reply.set)?;
        if let Some(tag) = &reply.lookup {
            context.set_lookup(tag);
        }

        let mut resp = MessageResponse {
            input: MessageInput::text(input),
            context,
            ..Default::default()
        };
        resp.output.text = reply.text;
        Ok(resp)
    }

    async fn list_intents(&self, _workspace_id: &str) -> GatewayResult<Vec<CatalogItem>> {
        self.check_failure()?;
        Ok(self.intents())
    }

    async fn list_entities(&self, _workspace_id: &str) -> GatewayResult<Vec<CatalogItem>> {
        self.check_failure()?;
        Ok(self.entities())
    }

    async fn list_values(&self, _workspace_id: &str, entity: &str) -> GatewayResult<Vec<String>> {
        self.check_failure()?;
        Ok(self.values(entity))
    }

    async fn create_intent(
        &self,
        _workspace_id: &str,
        intent: &str,
        example: &str,
    ) -> GatewayResult<()> {
        self.check_failure()?;
        self.add_intent(intent, Some(example));
        Ok(())
    }

    async fn create_entity(
        &self,
        _workspace_id: &str,
        entity: &str,
        value: &str,
    ) -> GatewayResult<()> {
        self.check_failure()?;
        self.add_entity(entity, None);
        self.add_value(entity, value);
        Ok(())
    }

    async fn create_value(
        &self,
        _workspace_id: &str,
        entity: &str,
        value: &str,
    ) -> GatewayResult<()> {
        self.check_failure()?;
        self.add_value(entity, value);
        Ok(())
    }

    async fn create_dialog_node(&self, _workspace_id: &str, node: &DialogNode) -> GatewayResult<()> {
        self.check_failure()?;
        self.nodes.write().unwrap().push(node.clone());
        Ok(())
    }

    async fn find_workspace(&self, name: &str) -> GatewayResult<Option<String>> {
        self.check_failure()?;
        Ok(self
            .workspaces
            .read()
            .unwrap()
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, id)| id.clone()))
    }

    async fn workspace_exists(&self, workspace_id: &str) -> GatewayResult<bool> {
        self.check_failure()?;
        Ok(self
            .workspaces
            .read()
            .unwrap()
            .iter()
            .any(|(_, id)| id == workspace_id))
    }

    async fn create_workspace(&self, definition: &Value) -> GatewayResult<String> {
        self.check_failure()?;
        let name = definition
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| GatewayError::Parse("workspace definition has no name".into()))?;
        let id = format!("ws-{}", self.next_id.fetch_add(1, Ordering::Relaxed));
        self.add_workspace(name, &id);
        Ok(id)
    }
}

pub struct MockKnowledgeGateway {
    passages: RwLock<Vec<Passage>>,
    queries: Mutex<Vec<String>>,
    fail_queries: AtomicBool,
    fail_prepare: AtomicBool,
    prepared_with: Mutex<Vec<PathBuf>>,
}

impl Default for MockKnowledgeGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MockKnowledgeGateway {
    pub fn new() -> Self {
        Self {
            passages: RwLock::new(Vec::new()),
            queries: Mutex::new(Vec::new()),
            fail_queries: AtomicBool::new(false),
            fail_prepare: AtomicBool::new(false),
            prepared_with: Mutex::new(Vec::new()),
        }
    }

    pub fn with_passages(passages: Vec<Passage>) -> Self {
        let mock = Self::new();
        *mock.passages.write().unwrap() = passages;
        mock
    }

    pub fn set_passages(&self, passages: Vec<Passage>) {
        *self.passages.write().unwrap() = passages;
    }

    pub fn fail_queries(&self, fail: bool) {
        self.fail_queries.store(fail, Ordering::Relaxed);
    }

    pub fn fail_prepare(&self, fail: bool) {
        self.fail_prepare.store(fail, Ordering::Relaxed);
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    pub fn prepared_with(&self) -> Vec<PathBuf> {
        self.prepared_with.lock().unwrap().clone()
    }

    pub fn params() -> SearchParams {
        SearchParams {
            environment_id: "env-test".into(),
            collection_id: "col-test".into(),
        }
    }
}

#[async_trait]
impl KnowledgeGateway for MockKnowledgeGateway {
    async fn prepare(&self, documents: &[PathBuf]) -> GatewayResult<SearchParams> {
        if self.fail_prepare.load(Ordering::Relaxed) {
            return Err(GatewayError::Status {
                code: 401,
                message: "Unauthorized".into(),
            });
        }
        self.prepared_with
            .lock()
            .unwrap()
            .extend(documents.iter().cloned());
        Ok(Self::params())
    }

    async fn query(&self, text: &str, _params: &SearchParams) -> GatewayResult<Vec<Passage>> {
        self.queries.lock().unwrap().push(text.to_string());
        if self.fail_queries.load(Ordering::Relaxed) {
            return Err(GatewayError::Transport("connection reset".into()));
        }
        Ok(self.passages.read().unwrap().clone())
    }
}

pub struct MockLanguageGateway {
    analysis: RwLock<Option<Analysis>>,
    inputs: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl Default for MockLanguageGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MockLanguageGateway {
    /// A language service with no configured result: every call fails.
    pub fn new() -> Self {
        Self {
            analysis: RwLock::new(None),
            inputs: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// A language service that always reports these keywords.
    pub fn with_keywords(keywords: &[&str]) -> Self {
        let mock = Self::new();
        *mock.analysis.write().unwrap() = Some(Analysis {
            keywords: keywords
                .iter()
                .map(|k| Keyword {
                    text: k.to_string(),
                    relevance: 0.9,
                    sentiment: None,
                })
                .collect(),
            ..Default::default()
        });
        mock
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    pub fn inputs(&self) -> Vec<String> {
        self.inputs.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageGateway for MockLanguageGateway {
    async fn analyze(&self, text: &str) -> GatewayResult<Analysis> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.inputs.lock().unwrap().push(text.to_string());
        self.analysis
            .read()
            .unwrap()
            .clone()
            .ok_or_else(|| GatewayError::Status {
                code: 422,
                message: "not enough text for language id".into(),
            })
    }
}
