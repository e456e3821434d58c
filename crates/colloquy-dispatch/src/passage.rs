//! Passage resolution: turns a knowledge-lookup turn into one answer line and
//! drives the relevance-feedback cursor across turns.

use std::sync::Arc;

use colloquy_core::config::ExtractionStrategy;
use colloquy_core::{Analysis, ConversationContext};
use colloquy_gateways::{GatewayResult, KnowledgeGateway, LanguageGateway, Passage, SearchParams};

use crate::extract::extract_answer;
use crate::readiness::Readiness;

pub const INITIALIZING_REPLY: &str = "Sorry, currently I do not have a response. Discovery initialization is in progress. Please try again later.";
pub const SEARCH_APOLOGY: &str = "Sorry, currently I do not have a response. Our customer representative will get in touch with you shortly.";
pub const NO_ANSWER_APOLOGY: &str = "Sorry, I currently do not have an appropriate response for your query. Our customer care executive will call you in 24 hours.";

/// Why a lookup ended without an answer. Every fallback ends the flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    SearchFailed,
    NoPassages,
    /// The feedback cursor moved past the last ranked passage.
    Exhausted,
    /// The selected passage had no usable answer line.
    NoAnswer,
}

impl Fallback {
    pub fn message(&self) -> &'static str {
        match self {
            Fallback::SearchFailed | Fallback::NoPassages | Fallback::Exhausted => SEARCH_APOLOGY,
            Fallback::NoAnswer => NO_ANSWER_APOLOGY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Answer { text: String, passage_index: usize },
    /// The user accepted the last answer. Nothing new to say.
    Accepted,
    /// Search backend not prepared yet.
    NotReady,
    Fallback(Fallback),
}

impl Resolution {
    /// The line to append to the outbound text, if any.
    pub fn line(&self) -> Option<&str> {
        match self {
            Resolution::Answer { text, .. } => Some(text.as_str()),
            Resolution::Accepted => None,
            Resolution::NotReady => Some(INITIALIZING_REPLY),
            Resolution::Fallback(f) => Some(f.message()),
        }
    }
}

pub struct PassageResolver {
    knowledge: Arc<dyn KnowledgeGateway>,
    language: Arc<dyn LanguageGateway>,
    readiness: Arc<Readiness>,
    strategy: ExtractionStrategy,
}

impl PassageResolver {
    pub fn new(
        knowledge: Arc<dyn KnowledgeGateway>,
        language: Arc<dyn LanguageGateway>,
        readiness: Arc<Readiness>,
        strategy: ExtractionStrategy,
    ) -> Self {
        Self {
            knowledge,
            language,
            readiness,
            strategy,
        }
    }

    /// Advance the lookup flow held in `ctx` by one turn.
    ///
    /// `input` is the redacted utterance of this turn. It only becomes the
    /// query when no flow is in progress; later turns reuse `inputQuery`.
    pub async fn resolve(&self, ctx: &mut ConversationContext, input: &str) -> Resolution {
        // Feedback is single-use: it is consumed on every branch.
        let feedback = ctx.take_feedback();

        let Some(params) = self.readiness.search_params() else {
            tracing::warn!("Knowledge lookup requested before search backend is ready");
            ctx.clear_action();
            return Resolution::NotReady;
        };

        if !ctx.search_in_progress() {
            if feedback.is_some() {
                tracing::debug!("Discarding relevance feedback with no lookup in progress");
            }
            return self.initiate(ctx, input, params).await;
        }

        match feedback {
            Some(true) => {
                tracing::info!("Answer accepted after {} rejection(s)", ctx.field);
                ctx.input_query = None;
                ctx.field = 0;
                ctx.clear_action();
                return Resolution::Accepted;
            }
            Some(false) => ctx.field = ctx.field.saturating_add(1),
            None => {}
        }

        let query = ctx.input_query.clone().unwrap_or_default();
        tracing::debug!("Continuing lookup '{}' at passage {}", query, ctx.field);
        let search = self.knowledge.query(&query, params).await;
        self.select(ctx, search)
    }

    async fn initiate(
        &self,
        ctx: &mut ConversationContext,
        input: &str,
        params: &SearchParams,
    ) -> Resolution {
        ctx.input_query = Some(input.to_string());
        ctx.field = 0;

        let (search, analysis) = tokio::join!(
            self.knowledge.query(input, params),
            self.language.analyze(input)
        );
        match analysis {
            Ok(analysis) => apply_enrichment(ctx, analysis),
            Err(e) => tracing::warn!("Language enrichment failed: {e}"),
        }

        self.select(ctx, search)
    }

    fn select(
        &self,
        ctx: &mut ConversationContext,
        search: GatewayResult<Vec<Passage>>,
    ) -> Resolution {
        let resolution = match search {
            Err(e) => {
                tracing::error!("Knowledge search failed: {e}");
                Resolution::Fallback(Fallback::SearchFailed)
            }
            Ok(passages) if passages.is_empty() => Resolution::Fallback(Fallback::NoPassages),
            Ok(passages) => {
                let index = ctx.field as usize;
                match passages.get(index) {
                    None => {
                        tracing::info!(
                            "No passage left at {} of {}, ending lookup",
                            index,
                            passages.len()
                        );
                        Resolution::Fallback(Fallback::Exhausted)
                    }
                    Some(passage) => match extract_answer(&passage.text, self.strategy) {
                        Some(text) => Resolution::Answer {
                            text,
                            passage_index: index,
                        },
                        None => Resolution::Fallback(Fallback::NoAnswer),
                    },
                }
            }
        };

        match &resolution {
            Resolution::Answer { text, .. } => ctx.new_passage = Some(text.clone()),
            Resolution::Fallback(_) => {
                ctx.reset_search_flow();
                ctx.clear_action();
            }
            Resolution::Accepted | Resolution::NotReady => {}
        }
        resolution
    }
}

/// Cache the language analysis and derive the active topic from it.
fn apply_enrichment(ctx: &mut ConversationContext, analysis: Analysis) {
    if !analysis.keywords.is_empty() {
        ctx.keywords = Some(analysis.keywords.clone());
    }
    if let Some(topic) = ctx.first_keyword().map(str::to_string) {
        ctx.key = Some(topic);
    }
    ctx.nlu_output = Some(analysis);
}
