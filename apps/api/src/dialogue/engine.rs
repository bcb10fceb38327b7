//! Screening dialogue orchestration.
//!
//! Flow per call:
//! 1. load the session from the store (`turn`) or build a fresh one (`start`)
//! 2. work on a copy: append the candidate answer, force a verdict at the ceiling
//! 3. one completion call, bounded by the configured timeout
//! 4. parse the reply for a `[RESULT]` block and pick the next stage
//! 5. save the copy
//!
//! A failed or timed-out completion returns before step 5, so the stored
//! session keeps its pre-call state and the same turn can be retried.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::dialogue::prompts::{opening_message, system_prompt, FORCE_VERDICT_INSTRUCTION};
use crate::dialogue::session::{ConversationSession, DialogueStage, SessionSummary};
use crate::dialogue::verdict::{candidate_reply, extract_verdict, Verdict};
use crate::errors::AppError;
use crate::llm_client::{ChatMessage, CompletionService};
use crate::store::{get_json, set_json, KvStore};

pub const SESSION_KEY_PREFIX: &str = "session:";

pub const DEFAULT_MAX_TURNS: u32 = 8;
pub const DEFAULT_ALTERNATIVE_THRESHOLD: u8 = 50;

const COMPLETED_REPLY: &str = "Thank you! I have finished reviewing your application.";
const CEILING_REPLY: &str =
    "Thank you for the detailed answers! I will pass the information on to the employer.";
const ALREADY_COMPLETED_REPLY: &str = "Thank you! The review of your application is already complete.";

#[derive(Debug, Clone)]
pub struct DialogueConfig {
    /// Candidate answers accepted before a verdict is forced.
    pub max_turns: u32,
    pub alternative_threshold: u8,
    pub max_output_tokens: u32,
    pub completion_timeout: Duration,
    pub session_ttl: Option<Duration>,
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            max_turns: DEFAULT_MAX_TURNS,
            alternative_threshold: DEFAULT_ALTERNATIVE_THRESHOLD,
            max_output_tokens: 800,
            completion_timeout: Duration::from_secs(60),
            session_ttl: None,
        }
    }
}

/// What a caller gets back from `start` and `turn`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DialogueReply {
    pub session_id: String,
    pub reply: String,
    pub stage: DialogueStage,
    pub is_completed: bool,
    pub turn_count: u32,
    pub relevance: u8,
    pub summary: String,
    pub reasons: Vec<String>,
    pub rejection_tags: Vec<String>,
    pub suggest_alternative: bool,
    pub alternative_note: Option<String>,
}

impl DialogueReply {
    fn new(session: &ConversationSession, reply: impl Into<String>) -> Self {
        Self {
            session_id: session.id.clone(),
            reply: reply.into(),
            stage: session.stage,
            is_completed: session.is_completed(),
            turn_count: session.turn_count,
            relevance: session.assessment.relevance,
            summary: session.assessment.summary.clone(),
            reasons: session.assessment.reasons.clone(),
            rejection_tags: session.assessment.rejection_tags.clone(),
            suggest_alternative: session.suggest_alternative,
            alternative_note: session.alternative_note.clone(),
        }
    }
}

pub struct DialogueEngine {
    llm: Arc<dyn CompletionService>,
    store: Arc<dyn KvStore>,
    config: DialogueConfig,
}

impl DialogueEngine {
    pub fn new(
        llm: Arc<dyn CompletionService>,
        store: Arc<dyn KvStore>,
        config: DialogueConfig,
    ) -> Self {
        Self { llm, store, config }
    }

    /// Opens a session and asks the model for a first question or an immediate verdict.
    pub async fn start(
        &self,
        vacancy_text: &str,
        candidate_text: Option<&str>,
        session_id: Option<String>,
    ) -> Result<(ConversationSession, DialogueReply), AppError> {
        if vacancy_text.trim().is_empty() {
            return Err(AppError::Validation("vacancy_text must not be empty".to_string()));
        }

        let id = match session_id.map(|id| id.trim().to_string()) {
            Some(id) if id.is_empty() => {
                return Err(AppError::Validation("session_id must not be empty".to_string()))
            }
            Some(id) => {
                if self.load(&id).await?.is_some() {
                    return Err(AppError::Validation(format!("session '{id}' already exists")));
                }
                id
            }
            None => Uuid::new_v4().to_string(),
        };

        let transcript = vec![
            ChatMessage::system(system_prompt()),
            ChatMessage::user(opening_message(vacancy_text, candidate_text)),
        ];
        let mut session = ConversationSession::new(
            id,
            vacancy_text.to_string(),
            candidate_text.map(str::to_string),
            transcript,
        );

        let raw = self.complete(&session).await?;
        session.record_reply(&raw);

        let reply = match extract_verdict(&raw) {
            Some(verdict) => {
                session.complete(verdict, self.config.alternative_threshold)?;
                info!(
                    "Session {} completed without questions: relevance {}%",
                    session.id, session.assessment.relevance
                );
                reply_or(&raw, COMPLETED_REPLY)
            }
            None => {
                session.continue_questioning()?;
                info!("Session {} started, questioning", session.id);
                raw.trim().to_string()
            }
        };

        self.save(&session).await?;
        let reply = DialogueReply::new(&session, reply);
        Ok((session, reply))
    }

    /// Feeds one candidate answer into the conversation.
    pub async fn turn(&self, session_id: &str, message: &str) -> Result<DialogueReply, AppError> {
        let session = self.get_session(session_id).await?;

        if session.is_completed() {
            debug!("Session {session_id} already completed, returning frozen verdict");
            return Ok(DialogueReply::new(&session, ALREADY_COMPLETED_REPLY));
        }
        if message.trim().is_empty() {
            return Err(AppError::Validation("message must not be empty".to_string()));
        }

        let mut next = session;
        let turn = next.record_candidate_message(message.trim())?;
        let ceiling_reached = turn >= self.config.max_turns;
        if ceiling_reached {
            info!("Session {session_id} reached the turn ceiling ({turn}), forcing a verdict");
            next.push_instruction(FORCE_VERDICT_INSTRUCTION);
        }

        let raw = self.complete(&next).await?;
        next.record_reply(&raw);

        let reply = match (extract_verdict(&raw), ceiling_reached) {
            (Some(verdict), _) => {
                next.complete(verdict, self.config.alternative_threshold)?;
                reply_or(&raw, COMPLETED_REPLY)
            }
            (None, true) => {
                warn!("Session {session_id}: no verdict at the ceiling, using fallback verdict");
                next.complete(Verdict::ceiling_fallback(), self.config.alternative_threshold)?;
                CEILING_REPLY.to_string()
            }
            (None, false) => {
                next.continue_questioning()?;
                raw.trim().to_string()
            }
        };

        if next.is_completed() {
            info!(
                "Session {} completed after {} turns: relevance {}%",
                next.id, next.turn_count, next.assessment.relevance
            );
        }

        self.save(&next).await?;
        Ok(DialogueReply::new(&next, reply))
    }

    pub async fn get_session(&self, session_id: &str) -> Result<ConversationSession, AppError> {
        self.load(session_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("session '{session_id}' not found")))
    }

    /// Summaries of every stored session, oldest first.
    pub async fn list_sessions(&self) -> Result<Vec<SessionSummary>, AppError> {
        let mut sessions = Vec::new();
        for key in self.store.keys(SESSION_KEY_PREFIX).await? {
            // Expired or deleted between listing and reading.
            if let Some(session) = get_json::<ConversationSession>(self.store.as_ref(), &key).await? {
                sessions.push(SessionSummary::from(&session));
            }
        }
        sessions.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(sessions)
    }

    pub async fn delete_session(&self, session_id: &str) -> Result<(), AppError> {
        if !self.store.delete(&session_key(session_id)).await? {
            return Err(AppError::NotFound(format!("session '{session_id}' not found")));
        }
        info!("Session {session_id} deleted");
        Ok(())
    }

    async fn complete(&self, session: &ConversationSession) -> Result<String, AppError> {
        let call = self
            .llm
            .complete(&session.transcript, self.config.max_output_tokens);
        match tokio::time::timeout(self.config.completion_timeout, call).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(AppError::ServiceUnavailable(format!(
                "language model did not answer within {:?}",
                self.config.completion_timeout
            ))),
        }
    }

    async fn load(&self, session_id: &str) -> Result<Option<ConversationSession>, AppError> {
        Ok(get_json(self.store.as_ref(), &session_key(session_id)).await?)
    }

    async fn save(&self, session: &ConversationSession) -> Result<(), AppError> {
        set_json(
            self.store.as_ref(),
            &session_key(&session.id),
            session,
            self.config.session_ttl,
        )
        .await?;
        Ok(())
    }
}

fn session_key(session_id: &str) -> String {
    format!("{SESSION_KEY_PREFIX}{session_id}")
}

fn reply_or(raw: &str, fallback: &str) -> String {
    match candidate_reply(raw) {
        "" => fallback.to_string(),
        text => text.to_string(),
    }
}
