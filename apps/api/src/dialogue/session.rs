use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dialogue::verdict::Verdict;
use crate::errors::AppError;
use crate::llm_client::ChatMessage;

pub const PROVISIONAL_RELEVANCE: u8 = 50;
pub const PROVISIONAL_SUMMARY: &str = "Clarifying details with the candidate";
pub const PROVISIONAL_REASON: &str = "Additional information required";

pub const CEILING_RELEVANCE: u8 = 60;
pub const CEILING_SUMMARY: &str = "Candidate answered all questions, additional review required";
pub const CEILING_REASON: &str = "Dialogue ended at the question limit";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogueStage {
    Created,
    Questioning,
    Completed,
}

impl DialogueStage {
    /// `Completed` is terminal; `Questioning` may loop on itself.
    pub fn can_transition_to(self, next: DialogueStage) -> bool {
        use DialogueStage::*;
        matches!(
            (self, next),
            (Created, Questioning)
                | (Created, Completed)
                | (Questioning, Questioning)
                | (Questioning, Completed)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DialogueStage::Created => "created",
            DialogueStage::Questioning => "questioning",
            DialogueStage::Completed => "completed",
        }
    }
}

impl Verdict {
    /// Assessment held by a session that is still asking questions.
    pub fn provisional() -> Self {
        Self {
            relevance: PROVISIONAL_RELEVANCE,
            summary: PROVISIONAL_SUMMARY.to_string(),
            reasons: vec![PROVISIONAL_REASON.to_string()],
            rejection_tags: Vec::new(),
        }
    }

    /// Substituted when the turn ceiling is hit and the model still gave no verdict.
    pub fn ceiling_fallback() -> Self {
        Self {
            relevance: CEILING_RELEVANCE,
            summary: CEILING_SUMMARY.to_string(),
            reasons: vec![CEILING_REASON.to_string()],
            rejection_tags: Vec::new(),
        }
    }
}

/// One screening conversation. Owns its transcript; frozen once completed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSession {
    pub id: String,
    pub vacancy_text: String,
    pub candidate_text: Option<String>,
    pub transcript: Vec<ChatMessage>,
    pub turn_count: u32,
    pub stage: DialogueStage,
    pub assessment: Verdict,
    pub suggest_alternative: bool,
    pub alternative_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ConversationSession {
    pub fn new(
        id: String,
        vacancy_text: String,
        candidate_text: Option<String>,
        transcript: Vec<ChatMessage>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            vacancy_text,
            candidate_text,
            transcript,
            turn_count: 0,
            stage: DialogueStage::Created,
            assessment: Verdict::provisional(),
            suggest_alternative: false,
            alternative_note: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.stage == DialogueStage::Completed
    }

    pub fn message_count(&self) -> usize {
        self.transcript.len()
    }

    fn transition(&mut self, next: DialogueStage) -> Result<(), AppError> {
        if !self.stage.can_transition_to(next) {
            return Err(AppError::Internal(anyhow::anyhow!(
                "session {}: illegal transition {} -> {}",
                self.id,
                self.stage.as_str(),
                next.as_str()
            )));
        }
        self.stage = next;
        Ok(())
    }

    /// Appends the candidate's answer and bumps the turn counter.
    pub fn record_candidate_message(&mut self, message: &str) -> Result<u32, AppError> {
        if self.stage != DialogueStage::Questioning {
            return Err(AppError::Internal(anyhow::anyhow!(
                "session {} is not accepting answers in stage {}",
                self.id,
                self.stage.as_str()
            )));
        }
        self.transcript.push(ChatMessage::user(message));
        self.turn_count += 1;
        self.touch();
        Ok(self.turn_count)
    }

    pub fn push_instruction(&mut self, instruction: &str) {
        self.transcript.push(ChatMessage::system(instruction));
    }

    pub fn record_reply(&mut self, reply: &str) {
        self.transcript.push(ChatMessage::assistant(reply));
        self.touch();
    }

    /// Keeps asking: the assessment stays whatever it was.
    pub fn continue_questioning(&mut self) -> Result<(), AppError> {
        self.transition(DialogueStage::Questioning)
    }

    /// Freezes the session on `verdict`. A relevance below `alternative_threshold`
    /// flags the candidate for redirection to other openings.
    pub fn complete(&mut self, verdict: Verdict, alternative_threshold: u8) -> Result<(), AppError> {
        self.transition(DialogueStage::Completed)?;
        if verdict.relevance < alternative_threshold {
            self.suggest_alternative = true;
            self.alternative_note = Some(format!(
                "Relevance {}% is below {}%: consider offering the candidate other openings.",
                verdict.relevance, alternative_threshold
            ));
        }
        self.assessment = verdict;
        self.touch();
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Listing entry for `GET /sessions`.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub id: String,
    pub stage: DialogueStage,
    pub relevance: u8,
    pub turn_count: u32,
    pub suggest_alternative: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&ConversationSession> for SessionSummary {
    fn from(session: &ConversationSession) -> Self {
        Self {
            id: session.id.clone(),
            stage: session.stage,
            relevance: session.assessment.relevance,
            turn_count: session.turn_count,
            suggest_alternative: session.suggest_alternative,
            created_at: session.created_at,
            updated_at: session.updated_at,
        }
    }
}
