//! Populates `Candidate` / `Vacancy` from free text via the model.
//!
//! The model is asked for JSON, but its output is read tolerantly: numbers may arrive
//! as strings ("5+ years", "300 000"), lists as comma-separated strings, languages as
//! strings or objects. Fields that cannot be read are left unknown.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::{complete_json, ChatMessage, CompletionService, LlmError};
use crate::profile::models::{Candidate, Language, SalaryRange, Vacancy};
use crate::profile::prompts::{CANDIDATE_EXTRACT_PROMPT, VACANCY_EXTRACT_PROMPT};

/// Output budget for a single extraction call.
const EXTRACTION_MAX_TOKENS: u32 = 1000;

/// Placeholder strings models emit instead of null.
const UNKNOWN_MARKERS: &[&str] = &["", "null", "none", "unknown", "n/a", "not specified"];

#[derive(Clone)]
pub struct ProfileExtractor {
    llm: Arc<dyn CompletionService>,
}

impl ProfileExtractor {
    pub fn new(llm: Arc<dyn CompletionService>) -> Self {
        Self { llm }
    }

    pub async fn extract_candidate(&self, text: &str) -> Result<Candidate, AppError> {
        let fields = self.extract_fields(CANDIDATE_EXTRACT_PROMPT, text).await?;
        let candidate = candidate_from_fields(&fields, text);
        candidate.validate()?;
        info!(
            "Extracted candidate profile: {} skills, city known: {}",
            candidate.skills.as_ref().map_or(0, Vec::len),
            candidate.city.is_some()
        );
        Ok(candidate)
    }

    pub async fn extract_vacancy(&self, text: &str) -> Result<Vacancy, AppError> {
        let fields = self.extract_fields(VACANCY_EXTRACT_PROMPT, text).await?;
        let vacancy = vacancy_from_fields(&fields, text)?;
        vacancy.validate()?;
        info!(
            "Extracted vacancy profile: {} must-have skills",
            vacancy.must_have_skills.as_ref().map_or(0, Vec::len)
        );
        Ok(vacancy)
    }

    async fn extract_fields(
        &self,
        template: &str,
        text: &str,
    ) -> Result<Map<String, Value>, AppError> {
        if text.trim().is_empty() {
            return Err(AppError::Validation("text cannot be empty".to_string()));
        }

        let messages = [
            ChatMessage::system(JSON_ONLY_SYSTEM),
            ChatMessage::user(template.replace("{text}", text)),
        ];
        let value: Value = complete_json(self.llm.as_ref(), &messages, EXTRACTION_MAX_TOKENS)
            .await
            .map_err(|e| match e {
                LlmError::Parse(e) => {
                    AppError::UnprocessableEntity(format!("model returned invalid JSON: {e}"))
                }
                other => AppError::from(other),
            })?;

        match value {
            Value::Object(fields) => Ok(fields),
            other => Err(AppError::UnprocessableEntity(format!(
                "model returned {} instead of a JSON object",
                json_kind(&other)
            ))),
        }
    }
}

pub fn candidate_from_fields(fields: &Map<String, Value>, raw_text: &str) -> Candidate {
    Candidate {
        name: text_field(fields, &["name", "full_name"]),
        city: text_field(fields, &["city", "location"]),
        experience_years: years_field(fields, &["experience_years", "experience"]),
        position: text_field(fields, &["position", "title", "desired_position"]),
        education: text_field(fields, &["education"]),
        languages: list_field(fields, &["languages"])
            .map(|items| items.iter().filter_map(|l| Language::parse(l)).collect()),
        salary_expectation: amount_field(fields, &["salary_expectation", "salary"]),
        employment_type: text_field(fields, &["employment_type", "employment"]),
        skills: list_field(fields, &["skills"]),
        seniority: text_field(fields, &["seniority", "level"]),
        raw_text: Some(raw_text.to_string()),
    }
}

pub fn vacancy_from_fields(fields: &Map<String, Value>, raw_text: &str) -> Result<Vacancy, AppError> {
    let nested = fields.get("salary").and_then(Value::as_object);
    let salary_min = amount_field(fields, &["salary_min"])
        .or_else(|| nested.and_then(|s| amount_field(s, &["min", "from"])));
    let salary_max = amount_field(fields, &["salary_max"])
        .or_else(|| nested.and_then(|s| amount_field(s, &["max", "to"])));

    let salary = match (salary_min, salary_max) {
        (None, None) => None,
        (min, max) => Some(SalaryRange::new(min, max)?),
    };

    Ok(Vacancy {
        city: text_field(fields, &["city", "location"]),
        min_experience_years: years_field(fields, &["min_experience_years", "experience_years"]),
        position: text_field(fields, &["position", "title"]),
        education: text_field(fields, &["education"]),
        languages: list_field(fields, &["languages"]).map(|items| {
            items
                .iter()
                .filter_map(|l| Language::parse(l))
                .map(|l| l.name)
                .collect()
        }),
        salary,
        employment_type: text_field(fields, &["employment_type", "employment"]),
        must_have_skills: list_field(fields, &["must_have_skills", "skills"]),
        nice_to_have_skills: list_field(fields, &["nice_to_have_skills"]),
        seniority: text_field(fields, &["seniority", "level"]),
        raw_text: Some(raw_text.to_string()),
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Tolerant field readers
// ────────────────────────────────────────────────────────────────────────────

fn lookup<'a>(fields: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| fields.get(*k))
        .find(|v| !v.is_null())
}

fn is_unknown(text: &str) -> bool {
    UNKNOWN_MARKERS.contains(&text.trim().to_lowercase().as_str())
}

fn text_field(fields: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    match lookup(fields, keys)? {
        Value::String(s) if !is_unknown(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn years_field(fields: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    let years = match lookup(fields, keys)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => leading_number(s),
        _ => None,
    }?;

    if !years.is_finite() || years < 0.0 {
        warn!("Ignoring invalid experience value from model: {years}");
        return None;
    }
    Some(years)
}

fn amount_field(fields: &Map<String, Value>, keys: &[&str]) -> Option<u64> {
    match lookup(fields, keys)? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f.round() as u64)),
        Value::String(s) => leading_amount(s),
        _ => None,
    }
}

fn list_field(fields: &Map<String, Value>, keys: &[&str]) -> Option<Vec<String>> {
    let items: Vec<String> = match lookup(fields, keys)? {
        Value::Array(values) => values.iter().filter_map(list_item).collect(),
        Value::String(s) if is_unknown(s) => return None,
        Value::String(s) => s
            .split([',', ';', '\n'])
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect(),
        _ => return None,
    };
    Some(items)
}

/// A list element: a plain string, or an object such as `{"name": "English", "level": "B2"}`.
fn list_item(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !is_unknown(s) => Some(s.trim().to_string()),
        Value::Object(obj) => {
            let name = text_field(obj, &["name", "language", "skill"])?;
            match text_field(obj, &["level", "proficiency"]) {
                Some(level) => Some(format!("{name} ({level})")),
                None => Some(name),
            }
        }
        _ => None,
    }
}

/// First decimal number in `text`: "5+ years" → 5.0, "3,5 года" → 3.5.
fn leading_number(text: &str) -> Option<f64> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let number: String = text[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    number.trim_end_matches('.').parse().ok()
}

/// First integer amount in `text`, allowing digit-group separators: "300 000 ₽" → 300000.
fn leading_amount(text: &str) -> Option<u64> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let digits: String = text[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || matches!(c, ' ' | '\u{a0}' | ',' | '_'))
        .filter(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedCompletion;
    use serde_json::json;

    fn fields(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_candidate_fields_read_tolerantly() {
        let candidate = candidate_from_fields(
            &fields(json!({
                "name": "Anna",
                "city": "Moscow",
                "experience_years": "5+ years",
                "languages": ["English (B2)", {"language": "German", "level": "A2"}],
                "salary_expectation": "350 000 ₽",
                "skills": "Python, FastAPI; PostgreSQL",
                "seniority": "unknown"
            })),
            "resume",
        );

        assert_eq!(candidate.city.as_deref(), Some("Moscow"));
        assert_eq!(candidate.experience_years, Some(5.0));
        assert_eq!(candidate.salary_expectation, Some(350_000));
        assert_eq!(
            candidate.skills,
            Some(vec!["Python".into(), "FastAPI".into(), "PostgreSQL".into()])
        );
        let languages = candidate.languages.unwrap();
        assert_eq!(languages[1].name, "German");
        assert_eq!(languages[1].proficiency.as_deref(), Some("A2"));
        assert_eq!(candidate.seniority, None);
        assert_eq!(candidate.raw_text.as_deref(), Some("resume"));
    }

    #[test]
    fn test_missing_and_null_fields_stay_unknown() {
        let candidate = candidate_from_fields(&fields(json!({"city": null})), "x");
        assert_eq!(candidate.city, None);
        assert_eq!(candidate.skills, None);
        assert_eq!(candidate.experience_years, None);
    }

    #[test]
    fn test_negative_experience_is_dropped() {
        let candidate = candidate_from_fields(&fields(json!({"experience_years": -2})), "x");
        assert_eq!(candidate.experience_years, None);
    }

    #[test]
    fn test_vacancy_salary_flat_and_nested() {
        let flat = vacancy_from_fields(
            &fields(json!({"salary_min": 300000, "salary_max": "400 000"})),
            "x",
        )
        .unwrap();
        let salary = flat.salary.unwrap();
        assert_eq!((salary.min(), salary.max()), (Some(300_000), Some(400_000)));

        let nested =
            vacancy_from_fields(&fields(json!({"salary": {"from": 200000}})), "x").unwrap();
        assert_eq!(nested.salary.unwrap().max(), None);
    }

    #[test]
    fn test_vacancy_inverted_salary_is_rejected() {
        let result = vacancy_from_fields(
            &fields(json!({"salary_min": 500000, "salary_max": 400000})),
            "x",
        );
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_leading_number_parsing() {
        assert_eq!(leading_number("3,5 года"), Some(3.5));
        assert_eq!(leading_number("about 7 years."), Some(7.0));
        assert_eq!(leading_number("no digits"), None);
        assert_eq!(leading_amount("от 120,000 до 150,000"), Some(120_000));
    }

    #[tokio::test]
    async fn test_extract_vacancy_through_model() {
        let llm = Arc::new(ScriptedCompletion::new(vec![
            r#"```json
{"city": "Moscow", "min_experience_years": 5, "must_have_skills": ["Python", "FastAPI"]}
```"#,
        ]));
        let extractor = ProfileExtractor::new(llm.clone());

        let vacancy = extractor.extract_vacancy("Backend developer in Moscow").await.unwrap();

        assert_eq!(vacancy.city.as_deref(), Some("Moscow"));
        assert_eq!(vacancy.min_experience_years, Some(5.0));
        assert_eq!(
            vacancy.must_have_skills,
            Some(vec!["Python".to_string(), "FastAPI".to_string()])
        );
        let prompt = &llm.calls()[0][1].content;
        assert!(prompt.contains("Backend developer in Moscow"));
    }

    #[tokio::test]
    async fn test_non_json_reply_is_unprocessable() {
        let extractor = ProfileExtractor::new(Arc::new(ScriptedCompletion::new(vec![
            "I could not read this resume.",
        ])));
        let result = extractor.extract_candidate("some resume").await;
        assert!(matches!(result, Err(AppError::UnprocessableEntity(_))));
    }

    #[tokio::test]
    async fn test_empty_text_is_rejected_before_model_call() {
        let llm = Arc::new(ScriptedCompletion::new(vec![]));
        let extractor = ProfileExtractor::new(llm.clone());
        let result = extractor.extract_candidate("   ").await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_model_failure_is_retryable() {
        let extractor = ProfileExtractor::new(Arc::new(ScriptedCompletion::with_results(vec![
            Err(LlmError::Api {
                status: 503,
                message: "overloaded".into(),
            }),
        ])));
        let result = extractor.extract_vacancy("vacancy").await;
        assert!(matches!(result, Err(AppError::ServiceUnavailable(_))));
    }
}
