//! Pulls a structured verdict out of a free-form model reply.
//!
//! The model is instructed to end its final message with a block such as:
//!
//! ```text
//! [RESULT]
//! match_percent: 85
//! summary_one_liner: "Good fit, backend experience needs confirming."
//! rejection_tags: relocation
//! reasons: ["3 years of Python", "Ready to relocate"]
//! ```
//!
//! Model output is non-deterministic, so every field is read tolerantly and a
//! garbled block degrades to defaults instead of failing. No marker, no verdict.

use serde::{Deserialize, Serialize};

pub const RESULT_MARKER: &str = "[RESULT]";

/// Relevance used when the percentage field is present but unreadable.
/// A result block without one scores 0.
pub const DEFAULT_MATCH_PERCENT: u8 = 50;

const QUOTES: &[char] = &['"', '\'', '«', '»', '“', '”', '`'];

/// Structured outcome of a screening dialogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub relevance: u8,
    pub summary: String,
    pub reasons: Vec<String>,
    pub rejection_tags: Vec<String>,
}

pub fn extract_verdict(text: &str) -> Option<Verdict> {
    let (_, body) = text.split_once(RESULT_MARKER)?;

    let mut verdict = Verdict {
        relevance: 0,
        summary: String::new(),
        reasons: Vec::new(),
        rejection_tags: Vec::new(),
    };

    let mut lines = body.lines();
    while let Some(line) = lines.next() {
        let line = line.trim().trim_start_matches(['-', '*']).trim();
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };

        match key.trim().trim_matches('*').to_lowercase().as_str() {
            "match_percent" | "relevance" => verdict.relevance = parse_percent(value),
            "summary_one_liner" | "summary" => verdict.summary = unquote(value).to_string(),
            "rejection_tags" | "tags" => verdict.rejection_tags = parse_tags(value),
            "reasons" => {
                let mut value = value.trim().to_string();
                // A JSON list the model wrapped over several lines.
                if value.starts_with('[') && !value.ends_with(']') {
                    for next in lines.by_ref() {
                        value.push_str(next.trim());
                        if next.trim_end().ends_with(']') {
                            break;
                        }
                    }
                }
                verdict.reasons = parse_reasons(&value);
            }
            _ => {}
        }
    }

    Some(verdict)
}

/// The candidate-facing part of a reply: everything before the result block.
pub fn candidate_reply(text: &str) -> &str {
    text.split_once(RESULT_MARKER)
        .map_or(text, |(before, _)| before)
        .trim()
}

fn parse_percent(value: &str) -> u8 {
    let value = value.trim().trim_end_matches('%').trim();
    if let Ok(n) = value.parse::<i64>() {
        return n.clamp(0, 100) as u8;
    }
    match value.parse::<f64>() {
        Ok(f) if f.is_finite() => f.round().clamp(0.0, 100.0) as u8,
        _ => DEFAULT_MATCH_PERCENT,
    }
}

fn unquote(value: &str) -> &str {
    value.trim().trim_matches(QUOTES).trim()
}

fn parse_tags(value: &str) -> Vec<String> {
    let value = value.trim();
    let value = value
        .strip_prefix('[')
        .and_then(|v| v.strip_suffix(']'))
        .unwrap_or(value);

    value
        .split(',')
        .map(unquote)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

/// `["a", "b"]`; anything not bracketed yields an empty list.
fn parse_reasons(value: &str) -> Vec<String> {
    let value = value.trim();
    let Some(inner) = value.strip_prefix('[').and_then(|v| v.strip_suffix(']')) else {
        return Vec::new();
    };

    if let Ok(reasons) = serde_json::from_str::<Vec<String>>(value) {
        return reasons
            .into_iter()
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .collect();
    }

    inner
        .split(',')
        .map(unquote)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const WELL_FORMED: &str = "Thank you for applying! We will be in touch soon.\n\n\
        [RESULT]\n\
        match_percent: 85\n\
        summary_one_liner: \"Good fit, backend depth to be confirmed.\"\n\
        rejection_tags: relocation, salary\n\
        reasons: [\"3 years of Python\", \"Ready to start in a month\"]\n";

    #[test]
    fn test_no_marker_means_no_verdict() {
        assert_eq!(extract_verdict("Are you ready to relocate? [Yes/No]"), None);
        assert_eq!(extract_verdict(""), None);
    }

    #[test]
    fn test_well_formed_block() {
        let verdict = extract_verdict(WELL_FORMED).unwrap();
        assert_eq!(
            verdict,
            Verdict {
                relevance: 85,
                summary: "Good fit, backend depth to be confirmed.".into(),
                reasons: vec!["3 years of Python".into(), "Ready to start in a month".into()],
                rejection_tags: vec!["relocation".into(), "salary".into()],
            }
        );
    }

    #[test]
    fn test_malformed_percent_defaults_to_50() {
        let verdict = extract_verdict("[RESULT]\nmatch_percent: high\n").unwrap();
        assert_eq!(verdict.relevance, 50);
    }

    #[test]
    fn test_missing_percent_is_zero() {
        let verdict = extract_verdict("[RESULT]\nsummary_one_liner: \"ok\"").unwrap();
        assert_eq!(verdict.relevance, 0);
        assert_eq!(verdict.summary, "ok");
    }

    #[test]
    fn test_percent_tolerates_sign_and_range() {
        assert_eq!(parse_percent(" 72% "), 72);
        assert_eq!(parse_percent("150"), 100);
        assert_eq!(parse_percent("-5"), 0);
        assert_eq!(parse_percent("66.6"), 67);
    }

    #[test]
    fn test_reasons_with_commas_inside_quotes() {
        let verdict =
            extract_verdict("[RESULT]\nreasons: [\"Python, Django\", \"Moscow\"]").unwrap();
        assert_eq!(verdict.reasons, vec!["Python, Django", "Moscow"]);
    }

    #[test]
    fn test_reasons_fallback_for_single_quotes() {
        let verdict = extract_verdict("[RESULT]\nreasons: ['no English', 'junior']").unwrap();
        assert_eq!(verdict.reasons, vec!["no English", "junior"]);
    }

    #[test]
    fn test_reasons_spanning_lines() {
        let text = "[RESULT]\nmatch_percent: 40\nreasons: [\n  \"No relocation\",\n  \"2 years of experience\"\n]\n";
        let verdict = extract_verdict(text).unwrap();
        assert_eq!(verdict.relevance, 40);
        assert_eq!(verdict.reasons, vec!["No relocation", "2 years of experience"]);
    }

    #[test]
    fn test_unbracketed_reasons_are_empty() {
        let verdict = extract_verdict("[RESULT]\nreasons: good candidate").unwrap();
        assert!(verdict.reasons.is_empty());
    }

    #[test]
    fn test_empty_tags_are_empty_list() {
        let verdict = extract_verdict("[RESULT]\nrejection_tags:   \n").unwrap();
        assert!(verdict.rejection_tags.is_empty());
        let verdict = extract_verdict("[RESULT]\nrejection_tags: [\"\", ]").unwrap();
        assert!(verdict.rejection_tags.is_empty());
    }

    #[test]
    fn test_garbage_after_marker_degrades_to_defaults() {
        let verdict = extract_verdict("[RESULT] ¯\\_(ツ)_/¯ \n:::\n\u{0}").unwrap();
        assert_eq!(verdict.relevance, 0);
        assert!(verdict.summary.is_empty());
        assert!(verdict.reasons.is_empty());
    }

    #[test]
    fn test_markdown_decorated_keys() {
        let verdict =
            extract_verdict("[RESULT]\n- **match_percent**: 90\n* summary: «Strong fit»").unwrap();
        assert_eq!(verdict.relevance, 90);
        assert_eq!(verdict.summary, "Strong fit");
    }

    #[test]
    fn test_candidate_reply_strips_result_block() {
        assert_eq!(
            candidate_reply(WELL_FORMED),
            "Thank you for applying! We will be in touch soon."
        );
        assert_eq!(candidate_reply("  Any questions?  "), "Any questions?");
        assert_eq!(candidate_reply("[RESULT]\nmatch_percent: 1"), "");
    }
}
