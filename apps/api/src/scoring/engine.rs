//! Pluggable, trait-based scorer comparing a candidate to a vacancy.
//!
//! Default: `WeightedScorer`. Eight independently weighted criteria; a criterion
//! is assessed only when both profiles carry data for it. Label criteria use the
//! `SemanticMatcher`, the rest are deterministic comparisons.
//!
//! `AppState` holds an `Arc<dyn RelevanceScorer>`.

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::matching::SemanticMatcher;
use crate::profile::models::{normalize_language, Candidate, SalaryRange, Vacancy};
use crate::scoring::criteria::{Criterion, CriterionWeights};

// ────────────────────────────────────────────────────────────────────────────
// Output data models
// ────────────────────────────────────────────────────────────────────────────

/// Why a single criterion was not satisfied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Mismatch {
    /// city / position / employment_type
    Label { expected: String, actual: String },
    Experience { expected_min: f64, actual: f64 },
    Education { expected: String, actual: String },
    /// languages / skills
    Missing { missing: Vec<String> },
    Salary { expected: SalaryRange, actual: u64 },
}

/// Full scoring verdict. Always recomputable from the two profiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringResult {
    /// round(100 × Σ weights of satisfied criteria), 0 – 100
    pub relevance: u8,
    pub mismatches: BTreeMap<Criterion, Mismatch>,
    /// One sentence per mismatch, in criterion order.
    pub reasons: Vec<String>,
    pub satisfied: Vec<Criterion>,
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// Implement this to swap scoring backends without touching handlers.
#[async_trait]
pub trait RelevanceScorer: Send + Sync {
    async fn score(&self, candidate: &Candidate, vacancy: &Vacancy) -> ScoringResult;
}

enum Outcome {
    NotAssessable,
    Satisfied,
    Unsatisfied(Mismatch),
}

// ────────────────────────────────────────────────────────────────────────────
// WeightedScorer
// ────────────────────────────────────────────────────────────────────────────

pub struct WeightedScorer {
    matcher: SemanticMatcher,
    weights: CriterionWeights,
}

#[async_trait]
impl RelevanceScorer for WeightedScorer {
    async fn score(&self, candidate: &Candidate, vacancy: &Vacancy) -> ScoringResult {
        let mut mismatches = BTreeMap::new();
        let mut satisfied = Vec::new();
        let mut satisfied_weight = 0.0_f64;

        for criterion in Criterion::ALL {
            match self.evaluate(criterion, candidate, vacancy).await {
                Outcome::NotAssessable => {}
                Outcome::Satisfied => {
                    satisfied_weight += self.weights.weight(criterion);
                    satisfied.push(criterion);
                }
                Outcome::Unsatisfied(mismatch) => {
                    mismatches.insert(criterion, mismatch);
                }
            }
        }

        let relevance = (satisfied_weight * 100.0).round().clamp(0.0, 100.0) as u8;
        let reasons = mismatches
            .iter()
            .map(|(criterion, mismatch)| explain(*criterion, mismatch))
            .collect();

        debug!(
            "Scored candidate: relevance={}, satisfied={}, mismatches={}",
            relevance,
            satisfied.len(),
            mismatches.len()
        );

        ScoringResult {
            relevance,
            mismatches,
            reasons,
            satisfied,
        }
    }
}

impl WeightedScorer {
    pub fn new(matcher: SemanticMatcher, weights: CriterionWeights) -> Self {
        Self { matcher, weights }
    }

    async fn evaluate(&self, criterion: Criterion, candidate: &Candidate, vacancy: &Vacancy) -> Outcome {
        match criterion {
            Criterion::City => self.compare_labels(&vacancy.city, &candidate.city).await,
            Criterion::Position => self.compare_labels(&vacancy.position, &candidate.position).await,
            Criterion::EmploymentType => {
                self.compare_labels(&vacancy.employment_type, &candidate.employment_type)
                    .await
            }
            Criterion::Experience => {
                compare_experience(vacancy.min_experience_years, candidate.experience_years)
            }
            Criterion::Education => compare_education(&vacancy.education, &candidate.education),
            Criterion::Languages => compare_languages(vacancy, candidate),
            Criterion::Salary => compare_salary(vacancy.salary, candidate.salary_expectation),
            Criterion::Skills => self.compare_skills(vacancy, candidate).await,
        }
    }

    async fn compare_labels(&self, expected: &Option<String>, actual: &Option<String>) -> Outcome {
        let (Some(expected), Some(actual)) = (non_blank(expected), non_blank(actual)) else {
            return Outcome::NotAssessable;
        };

        if self.matcher.are_similar(expected, actual).await {
            Outcome::Satisfied
        } else {
            Outcome::Unsatisfied(Mismatch::Label {
                expected: expected.to_string(),
                actual: actual.to_string(),
            })
        }
    }

    async fn compare_skills(&self, vacancy: &Vacancy, candidate: &Candidate) -> Outcome {
        let required = non_blank_items(vacancy.must_have_skills.as_deref());
        let (false, Some(skills)) = (required.is_empty(), candidate.skills.as_deref()) else {
            return Outcome::NotAssessable;
        };

        let mut missing = Vec::new();
        for skill in required {
            if self.matcher.best_match(skill, skills).await.is_none() {
                missing.push(skill.to_string());
            }
        }

        if missing.is_empty() {
            Outcome::Satisfied
        } else {
            Outcome::Unsatisfied(Mismatch::Missing { missing })
        }
    }
}

fn compare_experience(expected_min: Option<f64>, actual: Option<f64>) -> Outcome {
    let (Some(expected_min), Some(actual)) = (expected_min, actual) else {
        return Outcome::NotAssessable;
    };

    if actual >= expected_min {
        Outcome::Satisfied
    } else {
        Outcome::Unsatisfied(Mismatch::Experience {
            expected_min,
            actual,
        })
    }
}

/// Substring check: candidate education text is usually compound
/// ("MSc Computer Science, Bauman University").
fn compare_education(expected: &Option<String>, actual: &Option<String>) -> Outcome {
    let (Some(expected), Some(actual)) = (non_blank(expected), non_blank(actual)) else {
        return Outcome::NotAssessable;
    };

    if actual.to_lowercase().contains(&expected.to_lowercase()) {
        Outcome::Satisfied
    } else {
        Outcome::Unsatisfied(Mismatch::Education {
            expected: expected.to_string(),
            actual: actual.to_string(),
        })
    }
}

fn compare_languages(vacancy: &Vacancy, candidate: &Candidate) -> Outcome {
    let required = non_blank_items(vacancy.languages.as_deref());
    let (false, Some(spoken)) = (required.is_empty(), candidate.languages.as_deref()) else {
        return Outcome::NotAssessable;
    };

    let spoken: HashSet<String> = spoken.iter().map(|l| l.key()).collect();
    let missing: Vec<String> = required
        .into_iter()
        .filter(|lang| !spoken.contains(&normalize_language(lang)))
        .map(str::to_string)
        .collect();

    if missing.is_empty() {
        Outcome::Satisfied
    } else {
        Outcome::Unsatisfied(Mismatch::Missing { missing })
    }
}

fn compare_salary(range: Option<SalaryRange>, expectation: Option<u64>) -> Outcome {
    let (Some(range), Some(expectation)) = (range, expectation) else {
        return Outcome::NotAssessable;
    };
    if range.is_unbounded() {
        return Outcome::NotAssessable;
    }

    if range.contains(expectation) {
        Outcome::Satisfied
    } else {
        Outcome::Unsatisfied(Mismatch::Salary {
            expected: range,
            actual: expectation,
        })
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn non_blank_items(items: Option<&[String]>) -> Vec<&str> {
    items
        .unwrap_or_default()
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Human-readable explanation of a mismatch, derived only from the mismatch data.
pub fn explain(criterion: Criterion, mismatch: &Mismatch) -> String {
    match (criterion, mismatch) {
        (Criterion::City, Mismatch::Label { expected, actual }) => {
            format!("Candidate is based in {actual}, but the vacancy is located in {expected}.")
        }
        (Criterion::Position, Mismatch::Label { expected, actual }) => {
            format!("Candidate is looking for a {actual} role, but the vacancy is for {expected}.")
        }
        (Criterion::EmploymentType, Mismatch::Label { expected, actual }) => {
            format!("Candidate prefers {actual} employment, but the vacancy offers {expected}.")
        }
        (_, Mismatch::Experience {
            expected_min,
            actual,
        }) => format!(
            "Candidate has {actual} years of relevant experience, but at least {expected_min} are required."
        ),
        (_, Mismatch::Education { expected, actual }) => {
            format!("Education \"{actual}\" does not meet the requirement \"{expected}\".")
        }
        (Criterion::Languages, Mismatch::Missing { missing }) => {
            format!("Candidate does not speak required languages: {}.", missing.join(", "))
        }
        (Criterion::Skills, Mismatch::Missing { missing }) => {
            format!("Candidate is missing must-have skills: {}.", missing.join(", "))
        }
        (_, Mismatch::Salary { expected, actual }) => {
            format!("Salary expectation of {actual} is outside the offered range ({expected}).")
        }
        (criterion, Mismatch::Label { expected, actual }) => {
            format!("{criterion}: expected {expected}, got {actual}.")
        }
        (criterion, Mismatch::Missing { missing }) => {
            format!("{criterion}: missing {}.", missing.join(", "))
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
