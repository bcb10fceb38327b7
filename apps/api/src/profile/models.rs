use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// A spoken language, optionally annotated with a proficiency level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Language {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proficiency: Option<String>,
}

impl Language {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            proficiency: None,
        }
    }

    /// Parses "English", "English (B2)", "English - fluent" or "English: C1".
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        if let Some((name, rest)) = raw.split_once('(') {
            let level = rest.trim_end_matches(')').trim();
            return Some(Self {
                name: name.trim().to_string(),
                proficiency: (!level.is_empty()).then(|| level.to_string()),
            });
        }

        for separator in [" - ", ":", " — ", " – "] {
            if let Some((name, level)) = raw.split_once(separator) {
                let level = level.trim();
                return Some(Self {
                    name: name.trim().to_string(),
                    proficiency: (!level.is_empty()).then(|| level.to_string()),
                });
            }
        }

        Some(Self::new(raw))
    }

    /// Comparison key: the name, case-folded with whitespace collapsed.
    pub fn key(&self) -> String {
        normalize_language(&self.name)
    }
}

pub fn normalize_language(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Offered salary bounds. Either bound may be absent (unbounded on that side).
/// Deserialization does not check the bounds; `Vacancy::validate` does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SalaryRange {
    min: Option<u64>,
    max: Option<u64>,
}

impl SalaryRange {
    pub fn new(min: Option<u64>, max: Option<u64>) -> Result<Self, AppError> {
        let range = Self { min, max };
        range.validate()?;
        Ok(range)
    }

    /// Rejects `max < min`.
    pub fn validate(&self) -> Result<(), AppError> {
        match (self.min, self.max) {
            (Some(min), Some(max)) if max < min => Err(AppError::Validation(format!(
                "salary max ({max}) must not be below salary min ({min})"
            ))),
            _ => Ok(()),
        }
    }

    pub fn min(&self) -> Option<u64> {
        self.min
    }

    pub fn max(&self) -> Option<u64> {
        self.max
    }

    /// True when neither bound is set; such a range carries no requirement.
    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    pub fn contains(&self, amount: u64) -> bool {
        self.min.map_or(true, |min| amount >= min) && self.max.map_or(true, |max| amount <= max)
    }
}

impl fmt::Display for SalaryRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.min, self.max) {
            (Some(min), Some(max)) => write!(f, "{min}–{max}"),
            (Some(min), None) => write!(f, "from {min}"),
            (None, Some(max)) => write!(f, "up to {max}"),
            (None, None) => write!(f, "any"),
        }
    }
}

/// Structured candidate profile. Every field is optional: `None` means unknown,
/// which is distinct from an explicitly empty list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Candidate {
    pub name: Option<String>,
    pub city: Option<String>,
    pub experience_years: Option<f64>,
    pub position: Option<String>,
    pub education: Option<String>,
    pub languages: Option<Vec<Language>>,
    pub salary_expectation: Option<u64>,
    pub employment_type: Option<String>,
    pub skills: Option<Vec<String>>,
    pub seniority: Option<String>,
    pub raw_text: Option<String>,
}

impl Candidate {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_years("experience_years", self.experience_years)
    }
}

/// Structured vacancy requirements, mirroring `Candidate`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vacancy {
    pub city: Option<String>,
    pub min_experience_years: Option<f64>,
    pub position: Option<String>,
    pub education: Option<String>,
    pub languages: Option<Vec<String>>,
    pub salary: Option<SalaryRange>,
    pub employment_type: Option<String>,
    pub must_have_skills: Option<Vec<String>>,
    pub nice_to_have_skills: Option<Vec<String>>,
    pub seniority: Option<String>,
    pub raw_text: Option<String>,
}

impl Vacancy {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_years("min_experience_years", self.min_experience_years)?;
        if let Some(salary) = &self.salary {
            salary.validate()?;
        }
        Ok(())
    }
}

fn validate_years(field: &str, years: Option<f64>) -> Result<(), AppError> {
    match years {
        Some(y) if !y.is_finite() || y < 0.0 => Err(AppError::Validation(format!(
            "{field} must be a non-negative number, got {y}"
        ))),
        _ => Ok(()),
    }
}
