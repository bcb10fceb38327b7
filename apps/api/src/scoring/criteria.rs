use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// One weighted dimension of the candidate / vacancy comparison.
/// Declaration order is the order mismatches and reasons are reported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    City,
    Experience,
    Position,
    Education,
    Languages,
    Salary,
    EmploymentType,
    Skills,
}

impl Criterion {
    pub const ALL: [Criterion; 8] = [
        Criterion::City,
        Criterion::Experience,
        Criterion::Position,
        Criterion::Education,
        Criterion::Languages,
        Criterion::Salary,
        Criterion::EmploymentType,
        Criterion::Skills,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Criterion::City => "city",
            Criterion::Experience => "experience",
            Criterion::Position => "position",
            Criterion::Education => "education",
            Criterion::Languages => "languages",
            Criterion::Salary => "salary",
            Criterion::EmploymentType => "employment_type",
            Criterion::Skills => "skills",
        }
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Criterion {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();
        Criterion::ALL
            .into_iter()
            .find(|c| c.as_str() == name)
            .ok_or_else(|| AppError::Validation(format!("unknown criterion '{}'", s.trim())))
    }
}

/// Per-criterion weights. Must sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CriterionWeights {
    pub city: f64,
    pub experience: f64,
    pub position: f64,
    pub education: f64,
    pub languages: f64,
    pub salary: f64,
    pub employment_type: f64,
    pub skills: f64,
}

impl Default for CriterionWeights {
    fn default() -> Self {
        Self {
            city: 0.15,
            experience: 0.20,
            position: 0.15,
            education: 0.10,
            languages: 0.15,
            salary: 0.10,
            employment_type: 0.05,
            skills: 0.10,
        }
    }
}

impl CriterionWeights {
    const SUM_TOLERANCE: f64 = 1e-6;

    pub fn weight(&self, criterion: Criterion) -> f64 {
        match criterion {
            Criterion::City => self.city,
            Criterion::Experience => self.experience,
            Criterion::Position => self.position,
            Criterion::Education => self.education,
            Criterion::Languages => self.languages,
            Criterion::Salary => self.salary,
            Criterion::EmploymentType => self.employment_type,
            Criterion::Skills => self.skills,
        }
    }

    fn weight_mut(&mut self, criterion: Criterion) -> &mut f64 {
        match criterion {
            Criterion::City => &mut self.city,
            Criterion::Experience => &mut self.experience,
            Criterion::Position => &mut self.position,
            Criterion::Education => &mut self.education,
            Criterion::Languages => &mut self.languages,
            Criterion::Salary => &mut self.salary,
            Criterion::EmploymentType => &mut self.employment_type,
            Criterion::Skills => &mut self.skills,
        }
    }

    pub fn sum(&self) -> f64 {
        Criterion::ALL.iter().map(|c| self.weight(*c)).sum()
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(c) = Criterion::ALL
            .iter()
            .find(|c| !self.weight(**c).is_finite() || self.weight(**c) < 0.0)
        {
            return Err(AppError::Validation(format!(
                "weight for '{c}' must be a non-negative number"
            )));
        }
        let sum = self.sum();
        if (sum - 1.0).abs() > Self::SUM_TOLERANCE {
            return Err(AppError::Validation(format!(
                "criterion weights must sum to 1.0, got {sum:.4}"
            )));
        }
        Ok(())
    }

    /// Applies `criterion=weight` overrides (comma separated) on top of the defaults.
    pub fn from_overrides(overrides: &str) -> Result<Self, AppError> {
        let mut weights = Self::default();
        for pair in overrides.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (name, value) = pair.split_once('=').ok_or_else(|| {
                AppError::Validation(format!("expected criterion=weight, got '{pair}'"))
            })?;
            let criterion: Criterion = name.parse()?;
            let value: f64 = value.trim().parse().map_err(|_| {
                AppError::Validation(format!("invalid weight '{}' for '{criterion}'", value.trim()))
            })?;
            *weights.weight_mut(criterion) = value;
        }
        weights.validate()?;
        Ok(weights)
    }
}
