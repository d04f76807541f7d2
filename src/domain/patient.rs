//! Patient demographic context
//!
//! Reference range resolution is demographic-aware: pregnancy state, age and
//! gender all influence which normal band applies to a result value. The
//! patient registry is a collaborator; the engine only consumes this slim
//! context snapshot.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Administrative gender as recorded by the patient registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        };
        write!(f, "{s}")
    }
}

/// Demographic snapshot used during rendering
///
/// All fields are optional except the pregnancy flag: a report can be
/// rendered for a patient with unknown age or gender, in which case the
/// corresponding range tiers simply never match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PatientContext {
    /// Age in years, fractional for infants (e.g. 0.25 = 3 months)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_years: Option<f64>,

    /// Administrative gender
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,

    /// Whether the patient is currently pregnant
    #[serde(default)]
    pub pregnant: bool,

    /// Gestational age in weeks, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gestational_weeks: Option<u8>,
}

impl PatientContext {
    /// Context with age and gender, not pregnant
    pub fn new(age_years: f64, gender: Gender) -> Self {
        Self {
            age_years: Some(age_years),
            gender: Some(gender),
            pregnant: false,
            gestational_weeks: None,
        }
    }

    /// Marks the context as pregnant, optionally with gestational weeks
    pub fn with_pregnancy(mut self, gestational_weeks: Option<u8>) -> Self {
        self.pregnant = true;
        self.gestational_weeks = gestational_weeks;
        self
    }

    /// Current trimester (1-3) derived from gestational weeks
    ///
    /// Returns `None` when gestational weeks are unknown.
    pub fn trimester(&self) -> Option<u8> {
        let weeks = self.gestational_weeks?;
        Some(match weeks {
            0..=13 => 1,
            14..=27 => 2,
            _ => 3,
        })
    }
}
