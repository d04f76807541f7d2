//! Rendered report output types
//!
//! The rendering engine is pure: it returns these structures and owns no
//! persistence. Consumers (print/export, the workflow engine) treat the
//! critical-value list as ordered and the calculated map as deterministic.

use super::interpret::{Interpretation, Sensitivity};
use crate::domain::report::CriticalValue;
use crate::domain::template::{FieldType, RangeSpec, TemplateType};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A single rendered field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedField {
    /// Field code
    pub code: String,

    /// Display label
    pub label: String,

    /// Declared field type
    pub field_type: FieldType,

    /// Raw or calculated value; `Null` when not entered
    pub value: Value,

    /// Measurement unit, when declared
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    /// Human-readable reference range text, when a range was resolved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_text: Option<String>,

    /// Classification of the value
    pub interpretation: Interpretation,

    /// Whether the value was flagged critical
    pub is_critical: bool,
}

/// A rendered display section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedSection {
    /// Section identifier; `results` for the synthetic catch-all section
    pub id: String,

    /// Display title
    pub title: String,

    /// Rendered fields in template declaration order
    pub fields: Vec<RenderedField>,
}

/// One antibiotic row of a sensitivity panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedSensitivity {
    /// Antibiotic name
    pub antibiotic: String,

    /// S/I/R classification; `None` when not tested or unparseable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Sensitivity>,
}

/// One expanded instance of a repeatable section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedRepeat {
    /// Repeatable section identifier
    pub section_id: String,

    /// Display title
    pub title: String,

    /// Zero-based instance index
    pub instance: usize,

    /// Rendered instance fields
    pub fields: Vec<RenderedField>,

    /// Sensitivity panel rows, when the section declares one
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sensitivities: Vec<RenderedSensitivity>,
}

/// The complete rendered view of a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedReport {
    /// Template code the render came from
    pub template_code: String,

    /// Template version captured for the render
    pub template_version: u32,

    /// Template shape that drove the dispatch
    pub template_type: TemplateType,

    /// Rendered sections in display order; the synthetic "Results" section,
    /// when present, is ordered last
    pub sections: Vec<RenderedSection>,

    /// Expanded repeatable-section instances (hybrid templates)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub repeats: Vec<RenderedRepeat>,

    /// Calculated field values in field-code order
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub calculated_values: BTreeMap<String, Value>,

    /// Matched interpretation-rule statements, in declaration order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interpretations: Vec<String>,

    /// Detected critical values, ordered
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub critical_values: Vec<CriticalValue>,

    /// SHA-256 checksum of the canonical rendered payload
    pub checksum: String,
}

impl RenderedReport {
    /// Whether the render detected any critical values
    pub fn has_critical_values(&self) -> bool {
        !self.critical_values.is_empty()
    }
}

/// Formats a range spec for display next to a rendered value
pub fn reference_text(spec: &RangeSpec) -> Option<String> {
    if let Some(ref titre) = spec.significant_titre {
        return Some(format!("significant >= {titre}"));
    }
    match (spec.min, spec.max) {
        (Some(min), Some(max)) => Some(format!("{min} - {max}")),
        (Some(min), None) => Some(format!("> {min}")),
        (None, Some(max)) => Some(format!("< {max}")),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_text_band() {
        let spec = RangeSpec::band(13.0, 17.0);
        assert_eq!(reference_text(&spec).unwrap(), "13 - 17");
    }

    #[test]
    fn test_reference_text_one_sided() {
        let spec = RangeSpec {
            max: Some(5.0),
            ..Default::default()
        };
        assert_eq!(reference_text(&spec).unwrap(), "< 5");
    }

    #[test]
    fn test_reference_text_titre() {
        let spec = RangeSpec {
            significant_titre: Some("1:80".to_string()),
            ..Default::default()
        };
        assert_eq!(reference_text(&spec).unwrap(), "significant >= 1:80");
    }

    #[test]
    fn test_reference_text_empty() {
        assert!(reference_text(&RangeSpec::default()).is_none());
    }
}
