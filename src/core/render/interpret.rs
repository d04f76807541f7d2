//! Value interpretation
//!
//! Classifies a single result value against a resolved reference range,
//! independent of template type. Critical thresholds from the resolved range
//! take precedence over critical bounds declared on the field itself, which
//! take precedence over the normal-band comparison. Non-numeric or empty
//! input yields `NotDone`, never `Normal`.

use crate::domain::template::{Field, RangeSpec};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Classification of a single result value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Interpretation {
    Normal,
    Low,
    High,
    CriticalLow,
    CriticalHigh,
    /// Qualitative positive-like or rule-flagged result
    Abnormal,
    /// No value supplied, or the value could not be read as the field type
    NotDone,
}

impl Interpretation {
    /// Whether the classification is a critical hit
    pub fn is_critical(&self) -> bool {
        matches!(self, Interpretation::CriticalLow | Interpretation::CriticalHigh)
    }

    /// Whether the classification counts as abnormal
    ///
    /// A critical hit always implies abnormal; `NotDone` never does.
    pub fn is_abnormal(&self) -> bool {
        !matches!(self, Interpretation::Normal | Interpretation::NotDone)
    }
}

impl fmt::Display for Interpretation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Interpretation::Normal => "NORMAL",
            Interpretation::Low => "LOW",
            Interpretation::High => "HIGH",
            Interpretation::CriticalLow => "CRITICAL_LOW",
            Interpretation::CriticalHigh => "CRITICAL_HIGH",
            Interpretation::Abnormal => "ABNORMAL",
            Interpretation::NotDone => "NOT_DONE",
        };
        write!(f, "{s}")
    }
}

/// Values that classify a qualitative result as positive-like, hence abnormal
pub const POSITIVE_LIKE_VALUES: &[&str] = &[
    "POSITIVE",
    "REACTIVE",
    "DETECTED",
    "PRESENT",
    "ISOLATED",
    "GROWTH",
];

/// Extracts a numeric value from a raw result value
///
/// Accepts JSON numbers and numeric strings; everything else (including
/// empty strings) yields `None`.
pub fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                trimmed.parse::<f64>().ok()
            }
        }
        _ => None,
    }
}

/// Effective critical thresholds for a field
///
/// Resolved-range critical bounds take precedence over bounds declared on
/// the field itself.
pub fn critical_bounds(
    resolved: Option<&RangeSpec>,
    field: &Field,
) -> (Option<f64>, Option<f64>) {
    let critical_low = resolved
        .and_then(|r| r.critical_low)
        .or(field.critical_low);
    let critical_high = resolved
        .and_then(|r| r.critical_high)
        .or(field.critical_high);
    (critical_low, critical_high)
}

/// Interprets a numeric field value against a resolved range
///
/// Threshold precedence: resolved-range critical bounds, then field-declared
/// critical bounds, then the normal band. When no range was resolved the
/// field-declared critical bounds still apply; without any thresholds at all
/// the value renders `NotDone`-or-`Normal` on presence alone.
pub fn interpret_numeric(
    raw: Option<&Value>,
    resolved: Option<&RangeSpec>,
    field: &Field,
) -> Interpretation {
    let value = match raw.and_then(numeric_value) {
        Some(v) => v,
        None => return Interpretation::NotDone,
    };

    let (critical_low, critical_high) = critical_bounds(resolved, field);

    if let Some(cl) = critical_low {
        if value <= cl {
            return Interpretation::CriticalLow;
        }
    }
    if let Some(ch) = critical_high {
        if value >= ch {
            return Interpretation::CriticalHigh;
        }
    }

    if let Some(spec) = resolved {
        if let Some(min) = spec.min {
            if value < min {
                return Interpretation::Low;
            }
        }
        if let Some(max) = spec.max {
            if value > max {
                return Interpretation::High;
            }
        }
    }

    Interpretation::Normal
}

/// Interprets a qualitative field value
///
/// Returns the classification plus whether the value matched a field-declared
/// critical value. Positive-like values are abnormal; a critical match always
/// implies abnormal.
pub fn interpret_qualitative(raw: Option<&Value>, field: &Field) -> (Interpretation, bool) {
    let text = match raw {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim(),
        _ => return (Interpretation::NotDone, false),
    };

    let is_critical = field
        .critical_values
        .iter()
        .any(|cv| cv.eq_ignore_ascii_case(text));

    let is_positive_like = POSITIVE_LIKE_VALUES
        .iter()
        .any(|p| p.eq_ignore_ascii_case(text));

    if is_critical || is_positive_like {
        (Interpretation::Abnormal, is_critical)
    } else {
        (Interpretation::Normal, false)
    }
}

/// Antibiotic sensitivity classification for culture panels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Sensitivity {
    Susceptible,
    Intermediate,
    Resistant,
}

impl Sensitivity {
    /// Parses an S/I/R marker, accepting the single letter or the full word
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_uppercase().as_str() {
            "S" | "SUSCEPTIBLE" | "SENSITIVE" => Some(Sensitivity::Susceptible),
            "I" | "INTERMEDIATE" => Some(Sensitivity::Intermediate),
            "R" | "RESISTANT" => Some(Sensitivity::Resistant),
            _ => None,
        }
    }
}

impl fmt::Display for Sensitivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Sensitivity::Susceptible => "S",
            Sensitivity::Intermediate => "I",
            Sensitivity::Resistant => "R",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::template::FieldType;
    use serde_json::json;

    fn number_field() -> Field {
        Field::new("hemoglobin", "Hemoglobin", FieldType::Number)
    }

    #[test]
    fn test_critical_low_from_range() {
        let field = number_field();
        let spec = RangeSpec::band(13.0, 17.0).with_critical(Some(7.0), None);

        let result = interpret_numeric(Some(&json!(6.5)), Some(&spec), &field);
        assert_eq!(result, Interpretation::CriticalLow);
        assert!(result.is_critical());
        assert!(result.is_abnormal());
    }

    #[test]
    fn test_low_between_critical_and_min() {
        let field = number_field();
        let spec = RangeSpec::band(13.0, 17.0).with_critical(Some(7.0), None);

        assert_eq!(
            interpret_numeric(Some(&json!(10.0)), Some(&spec), &field),
            Interpretation::Low
        );
    }

    #[test]
    fn test_normal_within_band() {
        let field = number_field();
        let spec = RangeSpec::band(13.0, 17.0);

        assert_eq!(
            interpret_numeric(Some(&json!(14.2)), Some(&spec), &field),
            Interpretation::Normal
        );
    }

    #[test]
    fn test_high_and_critical_high() {
        let field = number_field();
        let spec = RangeSpec::band(13.0, 17.0).with_critical(None, Some(20.0));

        assert_eq!(
            interpret_numeric(Some(&json!(18.0)), Some(&spec), &field),
            Interpretation::High
        );
        assert_eq!(
            interpret_numeric(Some(&json!(21.0)), Some(&spec), &field),
            Interpretation::CriticalHigh
        );
    }

    #[test]
    fn test_range_critical_beats_field_critical() {
        let mut field = number_field();
        field.critical_low = Some(5.0);
        let spec = RangeSpec::band(13.0, 17.0).with_critical(Some(7.0), None);

        // 6.5 is above the field-declared 5.0 but at or below the resolved
        // range's 7.0; the range threshold wins.
        assert_eq!(
            interpret_numeric(Some(&json!(6.5)), Some(&spec), &field),
            Interpretation::CriticalLow
        );
    }

    #[test]
    fn test_field_critical_applies_without_range_critical() {
        let mut field = number_field();
        field.critical_low = Some(7.0);
        let spec = RangeSpec::band(13.0, 17.0);

        assert_eq!(
            interpret_numeric(Some(&json!(6.5)), Some(&spec), &field),
            Interpretation::CriticalLow
        );
    }

    #[test]
    fn test_monotonic_below_critical_low() {
        // Decreasing the value further below critical_low must stay
        // CRITICAL_LOW, never flip back to NORMAL or HIGH.
        let field = number_field();
        let spec = RangeSpec::band(13.0, 17.0).with_critical(Some(7.0), None);

        for value in [7.0, 5.0, 2.0, 0.1] {
            assert_eq!(
                interpret_numeric(Some(&json!(value)), Some(&spec), &field),
                Interpretation::CriticalLow,
                "value {value} should be CRITICAL_LOW"
            );
        }
    }

    #[test]
    fn test_numeric_string_input() {
        let field = number_field();
        let spec = RangeSpec::band(13.0, 17.0);

        assert_eq!(
            interpret_numeric(Some(&json!("14.5")), Some(&spec), &field),
            Interpretation::Normal
        );
    }

    #[test]
    fn test_not_done_for_missing_or_unparseable() {
        let field = number_field();
        let spec = RangeSpec::band(13.0, 17.0);

        assert_eq!(
            interpret_numeric(None, Some(&spec), &field),
            Interpretation::NotDone
        );
        assert_eq!(
            interpret_numeric(Some(&json!("")), Some(&spec), &field),
            Interpretation::NotDone
        );
        assert_eq!(
            interpret_numeric(Some(&json!("pending")), Some(&spec), &field),
            Interpretation::NotDone
        );
        assert!(!Interpretation::NotDone.is_abnormal());
    }

    #[test]
    fn test_qualitative_positive_is_abnormal() {
        let field = Field::new("dengue_ns1", "Dengue NS1 Antigen", FieldType::Qualitative)
            .with_options(&["POSITIVE", "NEGATIVE"]);

        let (interp, critical) = interpret_qualitative(Some(&json!("POSITIVE")), &field);
        assert_eq!(interp, Interpretation::Abnormal);
        assert!(!critical);
    }

    #[test]
    fn test_qualitative_critical_value_match() {
        let field = Field::new("dengue_ns1", "Dengue NS1 Antigen", FieldType::Qualitative)
            .with_options(&["POSITIVE", "NEGATIVE"])
            .with_critical_values(&["POSITIVE"]);

        let (interp, critical) = interpret_qualitative(Some(&json!("POSITIVE")), &field);
        assert_eq!(interp, Interpretation::Abnormal);
        assert!(critical);
    }

    #[test]
    fn test_qualitative_negative_is_normal() {
        let field = Field::new("dengue_ns1", "Dengue NS1 Antigen", FieldType::Qualitative);

        let (interp, critical) = interpret_qualitative(Some(&json!("NEGATIVE")), &field);
        assert_eq!(interp, Interpretation::Normal);
        assert!(!critical);
    }

    #[test]
    fn test_qualitative_missing_is_not_done() {
        let field = Field::new("dengue_ns1", "Dengue NS1 Antigen", FieldType::Qualitative);
        let (interp, critical) = interpret_qualitative(None, &field);
        assert_eq!(interp, Interpretation::NotDone);
        assert!(!critical);
    }

    #[test]
    fn test_sensitivity_parsing() {
        assert_eq!(Sensitivity::parse("S"), Some(Sensitivity::Susceptible));
        assert_eq!(Sensitivity::parse("sensitive"), Some(Sensitivity::Susceptible));
        assert_eq!(Sensitivity::parse("I"), Some(Sensitivity::Intermediate));
        assert_eq!(Sensitivity::parse("Resistant"), Some(Sensitivity::Resistant));
        assert_eq!(Sensitivity::parse("X"), None);
    }
}
