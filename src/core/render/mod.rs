//! Template rendering engine
//!
//! Turns raw result values into a structured, clinically interpreted report
//! view. Four template shapes share one pipeline: the engine dispatches on
//! [`TemplateType`] and the variants share the range-resolution,
//! interpretation, and formula primitives.
//!
//! Rendering is pure: it returns a [`RenderedReport`] and performs no
//! persistence; all side effects are owned by the workflow engine.
//!
//! # Examples
//!
//! ```no_run
//! use assay::core::render::{RenderEngine, RenderInput};
//! # fn example(template: &assay::domain::Template) -> assay::domain::Result<()> {
//! let engine = RenderEngine::new()?;
//! let input = RenderInput::default();
//! let rendered = engine.render(template, &input)?;
//! println!("{} critical value(s)", rendered.critical_values.len());
//! # Ok(())
//! # }
//! ```

pub mod checksum;
pub mod clinical;
pub mod formula;
mod hybrid;
pub mod interpret;
mod narrative;
pub mod phrases;
mod qualitative;
pub mod ranges;
pub mod rendered;
mod tabular;

use crate::domain::patient::PatientContext;
use crate::domain::result::Result;
use crate::domain::template::{Template, TemplateType};
use chrono::{DateTime, Utc};
use formula::{evaluate_calculated, evaluate_condition, EvalContext};
use phrases::PhraseLibrary;
use rendered::{RenderedField, RenderedReport, RenderedSection};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub use rendered::{RenderedRepeat, RenderedSensitivity};

/// Section id and title used for fields without a declared section
const SYNTHETIC_SECTION_ID: &str = "results";
const SYNTHETIC_SECTION_TITLE: &str = "Results";

/// A specimen accompanying the result set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Specimen {
    /// Specimen type (serum, EDTA whole blood, urine, ...)
    pub specimen_type: String,

    /// Collection container / barcode identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specimen_id: Option<String>,

    /// When the specimen was collected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collected_at: Option<DateTime<Utc>>,
}

/// Input to a render: patient context, raw results, specimens, metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RenderInput {
    /// Demographic context driving range resolution
    #[serde(default)]
    pub patient: PatientContext,

    /// Raw result values, field code -> scalar/array value
    #[serde(default)]
    pub results: BTreeMap<String, Value>,

    /// Specimens the results came from
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub specimens: Vec<Specimen>,

    /// Caller-supplied metadata, carried through untouched
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, Value>,
}

impl RenderInput {
    /// Input with patient context and results only
    pub fn new(patient: PatientContext, results: BTreeMap<String, Value>) -> Self {
        Self {
            patient,
            results,
            specimens: Vec::new(),
            metadata: BTreeMap::new(),
        }
    }
}

/// The template rendering engine
///
/// Holds the compiled critical phrase library; everything else is stateless.
/// Thread-safe: share via `Arc` across tasks.
pub struct RenderEngine {
    phrases: PhraseLibrary,
}

impl RenderEngine {
    /// Creates a render engine with the built-in phrase library
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a built-in phrase pattern fails to
    /// compile.
    pub fn new() -> Result<Self> {
        Ok(Self {
            phrases: PhraseLibrary::default_phrases()?,
        })
    }

    /// Renders raw results into an interpreted report view
    ///
    /// Calculated fields are evaluated strictly after raw fields, in
    /// declaration order; a formula failure nulls that field and never
    /// aborts the render. All matching interpretation rules contribute
    /// statements, in declaration order.
    pub fn render(&self, template: &Template, input: &RenderInput) -> Result<RenderedReport> {
        let calculated = self.evaluate_calculated_fields(template, input);

        let (fields, repeats, mut criticals) = match template.template_type {
            TemplateType::Tabular => {
                let (mut fields, mut criticals) = tabular::render_fields(template, input);
                let (calc_fields, calc_criticals) =
                    tabular::render_calculated_fields(template, input, &calculated);
                fields.extend(calc_fields);
                criticals.extend(calc_criticals);
                (fields, Vec::new(), criticals)
            }
            TemplateType::Qualitative => {
                let (fields, criticals) = qualitative::render_fields(template, input);
                (fields, Vec::new(), criticals)
            }
            TemplateType::Narrative => {
                let (fields, criticals) =
                    narrative::render_fields(template, input, &self.phrases);
                (fields, Vec::new(), criticals)
            }
            TemplateType::Hybrid => {
                let (mut fields, repeats, mut criticals) = hybrid::render(template, input);
                let (calc_fields, calc_criticals) =
                    tabular::render_calculated_fields(template, input, &calculated);
                fields.extend(calc_fields);
                criticals.extend(calc_criticals);
                (fields, repeats, criticals)
            }
        };

        // Deduplicate phrase hits that produced identical entries from the
        // same field; numeric paths never produce duplicates.
        criticals.dedup_by(|a, b| a.field_code == b.field_code && a.reason == b.reason);

        let sections = group_into_sections(template, fields);
        let interpretations = self.evaluate_rules(template, input, &calculated);

        let mut report = RenderedReport {
            template_code: template.code.as_str().to_string(),
            template_version: template.version,
            template_type: template.template_type,
            sections,
            repeats,
            calculated_values: calculated,
            interpretations,
            critical_values: criticals,
            checksum: String::new(),
        };

        let payload = serde_json::to_value(&report)?;
        report.checksum = checksum::calculate_checksum(&payload)?;

        Ok(report)
    }

    /// Evaluates calculated fields in declaration order
    ///
    /// Later formulas see earlier calculated codes. Failures are logged and
    /// yield a null value for that field only.
    fn evaluate_calculated_fields(
        &self,
        template: &Template,
        input: &RenderInput,
    ) -> BTreeMap<String, Value> {
        let mut calculated: BTreeMap<String, Value> = BTreeMap::new();

        for calc in &template.calculated_fields {
            let value = {
                let ctx = EvalContext::new(&input.results, &calculated, &input.patient);
                evaluate_calculated(&calc.formula, &ctx)
            };

            match value {
                Ok(number) => {
                    let rounded = match calc.precision {
                        Some(digits) => {
                            let factor = 10_f64.powi(digits as i32);
                            (number * factor).round() / factor
                        }
                        None => number,
                    };
                    let json_number = serde_json::Number::from_f64(rounded)
                        .map(Value::Number)
                        .unwrap_or(Value::Null);
                    calculated.insert(calc.code.clone(), json_number);
                }
                Err(error) => {
                    tracing::warn!(
                        field_code = %calc.code,
                        formula = %calc.formula,
                        error = %error,
                        "Calculated field evaluation failed; storing null"
                    );
                    calculated.insert(calc.code.clone(), Value::Null);
                }
            }
        }

        calculated
    }

    /// Evaluates interpretation rules; all matches are retained in order
    fn evaluate_rules(
        &self,
        template: &Template,
        input: &RenderInput,
        calculated: &BTreeMap<String, Value>,
    ) -> Vec<String> {
        let ctx = EvalContext::new(&input.results, calculated, &input.patient);
        let mut statements = Vec::new();

        for rule in &template.interpretation_rules {
            match evaluate_condition(&rule.condition, &ctx) {
                Ok(true) => statements.push(rule.statement.clone()),
                Ok(false) => {}
                Err(error) => {
                    tracing::warn!(
                        condition = %rule.condition,
                        error = %error,
                        "Interpretation rule condition failed; skipping rule"
                    );
                }
            }
        }

        statements
    }
}

/// Groups rendered fields into the template's declared sections
///
/// Declared sections come first in `display_order`; fields without a section
/// fall into a synthetic "Results" section ordered last. Sections that end
/// up empty are omitted.
fn group_into_sections(template: &Template, fields: Vec<RenderedField>) -> Vec<RenderedSection> {
    let mut declared: Vec<_> = template.sections.clone();
    declared.sort_by_key(|s| s.display_order);

    let mut sections = Vec::with_capacity(declared.len() + 1);
    let mut unassigned: Vec<RenderedField> = Vec::new();

    let mut by_section: BTreeMap<String, Vec<RenderedField>> = BTreeMap::new();
    for field in fields {
        let section_id = template
            .field(&field.code)
            .and_then(|f| f.section_id.clone());
        match section_id {
            Some(id) => by_section.entry(id).or_default().push(field),
            None => unassigned.push(field),
        }
    }

    for section in declared {
        if let Some(fields) = by_section.remove(&section.id) {
            sections.push(RenderedSection {
                id: section.id,
                title: section.title,
                fields,
            });
        }
    }

    if !unassigned.is_empty() {
        sections.push(RenderedSection {
            id: SYNTHETIC_SECTION_ID.to_string(),
            title: SYNTHETIC_SECTION_TITLE.to_string(),
            fields: unassigned,
        });
    }

    sections
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ids::TemplateCode;
    use crate::domain::patient::Gender;
    use crate::domain::template::{
        CalculatedField, Field, FieldType, InterpretationRule, RangeSpec, ReferenceRange,
        ReportCategory, Section,
    };
    use serde_json::json;

    fn kft_template() -> Template {
        let mut by_gender = BTreeMap::new();
        by_gender.insert(Gender::Male, RangeSpec::band(0.7, 1.3));
        by_gender.insert(Gender::Female, RangeSpec::band(0.6, 1.1));

        Template::builder()
            .code(TemplateCode::new("KFT").unwrap())
            .name("Kidney Function Test")
            .category(ReportCategory::Biochemistry)
            .template_type(TemplateType::Tabular)
            .section(Section::new("renal", "Renal Profile", 1))
            .field(
                Field::new("creatinine", "Serum Creatinine", FieldType::Number)
                    .with_unit("mg/dL")
                    .with_section("renal")
                    .required(),
            )
            .field(
                Field::new("urea", "Blood Urea", FieldType::Number)
                    .with_unit("mg/dL")
                    .with_section("renal"),
            )
            .reference_range(
                "creatinine",
                ReferenceRange {
                    by_gender,
                    ..Default::default()
                },
            )
            .calculated_field(CalculatedField {
                code: "egfr".to_string(),
                label: "eGFR (CKD-EPI 2021)".to_string(),
                formula: "egfr(creatinine)".to_string(),
                unit: Some("mL/min/1.73m2".to_string()),
                precision: None,
            })
            .calculated_field(CalculatedField {
                code: "urea_creatinine_ratio".to_string(),
                label: "Urea/Creatinine Ratio".to_string(),
                formula: "urea / creatinine".to_string(),
                unit: None,
                precision: Some(1),
            })
            .interpretation_rule(InterpretationRule {
                condition: "egfr < 60".to_string(),
                statement: "Reduced eGFR; suggest nephrology correlation.".to_string(),
            })
            .interpretation_rule(InterpretationRule {
                condition: "egfr >= 90".to_string(),
                statement: "Normal kidney function.".to_string(),
            })
            .build()
            .unwrap()
    }

    fn kft_input() -> RenderInput {
        let mut results = BTreeMap::new();
        results.insert("creatinine".to_string(), json!(1.0));
        results.insert("urea".to_string(), json!(30.0));
        RenderInput::new(PatientContext::new(40.0, Gender::Male), results)
    }

    #[test]
    fn test_egfr_scenario() {
        let engine = RenderEngine::new().unwrap();
        let rendered = engine.render(&kft_template(), &kft_input()).unwrap();

        // creatinine=1.0, age=40, male: CKD-EPI 2021 rounds to 98.
        assert_eq!(rendered.calculated_values["egfr"], json!(98.0));
        assert_eq!(rendered.calculated_values["urea_creatinine_ratio"], json!(30.0));
    }

    #[test]
    fn test_calculated_chain_and_declaration_order() {
        let mut template = kft_template();
        // Third formula referencing a prior calculated code.
        template.calculated_fields.push(CalculatedField {
            code: "half_ratio".to_string(),
            label: "Half Ratio".to_string(),
            formula: "urea_creatinine_ratio / 2".to_string(),
            unit: None,
            precision: Some(1),
        });

        let engine = RenderEngine::new().unwrap();
        let rendered = engine.render(&template, &kft_input()).unwrap();
        assert_eq!(rendered.calculated_values["half_ratio"], json!(15.0));
    }

    #[test]
    fn test_failed_formula_yields_null_not_abort() {
        let mut template = kft_template();
        template.calculated_fields.push(CalculatedField {
            code: "broken".to_string(),
            label: "Broken".to_string(),
            formula: "nonexistent_field * 2".to_string(),
            unit: None,
            precision: None,
        });

        let engine = RenderEngine::new().unwrap();
        let rendered = engine.render(&template, &kft_input()).unwrap();

        assert_eq!(rendered.calculated_values["broken"], Value::Null);
        // Remaining calculated fields are unaffected.
        assert_eq!(rendered.calculated_values["egfr"], json!(98.0));
    }

    #[test]
    fn test_all_matching_rules_retained() {
        let mut template = kft_template();
        template.interpretation_rules.push(InterpretationRule {
            condition: "patient.age >= 18".to_string(),
            statement: "Adult reference ranges applied.".to_string(),
        });

        let engine = RenderEngine::new().unwrap();
        let rendered = engine.render(&template, &kft_input()).unwrap();

        // egfr=98 matches ">= 90" and the adult rule; "< 60" does not.
        assert_eq!(
            rendered.interpretations,
            vec![
                "Normal kidney function.".to_string(),
                "Adult reference ranges applied.".to_string(),
            ]
        );
    }

    #[test]
    fn test_rendering_is_idempotent() {
        let engine = RenderEngine::new().unwrap();
        let template = kft_template();
        let input = kft_input();

        let first = engine.render(&template, &input).unwrap();
        let second = engine.render(&template, &input).unwrap();

        assert_eq!(first.calculated_values, second.calculated_values);
        assert_eq!(first.interpretations, second.interpretations);
        assert_eq!(first.checksum, second.checksum);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_sections_with_synthetic_results_last() {
        let engine = RenderEngine::new().unwrap();
        let rendered = engine.render(&kft_template(), &kft_input()).unwrap();

        assert_eq!(rendered.sections.len(), 2);
        assert_eq!(rendered.sections[0].id, "renal");
        // Calculated fields carry no section and land in the synthetic
        // trailing section.
        assert_eq!(rendered.sections[1].id, SYNTHETIC_SECTION_ID);
        assert!(rendered.sections[1]
            .fields
            .iter()
            .any(|f| f.code == "egfr"));
    }

    #[test]
    fn test_broken_rule_skipped_not_fatal() {
        let mut template = kft_template();
        template.interpretation_rules.insert(
            0,
            InterpretationRule {
                condition: "((broken".to_string(),
                statement: "Never emitted.".to_string(),
            },
        );

        let engine = RenderEngine::new().unwrap();
        let rendered = engine.render(&template, &kft_input()).unwrap();

        assert!(!rendered
            .interpretations
            .contains(&"Never emitted.".to_string()));
        assert!(rendered
            .interpretations
            .contains(&"Normal kidney function.".to_string()));
    }
}
