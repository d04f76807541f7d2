//! Report template domain model
//!
//! A template is a versioned definition of a diagnostic report: its fields,
//! sections, reference ranges, calculated fields, and interpretation rules.
//! Templates are immutable once activated. System templates (tenant-less)
//! are read-only and may only be cloned into a tenant-owned copy; versioning
//! deactivates the old version and creates a new one, never overwriting in
//! place.

use super::ids::{TemplateCode, TemplateId, TenantId};
use super::patient::Gender;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Structural shape of a template
///
/// Four report shapes share one rendering pipeline; the engine dispatches on
/// this tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TemplateType {
    /// Numeric panel: rows of value / unit / range / flag (e.g. CBC, KFT)
    Tabular,
    /// Enumerated results (e.g. POSITIVE / NEGATIVE serology)
    Qualitative,
    /// Free-text findings and impression (e.g. radiology, histopathology)
    Narrative,
    /// Mixed numeric and narrative fields, with repeatable sub-panels
    /// (e.g. culture and sensitivity)
    Hybrid,
}

impl fmt::Display for TemplateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TemplateType::Tabular => "TABULAR",
            TemplateType::Qualitative => "QUALITATIVE",
            TemplateType::Narrative => "NARRATIVE",
            TemplateType::Hybrid => "HYBRID",
        };
        write!(f, "{s}")
    }
}

/// Report category, used to scope report numbering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportCategory {
    Hematology,
    Biochemistry,
    Microbiology,
    Serology,
    Radiology,
    Pathology,
    General,
}

impl ReportCategory {
    /// Short prefix used in human-readable report numbers
    pub fn prefix(&self) -> &'static str {
        match self {
            ReportCategory::Hematology => "HEM",
            ReportCategory::Biochemistry => "BIO",
            ReportCategory::Microbiology => "MIC",
            ReportCategory::Serology => "SER",
            ReportCategory::Radiology => "RAD",
            ReportCategory::Pathology => "PAT",
            ReportCategory::General => "GEN",
        }
    }
}

/// Data type of a template field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Numeric measurement
    Number,
    /// Single choice from the declared option set
    Select,
    /// Enumerated qualitative result (POSITIVE / NEGATIVE, titres)
    Qualitative,
    /// Single-line free text
    Text,
    /// Multi-line free text
    Textarea,
    /// Derived via a declared formula; never entered directly
    Calculated,
}

/// A single field definition within a template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Field code, unique within the template
    pub code: String,

    /// Display label
    pub label: String,

    /// Data type
    pub field_type: FieldType,

    /// Measurement unit, when applicable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    /// Section this field belongs to; fields without one fall into a
    /// synthetic "Results" section ordered last
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_id: Option<String>,

    /// Whether the field must carry a value before QC submission
    #[serde(default)]
    pub required: bool,

    /// Lower validation bound for numeric input
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,

    /// Upper validation bound for numeric input
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,

    /// Declared option set for Select / Qualitative fields
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,

    /// Field-declared critical low, overridden by the resolved range
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub critical_low: Option<f64>,

    /// Field-declared critical high, overridden by the resolved range
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub critical_high: Option<f64>,

    /// Qualitative values that flag the field critical when matched exactly
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub critical_values: Vec<String>,
}

impl Field {
    /// Creates a field with the given code, label and type
    pub fn new(code: impl Into<String>, label: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            code: code.into(),
            label: label.into(),
            field_type,
            unit: None,
            section_id: None,
            required: false,
            min_value: None,
            max_value: None,
            options: Vec::new(),
            critical_low: None,
            critical_high: None,
            critical_values: Vec::new(),
        }
    }

    /// Sets the measurement unit
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Assigns the field to a section
    pub fn with_section(mut self, section_id: impl Into<String>) -> Self {
        self.section_id = Some(section_id.into());
        self
    }

    /// Marks the field as required
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Sets the numeric validation bounds
    pub fn with_bounds(mut self, min: f64, max: f64) -> Self {
        self.min_value = Some(min);
        self.max_value = Some(max);
        self
    }

    /// Sets the declared option set
    pub fn with_options(mut self, options: &[&str]) -> Self {
        self.options = options.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Declares qualitative critical values
    pub fn with_critical_values(mut self, values: &[&str]) -> Self {
        self.critical_values = values.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Declares field-level numeric critical bounds
    pub fn with_critical_bounds(mut self, low: Option<f64>, high: Option<f64>) -> Self {
        self.critical_low = low;
        self.critical_high = high;
        self
    }

    /// Whether input values are free text
    pub fn is_textual(&self) -> bool {
        matches!(self.field_type, FieldType::Text | FieldType::Textarea)
    }
}

/// Display grouping for rendered fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Section identifier referenced by `Field::section_id`
    pub id: String,

    /// Display title
    pub title: String,

    /// Display position; lower renders first
    #[serde(default)]
    pub display_order: u32,
}

impl Section {
    /// Creates a section
    pub fn new(id: impl Into<String>, title: impl Into<String>, display_order: u32) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            display_order,
        }
    }
}

/// A leaf of the reference range tree
///
/// Either a numeric band with optional critical thresholds, or a qualitative
/// significant titre.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RangeSpec {
    /// Lower bound of the normal band
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,

    /// Upper bound of the normal band
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,

    /// Values at or below this are critical
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub critical_low: Option<f64>,

    /// Values at or above this are critical
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub critical_high: Option<f64>,

    /// Titre at or above which a qualitative result is significant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub significant_titre: Option<String>,
}

impl RangeSpec {
    /// Numeric band without critical thresholds
    pub fn band(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
            ..Default::default()
        }
    }

    /// Adds critical thresholds to a band
    pub fn with_critical(mut self, low: Option<f64>, high: Option<f64>) -> Self {
        self.critical_low = low;
        self.critical_high = high;
        self
    }
}

/// Age-banded range entry
///
/// Matches when `min_years <= age < max_years`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgeBandRange {
    pub min_years: f64,
    pub max_years: f64,
    pub range: RangeSpec,
}

/// Trimester-specific range entry
///
/// Matches when `from_week <= gestational_weeks <= to_week`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrimesterRange {
    pub from_week: u8,
    pub to_week: u8,
    pub range: RangeSpec,
}

/// Pregnancy-specific ranges, optionally refined by trimester
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PregnancyRange {
    /// Trimester bands, consulted when gestational weeks are known
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trimesters: Vec<TrimesterRange>,

    /// Fallback for pregnant patients without a matching trimester band
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<RangeSpec>,
}

/// Demographic resolution tree for one field's reference range
///
/// Resolution priority (most specific wins): pregnancy > age band > gender >
/// generic. The resolver lives in `core::render::ranges`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ReferenceRange {
    /// Pregnancy-specific ranges
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pregnancy: Option<PregnancyRange>,

    /// Age-banded ranges, first match wins
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub age_bands: Vec<AgeBandRange>,

    /// Gender-specific ranges
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub by_gender: BTreeMap<Gender, RangeSpec>,

    /// Generic range applying to all demographics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all: Option<RangeSpec>,
}

/// A derived field computed from raw results
///
/// Declaration order is evaluation order, so later formulas may reference
/// earlier calculated codes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculatedField {
    /// Field code the calculated value is stored under
    pub code: String,

    /// Display label
    pub label: String,

    /// Formula text: either a named clinical formula invocation
    /// (`egfr(creatinine)`, `qtc(qt_interval, heart_rate)`) or an arithmetic
    /// expression over field codes
    pub formula: String,

    /// Measurement unit, when applicable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    /// Decimal places to round the result to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,
}

/// A declarative interpretation rule
///
/// All matching rules contribute statements to the rendered report, in
/// declaration order; this is not a first-match scheme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterpretationRule {
    /// Boolean condition over raw results, calculated values, and patient
    /// context (`patient.age`, `patient.gender`, `patient.pregnant`)
    pub condition: String,

    /// Statement added to the report when the condition holds
    pub statement: String,
}

/// Antibiotic sensitivity sub-panel of a repeatable section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityPanel {
    /// Result key holding the per-antibiotic map within each instance
    pub field_code: String,

    /// Declared antibiotic list
    pub antibiotics: Vec<String>,
}

/// A section that repeats per instance (e.g. one per isolated organism)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepeatableSection {
    /// Identifier; instance arrays in `results` are keyed by this
    pub id: String,

    /// Display title for each instance
    pub title: String,

    /// Fields rendered per instance
    pub fields: Vec<Field>,

    /// Optional antibiotic sensitivity sub-panel interpreted S/I/R
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensitivity_panel: Option<SensitivityPanel>,
}

/// A versioned, immutable-once-activated report definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    /// Unique identifier of this template version
    pub id: TemplateId,

    /// Template code, stable across versions
    pub code: TemplateCode,

    /// Display name
    pub name: String,

    /// Version number, starting at 1
    pub version: u32,

    /// Category driving report-number prefixes
    pub category: ReportCategory,

    /// Structural shape
    pub template_type: TemplateType,

    /// Ordered field definitions
    pub fields: Vec<Field>,

    /// Ordered section definitions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sections: Vec<Section>,

    /// Reference range specifications keyed by field code
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub reference_ranges: BTreeMap<String, ReferenceRange>,

    /// Calculated field formulas, evaluated in declaration order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub calculated_fields: Vec<CalculatedField>,

    /// Declarative interpretation rules
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interpretation_rules: Vec<InterpretationRule>,

    /// Repeatable section definitions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub repeatable_sections: Vec<RepeatableSection>,

    /// Owning tenant; `None` marks a read-only system template
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant: Option<TenantId>,

    /// Whether this version is active
    pub active: bool,
}

impl Template {
    /// Returns a builder for constructing a Template
    pub fn builder() -> TemplateBuilder {
        TemplateBuilder::default()
    }

    /// Whether this is a tenant-less system template
    pub fn is_system(&self) -> bool {
        self.tenant.is_none()
    }

    /// Looks up a field definition by code
    pub fn field(&self, code: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.code == code)
    }

    /// Looks up a section definition by id
    pub fn section(&self, id: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == id)
    }

    /// Clones a system template into a tenant-owned copy
    ///
    /// The copy gets a fresh id and version 1; the source is untouched.
    /// This is the only customization path for system templates.
    pub fn clone_for_tenant(&self, tenant: TenantId) -> Template {
        let mut copy = self.clone();
        copy.id = TemplateId::generate();
        copy.version = 1;
        copy.tenant = Some(tenant);
        copy.active = true;
        copy
    }

    /// Creates the successor version of this template
    ///
    /// The successor gets a fresh id and an incremented version; callers are
    /// expected to deactivate this version when activating the successor.
    pub fn next_version(&self) -> Template {
        let mut next = self.clone();
        next.id = TemplateId::generate();
        next.version = self.version + 1;
        next.active = true;
        next
    }

    /// Checks structural invariants: unique field codes, resolvable section
    /// references, calculated codes not colliding with raw field codes
    ///
    /// # Errors
    ///
    /// Returns a list of human-readable violations.
    pub fn check_invariants(&self) -> Result<(), Vec<String>> {
        let mut problems = Vec::new();
        let mut seen = std::collections::BTreeSet::new();
        for field in &self.fields {
            if !seen.insert(field.code.as_str()) {
                problems.push(format!("duplicate field code '{}'", field.code));
            }
            if let Some(ref section_id) = field.section_id {
                if self.section(section_id).is_none() {
                    problems.push(format!(
                        "field '{}' references unknown section '{}'",
                        field.code, section_id
                    ));
                }
            }
        }
        for calc in &self.calculated_fields {
            if seen.contains(calc.code.as_str()) {
                problems.push(format!(
                    "calculated field '{}' collides with a raw field code",
                    calc.code
                ));
            }
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems)
        }
    }
}

/// Builder for constructing Template instances
#[derive(Debug, Default)]
pub struct TemplateBuilder {
    code: Option<TemplateCode>,
    name: Option<String>,
    version: u32,
    category: Option<ReportCategory>,
    template_type: Option<TemplateType>,
    fields: Vec<Field>,
    sections: Vec<Section>,
    reference_ranges: BTreeMap<String, ReferenceRange>,
    calculated_fields: Vec<CalculatedField>,
    interpretation_rules: Vec<InterpretationRule>,
    repeatable_sections: Vec<RepeatableSection>,
    tenant: Option<TenantId>,
}

impl TemplateBuilder {
    /// Creates a new TemplateBuilder
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the template code
    pub fn code(mut self, code: TemplateCode) -> Self {
        self.code = Some(code);
        self
    }

    /// Sets the display name
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the version (defaults to 1)
    pub fn version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Sets the report category
    pub fn category(mut self, category: ReportCategory) -> Self {
        self.category = Some(category);
        self
    }

    /// Sets the template type
    pub fn template_type(mut self, template_type: TemplateType) -> Self {
        self.template_type = Some(template_type);
        self
    }

    /// Appends a field definition
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Appends a section definition
    pub fn section(mut self, section: Section) -> Self {
        self.sections.push(section);
        self
    }

    /// Declares a reference range for a field code
    pub fn reference_range(mut self, field_code: impl Into<String>, range: ReferenceRange) -> Self {
        self.reference_ranges.insert(field_code.into(), range);
        self
    }

    /// Appends a calculated field
    pub fn calculated_field(mut self, calc: CalculatedField) -> Self {
        self.calculated_fields.push(calc);
        self
    }

    /// Appends an interpretation rule
    pub fn interpretation_rule(mut self, rule: InterpretationRule) -> Self {
        self.interpretation_rules.push(rule);
        self
    }

    /// Appends a repeatable section
    pub fn repeatable_section(mut self, section: RepeatableSection) -> Self {
        self.repeatable_sections.push(section);
        self
    }

    /// Sets the owning tenant (omit for a system template)
    pub fn tenant(mut self, tenant: TenantId) -> Self {
        self.tenant = Some(tenant);
        self
    }

    /// Builds the Template
    ///
    /// # Errors
    ///
    /// Returns an error if code, name, category or template type are missing,
    /// or if structural invariants do not hold.
    pub fn build(self) -> Result<Template, String> {
        let template = Template {
            id: TemplateId::generate(),
            code: self.code.ok_or("code is required")?,
            name: self.name.ok_or("name is required")?,
            version: if self.version == 0 { 1 } else { self.version },
            category: self.category.ok_or("category is required")?,
            template_type: self.template_type.ok_or("template_type is required")?,
            fields: self.fields,
            sections: self.sections,
            reference_ranges: self.reference_ranges,
            calculated_fields: self.calculated_fields,
            interpretation_rules: self.interpretation_rules,
            repeatable_sections: self.repeatable_sections,
            tenant: self.tenant,
            active: true,
        };
        template
            .check_invariants()
            .map_err(|problems| problems.join("; "))?;
        Ok(template)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_template() -> Template {
        Template::builder()
            .code(TemplateCode::new("CBC").unwrap())
            .name("Complete Blood Count")
            .category(ReportCategory::Hematology)
            .template_type(TemplateType::Tabular)
            .field(Field::new("hemoglobin", "Hemoglobin", FieldType::Number).with_unit("g/dL"))
            .build()
            .unwrap()
    }

    #[test]
    fn test_template_builder() {
        let template = minimal_template();
        assert_eq!(template.code.as_str(), "CBC");
        assert_eq!(template.version, 1);
        assert!(template.active);
        assert!(template.is_system());
    }

    #[test]
    fn test_template_builder_missing_code() {
        let result = Template::builder()
            .name("No code")
            .category(ReportCategory::General)
            .template_type(TemplateType::Tabular)
            .build();
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("code is required"));
    }

    #[test]
    fn test_duplicate_field_codes_rejected() {
        let result = Template::builder()
            .code(TemplateCode::new("DUP").unwrap())
            .name("Duplicate fields")
            .category(ReportCategory::General)
            .template_type(TemplateType::Tabular)
            .field(Field::new("a", "A", FieldType::Number))
            .field(Field::new("a", "A again", FieldType::Number))
            .build();
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("duplicate field code"));
    }

    #[test]
    fn test_unknown_section_reference_rejected() {
        let result = Template::builder()
            .code(TemplateCode::new("SEC").unwrap())
            .name("Bad section")
            .category(ReportCategory::General)
            .template_type(TemplateType::Tabular)
            .field(Field::new("a", "A", FieldType::Number).with_section("missing"))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_clone_for_tenant() {
        let system = minimal_template();
        let tenant = TenantId::new("city-hospital").unwrap();
        let copy = system.clone_for_tenant(tenant.clone());

        assert!(system.is_system());
        assert!(!copy.is_system());
        assert_eq!(copy.tenant, Some(tenant));
        assert_ne!(copy.id, system.id);
        assert_eq!(copy.code, system.code);
        assert_eq!(copy.fields, system.fields);
    }

    #[test]
    fn test_next_version_increments() {
        let v1 = minimal_template();
        let v2 = v1.next_version();
        assert_eq!(v2.version, 2);
        assert_ne!(v2.id, v1.id);
        assert_eq!(v2.code, v1.code);
    }

    #[test]
    fn test_field_lookup() {
        let template = minimal_template();
        assert!(template.field("hemoglobin").is_some());
        assert!(template.field("absent").is_none());
    }

    #[test]
    fn test_template_serialization_roundtrip() {
        let template = minimal_template();
        let json = serde_json::to_string(&template).unwrap();
        let deserialized: Template = serde_json::from_str(&json).unwrap();
        assert_eq!(template, deserialized);
    }

    #[test]
    fn test_category_prefixes() {
        assert_eq!(ReportCategory::Hematology.prefix(), "HEM");
        assert_eq!(ReportCategory::Radiology.prefix(), "RAD");
    }
}
