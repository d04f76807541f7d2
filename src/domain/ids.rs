//! Domain identifier types with validation
//!
//! This module provides newtype wrappers for the identifiers used by the
//! report engine. Each type ensures type safety so that, for example, a
//! patient identifier can never be passed where a report identifier is
//! expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Report identifier newtype wrapper
///
/// Uniquely identifies a diagnostic report instance. Backed by a UUID v4.
///
/// # Examples
///
/// ```
/// use assay::domain::ids::ReportId;
///
/// let id = ReportId::generate();
/// let parsed = ReportId::parse(&id.to_string()).unwrap();
/// assert_eq!(id, parsed);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReportId(Uuid);

impl ReportId {
    /// Generates a new random report identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses a report identifier from its string form
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a valid UUID
    pub fn parse(id: &str) -> Result<Self, String> {
        Uuid::parse_str(id)
            .map(Self)
            .map_err(|e| format!("Invalid report id '{id}': {e}"))
    }

    /// Returns the underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ReportId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Template identifier newtype wrapper
///
/// Uniquely identifies one version of a report template. Backed by a UUID v4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TemplateId(Uuid);

impl TemplateId {
    /// Generates a new random template identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses a template identifier from its string form
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a valid UUID
    pub fn parse(id: &str) -> Result<Self, String> {
        Uuid::parse_str(id)
            .map(Self)
            .map_err(|e| format!("Invalid template id '{id}': {e}"))
    }

    /// Returns the underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TemplateId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Template code newtype wrapper
///
/// The human-assigned code for a template (e.g. `CBC`, `KFT`, `CT_BRAIN`).
/// Unique among active templates within a tenant scope; stable across
/// template versions.
///
/// # Examples
///
/// ```
/// use assay::domain::ids::TemplateCode;
///
/// let code = TemplateCode::new("CBC").unwrap();
/// assert_eq!(code.as_str(), "CBC");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TemplateCode(String);

impl TemplateCode {
    /// Creates a new TemplateCode from a string
    ///
    /// # Errors
    ///
    /// Returns an error if the code is empty or contains whitespace
    pub fn new(code: impl Into<String>) -> Result<Self, String> {
        let code = code.into();
        if code.trim().is_empty() {
            return Err("Template code cannot be empty".to_string());
        }
        if code.chars().any(char::is_whitespace) {
            return Err(format!("Template code cannot contain whitespace: '{code}'"));
        }
        Ok(Self(code))
    }

    /// Returns the template code as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for TemplateCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TemplateCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for TemplateCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Patient identifier newtype wrapper
///
/// Identifies a patient in the collaborating patient registry. The format is
/// owned by the registry; this type only guarantees non-emptiness.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PatientId(String);

impl PatientId {
    /// Creates a new PatientId from a string
    ///
    /// # Errors
    ///
    /// Returns an error if the identifier is empty
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("Patient ID cannot be empty".to_string());
        }
        Ok(Self(id))
    }

    /// Returns the patient ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PatientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PatientId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for PatientId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Order identifier newtype wrapper
///
/// References the originating diagnostic order created by the order-entry
/// collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(String);

impl OrderId {
    /// Creates a new OrderId from a string
    ///
    /// # Errors
    ///
    /// Returns an error if the identifier is empty
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("Order ID cannot be empty".to_string());
        }
        Ok(Self(id))
    }

    /// Returns the order ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for OrderId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Tenant identifier newtype wrapper
///
/// Scopes tenant-owned templates. System templates carry no tenant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenantId(String);

impl TenantId {
    /// Creates a new TenantId from a string
    ///
    /// # Errors
    ///
    /// Returns an error if the identifier is empty
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("Tenant ID cannot be empty".to_string());
        }
        Ok(Self(id))
    }

    /// Returns the tenant ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TenantId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Actor identifier newtype wrapper
///
/// Identifies the staff member performing a workflow operation (technician,
/// QC reviewer, pathologist). Authentication is collaborator-owned; this type
/// only carries the identity through audit and sign-off stamps.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorId(String);

impl ActorId {
    /// Creates a new ActorId from a string
    ///
    /// # Errors
    ///
    /// Returns an error if the identifier is empty
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("Actor ID cannot be empty".to_string());
        }
        Ok(Self(id))
    }

    /// Returns the actor ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ActorId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for ActorId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
