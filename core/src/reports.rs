//! file: core/src/reports.rs
//! description: non-fatal build diagnostics.
//!
//! Conflict policies such as `warn` and failed dependency lookups do not
//! abort a build. They are recorded here so callers (and tests) can inspect
//! them after authoring, and serialized to JSON for tooling.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreErrorExt, Level};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub level: Level,
    pub issuer: String,
    pub message: String,
    /// Resource the diagnostic is about, rendered as `namespace:path`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
}

impl Diagnostic {
    pub fn new(level: Level, issuer: &str, message: impl Into<String>) -> Self {
        Diagnostic {
            level,
            issuer: issuer.to_string(),
            message: message.into(),
            resource: None,
        }
    }

    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    pub fn from_error(error: &CoreError) -> Self {
        Diagnostic::new(error.level(), &error.issuer(), error.message())
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.resource {
            Some(resource) => write!(f, "[{}] {}: {} ({})", self.level, self.issuer, self.message, resource),
            None => write!(f, "[{}] {}: {}", self.level, self.issuer, self.message),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics {
    reports: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Diagnostics::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.reports.push(diagnostic);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.reports.iter()
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.reports.iter().filter(|d| d.level == Level::Warning)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.reports)
    }
}
