//! Structured diagnostics for a host tool to render.
//!
//! A [`Diagnostic`] is what a failed resource operation looks like to the
//! outside: a severity, a one-line summary written by the caller, the error
//! detail, and optionally the attribute the problem is attached to.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ── Attribute paths ──────────────────────────────────────────────────

/// One step into a nested value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathStep {
    Attribute(String),
    Index(usize),
    Key(String),
}

/// Location of a value inside a resource, rendered as `acls[0].src` or
/// `groups["group:eng"]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributePath(Vec<PathStep>);

impl AttributePath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn attribute(name: &str) -> Self {
        Self(vec![PathStep::Attribute(name.to_owned())])
    }

    pub fn push(&mut self, step: PathStep) {
        self.0.push(step);
    }

    pub fn pop(&mut self) {
        self.0.pop();
    }

    /// A new path one step deeper.
    pub fn child(&self, step: PathStep) -> Self {
        let mut next = self.clone();
        next.push(step);
        next
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str(".");
        }
        for (i, step) in self.0.iter().enumerate() {
            match step {
                PathStep::Attribute(name) if i == 0 => f.write_str(name)?,
                PathStep::Attribute(name) => write!(f, ".{name}")?,
                PathStep::Index(idx) => write!(f, "[{idx}]")?,
                PathStep::Key(key) => write!(f, "[{key:?}]")?,
            }
        }
        Ok(())
    }
}

// ── Diagnostics ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub summary: String,
    pub detail: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute_path: Option<AttributePath>,
}

impl Diagnostic {
    /// An error diagnostic whose detail is the full error, field problems
    /// included.
    pub fn error(err: &CoreError, summary: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            summary: summary.into(),
            detail: error_detail(err),
            attribute_path: None,
        }
    }

    /// Like [`Diagnostic::error`], pinned to one attribute.
    pub fn error_with_path(
        err: &CoreError,
        summary: impl Into<String>,
        path: AttributePath,
    ) -> Self {
        Self {
            attribute_path: Some(path),
            ..Self::error(err, summary)
        }
    }

    pub fn warning(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            summary: summary.into(),
            detail: detail.into(),
            attribute_path: None,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.summary)?;
        if let Some(path) = &self.attribute_path {
            write!(f, " (at {path})")?;
        }
        if !self.detail.is_empty() {
            write!(f, "\n  {}", self.detail.replace('\n', "\n  "))?;
        }
        Ok(())
    }
}

fn error_detail(err: &CoreError) -> String {
    let mut detail = err.to_string();
    for field in err.fields() {
        detail.push_str(&format!("\n{}: {}", field.field, field.detail));
    }
    detail
}
