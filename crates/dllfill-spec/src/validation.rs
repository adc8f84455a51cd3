use std::fmt;

use serde::Serialize;

/// A single problem found while validating a binding table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BindingIssue {
    /// Dotted location of the offending field, e.g. `rules[3].source`.
    pub path: String,
    pub message: String,
}

impl BindingIssue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for BindingIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// All issues found in one validation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    issues: Vec<BindingIssue>,
}

impl ValidationError {
    pub fn new(issues: Vec<BindingIssue>) -> Self {
        Self { issues }
    }

    pub fn issues(&self) -> &[BindingIssue] {
        &self.issues
    }

    pub fn into_issues(self) -> Vec<BindingIssue> {
        self.issues
    }

    /// Whether any issue was reported against `path` exactly.
    pub fn has_issue_at(&self, path: &str) -> bool {
        self.issues.iter().any(|issue| issue.path == path)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.issues.as_slice() {
            [] => write!(f, "binding table is invalid"),
            [single] => write!(f, "binding table is invalid: {single}"),
            many => {
                write!(f, "binding table has {} issues:", many.len())?;
                for issue in many {
                    write!(f, "\n  - {issue}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ValidationError {}
