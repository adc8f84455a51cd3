//! Turning document values into cell text.

use std::fmt;

use dllfill_spec::{FieldPath, Transform};
use serde_json::Value;

use crate::document::{LessonPlanDocument, Lookup, describe};

/// A value whose shape cannot be written to a cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedShape {
    /// Shape of the offending value, e.g. `a number`.
    pub found: String,
    /// Set when the path tried to descend into a number or boolean at this prefix.
    pub at: Option<String>,
}

impl fmt::Display for UnsupportedShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.at {
            Some(prefix) => write!(
                f,
                "descends into `{prefix}`, which holds {} and has no fields or elements",
                self.found
            ),
            None => write!(f, "holds {}, expected text or a list of text", self.found),
        }
    }
}

/// Cell text for one rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub text: String,
    /// Set when the text is empty because the primary path addressed a list,
    /// object or text the wrong way and no fallback matched.
    pub mismatch: Option<ShapeMismatch>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeMismatch {
    pub prefix: String,
    pub found: String,
}

/// Resolve `path` in `document` and normalize it with `transform`.
///
/// Undefined (absent or `null`) values become `""`. Text passes through, a list
/// of text is joined with `\n`. Anything else, including a path that descends
/// into a number or boolean, is an [`UnsupportedShape`].
pub fn resolve(
    document: &LessonPlanDocument,
    path: &FieldPath,
    transform: Transform,
) -> Result<String, UnsupportedShape> {
    resolve_with_fallbacks(document, path, &[], transform).map(|resolved| resolved.text)
}

/// Like [`resolve`], trying `fallbacks` in order when `path` is mismatched.
///
/// Fallbacks are only consulted when the primary path hit a shape mismatch;
/// an undefined primary value stays empty.
pub fn resolve_with_fallbacks(
    document: &LessonPlanDocument,
    path: &FieldPath,
    fallbacks: &[FieldPath],
    transform: Transform,
) -> Result<Resolved, UnsupportedShape> {
    let (text, mismatch) = match document.lookup(path) {
        Lookup::Found(value) => (render(value)?, None),
        Lookup::Undefined => (String::new(), None),
        Lookup::Blocked { prefix, value } => return Err(blocked(prefix, value)),
        Lookup::Mismatched { prefix, value } => {
            let mut found = None;
            for fallback in fallbacks {
                if let Some(text) = lookup_text(document, fallback)? {
                    found = Some(text);
                    break;
                }
            }
            match found {
                Some(text) => (text, None),
                None => (
                    String::new(),
                    Some(ShapeMismatch {
                        prefix,
                        found: describe(value),
                    }),
                ),
            }
        }
    };
    let text = match transform {
        Transform::Identity | Transform::JoinLines => text,
        Transform::Trim => text.trim().to_string(),
    };
    Ok(Resolved { text, mismatch })
}

/// Rendered text when `path` finds a value; `None` when undefined or mismatched.
fn lookup_text(
    document: &LessonPlanDocument,
    path: &FieldPath,
) -> Result<Option<String>, UnsupportedShape> {
    match document.lookup(path) {
        Lookup::Found(value) => render(value).map(Some),
        Lookup::Undefined | Lookup::Mismatched { .. } => Ok(None),
        Lookup::Blocked { prefix, value } => Err(blocked(prefix, value)),
    }
}

fn blocked(prefix: String, value: &Value) -> UnsupportedShape {
    UnsupportedShape {
        found: describe(value),
        at: Some(prefix),
    }
}

fn render(value: &Value) -> Result<String, UnsupportedShape> {
    match value {
        Value::String(text) => Ok(text.clone()),
        Value::Array(items) => {
            let mut lines = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::String(text) => lines.push(text.as_str()),
                    other => {
                        return Err(UnsupportedShape {
                            found: format!("a list containing {}", describe(other)),
                            at: None,
                        });
                    }
                }
            }
            Ok(lines.join("\n"))
        }
        other => Err(UnsupportedShape {
            found: describe(other),
            at: None,
        }),
    }
}
