//! The lesson-plan document a fill reads from.

use std::io::Read;

use dllfill_spec::{FieldPath, PathSegment, Weekday};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::FillError;

const PROCEDURES_KEY: &str = "proceduresByDay";

/// A Daily Lesson Log payload, kept as a JSON object so any binding path can
/// address it (`teacherName`, `objectives[1]`, `generatedLesson.IV_Procedures[3]`).
#[derive(Debug, Clone, PartialEq)]
pub struct LessonPlanDocument {
    root: Map<String, Value>,
}

impl LessonPlanDocument {
    pub fn from_value(value: Value) -> Result<Self, FillError> {
        let root = match value {
            Value::Null => return Err(FillError::missing_input("document is null")),
            Value::Object(map) if map.is_empty() => {
                return Err(FillError::missing_input("document has no fields"));
            }
            Value::Object(map) => map,
            other => {
                return Err(FillError::missing_input(format!(
                    "document must be an object, got {}",
                    describe(&other)
                )));
            }
        };
        check_procedures(&root)?;
        Ok(Self { root })
    }

    pub fn from_json_str(text: &str) -> Result<Self, FillError> {
        if text.trim().is_empty() {
            return Err(FillError::missing_input("document is empty"));
        }
        let value: Value = serde_json::from_str(text)
            .map_err(|err| FillError::invalid_document("$", err.to_string()))?;
        Self::from_value(value)
    }

    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self, FillError> {
        let mut text = String::new();
        reader
            .read_to_string(&mut text)
            .map_err(|err| FillError::invalid_document("$", err.to_string()))?;
        Self::from_json_str(&text)
    }

    pub fn root(&self) -> &Map<String, Value> {
        &self.root
    }

    /// Follow `path` through the document.
    ///
    /// Text behaves as a one-element list, so `objectives[0]` reads a single
    /// objective given as plain text.
    pub fn lookup(&self, path: &FieldPath) -> Lookup<'_> {
        let mut segments = path.segments().iter().enumerate();
        let mut current = match segments.next() {
            Some((_, PathSegment::Field(name))) => match self.root.get(name) {
                Some(value) => value,
                None => return Lookup::Undefined,
            },
            _ => return Lookup::Undefined,
        };
        for (idx, segment) in segments {
            let next = match (segment, current) {
                (_, Value::Null) => return Lookup::Undefined,
                (PathSegment::Field(name), Value::Object(map)) => map.get(name),
                (PathSegment::Index(index), Value::Array(items)) => items.get(*index),
                (PathSegment::Index(0), Value::String(_)) => Some(current),
                (PathSegment::Index(_), Value::String(_)) => None,
                (_, Value::Object(_) | Value::Array(_) | Value::String(_)) => {
                    return Lookup::Mismatched {
                        prefix: prefix_of(path, idx),
                        value: current,
                    };
                }
                (_, scalar) => {
                    return Lookup::Blocked {
                        prefix: prefix_of(path, idx),
                        value: scalar,
                    };
                }
            };
            match next {
                Some(value) => current = value,
                None => return Lookup::Undefined,
            }
        }
        if current.is_null() {
            Lookup::Undefined
        } else {
            Lookup::Found(current)
        }
    }

    /// The value at `path`, or `None` when it is undefined for any reason.
    pub fn get(&self, path: &FieldPath) -> Option<&Value> {
        match self.lookup(path) {
            Lookup::Found(value) => Some(value),
            Lookup::Undefined | Lookup::Mismatched { .. } | Lookup::Blocked { .. } => None,
        }
    }

    pub fn header(&self) -> LessonHeader {
        let text = |key: &str| {
            self.root
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        LessonHeader {
            teacher_name: text("teacherName"),
            grade_level: text("gradeLevel"),
            subject: text("subject"),
            quarter: text("quarter"),
            week_date: text("weekDate"),
            school: text("school"),
        }
    }

    /// Number of elements at `path`: a list's length, 1 for text, otherwise 0.
    pub fn list_len(&self, path: &FieldPath) -> usize {
        match self.lookup(path) {
            Lookup::Found(Value::Array(items)) => items.len(),
            Lookup::Found(Value::String(_)) => 1,
            _ => 0,
        }
    }

    /// Procedure steps supplied for `day`; empty when the day is absent.
    pub fn procedures(&self, day: Weekday) -> &[Value] {
        self.root
            .get(PROCEDURES_KEY)
            .and_then(|days| days.get(day.name()))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// Outcome of following a path.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<'a> {
    Found(&'a Value),
    /// Absent or `null`, including an index past the end of a list.
    Undefined,
    /// `prefix` holds a list, object or text addressed with the wrong segment kind.
    Mismatched { prefix: String, value: &'a Value },
    /// A step tried to descend into a number or a boolean.
    Blocked { prefix: String, value: &'a Value },
}

fn prefix_of(path: &FieldPath, len: usize) -> String {
    let mut prefix = String::new();
    for (idx, segment) in path.segments()[..len].iter().enumerate() {
        match segment {
            PathSegment::Field(name) if idx == 0 => prefix.push_str(name),
            PathSegment::Field(name) => {
                prefix.push('.');
                prefix.push_str(name);
            }
            PathSegment::Index(index) => prefix.push_str(&format!("[{index}]")),
        }
    }
    prefix
}

fn check_procedures(root: &Map<String, Value>) -> Result<(), FillError> {
    let days = match root.get(PROCEDURES_KEY) {
        None | Some(Value::Null) => return Ok(()),
        Some(Value::Object(days)) => days,
        Some(other) => {
            return Err(FillError::invalid_document(
                PROCEDURES_KEY,
                format!("expected an object keyed by weekday, got {}", describe(other)),
            ));
        }
    };
    for key in days.keys() {
        if !Weekday::ALL.iter().any(|day| day.name() == key) {
            return Err(FillError::invalid_document(
                format!("{PROCEDURES_KEY}.{key}"),
                "keys must be Monday, Tuesday, Wednesday, Thursday or Friday",
            ));
        }
    }
    Ok(())
}

/// Short description of a JSON value's shape for error messages.
pub(crate) fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(_) => "a boolean".to_string(),
        Value::Number(_) => "a number".to_string(),
        Value::String(_) => "text".to_string(),
        Value::Array(_) => "a list".to_string(),
        Value::Object(_) => "an object".to_string(),
    }
}

/// Header fields of a lesson log; missing fields are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LessonHeader {
    pub teacher_name: String,
    pub grade_level: String,
    pub subject: String,
    pub quarter: String,
    pub week_date: String,
    pub school: String,
}

impl LessonHeader {
    /// File name for a filled log, e.g. `DLL_Grade_6_Science.xlsx`.
    pub fn file_name(&self) -> String {
        let mut stem = String::from("DLL");
        for part in [&self.grade_level, &self.subject, &self.week_date] {
            let cleaned: String = part
                .split(|c: char| !c.is_alphanumeric())
                .filter(|piece| !piece.is_empty())
                .collect::<Vec<_>>()
                .join("_");
            if !cleaned.is_empty() {
                stem.push('_');
                stem.push_str(&cleaned);
            }
        }
        format!("{stem}.xlsx")
    }
}
