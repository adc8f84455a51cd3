//! Source paths into a lesson-plan document.
//!
//! Grammar: `ident ( '.' ident | '[' index ']' )*` where `ident` matches
//! `[A-Za-z_][A-Za-z0-9_-]*`. Examples: `teacherName`, `objectives[0]`,
//! `proceduresByDay.Monday[3]`, `generatedLesson.IV_Procedures[9]`.

use std::fmt;
use std::str::FromStr;

/// One step of a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Field(String),
    Index(usize),
}

/// Parsed source path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

/// Error returned for malformed source paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathParseError {
    pub path: String,
    pub position: usize,
    pub message: &'static str,
}

impl fmt::Display for PathParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid source path `{}` at byte {}: {}",
            self.path, self.position, self.message
        )
    }
}

impl std::error::Error for PathParseError {}

impl FieldPath {
    pub fn parse(text: &str) -> Result<Self, PathParseError> {
        let bytes = text.as_bytes();
        let err = |position: usize, message: &'static str| PathParseError {
            path: text.to_string(),
            position,
            message,
        };

        let mut segments = Vec::new();
        let mut pos = 0usize;
        let mut expect_field = true;

        if bytes.is_empty() {
            return Err(err(0, "path is empty"));
        }

        while pos < bytes.len() {
            if expect_field {
                let start = pos;
                if !(bytes[pos].is_ascii_alphabetic() || bytes[pos] == b'_') {
                    return Err(err(pos, "expected a field name"));
                }
                pos += 1;
                while pos < bytes.len()
                    && (bytes[pos].is_ascii_alphanumeric() || bytes[pos] == b'_' || bytes[pos] == b'-')
                {
                    pos += 1;
                }
                segments.push(PathSegment::Field(text[start..pos].to_string()));
                expect_field = false;
                continue;
            }

            match bytes[pos] {
                b'.' => {
                    pos += 1;
                    if pos == bytes.len() {
                        return Err(err(pos, "path ends with `.`"));
                    }
                    expect_field = true;
                }
                b'[' => {
                    let start = pos + 1;
                    let close = text[start..]
                        .find(']')
                        .map(|offset| start + offset)
                        .ok_or_else(|| err(pos, "unclosed `[`"))?;
                    let digits = &text[start..close];
                    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                        return Err(err(start, "index must be a non-negative integer"));
                    }
                    let index = digits
                        .parse::<usize>()
                        .map_err(|_| err(start, "index is too large"))?;
                    segments.push(PathSegment::Index(index));
                    pos = close + 1;
                }
                _ => return Err(err(pos, "expected `.` or `[`")),
            }
        }

        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Append a field segment.
    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.segments.push(PathSegment::Field(name.into()));
        self
    }

    /// Append an index segment.
    pub fn index(mut self, index: usize) -> Self {
        self.segments.push(PathSegment::Index(index));
        self
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Field(name) if idx == 0 => f.write_str(name)?,
                PathSegment::Field(name) => write!(f, ".{name}")?,
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

impl FromStr for FieldPath {
    type Err = PathParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldPath::parse(s)
    }
}
