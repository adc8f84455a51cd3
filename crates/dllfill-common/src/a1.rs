//! A1 reference parsing.
//!
//! Accepts the forms that show up in templates and binding tables:
//!
//! - bare cells and ranges: `C5`, `$C$5`, `C5:F5`
//! - sheet-qualified references: `DLL!C5`, `'Week 1'!$C$5:$F$5` (`''` escapes a quote)
//! - defined-name formulas with several areas: `=DLL!$C$5,DLL!$C$40`
//!
//! Whole-row/column references and formulas are rejected; callers decide whether that
//! is fatal.

use std::fmt;

use crate::coord::{CellRef, CoordError, letters_to_column};
use crate::region::{Region, SheetRegion};

/// Errors produced while parsing A1 text.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum A1ParseError {
    Empty,
    InvalidCell(String),
    InvalidRange(String),
    UnterminatedQuote(String),
    EmptySheetName(String),
    Coord(CoordError),
}

impl fmt::Display for A1ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            A1ParseError::Empty => write!(f, "empty reference"),
            A1ParseError::InvalidCell(text) => write!(f, "`{text}` is not an A1 cell reference"),
            A1ParseError::InvalidRange(text) => write!(f, "`{text}` is not an A1 range"),
            A1ParseError::UnterminatedQuote(text) => {
                write!(f, "unterminated quoted sheet name in `{text}`")
            }
            A1ParseError::EmptySheetName(text) => write!(f, "empty sheet name in `{text}`"),
            A1ParseError::Coord(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for A1ParseError {}

impl From<CoordError> for A1ParseError {
    fn from(value: CoordError) -> Self {
        A1ParseError::Coord(value)
    }
}

/// Parse a single cell such as `C5` or `$C$5`.
pub fn parse_cell(input: &str) -> Result<CellRef, A1ParseError> {
    let text = input.trim();
    if text.is_empty() {
        return Err(A1ParseError::Empty);
    }
    let invalid = || A1ParseError::InvalidCell(text.to_string());

    let body = text.strip_prefix('$').unwrap_or(text);
    let split = body
        .find(|ch: char| !ch.is_ascii_alphabetic())
        .ok_or_else(invalid)?;
    let (letters, rest) = body.split_at(split);
    let digits = rest.strip_prefix('$').unwrap_or(rest);
    if letters.is_empty() || digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let col = letters_to_column(letters).ok_or_else(invalid)?;
    let row: u32 = digits.parse().map_err(|_| invalid())?;
    Ok(CellRef::new(row, col)?)
}

/// Parse a cell or a `start:end` range without a sheet prefix.
pub fn parse_region(input: &str) -> Result<Region, A1ParseError> {
    let text = input.trim();
    if text.is_empty() {
        return Err(A1ParseError::Empty);
    }
    match text.split_once(':') {
        None => Ok(Region::single(parse_cell(text)?)),
        Some((start, end)) => {
            if end.contains(':') {
                return Err(A1ParseError::InvalidRange(text.to_string()));
            }
            let start =
                parse_cell(start).map_err(|_| A1ParseError::InvalidRange(text.to_string()))?;
            let end = parse_cell(end).map_err(|_| A1ParseError::InvalidRange(text.to_string()))?;
            Ok(Region::new(start, end))
        }
    }
}

/// Parse a region with an optional sheet prefix. A leading `=` is ignored.
pub fn parse_sheet_region(input: &str) -> Result<SheetRegion, A1ParseError> {
    let text = input.trim();
    let text = text.strip_prefix('=').unwrap_or(text).trim();
    if text.is_empty() {
        return Err(A1ParseError::Empty);
    }

    if let Some(quoted) = text.strip_prefix('\'') {
        let (sheet, consumed) = read_quoted_sheet(quoted)
            .ok_or_else(|| A1ParseError::UnterminatedQuote(text.to_string()))?;
        let rest = &quoted[consumed..];
        let region_text = rest
            .strip_prefix('!')
            .ok_or_else(|| A1ParseError::InvalidRange(text.to_string()))?;
        if sheet.is_empty() {
            return Err(A1ParseError::EmptySheetName(text.to_string()));
        }
        return Ok(SheetRegion::new(Some(sheet), parse_region(region_text)?));
    }

    match text.split_once('!') {
        Some((sheet, region_text)) => {
            let sheet = sheet.trim();
            if sheet.is_empty() {
                return Err(A1ParseError::EmptySheetName(text.to_string()));
            }
            Ok(SheetRegion::new(
                Some(sheet.to_string()),
                parse_region(region_text)?,
            ))
        }
        None => Ok(SheetRegion::new(None, parse_region(text)?)),
    }
}

/// Parse a comma-separated list of areas, as stored in a defined name.
pub fn parse_area_list(input: &str) -> Result<Vec<SheetRegion>, A1ParseError> {
    let text = input.trim();
    let text = text.strip_prefix('=').unwrap_or(text).trim();
    if text.is_empty() {
        return Err(A1ParseError::Empty);
    }

    let mut areas = Vec::new();
    let mut start = 0usize;
    let mut in_quotes = false;
    for (idx, ch) in text.char_indices() {
        match ch {
            '\'' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                areas.push(parse_sheet_region(&text[start..idx])?);
                start = idx + 1;
            }
            _ => {}
        }
    }
    if in_quotes {
        return Err(A1ParseError::UnterminatedQuote(text.to_string()));
    }
    areas.push(parse_sheet_region(&text[start..])?);
    Ok(areas)
}

/// Read a quoted sheet name (opening quote already stripped). Returns the unescaped
/// name and the number of bytes consumed including the closing quote.
fn read_quoted_sheet(text: &str) -> Option<(String, usize)> {
    let mut name = String::new();
    let mut chars = text.char_indices().peekable();
    while let Some((idx, ch)) = chars.next() {
        if ch == '\'' {
            if let Some((_, '\'')) = chars.peek() {
                name.push('\'');
                chars.next();
                continue;
            }
            return Some((name, idx + 1));
        }
        name.push(ch);
    }
    None
}
