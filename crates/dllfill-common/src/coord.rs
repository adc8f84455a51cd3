//! 1-based cell coordinates with the same limits as Excel: 1,048,576 rows by 16,384
//! columns. Templates, named ranges, and binding tables all speak in these units, so
//! there is no 0-based representation anywhere in the workspace.

use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::a1::{A1ParseError, parse_cell};

/// Largest row index accepted by the OOXML grid.
pub const MAX_ROW: u32 = 1_048_576;
/// Largest column index accepted by the OOXML grid (`XFD`).
pub const MAX_COL: u32 = 16_384;

/// Errors returned when constructing coordinates from unchecked inputs.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CoordError {
    ZeroRow,
    ZeroCol,
    RowOverflow(u64),
    ColOverflow(u64),
}

impl fmt::Display for CoordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordError::ZeroRow => write!(f, "row indices are 1-based; got 0"),
            CoordError::ZeroCol => write!(f, "column indices are 1-based; got 0"),
            CoordError::RowOverflow(row) => write!(f, "row {row} exceeds {MAX_ROW}"),
            CoordError::ColOverflow(col) => write!(f, "col {col} exceeds {MAX_COL}"),
        }
    }
}

impl std::error::Error for CoordError {}

/// Absolute grid coordinate (row, column), both 1-based.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct CellRef {
    row: u32,
    col: u32,
}

impl CellRef {
    /// Fallible constructor that reports out-of-grid values rather than panicking.
    pub fn new(row: u32, col: u32) -> Result<Self, CoordError> {
        if row == 0 {
            return Err(CoordError::ZeroRow);
        }
        if col == 0 {
            return Err(CoordError::ZeroCol);
        }
        if row > MAX_ROW {
            return Err(CoordError::RowOverflow(row as u64));
        }
        if col > MAX_COL {
            return Err(CoordError::ColOverflow(col as u64));
        }
        Ok(Self { row, col })
    }

    /// Parse an A1 reference such as `C5` or `$C$5`.
    pub fn parse(text: &str) -> Result<Self, A1ParseError> {
        parse_cell(text)
    }

    #[inline(always)]
    pub fn row(self) -> u32 {
        self.row
    }

    #[inline(always)]
    pub fn col(self) -> u32 {
        self.col
    }

    /// Same column, `rows` further down.
    pub fn down(self, rows: u32) -> Result<Self, CoordError> {
        let row = (self.row as u64) + (rows as u64);
        if row > MAX_ROW as u64 {
            return Err(CoordError::RowOverflow(row));
        }
        Self::new(row as u32, self.col)
    }

    /// Same row, moved to `col`.
    pub fn with_col(self, col: u32) -> Result<Self, CoordError> {
        Self::new(self.row, col)
    }

    /// `(col, row)` tuple in the order umya-spreadsheet expects.
    #[inline(always)]
    pub fn col_row(self) -> (u32, u32) {
        (self.col, self.row)
    }

    pub fn column_letters(self) -> String {
        column_to_letters(self.col)
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_to_letters(self.col), self.row)
    }
}

impl FromStr for CellRef {
    type Err = A1ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_cell(s)
    }
}

impl TryFrom<(u32, u32)> for CellRef {
    type Error = CoordError;

    /// Interprets the tuple as `(row, col)`.
    fn try_from(value: (u32, u32)) -> Result<Self, Self::Error> {
        Self::new(value.0, value.1)
    }
}

/// Convert a 1-based column index into letters (`1 -> A`, `27 -> AA`).
///
/// Returns an empty string for column 0.
pub fn column_to_letters(col: u32) -> String {
    if col == 0 {
        return String::new();
    }
    let mut col = col - 1;
    let mut buf = Vec::new();
    loop {
        let rem = (col % 26) as u8;
        buf.push(b'A' + rem);
        col /= 26;
        if col == 0 {
            break;
        }
        col -= 1;
    }
    buf.reverse();
    buf.into_iter().map(char::from).collect()
}

/// Convert column letters into a 1-based index. Letters are case-insensitive.
pub fn letters_to_column(letters: &str) -> Option<u32> {
    if letters.is_empty() {
        return None;
    }
    let mut col: u32 = 0;
    for ch in letters.bytes() {
        if !ch.is_ascii_alphabetic() {
            return None;
        }
        let val = (ch.to_ascii_uppercase() - b'A') as u32 + 1;
        col = col.checked_mul(26)?.checked_add(val)?;
    }
    if col > MAX_COL {
        return None;
    }
    Some(col)
}
