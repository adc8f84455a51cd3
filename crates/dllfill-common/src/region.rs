use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::a1::{A1ParseError, parse_region, parse_sheet_region};
use crate::coord::CellRef;

/// Rectangular block of cells, always stored with `start` above/left of `end`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Region {
    start: CellRef,
    end: CellRef,
}

impl Region {
    /// Build a region from any two corners.
    pub fn new(a: CellRef, b: CellRef) -> Self {
        let top = a.row().min(b.row());
        let bottom = a.row().max(b.row());
        let left = a.col().min(b.col());
        let right = a.col().max(b.col());
        // Corners come from valid cells, so every combination is on the grid.
        let start = CellRef::new(top, left).unwrap_or(a);
        let end = CellRef::new(bottom, right).unwrap_or(b);
        Self { start, end }
    }

    pub fn single(cell: CellRef) -> Self {
        Self {
            start: cell,
            end: cell,
        }
    }

    pub fn parse(text: &str) -> Result<Self, A1ParseError> {
        parse_region(text)
    }

    pub fn start(&self) -> CellRef {
        self.start
    }

    pub fn end(&self) -> CellRef {
        self.end
    }

    /// Top-left cell; values written to a merged region live here.
    pub fn anchor(&self) -> CellRef {
        self.start
    }

    pub fn is_single_cell(&self) -> bool {
        self.start == self.end
    }

    pub fn width(&self) -> u32 {
        self.end.col() - self.start.col() + 1
    }

    pub fn height(&self) -> u32 {
        self.end.row() - self.start.row() + 1
    }

    pub fn contains(&self, cell: CellRef) -> bool {
        cell.row() >= self.start.row()
            && cell.row() <= self.end.row()
            && cell.col() >= self.start.col()
            && cell.col() <= self.end.col()
    }

    pub fn intersects(&self, other: &Region) -> bool {
        self.start.row() <= other.end.row()
            && other.start.row() <= self.end.row()
            && self.start.col() <= other.end.col()
            && other.start.col() <= self.end.col()
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_single_cell() {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}:{}", self.start, self.end)
        }
    }
}

impl FromStr for Region {
    type Err = A1ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_region(s)
    }
}

impl From<CellRef> for Region {
    fn from(cell: CellRef) -> Self {
        Region::single(cell)
    }
}

/// Region optionally qualified by a sheet name, e.g. `'Week 1'!$C$5:$F$5`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct SheetRegion {
    pub sheet: Option<String>,
    pub region: Region,
}

impl SheetRegion {
    pub fn new(sheet: Option<String>, region: Region) -> Self {
        Self { sheet, region }
    }

    pub fn parse(text: &str) -> Result<Self, A1ParseError> {
        parse_sheet_region(text)
    }

    pub fn sheet(&self) -> Option<&str> {
        self.sheet.as_deref()
    }
}

impl fmt::Display for SheetRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(sheet) = &self.sheet {
            if sheet_name_needs_quoting(sheet) {
                write!(f, "'{}'!", sheet.replace('\'', "''"))?;
            } else {
                write!(f, "{sheet}!")?;
            }
        }
        write!(f, "{}", self.region)
    }
}

impl FromStr for SheetRegion {
    type Err = A1ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_sheet_region(s)
    }
}

/// Whether a sheet name must be wrapped in single quotes inside a reference.
pub fn sheet_name_needs_quoting(name: &str) -> bool {
    let Some(first) = name.chars().next() else {
        return false;
    };
    if first.is_ascii_digit() {
        return true;
    }
    name.chars()
        .any(|ch| !(ch.is_alphanumeric() || ch == '_' || ch == '.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(row: u32, col: u32) -> CellRef {
        CellRef::new(row, col).unwrap()
    }

    #[test]
    fn normalizes_corner_order() {
        let region = Region::new(cell(5, 6), cell(4, 3));
        assert_eq!(region.start(), cell(4, 3));
        assert_eq!(region.end(), cell(5, 6));
        assert_eq!(region.width(), 4);
        assert_eq!(region.height(), 2);
        assert_eq!(region.to_string(), "C4:F5");
    }

    #[test]
    fn intersection_is_symmetric() {
        let a = Region::new(cell(5, 3), cell(5, 6));
        let b = Region::new(cell(4, 6), cell(6, 8));
        let c = Region::new(cell(6, 3), cell(6, 4));
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
        assert!(!a.intersects(&c));
        assert!(a.contains(cell(5, 4)));
        assert!(!a.contains(cell(4, 4)));
    }

    #[test]
    fn display_quotes_sheet_names_when_needed() {
        let region = Region::new(cell(5, 3), cell(5, 6));
        let plain = SheetRegion::new(Some("DLL".into()), region);
        assert_eq!(plain.to_string(), "DLL!C5:F5");
        let spaced = SheetRegion::new(Some("Week 1".into()), region);
        assert_eq!(spaced.to_string(), "'Week 1'!C5:F5");
        let quoted = SheetRegion::new(Some("Teacher's Log".into()), Region::single(cell(1, 1)));
        assert_eq!(quoted.to_string(), "'Teacher''s Log'!A1");
    }
}
