//! Sheet-scoped addressing helpers.

use std::borrow::Cow;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::coord::CellRef;

/// Sheet locator that can carry either a 0-based position or a name.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum SheetLocator<'a> {
    Index(usize),
    Name(Cow<'a, str>),
}

impl<'a> SheetLocator<'a> {
    /// The first sheet in workbook order.
    pub const FIRST: SheetLocator<'static> = SheetLocator::Index(0);

    pub const fn from_index(index: usize) -> Self {
        SheetLocator::Index(index)
    }

    pub fn from_name(name: impl Into<Cow<'a, str>>) -> Self {
        SheetLocator::Name(name.into())
    }

    /// Name locator when `name` is present, otherwise the first sheet.
    pub fn name_or_first(name: Option<&'a str>) -> Self {
        match name {
            Some(name) => SheetLocator::from_name(name),
            None => SheetLocator::Index(0),
        }
    }

    pub const fn index(&self) -> Option<usize> {
        match self {
            SheetLocator::Index(idx) => Some(*idx),
            SheetLocator::Name(_) => None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            SheetLocator::Index(_) => None,
            SheetLocator::Name(name) => Some(name.as_ref()),
        }
    }

    /// Convert the locator into an owned `'static` form.
    pub fn into_owned(self) -> SheetLocator<'static> {
        match self {
            SheetLocator::Index(idx) => SheetLocator::Index(idx),
            SheetLocator::Name(name) => SheetLocator::Name(Cow::Owned(name.into_owned())),
        }
    }
}

impl fmt::Display for SheetLocator<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetLocator::Index(idx) => write!(f, "#{idx}"),
            SheetLocator::Name(name) => f.write_str(name),
        }
    }
}

impl From<usize> for SheetLocator<'_> {
    fn from(value: usize) -> Self {
        SheetLocator::from_index(value)
    }
}

impl<'a> From<&'a str> for SheetLocator<'a> {
    fn from(value: &'a str) -> Self {
        SheetLocator::from_name(value)
    }
}

impl From<String> for SheetLocator<'_> {
    fn from(value: String) -> Self {
        SheetLocator::from_name(value)
    }
}

/// A sheet as it exists in a loaded workbook: position plus name.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct SheetRef {
    pub index: usize,
    pub name: String,
}

impl SheetRef {
    pub fn new(index: usize, name: impl Into<String>) -> Self {
        Self {
            index,
            name: name.into(),
        }
    }
}

impl fmt::Display for SheetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Concrete cell on a concrete sheet.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct SheetCell {
    pub sheet: SheetRef,
    pub cell: CellRef,
}

impl fmt::Display for SheetCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}!{}", self.sheet.name, self.cell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locator_accessors() {
        let by_name = SheetLocator::from("DLL");
        assert_eq!(by_name.name(), Some("DLL"));
        assert_eq!(by_name.index(), None);

        let by_index = SheetLocator::from(2usize);
        assert_eq!(by_index.index(), Some(2));
        assert_eq!(by_index.to_string(), "#2");

        assert_eq!(SheetLocator::name_or_first(None), SheetLocator::FIRST);
    }

    #[test]
    fn owned_locator_keeps_name() {
        let owned = {
            let name = String::from("Week 1");
            SheetLocator::from_name(name.as_str()).into_owned()
        };
        assert_eq!(owned.name(), Some("Week 1"));
    }
}
