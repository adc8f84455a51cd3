use dllfill_common::{CellRef, Region, SheetLocator, SheetRef};

/// Where a defined name is visible.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum NameScope {
    Workbook,
    Sheet(String),
}

/// A defined name exactly as stored in the template.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DefinedNameEntry {
    pub name: String,
    pub scope: NameScope,
    /// Raw reference text, e.g. `DLL!$C$5:$F$5`.
    pub definition: String,
}

/// One physical area a named range points at.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct NamedArea {
    pub sheet: SheetRef,
    pub region: Region,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MergeOutcome {
    Created,
    /// The identical region was already merged.
    AlreadyMerged,
    /// A different merged region overlaps; nothing was changed.
    Conflict { existing: Region },
}

/// Read side of a template backend.
pub trait TemplateReader {
    type Error: std::error::Error + Send + Sync + 'static;

    fn sheet_names(&self) -> Vec<String>;

    fn resolve_sheet(&self, locator: &SheetLocator<'_>) -> Result<SheetRef, Self::Error>;

    /// All areas bound to `name`; empty when the name is undefined or unusable.
    fn resolve_named_range(&self, name: &str) -> Vec<NamedArea>;

    fn defined_names(&self) -> Vec<DefinedNameEntry>;

    fn merged_regions(&self, sheet: &SheetRef) -> Result<Vec<Region>, Self::Error>;

    /// Displayed text of a cell; empty for blank or missing cells.
    fn read_text(&self, sheet: &SheetRef, cell: CellRef) -> Result<String, Self::Error>;
}

/// Write side of a template backend.
pub trait TemplateWriter: TemplateReader {
    /// Write `text` into `cell` (blank when empty) with wrap + top alignment.
    fn write_text(&mut self, sheet: &SheetRef, cell: CellRef, text: &str)
    -> Result<(), Self::Error>;

    /// Merge `region` unless it or an overlapping region is already merged.
    fn merge(&mut self, sheet: &SheetRef, region: Region) -> Result<MergeOutcome, Self::Error>;

    /// Serialize the workbook into a deterministic xlsx package.
    fn save_to_bytes(&self) -> Result<Vec<u8>, Self::Error>;
}
