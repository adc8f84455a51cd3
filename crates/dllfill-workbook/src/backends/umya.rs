use std::io::{Cursor, Read};
use std::path::Path;

use dllfill_common::{CellRef, Region, SheetLocator, SheetRef, parse_area_list, parse_region};
use umya_spreadsheet::{Spreadsheet, VerticalAlignmentValues, Worksheet, reader::xlsx};

use crate::error::TemplateError;
use crate::package;
use crate::traits::{
    DefinedNameEntry, MergeOutcome, NameScope, NamedArea, TemplateReader, TemplateWriter,
};

/// A template workbook loaded into memory and owned by a single fill.
pub struct UmyaTemplate {
    book: Spreadsheet,
}

impl std::fmt::Debug for UmyaTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UmyaTemplate")
            .field("sheets", &self.sheet_names())
            .finish()
    }
}

impl UmyaTemplate {
    pub fn open_bytes(data: &[u8]) -> Result<Self, TemplateError> {
        package::probe(data)?;
        let book = xlsx::read_reader(Cursor::new(data), true).map_err(TemplateError::corrupt)?;
        if book.get_sheet_count() == 0 {
            return Err(TemplateError::corrupt("workbook has no sheets"));
        }
        Ok(Self { book })
    }

    pub fn open_path<P: AsRef<Path>>(path: P) -> Result<Self, TemplateError> {
        let data = read_template_file(path.as_ref())?;
        Self::open_bytes(&data)
    }

    pub fn open_reader<R: Read>(mut reader: R) -> Result<Self, TemplateError> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::open_bytes(&data)
    }

    /// Wrap an already-built workbook.
    pub fn from_spreadsheet(book: Spreadsheet) -> Self {
        Self { book }
    }

    pub fn spreadsheet(&self) -> &Spreadsheet {
        &self.book
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> Result<(), TemplateError> {
        let bytes = self.save_to_bytes()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    fn sheet(&self, sheet: &SheetRef) -> Result<&Worksheet, TemplateError> {
        self.book
            .get_sheet_by_name(&sheet.name)
            .ok_or_else(|| TemplateError::SheetNotFound {
                sheet: sheet.name.clone(),
            })
    }

    fn sheet_mut(&mut self, sheet: &SheetRef) -> Result<&mut Worksheet, TemplateError> {
        self.book
            .get_sheet_by_name_mut(&sheet.name)
            .ok_or_else(|| TemplateError::SheetNotFound {
                sheet: sheet.name.clone(),
            })
    }

    fn find_sheet(&self, name: &str) -> Option<SheetRef> {
        let sheets = self.book.get_sheet_collection();
        sheets
            .iter()
            .position(|ws| ws.get_name() == name)
            .or_else(|| {
                sheets
                    .iter()
                    .position(|ws| ws.get_name().eq_ignore_ascii_case(name))
            })
            .map(|index| SheetRef::new(index, sheets[index].get_name()))
    }
}

pub(crate) fn read_template_file(path: &Path) -> Result<Vec<u8>, TemplateError> {
    std::fs::read(path).map_err(|err| match err.kind() {
        std::io::ErrorKind::NotFound => TemplateError::TemplateNotFound {
            path: path.to_path_buf(),
        },
        _ => TemplateError::Io(err),
    })
}

impl TemplateReader for UmyaTemplate {
    type Error = TemplateError;

    fn sheet_names(&self) -> Vec<String> {
        self.book
            .get_sheet_collection()
            .iter()
            .map(|ws| ws.get_name().to_string())
            .collect()
    }

    fn resolve_sheet(&self, locator: &SheetLocator<'_>) -> Result<SheetRef, TemplateError> {
        let found = match locator {
            SheetLocator::Index(index) => self
                .book
                .get_sheet_collection()
                .get(*index)
                .map(|ws| SheetRef::new(*index, ws.get_name())),
            SheetLocator::Name(name) => self.find_sheet(name),
        };
        found.ok_or_else(|| TemplateError::SheetNotFound {
            sheet: locator.to_string(),
        })
    }

    fn resolve_named_range(&self, name: &str) -> Vec<NamedArea> {
        let mut areas: Vec<NamedArea> = Vec::new();
        for entry in self
            .defined_names()
            .into_iter()
            .filter(|entry| entry.name.eq_ignore_ascii_case(name))
        {
            let parsed = match parse_area_list(&entry.definition) {
                Ok(parsed) => parsed,
                Err(err) => {
                    tracing::debug!(
                        name = %entry.name,
                        definition = %entry.definition,
                        error = %err,
                        "defined name is not a plain reference"
                    );
                    continue;
                }
            };
            for area in parsed {
                let sheet_name = match (&area.sheet, &entry.scope) {
                    (Some(sheet), _) => Some(sheet.as_str()),
                    (None, NameScope::Sheet(owner)) => Some(owner.as_str()),
                    (None, NameScope::Workbook) => None,
                };
                let sheet = match sheet_name {
                    Some(sheet_name) => self.find_sheet(sheet_name),
                    None => self.resolve_sheet(&SheetLocator::FIRST).ok(),
                };
                let Some(sheet) = sheet else {
                    tracing::debug!(
                        name = %entry.name,
                        sheet = sheet_name.unwrap_or_default(),
                        "defined name refers to a missing sheet"
                    );
                    continue;
                };
                let area = NamedArea {
                    sheet,
                    region: area.region,
                };
                if !areas.contains(&area) {
                    areas.push(area);
                }
            }
        }
        areas
    }

    fn defined_names(&self) -> Vec<DefinedNameEntry> {
        let mut entries: Vec<DefinedNameEntry> = Vec::new();
        let mut push = |entry: DefinedNameEntry| {
            if !entries.contains(&entry) {
                entries.push(entry);
            }
        };
        for defined in self.book.get_defined_names() {
            push(DefinedNameEntry {
                name: defined.get_name().to_string(),
                scope: NameScope::Workbook,
                definition: defined.get_address(),
            });
        }
        for ws in self.book.get_sheet_collection() {
            for defined in ws.get_defined_names() {
                push(DefinedNameEntry {
                    name: defined.get_name().to_string(),
                    scope: NameScope::Sheet(ws.get_name().to_string()),
                    definition: defined.get_address(),
                });
            }
        }
        entries
    }

    fn merged_regions(&self, sheet: &SheetRef) -> Result<Vec<Region>, TemplateError> {
        let ws = self.sheet(sheet)?;
        let mut regions = Vec::new();
        for range in ws.get_merge_cells() {
            let text = range.get_range();
            match parse_region(&text) {
                Ok(region) => regions.push(region),
                Err(err) => {
                    tracing::debug!(sheet = %sheet.name, range = %text, error = %err, "skipping unreadable merge");
                }
            }
        }
        Ok(regions)
    }

    fn read_text(&self, sheet: &SheetRef, cell: CellRef) -> Result<String, TemplateError> {
        let ws = self.sheet(sheet)?;
        Ok(ws.get_value(cell.col_row()))
    }
}

impl TemplateWriter for UmyaTemplate {
    fn write_text(
        &mut self,
        sheet: &SheetRef,
        cell: CellRef,
        text: &str,
    ) -> Result<(), TemplateError> {
        let ws = self.sheet_mut(sheet)?;
        // umya addresses cells as (col, row)
        let target = ws.get_cell_mut(cell.col_row());
        if text.is_empty() {
            target.set_blank();
        } else {
            target.set_value_string(text);
        }
        let alignment = target.get_style_mut().get_alignment_mut();
        alignment.set_wrap_text(true);
        alignment.set_vertical(VerticalAlignmentValues::Top);
        Ok(())
    }

    fn merge(&mut self, sheet: &SheetRef, region: Region) -> Result<MergeOutcome, TemplateError> {
        let existing = self.merged_regions(sheet)?;
        if existing.contains(&region) {
            return Ok(MergeOutcome::AlreadyMerged);
        }
        if let Some(conflict) = existing.iter().find(|other| other.intersects(&region)) {
            return Ok(MergeOutcome::Conflict {
                existing: *conflict,
            });
        }
        self.sheet_mut(sheet)?.add_merge_cells(region.to_string());
        Ok(MergeOutcome::Created)
    }

    fn save_to_bytes(&self) -> Result<Vec<u8>, TemplateError> {
        let mut buf = Cursor::new(Vec::new());
        umya_spreadsheet::writer::xlsx::write_writer(&self.book, &mut buf)
            .map_err(TemplateError::serialization)?;
        package::canonicalize(&buf.into_inner())
    }
}
