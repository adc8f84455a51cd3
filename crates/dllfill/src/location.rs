use dllfill_common::{CellRef, Region, SheetLocator, SheetRef};
use dllfill_workbook::TemplateReader;

use crate::binding::{BoundLayout, BoundRule, BoundTarget, invalid};
use crate::day_block::DayBlockRangeError;
use crate::error::FillError;

/// Concrete write position for one rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLocation {
    pub sheet: SheetRef,
    pub cell: CellRef,
    /// Region to merge around `cell`, when the target spans several cells.
    pub merge_span: Option<Region>,
}

impl ResolvedLocation {
    fn from_region(sheet: SheetRef, region: Region) -> Self {
        Self {
            sheet,
            cell: region.anchor(),
            merge_span: (!region.is_single_cell()).then_some(region),
        }
    }
}

/// Where `rule` writes in `template`. Reads only.
///
/// Named ranges yield one location per area and nothing when the name is
/// undefined. Literal cells and day blocks yield exactly one location.
pub fn locate<T>(
    template: &T,
    rule: &BoundRule,
    layout: Option<&BoundLayout>,
) -> Result<Vec<ResolvedLocation>, FillError>
where
    T: TemplateReader,
    FillError: From<T::Error>,
{
    match &rule.target {
        BoundTarget::Name(name) => Ok(template
            .resolve_named_range(name)
            .into_iter()
            .map(|area| ResolvedLocation::from_region(area.sheet, area.region))
            .collect()),
        BoundTarget::Cell { sheet, region } => {
            let sheet = template.resolve_sheet(&SheetLocator::name_or_first(sheet.as_deref()))?;
            Ok(vec![ResolvedLocation::from_region(sheet, *region)])
        }
        BoundTarget::DayBlock { day, step, column } => {
            let layout = layout.ok_or_else(|| {
                invalid(
                    format!("rules.{}.target.day_block", rule.id),
                    "day_block targets require a `layout` section",
                )
            })?;
            let row = layout
                .blocks
                .row_for_day(*day, *step)
                .map_err(|source| FillError::DayBlockOutOfRange {
                    rule: rule.id.clone(),
                    source,
                })?;
            let sheet =
                template.resolve_sheet(&SheetLocator::name_or_first(layout.sheet.as_deref()))?;
            let cell = CellRef::new(row, *column).map_err(|err| FillError::DayBlockOutOfRange {
                rule: rule.id.clone(),
                source: DayBlockRangeError::Cell(err),
            })?;
            Ok(vec![ResolvedLocation {
                sheet,
                cell,
                merge_span: None,
            }])
        }
    }
}
