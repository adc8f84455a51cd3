use dllfill_common::{Region, letters_to_column, parse_sheet_region};
use dllfill_spec::{
    BindingIssue, BindingRule, BindingTable, FieldPath, Target, Transform, ValidationError,
    Weekday,
};

use crate::day_block::WeekdayBlockLayout;
use crate::error::FillError;

/// Validated binding table with rules expanded and targets parsed.
#[derive(Debug, Clone)]
pub struct BoundTable {
    table: BindingTable,
    layout: Option<BoundLayout>,
    rules: Vec<BoundRule>,
}

impl BoundTable {
    /// Check layout geometry, validate, expand day blocks, and bind every rule.
    pub fn new(table: BindingTable) -> Result<Self, FillError> {
        // geometry first so a misconfigured stride surfaces as a layout error
        let layout = match &table.layout {
            Some(descriptor) => Some(BoundLayout {
                sheet: descriptor.sheet.clone(),
                column: column_number(&descriptor.column, "layout.column")?,
                blocks: WeekdayBlockLayout::new(
                    descriptor.base_row,
                    descriptor.stride,
                    descriptor.step_count,
                )?,
            }),
            None => None,
        };
        table.validate()?;

        let rules = table
            .expanded_rules()
            .iter()
            .enumerate()
            .map(|(index, rule)| BoundRule::bind(index, rule, layout.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(table = %table.table.id, rules = rules.len(), "bound binding table");
        Ok(Self {
            table,
            layout,
            rules,
        })
    }

    pub fn table(&self) -> &BindingTable {
        &self.table
    }

    pub fn layout(&self) -> Option<&BoundLayout> {
        self.layout.as_ref()
    }

    /// Bound rules in application order.
    pub fn rules(&self) -> &[BoundRule] {
        &self.rules
    }

    pub fn get(&self, id: &str) -> Option<&BoundRule> {
        self.rules.iter().find(|rule| rule.id == id)
    }
}

/// Weekday block layout with its sheet and column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundLayout {
    /// `None` means the first sheet.
    pub sheet: Option<String>,
    /// 1-based column of the step cells.
    pub column: u32,
    pub blocks: WeekdayBlockLayout,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundRule {
    pub index: usize,
    pub id: String,
    pub source: FieldPath,
    /// Tried in order when `source` addresses a list or object the wrong way.
    pub fallbacks: Vec<FieldPath>,
    pub transform: Transform,
    pub target: BoundTarget,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoundTarget {
    Name(String),
    /// Literal address; a multi-cell region is also the merge span.
    Cell {
        sheet: Option<String>,
        region: Region,
    },
    DayBlock {
        day: Weekday,
        step: u32,
        column: u32,
    },
}

impl BoundRule {
    fn bind(
        index: usize,
        rule: &BindingRule,
        layout: Option<&BoundLayout>,
    ) -> Result<Self, FillError> {
        let source = FieldPath::parse(&rule.source)
            .map_err(|err| invalid(format!("rules.{}.source", rule.id), err.to_string()))?;
        let fallbacks = rule
            .fallbacks
            .iter()
            .map(|path| {
                FieldPath::parse(path).map_err(|err| {
                    invalid(format!("rules.{}.fallbacks", rule.id), err.to_string())
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let target = match &rule.target {
            Target::Name(target) => BoundTarget::Name(target.name.clone()),
            Target::Cell(target) => {
                let parsed = parse_sheet_region(&target.a1)
                    .map_err(|err| invalid(format!("rules.{}.target.a1", rule.id), err.to_string()))?;
                BoundTarget::Cell {
                    sheet: parsed.sheet,
                    region: parsed.region,
                }
            }
            Target::DayBlock(target) => {
                let descriptor = &target.day_block;
                let column = match (&descriptor.column, layout) {
                    (Some(column), _) => {
                        column_number(column, &format!("rules.{}.target.day_block.column", rule.id))?
                    }
                    (None, Some(layout)) => layout.column,
                    (None, None) => {
                        return Err(invalid(
                            format!("rules.{}.target.day_block", rule.id),
                            "day_block targets require a `layout` section",
                        ));
                    }
                };
                BoundTarget::DayBlock {
                    day: descriptor.day,
                    step: descriptor.step,
                    column,
                }
            }
        };
        Ok(Self {
            index,
            id: rule.id.clone(),
            source,
            fallbacks,
            transform: rule.transform,
            target,
        })
    }
}

fn column_number(letters: &str, path: &str) -> Result<u32, FillError> {
    letters_to_column(letters.trim())
        .ok_or_else(|| invalid(path, format!("`{letters}` is not a column letter reference")))
}

pub(crate) fn invalid(path: impl Into<String>, message: impl Into<String>) -> FillError {
    FillError::InvalidBindingTable(ValidationError::new(vec![BindingIssue::new(path, message)]))
}
