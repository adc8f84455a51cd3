//! Binding tables for filling Daily Lesson Log spreadsheet templates.
//!
//! A [`BindingTable`] maps document paths (`teacherName`, `objectives[0]`,
//! `proceduresByDay.Monday[3]`) onto named ranges, literal cells, or weekday row
//! blocks. Tables are authored in YAML or JSON and validated before use.

pub mod bundled;
pub mod manifest;
pub mod path;
pub mod schema;
pub mod validation;
pub mod weekday;

pub use bundled::{BundledTable, legacy_table, weekly_table};
pub use manifest::{
    BindingRule, BindingTable, CURRENT_SPEC_VERSION, CellTarget, DayBlockDescriptor,
    DayBlockExpansion, DayBlockTarget, LayoutDescriptor, NameTarget, SPEC_IDENT, SpecVersion,
    TableMeta, Target, TargetKind, Transform,
};
pub use path::{FieldPath, PathParseError, PathSegment};
pub use schema::{generate_schema_json_pretty, generate_schema_value};
pub use validation::{BindingIssue, ValidationError};
pub use weekday::{UnknownWeekday, Weekday, step_letter};
