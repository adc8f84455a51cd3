//! Fill Daily Lesson Log spreadsheet templates from lesson-plan documents.
//!
//! A fill takes three inputs: template bytes ([`TemplateSource`]), a
//! [`LessonPlanDocument`], and a [`BoundTable`] built from a declarative
//! [`BindingTable`](dllfill_spec::BindingTable). Every fill works on its own
//! freshly loaded workbook, resolves all writes before touching it, and
//! serializes to deterministic xlsx bytes.
//!
//! ```no_run
//! use dllfill::{BoundTable, LessonPlanDocument, TemplateSource, render};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let source = TemplateSource::from_path("DLL_FORMAT.xlsx")?;
//! let bindings = BoundTable::new(dllfill_spec::weekly_table()?)?;
//! let document = LessonPlanDocument::from_json_str(r#"{"teacherName": "Jane Doe"}"#)?;
//! let rendered = render(&source, &document, &bindings)?;
//! std::fs::write("DLL_FINAL.xlsx", &rendered.bytes)?;
//! # Ok(())
//! # }
//! ```

pub mod binding;
pub mod config;
pub mod day_block;
pub mod document;
pub mod error;
pub mod location;
pub mod materializer;
pub mod report;
pub mod value;

use std::path::Path;

use dllfill_workbook::TemplateWriter;

pub use binding::{BoundLayout, BoundRule, BoundTable, BoundTarget};
pub use config::{ConfigError, FillConfig, load_binding_table};
pub use day_block::{DayBlockRangeError, LayoutOverlapError, WeekdayBlockLayout};
pub use document::{LessonHeader, LessonPlanDocument};
pub use error::{FillError, FillErrorKind};
pub use location::{ResolvedLocation, locate};
pub use report::{FillReport, FillStatus, FillWarning};
pub use dllfill_workbook::{TemplateSource, UmyaTemplate, XLSX_CONTENT_TYPE};

/// Parse template bytes into a fresh, exclusively owned handle.
pub fn load_template(bytes: impl Into<Vec<u8>>) -> Result<UmyaTemplate, FillError> {
    let bytes: Vec<u8> = bytes.into();
    Ok(UmyaTemplate::open_bytes(&bytes)?)
}

pub fn load_template_path<P: AsRef<Path>>(path: P) -> Result<UmyaTemplate, FillError> {
    Ok(UmyaTemplate::open_path(path)?)
}

/// Fill `handle` and hand it back with the fill report.
///
/// On error the handle is dropped; nothing partially filled escapes.
pub fn fill_template(
    mut handle: UmyaTemplate,
    document: &LessonPlanDocument,
    bindings: &BoundTable,
) -> Result<(UmyaTemplate, FillReport), FillError> {
    let report = materializer::fill(&mut handle, document, bindings)?;
    Ok((handle, report))
}

pub fn serialize(handle: &UmyaTemplate) -> Result<Vec<u8>, FillError> {
    Ok(handle.save_to_bytes()?)
}

/// Output of [`render`].
#[derive(Debug, Clone)]
pub struct Rendered {
    pub bytes: Vec<u8>,
    pub report: FillReport,
}

impl Rendered {
    pub fn content_type(&self) -> &'static str {
        XLSX_CONTENT_TYPE
    }
}

/// Load, fill, and serialize in one step.
pub fn render(
    source: &TemplateSource,
    document: &LessonPlanDocument,
    bindings: &BoundTable,
) -> Result<Rendered, FillError> {
    let handle = source.open()?;
    let (handle, report) = fill_template(handle, document, bindings)?;
    let bytes = serialize(&handle)?;
    Ok(Rendered { bytes, report })
}
