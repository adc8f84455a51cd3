//! Template loading for Daily Lesson Log fills.
//!
//! [`TemplateSource`] keeps the pristine template bytes; [`UmyaTemplate`] is the
//! mutable, per-fill workbook built on `umya-spreadsheet`. The
//! [`TemplateReader`]/[`TemplateWriter`] traits are the seam the fill engine
//! works against.

pub mod backends;
pub mod error;
pub mod package;
pub mod source;
pub mod traits;

pub use backends::UmyaTemplate;
pub use error::TemplateError;
pub use package::canonicalize;
pub use source::TemplateSource;
pub use traits::{
    DefinedNameEntry, MergeOutcome, NameScope, NamedArea, TemplateReader, TemplateWriter,
};

/// MIME type of the serialized workbook.
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
