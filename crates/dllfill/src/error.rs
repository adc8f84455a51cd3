use dllfill_spec::ValidationError;
use dllfill_workbook::TemplateError;
use thiserror::Error;

use crate::day_block::{DayBlockRangeError, LayoutOverlapError};

#[derive(Debug, Error)]
pub enum FillError {
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error("lesson plan document is missing: {reason}")]
    MissingRequiredInput { reason: String },
    #[error("invalid lesson plan document at `{path}`: {message}")]
    InvalidDocument { path: String, message: String },
    /// `problem` reads as a predicate of `path`, e.g. "holds a number, expected text or a list of text".
    #[error("rule `{rule}`: `{path}` {problem}")]
    BindingType {
        rule: String,
        path: String,
        problem: String,
    },
    #[error("weekday layout is invalid: {0}")]
    LayoutOverlap(#[from] LayoutOverlapError),
    #[error("rule `{rule}`: {source}")]
    DayBlockOutOfRange {
        rule: String,
        source: DayBlockRangeError,
    },
    #[error(transparent)]
    InvalidBindingTable(#[from] ValidationError),
}

/// Stable, machine-readable classification of a [`FillError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FillErrorKind {
    TemplateNotFound,
    TemplateCorrupt,
    SheetNotFound,
    MissingRequiredInput,
    InvalidDocument,
    BindingType,
    LayoutOverlap,
    DayBlockOutOfRange,
    InvalidBindingTable,
    SerializationFailure,
    Io,
}

impl FillErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TemplateNotFound => "template_not_found",
            Self::TemplateCorrupt => "template_corrupt",
            Self::SheetNotFound => "sheet_not_found",
            Self::MissingRequiredInput => "missing_required_input",
            Self::InvalidDocument => "invalid_document",
            Self::BindingType => "binding_type",
            Self::LayoutOverlap => "layout_overlap",
            Self::DayBlockOutOfRange => "day_block_out_of_range",
            Self::InvalidBindingTable => "invalid_binding_table",
            Self::SerializationFailure => "serialization_failure",
            Self::Io => "io",
        }
    }
}

impl std::fmt::Display for FillErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FillError {
    pub fn kind(&self) -> FillErrorKind {
        match self {
            FillError::Template(err) => match err {
                TemplateError::TemplateNotFound { .. } => FillErrorKind::TemplateNotFound,
                TemplateError::TemplateCorrupt { .. } => FillErrorKind::TemplateCorrupt,
                TemplateError::SheetNotFound { .. } => FillErrorKind::SheetNotFound,
                TemplateError::Serialization { .. } => FillErrorKind::SerializationFailure,
                TemplateError::Io(_) => FillErrorKind::Io,
            },
            FillError::MissingRequiredInput { .. } => FillErrorKind::MissingRequiredInput,
            FillError::InvalidDocument { .. } => FillErrorKind::InvalidDocument,
            FillError::BindingType { .. } => FillErrorKind::BindingType,
            FillError::LayoutOverlap(_) => FillErrorKind::LayoutOverlap,
            FillError::DayBlockOutOfRange { .. } => FillErrorKind::DayBlockOutOfRange,
            FillError::InvalidBindingTable(_) => FillErrorKind::InvalidBindingTable,
        }
    }

    pub(crate) fn missing_input(reason: impl Into<String>) -> Self {
        FillError::MissingRequiredInput {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_document(path: impl Into<String>, message: impl Into<String>) -> Self {
        FillError::InvalidDocument {
            path: path.into(),
            message: message.into(),
        }
    }
}
