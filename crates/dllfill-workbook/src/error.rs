use std::path::PathBuf;

use thiserror::Error;

/// Failures while loading, inspecting, or serializing a template workbook.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template `{}` does not exist", path.display())]
    TemplateNotFound { path: PathBuf },
    #[error("template is not a valid spreadsheet package: {message}")]
    TemplateCorrupt { message: String },
    #[error("sheet `{sheet}` not found in template")]
    SheetNotFound { sheet: String },
    #[error("failed to serialize workbook: {message}")]
    Serialization { message: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TemplateError {
    pub(crate) fn corrupt(message: impl ToString) -> Self {
        TemplateError::TemplateCorrupt {
            message: message.to_string(),
        }
    }

    pub(crate) fn serialization(message: impl ToString) -> Self {
        TemplateError::Serialization {
            message: message.to_string(),
        }
    }
}
