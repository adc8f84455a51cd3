use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::backends::UmyaTemplate;
use crate::backends::umya::read_template_file;
use crate::error::TemplateError;
use crate::package;

/// Read-only template bytes shared by every fill.
///
/// Cloning is cheap. Each [`open`](TemplateSource::open) parses a fresh,
/// independently owned workbook, so concurrent fills never share mutable state.
#[derive(Clone, Debug)]
pub struct TemplateSource {
    bytes: Arc<[u8]>,
    origin: Option<PathBuf>,
}

impl TemplateSource {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self, TemplateError> {
        let bytes: Vec<u8> = bytes.into();
        package::probe(&bytes)?;
        Ok(Self {
            bytes: Arc::from(bytes),
            origin: None,
        })
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, TemplateError> {
        let path = path.as_ref();
        let mut source = Self::from_bytes(read_template_file(path)?)?;
        source.origin = Some(path.to_path_buf());
        Ok(source)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Path the bytes were read from, if any.
    pub fn origin(&self) -> Option<&Path> {
        self.origin.as_deref()
    }

    pub fn open(&self) -> Result<UmyaTemplate, TemplateError> {
        UmyaTemplate::open_bytes(&self.bytes)
    }
}
