//! Zip container checks and canonical re-packing of xlsx output.

use std::io::{Cursor, Read, Write};

use zip::write::FileOptions;
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter};

use crate::error::TemplateError;

const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

/// Cheap structural check run before handing bytes to the workbook parser.
pub(crate) fn probe(bytes: &[u8]) -> Result<(), TemplateError> {
    if bytes.is_empty() {
        return Err(TemplateError::corrupt("byte stream is empty"));
    }
    let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(TemplateError::corrupt)?;
    if archive.by_name(CONTENT_TYPES_PART).is_err() {
        return Err(TemplateError::corrupt(format!(
            "package has no {CONTENT_TYPES_PART} part"
        )));
    }
    Ok(())
}

/// Re-emit every entry in its original order with a fixed timestamp so equal
/// workbook content always produces equal bytes.
pub fn canonicalize(bytes: &[u8]) -> Result<Vec<u8>, TemplateError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(TemplateError::serialization)?;
    let mut writer = ZipWriter::new(Cursor::new(Vec::with_capacity(bytes.len())));
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default());

    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(TemplateError::serialization)?;
        let name = entry.name().to_string();
        if entry.is_dir() {
            writer
                .add_directory(name, options)
                .map_err(TemplateError::serialization)?;
            continue;
        }
        let mut data = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut data)?;
        writer
            .start_file(name, options)
            .map_err(TemplateError::serialization)?;
        writer.write_all(&data)?;
    }

    let cursor = writer.finish().map_err(TemplateError::serialization)?;
    Ok(cursor.into_inner())
}
