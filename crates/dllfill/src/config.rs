use std::path::{Path, PathBuf};

use dllfill_spec::{BindingTable, legacy_table, weekly_table};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::document::LessonHeader;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read `{}`: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse `{}`: {message}", path.display())]
    Parse { path: PathBuf, message: String },
    #[error("no template configured (pass --template, set DLLFILL_TEMPLATE, or add `template` to the config file)")]
    MissingTemplate,
    #[error("`bindings` and `legacy` are mutually exclusive")]
    ConflictingBindings,
    #[error("bundled binding table is malformed: {0}")]
    Bundled(#[from] serde_yaml::Error),
}

/// Where a fill gets its template, bindings, and output location.
///
/// Sources are layered with [`FillConfig::merge`]: config file, then
/// environment, then command-line flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FillConfig {
    pub template: Option<PathBuf>,
    /// YAML or JSON binding table; the bundled weekly table when unset.
    pub bindings: Option<PathBuf>,
    /// Use the bundled `generatedLesson` table.
    pub legacy: bool,
    /// Directory for outputs named after the lesson header.
    pub output_dir: Option<PathBuf>,
}

impl FillConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = read(path)?;
        Self::from_yaml_str(&text).map_err(|err| ConfigError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
    }

    /// Overlay `other` on `self`; values set in `other` win.
    pub fn merge(self, other: FillConfig) -> FillConfig {
        FillConfig {
            template: other.template.or(self.template),
            bindings: other.bindings.or(self.bindings),
            legacy: other.legacy || self.legacy,
            output_dir: other.output_dir.or(self.output_dir),
        }
    }

    pub fn template_path(&self) -> Result<&Path, ConfigError> {
        self.template.as_deref().ok_or(ConfigError::MissingTemplate)
    }

    /// Load the configured binding table (not yet validated).
    pub fn binding_table(&self) -> Result<BindingTable, ConfigError> {
        match (&self.bindings, self.legacy) {
            (Some(_), true) => Err(ConfigError::ConflictingBindings),
            (Some(path), false) => load_binding_table(path),
            (None, true) => Ok(legacy_table()?),
            (None, false) => Ok(weekly_table()?),
        }
    }

    /// `output_dir/<header file name>`, when an output directory is configured.
    pub fn output_path(&self, header: &LessonHeader) -> Option<PathBuf> {
        self.output_dir
            .as_ref()
            .map(|dir| dir.join(header.file_name()))
    }
}

/// Read a binding table; `.json` files are parsed as JSON, anything else as YAML.
pub fn load_binding_table(path: &Path) -> Result<BindingTable, ConfigError> {
    let text = read(path)?;
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let parsed = if is_json {
        BindingTable::from_json_str(&text).map_err(|err| err.to_string())
    } else {
        BindingTable::from_yaml_str(&text).map_err(|err| err.to_string())
    };
    parsed.map_err(|message| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    })
}

fn read(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })
}
