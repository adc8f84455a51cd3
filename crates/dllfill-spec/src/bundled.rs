//! Binding tables shipped with the crate.

use crate::manifest::BindingTable;

/// Weekly DLL layout: header names plus procedures A-J per weekday in row blocks.
pub const WEEKLY_YAML: &str = include_str!("tables/dll_weekly.yaml");
/// Single-day `generatedLesson` payload written into `proc_A_review`..`proc_J_remediation`.
pub const LEGACY_YAML: &str = include_str!("tables/dll_legacy.yaml");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BundledTable {
    Weekly,
    Legacy,
}

impl BundledTable {
    pub fn yaml(self) -> &'static str {
        match self {
            BundledTable::Weekly => WEEKLY_YAML,
            BundledTable::Legacy => LEGACY_YAML,
        }
    }

    pub fn load(self) -> Result<BindingTable, serde_yaml::Error> {
        BindingTable::from_yaml_str(self.yaml())
    }
}

pub fn weekly_table() -> Result<BindingTable, serde_yaml::Error> {
    BundledTable::Weekly.load()
}

pub fn legacy_table() -> Result<BindingTable, serde_yaml::Error> {
    BundledTable::Legacy.load()
}
