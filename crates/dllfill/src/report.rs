use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FillStatus {
    Complete,
    CompletedWithWarnings,
}

impl FillStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::CompletedWithWarnings => "completed_with_warnings",
        }
    }
}

/// Something a fill recovered from locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FillWarning {
    /// The rule's named range is not defined in the template; the rule was skipped.
    MissingNamedRange { rule: String, name: String },
    /// The requested merge overlaps an existing merged region; only the anchor was written.
    MergeConflict {
        rule: String,
        sheet: String,
        requested: String,
        existing: String,
    },
    /// The rule's path addressed a list, object or text the wrong way and no
    /// fallback matched; the target was written empty.
    ShapeMismatch {
        rule: String,
        path: String,
        prefix: String,
        found: String,
    },
    /// A weekday supplied more steps than its block holds; the extra steps were not written.
    StepsDropped {
        source: String,
        supplied: usize,
        capacity: u32,
    },
}

impl std::fmt::Display for FillWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FillWarning::MissingNamedRange { rule, name } => {
                write!(f, "rule `{rule}`: named range `{name}` is not defined")
            }
            FillWarning::MergeConflict {
                rule,
                sheet,
                requested,
                existing,
            } => write!(
                f,
                "rule `{rule}`: {sheet}!{requested} overlaps merged region {existing}; left unmerged"
            ),
            FillWarning::ShapeMismatch {
                rule,
                path,
                prefix,
                found,
            } => write!(
                f,
                "rule `{rule}`: `{prefix}` is {found}, so `{path}` matched nothing; left empty"
            ),
            FillWarning::StepsDropped {
                source,
                supplied,
                capacity,
            } => write!(
                f,
                "`{source}` has {supplied} steps but the block holds {capacity}; steps past {capacity} were not written"
            ),
        }
    }
}

/// Summary of one fill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FillReport {
    pub status: FillStatus,
    pub rules_total: usize,
    pub rules_applied: usize,
    pub rules_skipped: usize,
    pub cells_written: usize,
    pub merges_created: usize,
    pub warnings: Vec<FillWarning>,
}

impl Default for FillReport {
    fn default() -> Self {
        Self {
            status: FillStatus::Complete,
            rules_total: 0,
            rules_applied: 0,
            rules_skipped: 0,
            cells_written: 0,
            merges_created: 0,
            warnings: Vec::new(),
        }
    }
}

impl FillReport {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub(crate) fn push_warning(&mut self, warning: FillWarning) {
        tracing::warn!(%warning, "fill warning");
        self.warnings.push(warning);
        self.status = FillStatus::CompletedWithWarnings;
    }

    /// Names of the rules skipped for a missing named range.
    pub fn missing_names(&self) -> impl Iterator<Item = &str> {
        self.warnings.iter().filter_map(|warning| match warning {
            FillWarning::MissingNamedRange { name, .. } => Some(name.as_str()),
            _ => None,
        })
    }
}
