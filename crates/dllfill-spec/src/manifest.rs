use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;

use dllfill_common::{MAX_ROW, letters_to_column, parse_sheet_region};
use once_cell::sync::Lazy;
use regex::Regex;
use schemars::JsonSchema;
use semver::Version;
use serde::de::{self, Deserializer, Visitor};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::path::FieldPath;
use crate::validation::{BindingIssue, ValidationError};
use crate::weekday::{Weekday, step_letter};

/// Current supported binding table version.
pub const CURRENT_SPEC_VERSION: &str = "1.0.0";
/// Constant identifier for this spec.
pub const SPEC_IDENT: &str = "dll";

static TABLE_ID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9][a-z0-9-]{1,62}[a-z0-9]$").expect("table id regex must compile")
});
static RULE_ID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9]+([_.-][a-z0-9]+)*$").expect("rule id regex must compile")
});
static DEFINED_NAME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_\\][A-Za-z0-9_.\\]*$").expect("defined name regex must compile")
});

/// Declarative mapping from a lesson-plan document onto a spreadsheet template.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[schemars(
    title = "Daily Lesson Log binding table",
    description = "Binds lesson-plan document fields to named ranges, literal cells, and weekday row blocks of a spreadsheet template."
)]
#[serde(deny_unknown_fields)]
pub struct BindingTable {
    /// Manifest kind; must be `dll`.
    pub spec: String,
    pub spec_version: SpecVersion,
    /// Human-facing metadata describing the table.
    pub table: TableMeta,
    /// Weekly row layout used by day-block targets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<LayoutDescriptor>,
    /// Rules generated per (weekday, step) from a per-day list in the document.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub day_blocks: Vec<DayBlockExpansion>,
    /// Ordered binding rules.
    #[serde(default)]
    pub rules: Vec<BindingRule>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct TableMeta {
    /// Lowercase, hyphenated identifier (3-64 chars).
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// File name of the template this table was authored against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
}

/// Repeating per-weekday row blocks: day `d`, step `s` lands on
/// `base_row + d * stride + s` in `column`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct LayoutDescriptor {
    /// Sheet holding the blocks; the first sheet when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet: Option<String>,
    /// Column letters of the step cells (e.g. `C`).
    pub column: String,
    /// Row of Monday's first step.
    pub base_row: u32,
    /// Distance in rows between the first steps of consecutive days.
    pub stride: u32,
    /// Steps per day (A..J is 10).
    pub step_count: u32,
}

/// A single document-field-to-template binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct BindingRule {
    pub id: String,
    pub target: Target,
    /// Dotted/indexed path into the document (e.g. `objectives[0]`).
    pub source: String,
    /// Paths tried in order when `source` addresses a list or object the wrong way
    /// (e.g. `objectives.content` when `objectives` is an object of named standards).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fallbacks: Vec<String>,
    #[serde(default)]
    pub transform: Transform,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl BindingRule {
    pub fn new(id: impl Into<String>, target: Target, source: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            target,
            source: source.into(),
            fallbacks: Vec::new(),
            transform: Transform::Identity,
            description: None,
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_fallback(mut self, path: impl Into<String>) -> Self {
        self.fallbacks.push(path.into());
        self
    }
}

/// Where a rule writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum Target {
    Name(NameTarget),
    Cell(CellTarget),
    DayBlock(DayBlockTarget),
}

impl Target {
    pub fn name(name: impl Into<String>) -> Self {
        Target::Name(NameTarget { name: name.into() })
    }

    pub fn cell(a1: impl Into<String>) -> Self {
        Target::Cell(CellTarget { a1: a1.into() })
    }

    pub fn day_block(day: Weekday, step: u32) -> Self {
        Target::DayBlock(DayBlockTarget {
            day_block: DayBlockDescriptor {
                day,
                step,
                column: None,
            },
        })
    }

    pub fn kind(&self) -> TargetKind {
        match self {
            Target::Name(_) => TargetKind::NamedRange,
            Target::Cell(_) => TargetKind::CellAddress,
            Target::DayBlock(_) => TargetKind::DayBlockCell,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Name(target) => write!(f, "name:{}", target.name),
            Target::Cell(target) => write!(f, "a1:{}", target.a1),
            Target::DayBlock(target) => write!(
                f,
                "day_block:{}[{}]",
                target.day_block.day.key(),
                target.day_block.step
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    NamedRange,
    CellAddress,
    DayBlockCell,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct NameTarget {
    /// Defined name in the template.
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct CellTarget {
    /// `Sheet!C5`, `C5`, or a range such as `Sheet!C5:F5` (merged on write).
    pub a1: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct DayBlockTarget {
    pub day_block: DayBlockDescriptor,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct DayBlockDescriptor {
    pub day: Weekday,
    /// 0-based step index (A = 0).
    pub step: u32,
    /// Overrides the layout column.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
}

/// Expands into one day-block rule per (weekday, step), reading
/// `<source>.<Weekday>[<step>]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct DayBlockExpansion {
    pub id: String,
    /// Path of the weekday-keyed mapping (e.g. `proceduresByDay`).
    pub source: String,
    #[serde(default)]
    pub transform: Transform,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
}

/// Normalization applied to a resolved value before it is written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Transform {
    #[default]
    Identity,
    JoinLines,
    #[serde(alias = "trim_string")]
    Trim,
}

impl BindingTable {
    /// Empty table at the current spec version.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            spec: SPEC_IDENT.to_string(),
            spec_version: SpecVersion::current(),
            table: TableMeta {
                id: id.into(),
                name: name.into(),
                description: None,
                tags: None,
                template: None,
            },
            layout: None,
            day_blocks: Vec::new(),
            rules: Vec::new(),
        }
    }

    pub fn with_layout(mut self, layout: LayoutDescriptor) -> Self {
        self.layout = Some(layout);
        self
    }

    pub fn with_rule(mut self, rule: BindingRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn with_day_blocks(mut self, expansion: DayBlockExpansion) -> Self {
        self.day_blocks.push(expansion);
        self
    }

    /// Construct a table by reading YAML from any reader.
    pub fn from_yaml_reader<R: std::io::Read>(reader: R) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_reader(reader)
    }

    /// Construct a table from a YAML string slice.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize this table to YAML.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    /// Day-block expansions followed by the explicit rules, in declaration order.
    ///
    /// Explicit rules come last so they win when both write the same cell. Without a
    /// layout, expansions produce nothing (validation reports that case).
    pub fn expanded_rules(&self) -> Vec<BindingRule> {
        let mut out = Vec::new();
        if let Some(layout) = &self.layout {
            for expansion in &self.day_blocks {
                for day in Weekday::ALL {
                    for step in 0..layout.step_count {
                        out.push(expansion.rule_for(day, step));
                    }
                }
            }
        }
        out.extend(self.rules.iter().cloned());
        out
    }

    /// Validate the table and return granular issues when invariants fail.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.spec != SPEC_IDENT {
            issues.push(BindingIssue::new(
                "spec",
                format!(
                    "expected spec identifier `{}`, found `{}`",
                    SPEC_IDENT, self.spec
                ),
            ));
        }

        let current = SpecVersion::current();
        if self.spec_version.0.major != current.0.major {
            issues.push(BindingIssue::new(
                "spec_version",
                format!(
                    "incompatible major version `{}` (expected `{}`)",
                    self.spec_version.0, current.0.major
                ),
            ));
        }

        if !TABLE_ID_PATTERN.is_match(&self.table.id) {
            issues.push(BindingIssue::new(
                "table.id",
                "id must be lowercase alphanumeric with hyphens, 3-64 chars",
            ));
        }

        if let Some(layout) = &self.layout {
            validate_layout(layout, &mut issues);
        }

        let mut seen_ids: HashSet<Cow<'_, str>> = HashSet::new();

        for (idx, expansion) in self.day_blocks.iter().enumerate() {
            let base = format!("day_blocks[{idx}]");
            if !RULE_ID_PATTERN.is_match(&expansion.id) {
                issues.push(BindingIssue::new(
                    format!("{base}.id"),
                    "id must contain lowercase alphanumeric characters optionally separated by '-', '_' or '.'",
                ));
            }
            if let Err(err) = FieldPath::parse(&expansion.source) {
                issues.push(BindingIssue::new(format!("{base}.source"), err.to_string()));
            }
            if let Some(column) = &expansion.column {
                check_column(column, &format!("{base}.column"), &mut issues);
            }
            match &self.layout {
                None => issues.push(BindingIssue::new(
                    base.clone(),
                    "day_blocks require a `layout` section",
                )),
                Some(layout) => {
                    for day in Weekday::ALL {
                        for step in 0..layout.step_count {
                            let id = expansion.generated_id(day, step);
                            if !seen_ids.insert(Cow::Owned(id.clone())) {
                                issues.push(BindingIssue::new(
                                    format!("{base}.id"),
                                    format!("generated rule id `{id}` collides with another rule"),
                                ));
                            }
                        }
                    }
                }
            }
        }

        for (idx, rule) in self.rules.iter().enumerate() {
            let base = format!("rules[{idx}]");
            if !RULE_ID_PATTERN.is_match(&rule.id) {
                issues.push(BindingIssue::new(
                    format!("{base}.id"),
                    "id must contain lowercase alphanumeric characters optionally separated by '-', '_' or '.'",
                ));
            }
            if !seen_ids.insert(Cow::Borrowed(rule.id.as_str())) {
                issues.push(BindingIssue::new(
                    format!("{base}.id"),
                    format!("duplicate rule id `{}`", rule.id),
                ));
            }
            if let Err(err) = FieldPath::parse(&rule.source) {
                issues.push(BindingIssue::new(format!("{base}.source"), err.to_string()));
            }
            for (fidx, fallback) in rule.fallbacks.iter().enumerate() {
                if let Err(err) = FieldPath::parse(fallback) {
                    issues.push(BindingIssue::new(
                        format!("{base}.fallbacks[{fidx}]"),
                        err.to_string(),
                    ));
                }
            }
            validate_target(&rule.target, self.layout.as_ref(), &base, &mut issues);
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(issues))
        }
    }
}

impl DayBlockExpansion {
    fn generated_id(&self, day: Weekday, step: u32) -> String {
        match step_letter(step) {
            Some(letter) => format!("{}.{}.{}", self.id, day.key(), letter.to_ascii_lowercase()),
            None => format!("{}.{}.{}", self.id, day.key(), step),
        }
    }

    /// Path of one weekday's step list, e.g. `proceduresByDay.Monday`.
    pub fn day_source(&self, day: Weekday) -> String {
        format!("{}.{}", self.source, day.name())
    }

    /// Concrete rule for one (weekday, step).
    pub fn rule_for(&self, day: Weekday, step: u32) -> BindingRule {
        BindingRule {
            id: self.generated_id(day, step),
            target: Target::DayBlock(DayBlockTarget {
                day_block: DayBlockDescriptor {
                    day,
                    step,
                    column: self.column.clone(),
                },
            }),
            source: format!("{}[{}]", self.day_source(day), step),
            fallbacks: Vec::new(),
            transform: self.transform,
            description: None,
        }
    }
}

fn validate_layout(layout: &LayoutDescriptor, issues: &mut Vec<BindingIssue>) {
    check_column(&layout.column, "layout.column", issues);
    if layout.base_row == 0 {
        issues.push(BindingIssue::new("layout.base_row", "rows are 1-based"));
    }
    if layout.step_count == 0 {
        issues.push(BindingIssue::new(
            "layout.step_count",
            "step_count must be at least 1",
        ));
    }
    if layout.stride <= layout.step_count {
        issues.push(BindingIssue::new(
            "layout.stride",
            format!(
                "stride ({}) must exceed step_count ({}) so weekday blocks cannot overlap",
                layout.stride, layout.step_count
            ),
        ));
    }
    let last_row = layout.base_row as u64
        + (Weekday::ALL.len() as u64 - 1) * layout.stride as u64
        + (layout.step_count as u64).saturating_sub(1);
    if last_row > MAX_ROW as u64 {
        issues.push(BindingIssue::new(
            "layout",
            format!("last weekday block ends at row {last_row}, past the sheet limit"),
        ));
    }
}

fn validate_target(
    target: &Target,
    layout: Option<&LayoutDescriptor>,
    base: &str,
    issues: &mut Vec<BindingIssue>,
) {
    match target {
        Target::Name(target) => {
            if !DEFINED_NAME_PATTERN.is_match(&target.name) {
                issues.push(BindingIssue::new(
                    format!("{base}.target.name"),
                    format!("`{}` is not a valid defined name", target.name),
                ));
            }
        }
        Target::Cell(target) => {
            if let Err(err) = parse_sheet_region(&target.a1) {
                issues.push(BindingIssue::new(format!("{base}.target.a1"), err.to_string()));
            }
        }
        Target::DayBlock(target) => {
            let descriptor = &target.day_block;
            if let Some(column) = &descriptor.column {
                check_column(column, &format!("{base}.target.day_block.column"), issues);
            }
            match layout {
                None => issues.push(BindingIssue::new(
                    format!("{base}.target.day_block"),
                    "day_block targets require a `layout` section",
                )),
                Some(layout) if descriptor.step >= layout.step_count => {
                    issues.push(BindingIssue::new(
                        format!("{base}.target.day_block.step"),
                        format!(
                            "step {} is outside the layout's {} steps",
                            descriptor.step, layout.step_count
                        ),
                    ));
                }
                Some(_) => {}
            }
        }
    }
}

fn check_column(column: &str, path: &str, issues: &mut Vec<BindingIssue>) {
    if letters_to_column(column.trim()).is_none() {
        issues.push(BindingIssue::new(
            path,
            format!("`{column}` is not a column letter reference"),
        ));
    }
}

/// Wrapper around semver::Version for serde compatibility.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SpecVersion(pub Version);

impl SpecVersion {
    pub fn new(version: Version) -> Self {
        Self(version)
    }

    pub fn current() -> Self {
        Self(Version::new(1, 0, 0))
    }
}

impl Serialize for SpecVersion {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for SpecVersion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct VersionVisitor;

        impl<'de> Visitor<'de> for VersionVisitor {
            type Value = SpecVersion;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("semantic version string (e.g. 1.0.0)")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Version::parse(v)
                    .map(SpecVersion)
                    .map_err(|err| de::Error::custom(format!("invalid spec_version: {err}")))
            }
        }

        deserializer.deserialize_str(VersionVisitor)
    }
}

impl JsonSchema for SpecVersion {
    fn schema_name() -> Cow<'static, str> {
        "SpecVersion".into()
    }

    fn json_schema(_generator: &mut schemars::SchemaGenerator) -> schemars::Schema {
        schemars::json_schema!({
            "type": "string",
            "pattern": r"^[0-9]+\.[0-9]+\.[0-9]+(?:-[0-9A-Za-z-.]+)?(?:\+[0-9A-Za-z-.]+)?$"
        })
    }
}

impl std::str::FromStr for BindingTable {
    type Err = serde_yaml::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BindingTable::from_yaml_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weekly_layout(stride: u32, step_count: u32) -> LayoutDescriptor {
        LayoutDescriptor {
            sheet: None,
            column: "C".into(),
            base_row: 23,
            stride,
            step_count,
        }
    }

    #[test]
    fn untagged_targets_deserialize_by_shape() {
        let yaml = r#"
- { name: teacher_name }
- { a1: "DLL!C5" }
- { day_block: { day: monday, step: 1 } }
"#;
        let targets: Vec<Target> = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(targets[0].kind(), TargetKind::NamedRange);
        assert_eq!(targets[1].kind(), TargetKind::CellAddress);
        assert_eq!(targets[2], Target::day_block(Weekday::Monday, 1));
    }

    #[test]
    fn transform_accepts_trim_string_alias() {
        let t: Transform = serde_yaml::from_str("trim_string").unwrap();
        assert_eq!(t, Transform::Trim);
        let t: Transform = serde_yaml::from_str("join_lines").unwrap();
        assert_eq!(t, Transform::JoinLines);
    }

    #[test]
    fn expansion_covers_every_day_and_step() {
        let table = BindingTable::new("weekly-test", "Weekly")
            .with_layout(weekly_layout(8, 3))
            .with_day_blocks(DayBlockExpansion {
                id: "procedures".into(),
                source: "proceduresByDay".into(),
                transform: Transform::Trim,
                column: None,
            })
            .with_rule(BindingRule::new("teacher", Target::cell("C5"), "teacherName"));

        let rules = table.expanded_rules();
        assert_eq!(rules.len(), 5 * 3 + 1);
        assert_eq!(rules[0].id, "procedures.monday.a");
        assert_eq!(rules[0].source, "proceduresByDay.Monday[0]");
        assert_eq!(rules[14].id, "procedures.friday.c");
        assert_eq!(rules[14].target, Target::day_block(Weekday::Friday, 2));
        assert_eq!(rules[15].id, "teacher");
        table.validate().expect("table is valid");
    }

    #[test]
    fn stride_must_exceed_step_count() {
        let table = BindingTable::new("weekly-test", "Weekly").with_layout(weekly_layout(7, 7));
        let err = table.validate().unwrap_err();
        assert!(err.has_issue_at("layout.stride"), "{err}");
    }

    #[test]
    fn day_block_rules_need_layout_and_valid_step() {
        let table = BindingTable::new("weekly-test", "Weekly").with_rule(BindingRule::new(
            "mon-a",
            Target::day_block(Weekday::Monday, 0),
            "proceduresByDay.Monday[0]",
        ));
        let err = table.validate().unwrap_err();
        assert!(err.has_issue_at("rules[0].target.day_block"));

        let table = table.with_layout(weekly_layout(8, 2)).with_rule(BindingRule::new(
            "mon-c",
            Target::day_block(Weekday::Monday, 2),
            "proceduresByDay.Monday[2]",
        ));
        let err = table.validate().unwrap_err();
        assert!(err.has_issue_at("rules[1].target.day_block.step"));
        assert!(!err.has_issue_at("rules[0].target.day_block"));
    }

    #[test]
    fn fallbacks_are_parsed_and_checked() {
        let yaml = r#"
id: objectives.content
target: { name: obj_content }
source: objectives[0]
fallbacks: [objectives.content, objectives.contentStandards]
"#;
        let rule: BindingRule = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(rule.fallbacks.len(), 2);

        let table = BindingTable::new("fallback-test", "Fallback").with_rule(
            BindingRule::new("obj", Target::name("obj_content"), "objectives[0]")
                .with_fallback("objectives.content")
                .with_fallback("objectives..content"),
        );
        let err = table.validate().unwrap_err();
        assert!(err.has_issue_at("rules[0].fallbacks[1]"), "{err}");
        assert!(!err.has_issue_at("rules[0].fallbacks[0]"));
    }
}
