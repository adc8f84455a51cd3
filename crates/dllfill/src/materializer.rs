//! Two-phase fill: plan every write against the untouched template, then apply.

use dllfill_spec::{FieldPath, Weekday};
use dllfill_workbook::{MergeOutcome, TemplateReader, TemplateWriter};

use crate::binding::{BoundTable, BoundTarget};
use crate::document::LessonPlanDocument;
use crate::error::FillError;
use crate::location::{ResolvedLocation, locate};
use crate::report::{FillReport, FillWarning};
use crate::value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedWrite {
    pub rule: String,
    pub location: ResolvedLocation,
    pub text: String,
}

/// Every write a fill will perform, in rule order.
#[derive(Debug, Clone, Default)]
pub struct WritePlan {
    writes: Vec<PlannedWrite>,
    report: FillReport,
}

impl WritePlan {
    pub fn writes(&self) -> &[PlannedWrite] {
        &self.writes
    }
}

/// Resolve all values and locations. Fails on the first unwritable value.
pub fn plan<T>(
    template: &T,
    document: &LessonPlanDocument,
    bindings: &BoundTable,
) -> Result<WritePlan, FillError>
where
    T: TemplateReader,
    FillError: From<T::Error>,
{
    let mut plan = WritePlan::default();
    plan.report.rules_total = bindings.rules().len();
    check_step_counts(document, bindings, &mut plan.report);

    for rule in bindings.rules() {
        let resolved =
            value::resolve_with_fallbacks(document, &rule.source, &rule.fallbacks, rule.transform)
                .map_err(|shape| FillError::BindingType {
                    rule: rule.id.clone(),
                    path: rule.source.to_string(),
                    problem: shape.to_string(),
                })?;
        if let Some(mismatch) = resolved.mismatch {
            plan.report.push_warning(FillWarning::ShapeMismatch {
                rule: rule.id.clone(),
                path: rule.source.to_string(),
                prefix: mismatch.prefix,
                found: mismatch.found,
            });
        }
        let text = resolved.text;
        let locations = locate(template, rule, bindings.layout())?;
        if locations.is_empty() {
            if let BoundTarget::Name(name) = &rule.target {
                plan.report.push_warning(FillWarning::MissingNamedRange {
                    rule: rule.id.clone(),
                    name: name.clone(),
                });
            }
            plan.report.rules_skipped += 1;
            continue;
        }
        plan.report.rules_applied += 1;
        plan.writes
            .extend(locations.into_iter().map(|location| PlannedWrite {
                rule: rule.id.clone(),
                location,
                text: text.clone(),
            }));
    }
    Ok(plan)
}

/// Warn for every weekday list longer than its block.
fn check_step_counts(
    document: &LessonPlanDocument,
    bindings: &BoundTable,
    report: &mut FillReport,
) {
    let Some(layout) = bindings.layout() else {
        return;
    };
    let capacity = layout.blocks.step_count();
    for expansion in &bindings.table().day_blocks {
        for day in Weekday::ALL {
            let source = expansion.day_source(day);
            let Ok(path) = FieldPath::parse(&source) else {
                continue;
            };
            let supplied = document.list_len(&path);
            if supplied > capacity as usize {
                report.push_warning(FillWarning::StepsDropped {
                    source,
                    supplied,
                    capacity,
                });
            }
        }
    }
}

/// Apply a plan produced by [`plan`] against the same template.
pub fn apply<T>(template: &mut T, plan: WritePlan) -> Result<FillReport, FillError>
where
    T: TemplateWriter,
    FillError: From<T::Error>,
{
    let WritePlan { writes, mut report } = plan;
    for write in writes {
        let ResolvedLocation {
            sheet,
            cell,
            merge_span,
        } = write.location;
        template.write_text(&sheet, cell, &write.text)?;
        report.cells_written += 1;

        let Some(span) = merge_span else { continue };
        match template.merge(&sheet, span)? {
            MergeOutcome::Created => report.merges_created += 1,
            MergeOutcome::AlreadyMerged => {}
            MergeOutcome::Conflict { existing } => {
                report.push_warning(FillWarning::MergeConflict {
                    rule: write.rule,
                    sheet: sheet.name.clone(),
                    requested: span.to_string(),
                    existing: existing.to_string(),
                });
            }
        }
    }
    Ok(report)
}

/// Plan then apply. On error the template has not been modified.
pub fn fill<T>(
    template: &mut T,
    document: &LessonPlanDocument,
    bindings: &BoundTable,
) -> Result<FillReport, FillError>
where
    T: TemplateWriter,
    FillError: From<T::Error>,
{
    let span = tracing::info_span!("fill_template", table = %bindings.table().table.id);
    let _guard = span.enter();

    let plan = plan(template, document, bindings)?;
    tracing::debug!(writes = plan.writes.len(), "write plan ready");
    let report = apply(template, plan)?;
    tracing::debug!(
        status = report.status.as_str(),
        cells = report.cells_written,
        merges = report.merges_created,
        "fill complete"
    );
    Ok(report)
}
