use dllfill::materializer;
use dllfill::{
    BoundTable, FillErrorKind, FillStatus, FillWarning, LessonPlanDocument, TemplateSource,
    UmyaTemplate, fill_template, load_template, render, serialize,
};
use dllfill_common::{CellRef, Region, SheetLocator};
use dllfill_spec::{
    BindingRule, BindingTable, DayBlockExpansion, LayoutDescriptor, Target, Transform,
    legacy_table, weekly_table,
};
use dllfill_testkit::{DAILY_SHEET, DLL_SHEET, block_row, build_workbook, dll_template_bytes};
use dllfill_workbook::TemplateReader;
use serde_json::json;

fn text(template: &UmyaTemplate, sheet: &str, a1: &str) -> String {
    let sheet = template.resolve_sheet(&SheetLocator::from(sheet)).unwrap();
    template
        .read_text(&sheet, CellRef::parse(a1).unwrap())
        .unwrap()
}

fn reload(bytes: &[u8]) -> UmyaTemplate {
    UmyaTemplate::open_bytes(bytes).expect("filled output reloads")
}

fn weekly_document() -> LessonPlanDocument {
    LessonPlanDocument::from_value(json!({
        "teacherName": "Jane Doe",
        "gradeLevel": "Grade 6",
        "subject": "Science",
        "quarter": "Q3",
        "weekDate": "March 3-7, 2025",
        "school": "Rizal Elementary School",
        "objectives": [
            "Understands the nature of mixtures",
            "Separates mixtures using appropriate techniques",
            "Identifies mixtures in the home"
        ],
        "content": ["Mixtures", "Solutions"],
        "learningResources": "Science 6 LM pp. 10-14",
        "proceduresByDay": {
            "Monday": ["  Review of matter  ", "Show two jars of water"],
            "Friday": ["Weekly quiz"]
        },
        "reflection": { "remarks": " Lesson carried over to Tuesday ", "notes": "Good recitation" }
    }))
    .unwrap()
}

fn e2e_table() -> BindingTable {
    BindingTable::new("e2e-test", "End to end")
        .with_layout(LayoutDescriptor {
            sheet: None,
            column: "C".into(),
            base_row: 23,
            stride: 8,
            step_count: 7,
        })
        .with_day_blocks(DayBlockExpansion {
            id: "procedures".into(),
            source: "proceduresByDay".into(),
            transform: Transform::Identity,
            column: None,
        })
        .with_rule(BindingRule::new("teacher", Target::cell("C5"), "teacherName"))
}

#[test]
fn jane_doe_lands_in_c5_and_monday_block() {
    let source = TemplateSource::from_bytes(build_workbook(|_| {})).unwrap();
    let document = LessonPlanDocument::from_value(json!({
        "teacherName": "Jane Doe",
        "gradeLevel": "Grade 6",
        "objectives": ["Obj1", "Obj2"],
        "proceduresByDay": { "Monday": ["Review text", "Motivation text"] }
    }))
    .unwrap();
    let bindings = BoundTable::new(e2e_table()).unwrap();

    let rendered = render(&source, &document, &bindings).unwrap();
    assert_eq!(
        rendered.content_type(),
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    );
    assert_eq!(rendered.report.status, FillStatus::Complete);
    assert_eq!(rendered.report.cells_written, 5 * 7 + 1);

    let out = reload(&rendered.bytes);
    assert_eq!(text(&out, "Sheet1", "C5"), "Jane Doe");
    assert_eq!(text(&out, "Sheet1", "C23"), "Review text");
    assert_eq!(text(&out, "Sheet1", "C24"), "Motivation text");
    for row in 25..=29 {
        assert_eq!(text(&out, "Sheet1", &format!("C{row}")), "");
    }
    // Tuesday starts one stride later
    assert_eq!(text(&out, "Sheet1", "C31"), "");
}

#[test]
fn numeric_objectives_abort_with_binding_type() {
    let source = TemplateSource::from_bytes(dll_template_bytes()).unwrap();
    let document = LessonPlanDocument::from_value(json!({
        "teacherName": "Jane Doe",
        "objectives": 42
    }))
    .unwrap();
    let bindings = BoundTable::new(weekly_table().unwrap()).unwrap();

    let err = render(&source, &document, &bindings).unwrap_err();
    assert_eq!(err.kind(), FillErrorKind::BindingType);
    assert!(
        err.to_string()
            .contains("`objectives[0]` descends into `objectives`, which holds a number"),
        "{err}"
    );

    let whole = BoundTable::new(
        BindingTable::new("objectives-test", "Objectives").with_rule(
            BindingRule::new("objectives", Target::name("obj_content"), "objectives")
                .with_transform(Transform::JoinLines),
        ),
    )
    .unwrap();
    let err = render(&source, &document, &whole).unwrap_err();
    assert_eq!(err.kind(), FillErrorKind::BindingType);
}

#[test]
fn failed_fill_leaves_handle_untouched() {
    let mut handle = load_template(dll_template_bytes()).unwrap();
    let document = LessonPlanDocument::from_value(json!({
        "teacherName": "Jane Doe",
        "subject": { "name": "Science" }
    }))
    .unwrap();
    let bindings = BoundTable::new(
        BindingTable::new("abort-test", "Abort")
            .with_rule(BindingRule::new("teacher", Target::cell("DLL!C5"), "teacherName"))
            .with_rule(BindingRule::new("subject", Target::cell("DLL!C7"), "subject")),
    )
    .unwrap();

    let err = materializer::fill(&mut handle, &document, &bindings).unwrap_err();
    assert_eq!(err.kind(), FillErrorKind::BindingType);
    assert_eq!(text(&handle, DLL_SHEET, "C5"), "");
}

#[test]
fn missing_named_range_is_skipped_with_warning() {
    let handle = load_template(dll_template_bytes()).unwrap();
    let bindings = BoundTable::new(
        BindingTable::new("missing-name", "Missing name")
            .with_rule(BindingRule::new("ghost", Target::name("not_in_template"), "teacherName"))
            .with_rule(BindingRule::new("teacher", Target::name("teacher_name"), "teacherName")),
    )
    .unwrap();

    let (handle, report) = fill_template(handle, &weekly_document(), &bindings).unwrap();
    assert_eq!(report.status, FillStatus::CompletedWithWarnings);
    assert_eq!(report.rules_skipped, 1);
    assert_eq!(report.rules_applied, 1);
    assert_eq!(report.missing_names().collect::<Vec<_>>(), vec!["not_in_template"]);

    let out = reload(&serialize(&handle).unwrap());
    assert_eq!(text(&out, DLL_SHEET, "C5"), "Jane Doe");
}

#[test]
fn weekly_table_round_trips_every_bound_cell() {
    let source = TemplateSource::from_bytes(dll_template_bytes()).unwrap();
    let bindings = BoundTable::new(weekly_table().unwrap()).unwrap();
    let rendered = render(&source, &weekly_document(), &bindings).unwrap();
    assert_eq!(rendered.report.status, FillStatus::Complete);
    assert_eq!(rendered.report.cells_written, 13 + 50);

    let out = reload(&rendered.bytes);
    for (cell, expected) in [
        ("C5", "Jane Doe"),
        ("C6", "Grade 6"),
        ("C7", "Science"),
        ("C8", "Q3"),
        ("C9", "March 3-7, 2025"),
        ("C10", "Rizal Elementary School"),
        ("C12", "Understands the nature of mixtures"),
        ("C13", "Separates mixtures using appropriate techniques"),
        ("C14", "Identifies mixtures in the home"),
        ("C16", "Mixtures\nSolutions"),
        ("C17", "Science 6 LM pp. 10-14"),
        ("C19", "Lesson carried over to Tuesday"),
        ("C20", "Good recitation"),
    ] {
        assert_eq!(text(&out, DLL_SHEET, cell), expected, "cell {cell}");
    }

    let at = |day: u32, step: u32| text(&out, DLL_SHEET, &format!("C{}", block_row(day, step)));
    assert_eq!(at(0, 0), "Review of matter");
    assert_eq!(at(0, 1), "Show two jars of water");
    assert_eq!(at(0, 2), "");
    assert_eq!(at(4, 0), "Weekly quiz");
    for step in 0..10 {
        assert_eq!(at(2, step), "", "wednesday step {step}");
    }
}

fn weekly_with_objectives(objectives: serde_json::Value) -> LessonPlanDocument {
    LessonPlanDocument::from_value(json!({
        "teacherName": "Jane Doe",
        "objectives": objectives
    }))
    .unwrap()
}

fn objective_rows(bytes: &[u8]) -> [String; 3] {
    let out = reload(bytes);
    ["C12", "C13", "C14"].map(|cell| text(&out, DLL_SHEET, cell))
}

#[test]
fn single_text_objective_fills_the_first_row() {
    let source = TemplateSource::from_bytes(dll_template_bytes()).unwrap();
    let bindings = BoundTable::new(weekly_table().unwrap()).unwrap();
    let document = weekly_with_objectives(json!("Understands the nature of mixtures"));

    let rendered = render(&source, &document, &bindings).unwrap();
    assert_eq!(rendered.report.status, FillStatus::Complete);
    assert!(rendered.report.warnings.is_empty());
    assert_eq!(
        objective_rows(&rendered.bytes),
        ["Understands the nature of mixtures", "", ""].map(String::from)
    );
}

#[test]
fn structured_objectives_fill_by_standard() {
    let source = TemplateSource::from_bytes(dll_template_bytes()).unwrap();
    let bindings = BoundTable::new(weekly_table().unwrap()).unwrap();
    let document = weekly_with_objectives(json!({
        "content": "CS text",
        "performanceStandards": "PS text",
        "competencies": ["LC1", "LC2"]
    }));

    let rendered = render(&source, &document, &bindings).unwrap();
    assert_eq!(rendered.report.status, FillStatus::Complete);
    assert_eq!(
        objective_rows(&rendered.bytes),
        ["CS text", "PS text", "LC1\nLC2"].map(String::from)
    );
}

#[test]
fn unrecognized_objective_keys_are_reported() {
    let source = TemplateSource::from_bytes(dll_template_bytes()).unwrap();
    let bindings = BoundTable::new(weekly_table().unwrap()).unwrap();
    let document = weekly_with_objectives(json!({ "goals": "Understand mixtures" }));

    let rendered = render(&source, &document, &bindings).unwrap();
    assert_eq!(rendered.report.status, FillStatus::CompletedWithWarnings);
    let mismatched: Vec<&str> = rendered
        .report
        .warnings
        .iter()
        .filter_map(|warning| match warning {
            FillWarning::ShapeMismatch { rule, prefix, found, .. } => {
                assert_eq!(prefix, "objectives");
                assert_eq!(found, "an object");
                Some(rule.as_str())
            }
            _ => None,
        })
        .collect();
    assert_eq!(
        mismatched,
        vec!["objectives.content", "objectives.performance", "objectives.competencies"]
    );
    assert_eq!(objective_rows(&rendered.bytes), ["", "", ""].map(String::from));
}

#[test]
fn steps_beyond_the_block_are_reported() {
    let source = TemplateSource::from_bytes(dll_template_bytes()).unwrap();
    let bindings = BoundTable::new(weekly_table().unwrap()).unwrap();
    let steps: Vec<String> = (1..=11).map(|n| format!("Step {n}")).collect();
    let document = LessonPlanDocument::from_value(json!({
        "teacherName": "Jane Doe",
        "proceduresByDay": { "Monday": steps }
    }))
    .unwrap();

    let rendered = render(&source, &document, &bindings).unwrap();
    assert_eq!(rendered.report.status, FillStatus::CompletedWithWarnings);
    assert_eq!(
        rendered.report.warnings,
        vec![FillWarning::StepsDropped {
            source: "proceduresByDay.Monday".into(),
            supplied: 11,
            capacity: 10,
        }]
    );

    let out = reload(&rendered.bytes);
    assert_eq!(text(&out, DLL_SHEET, &format!("C{}", block_row(0, 9))), "Step 10");
    // the separator row after Monday keeps its label
    assert_eq!(text(&out, DLL_SHEET, &format!("C{}", block_row(1, 0) - 1)), "TUESDAY");
}

#[test]
fn labels_outside_bound_cells_survive() {
    let source = TemplateSource::from_bytes(dll_template_bytes()).unwrap();
    let bindings = BoundTable::new(weekly_table().unwrap()).unwrap();
    let document = LessonPlanDocument::from_value(json!({ "teacherName": "Jane Doe" })).unwrap();
    let out = reload(&render(&source, &document, &bindings).unwrap().bytes);

    assert_eq!(text(&out, DLL_SHEET, "A1"), "DAILY LESSON LOG");
    assert_eq!(text(&out, DLL_SHEET, "B5"), "Teacher:");
    for (day, label) in ["MONDAY", "TUESDAY", "WEDNESDAY", "THURSDAY", "FRIDAY"]
        .iter()
        .enumerate()
    {
        let label_row = block_row(day as u32, 0) - 1;
        assert_eq!(text(&out, DLL_SHEET, &format!("C{label_row}")), *label);
        assert_eq!(text(&out, DLL_SHEET, &format!("B{}", block_row(day as u32, 9))), "J");
    }
    // placeholder text in a bound step cell is cleared
    assert_eq!(text(&out, DLL_SHEET, "C23"), "");
    assert_eq!(text(&out, DAILY_SHEET, "B3"), "A");
}

#[test]
fn merges_are_created_once_and_never_overlap() {
    let source = TemplateSource::from_bytes(dll_template_bytes()).unwrap();
    let table = weekly_table().unwrap().with_rule(BindingRule::new(
        "signature",
        Target::cell("DLL!E6:G7"),
        "teacherName",
    ));
    let bindings = BoundTable::new(table).unwrap();
    let rendered = render(&source, &weekly_document(), &bindings).unwrap();

    // teacher_name C5:F5 and obj_content C12:F12; C6:F6 was merged already
    assert_eq!(rendered.report.merges_created, 2);
    assert_eq!(rendered.report.status, FillStatus::CompletedWithWarnings);
    assert!(rendered.report.warnings.iter().any(|warning| matches!(
        warning,
        FillWarning::MergeConflict { rule, existing, .. }
            if rule == "signature" && existing == "C6:F6"
    )));

    let out = reload(&rendered.bytes);
    let sheet = out.resolve_sheet(&SheetLocator::FIRST).unwrap();
    let merged = out.merged_regions(&sheet).unwrap();
    let count = |a1: &str| {
        let region = Region::parse(a1).unwrap();
        merged.iter().filter(|r| **r == region).count()
    };
    assert_eq!(count("C5:F5"), 1);
    assert_eq!(count("C6:F6"), 1);
    assert_eq!(count("C12:F12"), 1);
    assert_eq!(count("E6:G7"), 0);
    assert_eq!(text(&out, DLL_SHEET, "E6"), "Jane Doe");

    // a second fill over the output does not stack merges
    let again = render(
        &TemplateSource::from_bytes(rendered.bytes.clone()).unwrap(),
        &weekly_document(),
        &bindings,
    )
    .unwrap();
    assert_eq!(again.report.merges_created, 0);
}

#[test]
fn identical_inputs_produce_identical_bytes() {
    let source = TemplateSource::from_bytes(dll_template_bytes()).unwrap();
    let bindings = BoundTable::new(weekly_table().unwrap()).unwrap();
    let first = render(&source, &weekly_document(), &bindings).unwrap();
    let second = render(&source, &weekly_document(), &bindings).unwrap();
    assert_eq!(first.bytes, second.bytes);
    assert_eq!(first.report, second.report);
}

#[test]
fn concurrent_fills_share_only_the_source() {
    let source = TemplateSource::from_bytes(dll_template_bytes()).unwrap();
    let bindings = BoundTable::new(weekly_table().unwrap()).unwrap();
    let teachers = ["Ana Cruz", "Ben Reyes", "Carla Santos", "Dan Lim"];

    let outputs: Vec<(String, Vec<u8>)> = std::thread::scope(|scope| {
        let handles: Vec<_> = teachers
            .iter()
            .map(|teacher| {
                let source = source.clone();
                let bindings = &bindings;
                scope.spawn(move || {
                    let document =
                        LessonPlanDocument::from_value(json!({ "teacherName": teacher })).unwrap();
                    let bytes = render(&source, &document, bindings).unwrap().bytes;
                    (teacher.to_string(), bytes)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for (teacher, bytes) in outputs {
        let out = reload(&bytes);
        assert_eq!(text(&out, DLL_SHEET, "C5"), teacher);
        let sequential = render(
            &source,
            &LessonPlanDocument::from_value(json!({ "teacherName": teacher })).unwrap(),
            &bindings,
        )
        .unwrap();
        assert_eq!(sequential.bytes, bytes);
    }
    assert_eq!(text(&source.open().unwrap(), DLL_SHEET, "C5"), "");
}

#[test]
fn legacy_table_fills_procedure_names() {
    let source = TemplateSource::from_bytes(dll_template_bytes()).unwrap();
    let bindings = BoundTable::new(legacy_table().unwrap()).unwrap();
    let steps: Vec<String> = ('A'..='J').map(|letter| format!("Step {letter}")).collect();
    let document = LessonPlanDocument::from_value(json!({
        "teacherName": "Jane Doe",
        "subject": "Mathematics",
        "generatedLesson": {
            "I_Objectives": ["Adds fractions", "Solves word problems"],
            "IV_Procedures": steps
        }
    }))
    .unwrap();

    let rendered = render(&source, &document, &bindings).unwrap();
    assert_eq!(rendered.report.status, FillStatus::Complete);
    let out = reload(&rendered.bytes);
    for (idx, letter) in ('A'..='J').enumerate() {
        let cell = format!("C{}", 3 + idx);
        assert_eq!(text(&out, DAILY_SHEET, &cell), format!("Step {letter}"));
    }
    assert_eq!(text(&out, DLL_SHEET, "C7"), "Mathematics");
    assert_eq!(text(&out, DLL_SHEET, "C12"), "Adds fractions");
    assert_eq!(text(&out, DLL_SHEET, "C14"), "");
}

#[test]
fn later_rules_win_on_the_same_cell() {
    let handle = load_template(build_workbook(|_| {})).unwrap();
    let bindings = BoundTable::new(
        BindingTable::new("override-test", "Override")
            .with_rule(BindingRule::new("first", Target::cell("B2"), "teacherName"))
            .with_rule(BindingRule::new("second", Target::cell("B2"), "gradeLevel")),
    )
    .unwrap();
    let (handle, report) = fill_template(handle, &weekly_document(), &bindings).unwrap();
    assert_eq!(report.cells_written, 2);
    assert_eq!(text(&handle, "Sheet1", "B2"), "Grade 6");
}

#[test]
fn unknown_sheet_in_cell_target_is_sheet_not_found() {
    let source = TemplateSource::from_bytes(build_workbook(|_| {})).unwrap();
    let bindings = BoundTable::new(
        BindingTable::new("sheet-test", "Sheet")
            .with_rule(BindingRule::new("teacher", Target::cell("'Week 2'!C5"), "teacherName")),
    )
    .unwrap();
    let err = render(&source, &weekly_document(), &bindings).unwrap_err();
    assert_eq!(err.kind(), FillErrorKind::SheetNotFound);
}
