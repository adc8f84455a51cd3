use std::path::{Path, PathBuf};
use std::process::Command;

use assert_cmd::prelude::*;
use dllfill::UmyaTemplate;
use dllfill_common::{CellRef, SheetLocator};
use dllfill_spec::bundled::WEEKLY_YAML;
use dllfill_testkit::{DLL_SHEET, dll_template};
use dllfill_workbook::TemplateReader;
use predicates::prelude::*;
use tempfile::TempDir;

fn dll_fill() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_dll-fill"));
    cmd.env_remove("DLLFILL_TEMPLATE")
        .env_remove("DLLFILL_BINDINGS")
        .env_remove("RUST_LOG");
    cmd
}

struct Workspace {
    dir: TempDir,
    template: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let (dir, template) = dllfill_testkit::write_workbook("DLL_FORMAT.xlsx", dll_template);
        Self { dir, template }
    }

    fn file(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

fn cell_text(path: &Path, a1: &str) -> String {
    let template = UmyaTemplate::open_path(path).unwrap();
    let sheet = template.resolve_sheet(&SheetLocator::from(DLL_SHEET)).unwrap();
    template
        .read_text(&sheet, CellRef::parse(a1).unwrap())
        .unwrap()
}

#[test]
fn fill_writes_the_output_and_report() {
    let ws = Workspace::new();
    let input = ws.file(
        "plan.json",
        r#"{"teacherName": "Jane Doe", "proceduresByDay": {"Monday": ["Review"]}}"#,
    );
    let output = ws.path("out/DLL_FINAL.xlsx");

    dll_fill()
        .arg("fill")
        .arg("--template")
        .arg(&ws.template)
        .arg("--input")
        .arg(&input)
        .arg("--output")
        .arg(&output)
        .arg("--report")
        .assert()
        .success()
        .stderr(predicate::str::contains("\"status\": \"complete\""));

    assert_eq!(cell_text(&output, "C5"), "Jane Doe");
    assert_eq!(cell_text(&output, "C23"), "Review");
}

#[test]
fn fill_reads_the_template_from_the_environment() {
    let ws = Workspace::new();
    let input = ws.file("plan.json", r#"{"teacherName": "Jane Doe"}"#);
    let output = ws.path("env.xlsx");

    dll_fill()
        .env("DLLFILL_TEMPLATE", &ws.template)
        .arg("fill")
        .arg("--input")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .assert()
        .success();
    assert_eq!(cell_text(&output, "C5"), "Jane Doe");
}

#[test]
fn failed_fill_reports_its_kind_and_writes_nothing() {
    let ws = Workspace::new();
    let input = ws.file("plan.json", r#"{"teacherName": "Jane Doe", "objectives": 42}"#);
    let output = ws.path("never.xlsx");

    dll_fill()
        .arg("fill")
        .arg("--template")
        .arg(&ws.template)
        .arg("--input")
        .arg(&input)
        .arg("--output")
        .arg(&output)
        .assert()
        .failure()
        .stderr(predicate::str::contains("error[binding_type]:"));
    assert!(!output.exists());

    dll_fill()
        .arg("fill")
        .arg("--template")
        .arg(ws.path("missing.xlsx"))
        .arg("--input")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("error[template_not_found]"));
}

#[test]
fn bindings_and_legacy_are_mutually_exclusive() {
    let ws = Workspace::new();
    let table = ws.file("table.yaml", WEEKLY_YAML);
    dll_fill()
        .arg("fill")
        .arg("--input")
        .arg("-")
        .arg("--bindings")
        .arg(&table)
        .arg("--legacy")
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn lint_checks_tables_against_templates() {
    let ws = Workspace::new();
    let table = ws.file("weekly.yaml", WEEKLY_YAML);
    dll_fill()
        .arg("lint")
        .arg("--bindings")
        .arg(&table)
        .arg("--template")
        .arg(&ws.template)
        .assert()
        .success()
        .stdout(predicate::str::contains("ok against"));

    let ghost = ws.file(
        "ghost.yaml",
        r#"
spec: dll
spec_version: "1.0.0"
table: { id: ghost-table, name: Ghost }
rules:
  - id: ghost
    target: { name: not_in_template }
    source: teacherName
"#,
    );
    dll_fill()
        .arg("lint")
        .arg("--bindings")
        .arg(&ghost)
        .arg("--template")
        .arg(&ws.template)
        .assert()
        .failure()
        .stdout(predicate::str::contains("named range `not_in_template` is not defined"));

    let broken = ws.file(
        "broken.yaml",
        r#"
spec: dll
spec_version: "1.0.0"
table: { id: broken-table, name: Broken }
rules:
  - id: Bad Id
    target: { name: teacher_name }
    source: teacherName
"#,
    );
    dll_fill()
        .arg("lint")
        .arg("--bindings")
        .arg(&broken)
        .assert()
        .failure()
        .stdout(predicate::str::contains("rules[0].id"));
}

#[test]
fn names_and_schema_print_to_stdout() {
    let ws = Workspace::new();
    dll_fill()
        .arg("names")
        .arg("--template")
        .arg(&ws.template)
        .assert()
        .success()
        .stdout(predicate::str::contains("teacher_name\t"))
        .stdout(predicate::str::contains("proc_J_remediation\t"));

    let assert = dll_fill().arg("schema").assert().success();
    let schema: serde_json::Value =
        serde_json::from_slice(&assert.get_output().stdout).unwrap();
    assert!(schema["properties"]["rules"].is_object(), "{schema}");
}
