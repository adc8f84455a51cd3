//! Fixture builders shared by the dllfill test suites.
//!
//! Templates are built in memory with `umya-spreadsheet` so tests never depend on
//! binary files checked into the repository.

use std::io::Cursor;
use std::path::PathBuf;

use umya_spreadsheet::Spreadsheet;

/// Name of the weekly sheet in [`dll_template`].
pub const DLL_SHEET: &str = "DLL";
/// Name of the single-day sheet holding the `proc_*` ranges.
pub const DAILY_SHEET: &str = "Daily";

/// Header and section names defined on the weekly sheet, with their areas.
pub const DLL_NAMES: &[(&str, &str)] = &[
    ("teacher_name", "DLL!$C$5:$F$5"),
    ("grade_level", "DLL!$C$6:$F$6"),
    ("learning_area", "DLL!$C$7"),
    ("quarter", "DLL!$C$8"),
    ("week_date", "DLL!$C$9"),
    ("school", "DLL!$C$10"),
    ("obj_content", "DLL!$C$12:$F$12"),
    ("obj_performance", "DLL!$C$13"),
    ("obj_learning_competencies", "DLL!$C$14"),
    ("content", "DLL!$C$16"),
    ("learning_resources", "DLL!$C$17"),
    ("reflection_remarks", "DLL!$C$19"),
    ("reflection_notes", "DLL!$C$20"),
];

/// Procedure step names on the daily sheet, A through J.
pub const PROC_NAMES: [&str; 10] = [
    "proc_A_review",
    "proc_B_motivation",
    "proc_C_presentation",
    "proc_D_discussion",
    "proc_E_practice",
    "proc_F_mastery",
    "proc_G_application",
    "proc_H_generalization",
    "proc_I_evaluation",
    "proc_J_remediation",
];

/// Weekly block geometry baked into [`dll_template`].
pub const BASE_ROW: u32 = 23;
pub const STRIDE: u32 = 11;
pub const STEP_COUNT: u32 = 10;

const DAY_LABELS: [&str; 5] = ["MONDAY", "TUESDAY", "WEDNESDAY", "THURSDAY", "FRIDAY"];

/// Build a workbook with `f` and return its xlsx bytes.
pub fn build_workbook<F>(f: F) -> Vec<u8>
where
    F: FnOnce(&mut Spreadsheet),
{
    let mut book = umya_spreadsheet::new_file();
    f(&mut book);
    book_to_bytes(&book)
}

/// Build a workbook with `f` and write it into a fresh temp dir.
///
/// The returned `TempDir` must outlive any use of the path.
pub fn write_workbook<F>(file_name: &str, f: F) -> (tempfile::TempDir, PathBuf)
where
    F: FnOnce(&mut Spreadsheet),
{
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join(file_name);
    std::fs::write(&path, build_workbook(f)).expect("write workbook");
    (dir, path)
}

pub fn book_to_bytes(book: &Spreadsheet) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    umya_spreadsheet::writer::xlsx::write_writer(book, &mut buf).expect("write to bytes");
    buf.into_inner()
}

/// A two-sheet Daily Lesson Log template.
///
/// `DLL` carries labels in column B, the header/section names from
/// [`DLL_NAMES`], a pre-merged `C6:F6`, day labels in column C on the row above
/// each weekday block and placeholder text in `C23`. `Daily` carries the
/// [`PROC_NAMES`] ranges in `C3:C12`.
pub fn dll_template(book: &mut Spreadsheet) {
    {
        let ws = book
            .get_sheet_by_name_mut("Sheet1")
            .expect("default sheet");
        ws.set_name(DLL_SHEET);
        ws.get_cell_mut("A1").set_value_string("DAILY LESSON LOG");
        ws.add_merge_cells("A1:F1");

        for (row, label) in [
            (5u32, "Teacher:"),
            (6, "Grade Level:"),
            (7, "Learning Area:"),
            (8, "Quarter:"),
            (9, "Week:"),
            (10, "School:"),
            (12, "Content Standards"),
            (13, "Performance Standards"),
            (14, "Learning Competencies"),
            (16, "Content"),
            (17, "Learning Resources"),
            (19, "Remarks"),
            (20, "Reflection"),
        ] {
            ws.get_cell_mut((2u32, row)).set_value_string(label);
        }
        ws.add_merge_cells("C6:F6");

        for (day, label) in DAY_LABELS.iter().enumerate() {
            let first = BASE_ROW + day as u32 * STRIDE;
            ws.get_cell_mut((3u32, first - 1)).set_value_string(*label);
            for step in 0..STEP_COUNT {
                let letter = char::from(b'A' + step as u8).to_string();
                ws.get_cell_mut((2u32, first + step)).set_value_string(letter);
            }
        }
        ws.get_cell_mut("C23").set_value_string("(write the review here)");

        for (name, address) in DLL_NAMES {
            ws.add_defined_name(*name, *address).expect("add defined name");
        }
    }

    let daily = book.new_sheet(DAILY_SHEET).expect("add daily sheet");
    for (idx, name) in PROC_NAMES.iter().enumerate() {
        let row = 3 + idx as u32;
        daily
            .get_cell_mut((2u32, row))
            .set_value_string(char::from(b'A' + idx as u8).to_string());
        daily
            .add_defined_name(name.to_string(), format!("{DAILY_SHEET}!$C${row}"))
            .expect("add proc name");
    }
}

pub fn dll_template_bytes() -> Vec<u8> {
    build_workbook(dll_template)
}

/// Row of `step` within the weekday block of `day` (both 0-based).
pub fn block_row(day: u32, step: u32) -> u32 {
    BASE_ROW + day * STRIDE + step
}
