//! Plain-text rendering of the roster page and parsing of `--mark` values.

use std::fmt::Write as _;

use client_core::RosterPage;
use shared::domain::{AttendanceStatus, ClassSummary, StudentId};

/// Parses `<student id>=<present|absent>`.
pub fn parse_mark(raw: &str) -> Result<(StudentId, AttendanceStatus), String> {
    let (id, status) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected <student id>=<present|absent>, got '{raw}'"))?;
    let id = id
        .trim()
        .parse::<i64>()
        .map_err(|_| format!("invalid student id '{}'", id.trim()))?;
    let status = status.parse::<AttendanceStatus>().map_err(|e| e.to_string())?;
    Ok((StudentId(id), status))
}

pub fn parse_status(raw: &str) -> Result<AttendanceStatus, String> {
    raw.parse::<AttendanceStatus>().map_err(|e| e.to_string())
}

pub fn render_classes(classes: &[ClassSummary]) -> String {
    if classes.is_empty() {
        return "no classes\n".to_string();
    }
    let mut out = String::new();
    for class in classes {
        let _ = writeln!(out, "{:>6}  {}", class.id, class.name);
    }
    out
}

pub fn render_roster(page: &RosterPage) -> String {
    if !page.is_roster_visible() {
        return String::new();
    }
    if page.rows().is_empty() {
        return "no students enrolled\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(out, "{:>6}  {:<24}  {:^7}  {:^7}", "id", "name", "Present", "Absent");
    for row in page.rows() {
        let selected = page.selection(row.student_id);
        let cell = |status| if selected == Some(status) { "(x)" } else { "( )" };
        let _ = writeln!(
            out,
            "{:>6}  {:<24}  {:^7}  {:^7}",
            row.student_id,
            row.name,
            cell(AttendanceStatus::Present),
            cell(AttendanceStatus::Absent),
        );
    }
    out
}
