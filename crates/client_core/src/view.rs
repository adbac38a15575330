//! Page surface the form controller renders into.
//!
//! [`RosterView`] is the dispatch seam a front-end implements: a table body
//! of student rows, a roster container that can be hidden, a message area and
//! the attendance form itself. [`RosterPage`] is the headless implementation
//! used by the terminal client and by tests.

use std::collections::HashMap;

use shared::domain::{AttendanceStatus, Student, StudentId};

use crate::{
    error::ClientError,
    form::{FormData, SubmitEvent},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterRow {
    pub student_id: StudentId,
    pub name: String,
    /// Shared name of the row's radio group, `student_<id>`.
    pub field_name: String,
    pub choices: [AttendanceStatus; 2],
    pub required: bool,
}

impl RosterRow {
    pub fn for_student(student: &Student) -> Self {
        Self {
            student_id: student.id,
            name: student.name.clone(),
            field_name: student.field_name(),
            choices: AttendanceStatus::ALL,
            required: true,
        }
    }
}

pub trait RosterView: Send {
    fn clear_rows(&mut self);
    fn append_row(&mut self, row: RosterRow);
    fn set_roster_visible(&mut self, visible: bool);
    /// Writes `message` to the message area and reveals it.
    fn show_message(&mut self, message: &str);
    /// Empties and hides the message area.
    fn clear_message(&mut self);
    /// Unchecks every choice; rendered rows stay in place.
    fn reset_form(&mut self);
}

#[derive(Debug, Default)]
pub struct RosterPage {
    rows: Vec<RosterRow>,
    selections: HashMap<String, AttendanceStatus>,
    roster_visible: bool,
    message: Option<String>,
}

impl RosterPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[RosterRow] {
        &self.rows
    }

    pub fn is_roster_visible(&self) -> bool {
        self.roster_visible
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn selection(&self, student_id: StudentId) -> Option<AttendanceStatus> {
        self.row(student_id)
            .and_then(|row| self.selections.get(&row.field_name))
            .copied()
    }

    /// Checks `status` for the student's row. Returns false when no such row
    /// is rendered.
    pub fn select(&mut self, student_id: StudentId, status: AttendanceStatus) -> bool {
        let Some(field_name) = self.row(student_id).map(|row| row.field_name.clone()) else {
            return false;
        };
        self.selections.insert(field_name, status);
        true
    }

    /// Checked choices in row order; unchecked rows contribute nothing.
    pub fn form_data(&self) -> FormData {
        self.rows
            .iter()
            .filter_map(|row| {
                self.selections
                    .get(&row.field_name)
                    .map(|status| (row.field_name.clone(), status.as_str()))
            })
            .collect()
    }

    /// Enforces one checked choice per required row before producing the
    /// submit event, the way a browser blocks submission.
    pub fn submit_event(&self) -> Result<SubmitEvent, ClientError> {
        if let Some(row) = self
            .rows
            .iter()
            .find(|row| row.required && !self.selections.contains_key(&row.field_name))
        {
            return Err(ClientError::MissingSelection {
                student: row.name.clone(),
            });
        }
        Ok(SubmitEvent::new(self.form_data()))
    }

    fn row(&self, student_id: StudentId) -> Option<&RosterRow> {
        self.rows.iter().find(|row| row.student_id == student_id)
    }
}

impl RosterView for RosterPage {
    fn clear_rows(&mut self) {
        self.rows.clear();
        self.selections.clear();
    }

    fn append_row(&mut self, row: RosterRow) {
        self.rows.push(row);
    }

    fn set_roster_visible(&mut self, visible: bool) {
        self.roster_visible = visible;
    }

    fn show_message(&mut self, message: &str) {
        self.message = Some(message.to_string());
    }

    fn clear_message(&mut self) {
        self.message = None;
    }

    fn reset_form(&mut self) {
        self.selections.clear();
    }
}

#[cfg(test)]
#[path = "tests/view_tests.rs"]
mod tests;
