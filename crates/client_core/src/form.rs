//! Submitted form contents and their conversion into an attendance payload.

use std::collections::HashSet;

use shared::{
    domain::{student_id_from_field, AttendanceStatus},
    protocol::{AttendanceRecord, AttendanceSubmission},
};

use crate::error::ClientError;

/// Ordered `(name, value)` pairs, the way a browser enumerates a form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    entries: Vec<(String, String)>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for FormData {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut form = FormData::new();
        for (name, value) in iter {
            form.append(name, value);
        }
        form
    }
}

#[derive(Debug, Clone)]
pub struct SubmitEvent {
    form: FormData,
    default_prevented: bool,
}

impl SubmitEvent {
    pub fn new(form: FormData) -> Self {
        Self {
            form,
            default_prevented: false,
        }
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub fn form_data(&self) -> &FormData {
        &self.form
    }
}

/// Builds one record per distinct `student_<id>` field, in form order.
/// Other fields are ignored; a repeated name keeps its first value.
pub fn collect_attendance(form: &FormData) -> Result<AttendanceSubmission, ClientError> {
    let mut seen = HashSet::new();
    let mut attendance = Vec::new();

    for (name, value) in form.entries() {
        let Some(student_id) = student_id_from_field(name) else {
            continue;
        };
        if !seen.insert(name) {
            continue;
        }
        let status = value
            .parse::<AttendanceStatus>()
            .map_err(|_| ClientError::InvalidField {
                field: name.to_string(),
                value: value.to_string(),
            })?;
        attendance.push(AttendanceRecord {
            student_id: student_id.to_string(),
            status,
        });
    }

    Ok(AttendanceSubmission { attendance })
}

#[cfg(test)]
#[path = "tests/form_tests.rs"]
mod tests;
