use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use shared::protocol::AttendanceReceipt;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
    error::ClientError,
    form::{collect_attendance, SubmitEvent},
    transport::AttendanceApi,
    view::{RosterRow, RosterView},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterOutcome {
    /// No class selected; the roster was emptied and hidden.
    Cleared,
    Rendered { rows: usize },
    /// A later class change started before this roster arrived.
    Superseded,
}

/// Reacts to class selection and form submission on an attendance page.
///
/// The controller owns no view. Each handler borrows the view for the
/// duration of the call and only holds its lock while mutating it, never
/// across a network request.
pub struct AttendanceFormController {
    api: Arc<dyn AttendanceApi>,
    roster_sequence: AtomicU64,
}

impl AttendanceFormController {
    pub fn new(api: Arc<dyn AttendanceApi>) -> Self {
        Self {
            api,
            roster_sequence: AtomicU64::new(0),
        }
    }

    pub async fn on_class_change<V: RosterView>(
        &self,
        view: &Mutex<V>,
        class_id: &str,
    ) -> Result<RosterOutcome, ClientError> {
        let ticket = self.roster_sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let class_id = class_id.trim();

        {
            let mut view = view.lock().await;
            view.clear_rows();
            if class_id.is_empty() {
                view.set_roster_visible(false);
                return Ok(RosterOutcome::Cleared);
            }
        }

        let roster = self.api.fetch_roster(class_id).await;

        let mut view = view.lock().await;
        if !self.is_current(ticket) {
            debug!(class_id, ticket, "discarding superseded roster response");
            return Ok(RosterOutcome::Superseded);
        }

        match roster {
            Ok(students) => {
                view.clear_message();
                view.clear_rows();
                for student in &students {
                    view.append_row(RosterRow::for_student(student));
                }
                view.set_roster_visible(true);
                info!(class_id, rows = students.len(), "roster rendered");
                Ok(RosterOutcome::Rendered {
                    rows: students.len(),
                })
            }
            Err(err) => {
                warn!(class_id, error = %err, "failed to load roster");
                view.set_roster_visible(false);
                view.show_message(&format!("Failed to load students: {}", err.user_message()));
                Err(err)
            }
        }
    }

    pub async fn on_submit<V: RosterView>(
        &self,
        view: &Mutex<V>,
        event: &mut SubmitEvent,
    ) -> Result<AttendanceReceipt, ClientError> {
        event.prevent_default();

        let result = match collect_attendance(event.form_data()) {
            Ok(submission) => self.api.submit_attendance(&submission).await,
            Err(err) => Err(err),
        };

        let mut view = view.lock().await;
        match result {
            Ok(receipt) => {
                info!(message = %receipt.message, "attendance submitted");
                view.show_message(&receipt.message);
                view.reset_form();
                view.set_roster_visible(false);
                Ok(receipt)
            }
            Err(err) => {
                warn!(error = %err, "failed to submit attendance");
                view.show_message(&format!(
                    "Failed to record attendance: {}",
                    err.user_message()
                ));
                Err(err)
            }
        }
    }

    fn is_current(&self, ticket: u64) -> bool {
        self.roster_sequence.load(Ordering::SeqCst) == ticket
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
