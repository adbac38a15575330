use super::*;
use async_trait::async_trait;
use chrono::NaiveDate;
use shared::{
    domain::{AttendanceStatus, ClassId, ClassSummary, Student, StudentId},
    protocol::{AttendanceReport, AttendanceSubmission},
};
use std::{collections::HashMap, time::Duration};

use crate::{form::FormData, view::RosterPage};

#[derive(Default)]
struct FakeAttendanceApi {
    rosters: HashMap<String, Vec<Student>>,
    delays: HashMap<String, Duration>,
    failing_classes: Vec<String>,
    submit_failure: Option<String>,
    roster_requests: std::sync::Mutex<Vec<String>>,
    submissions: std::sync::Mutex<Vec<AttendanceSubmission>>,
}

impl FakeAttendanceApi {
    fn with_roster(mut self, class_id: &str, students: Vec<Student>) -> Self {
        self.rosters.insert(class_id.to_string(), students);
        self
    }

    fn with_delay(mut self, class_id: &str, delay: Duration) -> Self {
        self.delays.insert(class_id.to_string(), delay);
        self
    }

    fn failing_roster(mut self, class_id: &str) -> Self {
        self.failing_classes.push(class_id.to_string());
        self
    }

    fn failing_submit(mut self, message: &str) -> Self {
        self.submit_failure = Some(message.to_string());
        self
    }

    fn roster_requests(&self) -> Vec<String> {
        self.roster_requests.lock().expect("lock").clone()
    }

    fn submissions(&self) -> Vec<AttendanceSubmission> {
        self.submissions.lock().expect("lock").clone()
    }
}

#[async_trait]
impl AttendanceApi for FakeAttendanceApi {
    async fn list_classes(&self) -> Result<Vec<ClassSummary>, ClientError> {
        Ok(Vec::new())
    }

    async fn fetch_roster(&self, class_id: &str) -> Result<Vec<Student>, ClientError> {
        self.roster_requests
            .lock()
            .expect("lock")
            .push(class_id.to_string());
        if let Some(delay) = self.delays.get(class_id) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing_classes.iter().any(|c| c == class_id) {
            return Err(ClientError::Status {
                status: 500,
                message: "database unavailable".into(),
            });
        }
        self.rosters
            .get(class_id)
            .cloned()
            .ok_or_else(|| ClientError::Status {
                status: 404,
                message: "class not found".into(),
            })
    }

    async fn submit_attendance(
        &self,
        submission: &AttendanceSubmission,
    ) -> Result<AttendanceReceipt, ClientError> {
        self.submissions
            .lock()
            .expect("lock")
            .push(submission.clone());
        if let Some(message) = &self.submit_failure {
            return Err(ClientError::Status {
                status: 400,
                message: message.clone(),
            });
        }
        Ok(AttendanceReceipt {
            message: "Saved".into(),
        })
    }

    async fn attendance_report(
        &self,
        class_id: ClassId,
        date: Option<NaiveDate>,
    ) -> Result<AttendanceReport, ClientError> {
        Ok(AttendanceReport {
            class_id,
            date: date.unwrap_or(NaiveDate::MIN),
            entries: Vec::new(),
        })
    }
}

fn student(id: i64, name: &str) -> Student {
    Student {
        id: StudentId(id),
        name: name.to_string(),
    }
}

fn alice_and_bob() -> Vec<Student> {
    vec![student(1, "Alice"), student(2, "Bob")]
}

fn controller(api: FakeAttendanceApi) -> (AttendanceFormController, Arc<FakeAttendanceApi>) {
    let api = Arc::new(api);
    (AttendanceFormController::new(api.clone()), api)
}

#[tokio::test]
async fn class_change_renders_one_row_per_student_in_order() {
    let (controller, _api) =
        controller(FakeAttendanceApi::default().with_roster("1", alice_and_bob()));
    let view = Mutex::new(RosterPage::new());

    let outcome = controller
        .on_class_change(&view, "1")
        .await
        .expect("roster");
    assert_eq!(outcome, RosterOutcome::Rendered { rows: 2 });

    let page = view.lock().await;
    let names: Vec<_> = page.rows().iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Alice", "Bob"]);
    assert_eq!(page.rows()[1].field_name, "student_2");
    assert_eq!(page.rows()[1].choices.len(), 2);
    assert!(page.is_roster_visible());
}

#[tokio::test]
async fn empty_class_clears_and_hides_without_a_request() {
    let (controller, api) =
        controller(FakeAttendanceApi::default().with_roster("1", alice_and_bob()));
    let view = Mutex::new(RosterPage::new());
    controller
        .on_class_change(&view, "1")
        .await
        .expect("roster");

    let outcome = controller
        .on_class_change(&view, "  ")
        .await
        .expect("cleared");
    assert_eq!(outcome, RosterOutcome::Cleared);

    let page = view.lock().await;
    assert!(page.rows().is_empty());
    assert!(!page.is_roster_visible());
    assert_eq!(api.roster_requests(), vec!["1".to_string()]);
}

#[tokio::test]
async fn empty_roster_renders_zero_rows_but_reveals_container() {
    let (controller, _api) = controller(FakeAttendanceApi::default().with_roster("4", Vec::new()));
    let view = Mutex::new(RosterPage::new());

    let outcome = controller
        .on_class_change(&view, "4")
        .await
        .expect("roster");
    assert_eq!(outcome, RosterOutcome::Rendered { rows: 0 });
    assert!(view.lock().await.is_roster_visible());
}

#[tokio::test]
async fn slower_earlier_roster_never_overwrites_a_later_one() {
    let (controller, _api) = controller(
        FakeAttendanceApi::default()
            .with_roster("1", alice_and_bob())
            .with_roster("2", vec![student(9, "Zed")])
            .with_delay("1", Duration::from_millis(150)),
    );
    let view = Mutex::new(RosterPage::new());

    let (first, second) = tokio::join!(
        controller.on_class_change(&view, "1"),
        async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            controller.on_class_change(&view, "2").await
        }
    );

    assert_eq!(first.expect("first"), RosterOutcome::Superseded);
    assert_eq!(second.expect("second"), RosterOutcome::Rendered { rows: 1 });
    let page = view.lock().await;
    let names: Vec<_> = page.rows().iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Zed"]);
}

#[tokio::test]
async fn clearing_the_selection_discards_an_in_flight_roster() {
    let (controller, _api) = controller(
        FakeAttendanceApi::default()
            .with_roster("1", alice_and_bob())
            .with_delay("1", Duration::from_millis(100)),
    );
    let view = Mutex::new(RosterPage::new());

    let (first, cleared) = tokio::join!(controller.on_class_change(&view, "1"), async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        controller.on_class_change(&view, "").await
    });

    assert_eq!(first.expect("first"), RosterOutcome::Superseded);
    assert_eq!(cleared.expect("cleared"), RosterOutcome::Cleared);
    let page = view.lock().await;
    assert!(page.rows().is_empty());
    assert!(!page.is_roster_visible());
}

#[tokio::test]
async fn roster_failure_is_shown_and_keeps_the_roster_hidden() {
    let (controller, _api) = controller(FakeAttendanceApi::default().failing_roster("3"));
    let view = Mutex::new(RosterPage::new());

    let err = controller
        .on_class_change(&view, "3")
        .await
        .expect_err("failure");
    assert!(matches!(err, ClientError::Status { status: 500, .. }));

    let page = view.lock().await;
    assert_eq!(
        page.message(),
        Some("Failed to load students: database unavailable")
    );
    assert!(!page.is_roster_visible());
    assert!(page.rows().is_empty());
}

#[tokio::test]
async fn stale_roster_failure_is_ignored() {
    let (controller, _api) = controller(
        FakeAttendanceApi::default()
            .failing_roster("3")
            .with_delay("3", Duration::from_millis(100))
            .with_roster("1", alice_and_bob()),
    );
    let view = Mutex::new(RosterPage::new());

    let (stale, fresh) = tokio::join!(controller.on_class_change(&view, "3"), async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        controller.on_class_change(&view, "1").await
    });

    assert_eq!(stale.expect("stale"), RosterOutcome::Superseded);
    assert_eq!(fresh.expect("fresh"), RosterOutcome::Rendered { rows: 2 });
    let page = view.lock().await;
    assert_eq!(page.message(), None);
    assert!(page.is_roster_visible());
}

#[tokio::test]
async fn successful_roster_clears_an_earlier_load_failure() {
    let (controller, _api) = controller(
        FakeAttendanceApi::default()
            .failing_roster("3")
            .with_roster("1", alice_and_bob()),
    );
    let view = Mutex::new(RosterPage::new());

    controller
        .on_class_change(&view, "3")
        .await
        .expect_err("failure");
    assert!(view.lock().await.message().is_some());

    let outcome = controller
        .on_class_change(&view, "1")
        .await
        .expect("roster");
    assert_eq!(outcome, RosterOutcome::Rendered { rows: 2 });

    let page = view.lock().await;
    assert_eq!(page.message(), None);
    assert!(page.is_roster_visible());
}

#[tokio::test]
async fn round_trip_submits_selected_statuses_and_resets_the_page() {
    let (controller, api) =
        controller(FakeAttendanceApi::default().with_roster("1", alice_and_bob()));
    let view = Mutex::new(RosterPage::new());
    controller
        .on_class_change(&view, "1")
        .await
        .expect("roster");

    let mut event = {
        let mut page = view.lock().await;
        page.select(StudentId(1), AttendanceStatus::Present);
        page.select(StudentId(2), AttendanceStatus::Absent);
        page.submit_event().expect("complete form")
    };

    let receipt = controller
        .on_submit(&view, &mut event)
        .await
        .expect("submit");
    assert_eq!(receipt.message, "Saved");
    assert!(event.default_prevented());

    let submissions = api.submissions();
    assert_eq!(submissions.len(), 1);
    assert_eq!(
        serde_json::to_string(&submissions[0]).expect("json"),
        r#"{"attendance":[{"student_id":"1","status":"Present"},{"student_id":"2","status":"Absent"}]}"#
    );

    let page = view.lock().await;
    assert_eq!(page.message(), Some("Saved"));
    assert!(!page.is_roster_visible());
    assert_eq!(page.selection(StudentId(1)), None);
    assert_eq!(page.selection(StudentId(2)), None);
}

#[tokio::test]
async fn submission_length_matches_distinct_student_fields() {
    let (controller, api) = controller(FakeAttendanceApi::default());
    let view = Mutex::new(RosterPage::new());
    let form: FormData = [
        ("student_4", "Present"),
        ("student_4", "Absent"),
        ("student_5", "Absent"),
        ("remark", "none"),
    ]
    .into_iter()
    .collect();

    controller
        .on_submit(&view, &mut SubmitEvent::new(form))
        .await
        .expect("submit");
    assert_eq!(api.submissions()[0].attendance.len(), 2);
}

#[tokio::test]
async fn failed_submit_keeps_the_form_and_shows_the_server_message() {
    let (controller, _api) = controller(
        FakeAttendanceApi::default()
            .with_roster("1", alice_and_bob())
            .failing_submit("student 2 not found"),
    );
    let view = Mutex::new(RosterPage::new());
    controller
        .on_class_change(&view, "1")
        .await
        .expect("roster");

    let mut event = {
        let mut page = view.lock().await;
        page.select(StudentId(1), AttendanceStatus::Present);
        page.select(StudentId(2), AttendanceStatus::Present);
        page.submit_event().expect("complete form")
    };
    controller
        .on_submit(&view, &mut event)
        .await
        .expect_err("rejected");

    let page = view.lock().await;
    assert_eq!(
        page.message(),
        Some("Failed to record attendance: student 2 not found")
    );
    assert!(page.is_roster_visible());
    assert_eq!(page.selection(StudentId(1)), Some(AttendanceStatus::Present));
}

#[tokio::test]
async fn invalid_field_value_is_reported_without_posting() {
    let (controller, api) = controller(FakeAttendanceApi::default());
    let view = Mutex::new(RosterPage::new());
    let form: FormData = [("student_1", "Tardy")].into_iter().collect();

    let err = controller
        .on_submit(&view, &mut SubmitEvent::new(form))
        .await
        .expect_err("invalid");
    assert!(matches!(err, ClientError::InvalidField { .. }));
    assert!(api.submissions().is_empty());
    assert!(view
        .lock()
        .await
        .message()
        .is_some_and(|m| m.starts_with("Failed to record attendance")));
}
