use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{AttendanceStatus, ClassId, StudentId};

pub const CLASSES_ROUTE: &str = "/classes";
pub const ATTENDANCE_ROUTE: &str = "/attendance";

pub const STUDENTS_ROUTE: &str = "/students/:class_id";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub student_id: String,
    pub status: AttendanceStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceSubmission {
    pub attendance: Vec<AttendanceRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceReceipt {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceReportQuery {
    pub class_id: ClassId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceReportEntry {
    pub student_id: StudentId,
    pub name: String,
    pub status: AttendanceStatus,
}

/// Attendance already recorded for one class on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceReport {
    pub class_id: ClassId,
    pub date: NaiveDate,
    pub entries: Vec<AttendanceReportEntry>,
}
