use chrono::NaiveDate;
use shared::{
    domain::{ClassId, ClassSummary, Student, StudentId},
    error::{ApiError, ErrorCode},
    protocol::{
        AttendanceReceipt, AttendanceReport, AttendanceReportEntry, AttendanceSubmission,
    },
};
use storage::Storage;
use tracing::info;

pub const ATTENDANCE_RECORDED_MESSAGE: &str = "Attendance recorded successfully!";

#[derive(Clone)]
pub struct ApiContext {
    pub storage: Storage,
}

pub async fn list_classes(ctx: &ApiContext) -> Result<Vec<ClassSummary>, ApiError> {
    ctx.storage.list_classes().await.map_err(internal)
}

/// Roster lookup keyed by the raw path segment; anything that is not an
/// existing class id is reported as not found.
pub async fn list_students(ctx: &ApiContext, raw_class_id: &str) -> Result<Vec<Student>, ApiError> {
    let class_id = parse_class_id(raw_class_id)?;
    ensure_class_exists(ctx, class_id).await?;
    ctx.storage
        .list_students_for_class(class_id)
        .await
        .map_err(internal)
}

pub async fn record_attendance(
    ctx: &ApiContext,
    submission: &AttendanceSubmission,
    date: NaiveDate,
) -> Result<AttendanceReceipt, ApiError> {
    if submission.attendance.is_empty() {
        return Err(ApiError::new(
            ErrorCode::Validation,
            "attendance list cannot be empty",
        ));
    }

    let mut entries = Vec::with_capacity(submission.attendance.len());
    for record in &submission.attendance {
        let student_id = record
            .student_id
            .trim()
            .parse::<i64>()
            .map(StudentId)
            .map_err(|_| {
                ApiError::new(
                    ErrorCode::Validation,
                    format!("invalid student_id '{}'", record.student_id),
                )
            })?;
        entries.push((student_id, record.status));
    }

    let ids: Vec<StudentId> = entries.iter().map(|(id, _)| *id).collect();
    let unknown = ctx.storage.unknown_students(&ids).await.map_err(internal)?;
    if let Some(first) = unknown.first() {
        return Err(ApiError::new(
            ErrorCode::NotFound,
            format!("student {first} not found"),
        ));
    }

    let inserted = ctx
        .storage
        .record_attendance(&entries, date)
        .await
        .map_err(internal)?;
    info!(inserted, %date, "attendance recorded");

    Ok(AttendanceReceipt {
        message: ATTENDANCE_RECORDED_MESSAGE.to_string(),
    })
}

pub async fn attendance_report(
    ctx: &ApiContext,
    class_id: ClassId,
    date: NaiveDate,
) -> Result<AttendanceReport, ApiError> {
    ensure_class_exists(ctx, class_id).await?;
    let rows = ctx
        .storage
        .attendance_for_date(class_id, date)
        .await
        .map_err(internal)?;
    Ok(AttendanceReport {
        class_id,
        date,
        entries: rows
            .into_iter()
            .map(|row| AttendanceReportEntry {
                student_id: row.student_id,
                name: row.student_name,
                status: row.status,
            })
            .collect(),
    })
}

fn parse_class_id(raw: &str) -> Result<ClassId, ApiError> {
    raw.trim()
        .parse::<i64>()
        .map(ClassId)
        .map_err(|_| ApiError::new(ErrorCode::NotFound, "class not found"))
}

async fn ensure_class_exists(ctx: &ApiContext, class_id: ClassId) -> Result<(), ApiError> {
    if ctx.storage.class_exists(class_id).await.map_err(internal)? {
        Ok(())
    } else {
        Err(ApiError::new(ErrorCode::NotFound, "class not found"))
    }
}

fn internal(err: anyhow::Error) -> ApiError {
    ApiError::new(ErrorCode::Internal, err.to_string())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
