use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite,
};
use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::debug;

use shared::domain::{AttendanceStatus, ClassId, ClassSummary, Student, StudentId};

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAttendance {
    pub student_id: StudentId,
    pub student_name: String,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn create_class(&self, name: &str) -> Result<ClassId> {
        let rec = sqlx::query("INSERT INTO classes (name) VALUES (?) RETURNING id")
            .bind(name)
            .fetch_one(&self.pool)
            .await?;
        Ok(ClassId(rec.get::<i64, _>(0)))
    }

    pub async fn list_classes(&self) -> Result<Vec<ClassSummary>> {
        let rows = sqlx::query("SELECT id, name FROM classes ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|r| ClassSummary {
                id: ClassId(r.get::<i64, _>(0)),
                name: r.get::<String, _>(1),
            })
            .collect())
    }

    pub async fn class_exists(&self, class_id: ClassId) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM classes WHERE id = ?")
            .bind(class_id.0)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    pub async fn add_student(
        &self,
        class_id: ClassId,
        name: &str,
        email: Option<&str>,
    ) -> Result<StudentId> {
        let rec = sqlx::query(
            "INSERT INTO students (name, email, class_id) VALUES (?, ?, ?) RETURNING id",
        )
        .bind(name)
        .bind(email)
        .bind(class_id.0)
        .fetch_one(&self.pool)
        .await
        .with_context(|| format!("failed to add student '{name}' to class {class_id}"))?;
        Ok(StudentId(rec.get::<i64, _>(0)))
    }

    /// Roster for a class in enrolment (id) order.
    pub async fn list_students_for_class(&self, class_id: ClassId) -> Result<Vec<Student>> {
        let rows = sqlx::query("SELECT id, name FROM students WHERE class_id = ? ORDER BY id ASC")
            .bind(class_id.0)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|r| Student {
                id: StudentId(r.get::<i64, _>(0)),
                name: r.get::<String, _>(1),
            })
            .collect())
    }

    /// Returns the ids from `student_ids` that have no matching student row,
    /// preserving input order.
    pub async fn unknown_students(&self, student_ids: &[StudentId]) -> Result<Vec<StudentId>> {
        let mut known = HashSet::new();
        for student_id in student_ids {
            if known.contains(student_id) {
                continue;
            }
            let row = sqlx::query("SELECT 1 FROM students WHERE id = ?")
                .bind(student_id.0)
                .fetch_optional(&self.pool)
                .await?;
            if row.is_some() {
                known.insert(*student_id);
            }
        }
        Ok(student_ids
            .iter()
            .filter(|id| !known.contains(id))
            .copied()
            .collect())
    }

    /// Stores every entry for `date` in one transaction.
    pub async fn record_attendance(
        &self,
        entries: &[(StudentId, AttendanceStatus)],
        date: NaiveDate,
    ) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;
        for (student_id, status) in entries {
            let result = sqlx::query(
                "INSERT INTO attendance (student_id, date, status) VALUES (?, ?, ?)",
            )
            .bind(student_id.0)
            .bind(date)
            .bind(status.as_str())
            .execute(&mut *tx)
            .await;
            match result {
                Ok(done) => inserted += done.rows_affected(),
                Err(err) => {
                    tx.rollback().await?;
                    return Err(anyhow::Error::new(err).context(format!(
                        "failed to record attendance for student {student_id}"
                    )));
                }
            }
        }
        tx.commit().await?;
        debug!(inserted, %date, "attendance rows committed");
        Ok(inserted)
    }

    pub async fn attendance_for_date(
        &self,
        class_id: ClassId,
        date: NaiveDate,
    ) -> Result<Vec<StoredAttendance>> {
        let rows = sqlx::query(
            "SELECT s.id, s.name, a.date, a.status
             FROM attendance a
             INNER JOIN students s ON s.id = a.student_id
             WHERE s.class_id = ? AND a.date = ?
             ORDER BY a.id ASC",
        )
        .bind(class_id.0)
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|r| {
                let status: String = r.get(3);
                Ok(StoredAttendance {
                    student_id: StudentId(r.get::<i64, _>(0)),
                    student_name: r.get::<String, _>(1),
                    date: r.get::<NaiveDate, _>(2),
                    status: status
                        .parse()
                        .with_context(|| format!("corrupt attendance status '{status}'"))?,
                })
            })
            .collect()
    }
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with("sqlite::memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
