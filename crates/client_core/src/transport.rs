use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::{ClassId, ClassSummary, Student},
    error::ApiError,
    protocol::{AttendanceReceipt, AttendanceReport, AttendanceReportQuery, AttendanceSubmission},
};
use tracing::debug;
use url::Url;

use crate::error::ClientError;

/// Network seam between the form controller and the attendance server.
#[async_trait]
pub trait AttendanceApi: Send + Sync {
    async fn list_classes(&self) -> Result<Vec<ClassSummary>, ClientError>;
    async fn fetch_roster(&self, class_id: &str) -> Result<Vec<Student>, ClientError>;
    async fn submit_attendance(
        &self,
        submission: &AttendanceSubmission,
    ) -> Result<AttendanceReceipt, ClientError>;
    async fn attendance_report(
        &self,
        class_id: ClassId,
        date: Option<NaiveDate>,
    ) -> Result<AttendanceReport, ClientError>;
}

pub struct HttpAttendanceApi {
    http: Client,
    base_url: Url,
}

impl HttpAttendanceApi {
    pub fn new(server_url: &str) -> Result<Self, ClientError> {
        Self::with_client(Client::new(), server_url)
    }

    pub fn with_client(http: Client, server_url: &str) -> Result<Self, ClientError> {
        let base_url = Url::parse(server_url.trim())?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidBaseUrl(
                url::ParseError::RelativeUrlWithCannotBeABaseBase,
            ));
        }
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Appends path segments to the base url, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

#[async_trait]
impl AttendanceApi for HttpAttendanceApi {
    async fn list_classes(&self) -> Result<Vec<ClassSummary>, ClientError> {
        let response = self.http.get(self.endpoint(&["classes"])).send().await?;
        decode(response).await
    }

    async fn fetch_roster(&self, class_id: &str) -> Result<Vec<Student>, ClientError> {
        let url = self.endpoint(&["students", class_id]);
        debug!(%url, "fetching roster");
        let response = self.http.get(url).send().await?;
        decode(response).await
    }

    async fn submit_attendance(
        &self,
        submission: &AttendanceSubmission,
    ) -> Result<AttendanceReceipt, ClientError> {
        debug!(records = submission.attendance.len(), "posting attendance");
        let response = self
            .http
            .post(self.endpoint(&["attendance"]))
            .json(submission)
            .send()
            .await?;
        decode(response).await
    }

    async fn attendance_report(
        &self,
        class_id: ClassId,
        date: Option<NaiveDate>,
    ) -> Result<AttendanceReport, ClientError> {
        let response = self
            .http
            .get(self.endpoint(&["attendance"]))
            .query(&AttendanceReportQuery { class_id, date })
            .send()
            .await?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ApiError>(&body) {
        Ok(api_error) => api_error.message,
        Err(_) if !body.trim().is_empty() => body.trim().to_string(),
        Err(_) => status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string(),
    };
    Err(ClientError::Status {
        status: status.as_u16(),
        message,
    })
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
