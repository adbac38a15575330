use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{DefaultBodyLimit, Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use server_api::{attendance_report, list_classes, list_students, record_attendance, ApiContext};
use shared::{
    domain::{ClassSummary, Student},
    error::{ApiError, ErrorCode},
    protocol::{
        AttendanceReceipt, AttendanceReport, AttendanceReportQuery, AttendanceSubmission,
        ATTENDANCE_ROUTE, CLASSES_ROUTE, STUDENTS_ROUTE,
    },
};
use storage::Storage;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod app_state;
mod config;

use app_state::AppState;
use config::{load_settings, normalize_database_url};

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = load_settings();
    let database_url = normalize_database_url(&settings.database_url);
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;

    let state = AppState::new(ApiContext { storage });
    let app = build_router(Arc::new(state), settings.max_body_bytes);

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "attendance server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown requested");
        })
        .await?;
    Ok(())
}

fn build_router(state: Arc<AppState>, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route(CLASSES_ROUTE, get(http_list_classes))
        .route(STUDENTS_ROUTE, get(http_list_students))
        .route(
            ATTENDANCE_ROUTE,
            get(http_attendance_report).post(http_record_attendance),
        )
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn error_response(err: ApiError) -> (StatusCode, Json<ApiError>) {
    let status = match err.code {
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        error!(message = %err.message, "request failed");
    } else {
        warn!(code = ?err.code, message = %err.message, "request rejected");
    }
    (status, Json(err))
}

async fn healthz(State(state): State<Arc<AppState>>) -> (StatusCode, &'static str) {
    match state.api.storage.health_check().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(error) => {
            error!(%error, "health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
    }
}

async fn http_list_classes(State(state): State<Arc<AppState>>) -> ApiResult<Vec<ClassSummary>> {
    let classes = list_classes(&state.api).await.map_err(error_response)?;
    Ok(Json(classes))
}

async fn http_list_students(
    State(state): State<Arc<AppState>>,
    Path(class_id): Path<String>,
) -> ApiResult<Vec<Student>> {
    let students = list_students(&state.api, &class_id)
        .await
        .map_err(error_response)?;
    Ok(Json(students))
}

async fn http_record_attendance(
    State(state): State<Arc<AppState>>,
    Json(submission): Json<AttendanceSubmission>,
) -> ApiResult<AttendanceReceipt> {
    let today = (state.today)();
    let receipt = record_attendance(&state.api, &submission, today)
        .await
        .map_err(error_response)?;
    Ok(Json(receipt))
}

async fn http_attendance_report(
    State(state): State<Arc<AppState>>,
    Query(q): Query<AttendanceReportQuery>,
) -> ApiResult<AttendanceReport> {
    let date = q.date.unwrap_or_else(|| (state.today)());
    let report = attendance_report(&state.api, q.class_id, date)
        .await
        .map_err(error_response)?;
    Ok(Json(report))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
