//! Aggregate routes: namespace stats, lead classification and CSV export.
//!
//! All of them are recomputed from a fresh scan on every request.

use axum::{
    extract::State,
    http::{header, HeaderName, HeaderValue},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use leadcache_core::ExportRow;
use leadcache_storage::Aggregator;

use crate::error::{ApiError, ApiResult, ErrorBody};
use crate::state::AppState;
use crate::telemetry::observe_store_op;
use crate::types::{LeadCountResponse, StatsResponse};

/// GET /stats - Entry count and freshness window
#[utoipa::path(
    get,
    path = "/stats",
    tag = "Leads",
    responses(
        (status = 200, description = "Namespace statistics", body = StatsResponse),
        (status = 503, description = "Store unreachable", body = ErrorBody),
    ),
)]
pub async fn stats(State(aggregator): State<Aggregator>) -> ApiResult<Json<StatsResponse>> {
    let snapshot = observe_store_op("stats", aggregator.stats()).await?;
    tracing::debug!(total_entries = snapshot.total_entries, "Computed stats");

    Ok(Json(StatsResponse {
        success: true,
        stats: snapshot.into(),
    }))
}

/// GET /leads/count - Classify every lead in the namespace
#[utoipa::path(
    get,
    path = "/leads/count",
    tag = "Leads",
    responses(
        (status = 200, description = "Lead tallies", body = LeadCountResponse),
        (status = 503, description = "Store unreachable", body = ErrorBody),
    ),
)]
pub async fn lead_count(State(aggregator): State<Aggregator>) -> ApiResult<Json<LeadCountResponse>> {
    let tally = observe_store_op("classify", aggregator.classify()).await?;
    tracing::debug!(
        total = tally.total,
        valid_exported = tally.valid_exported,
        valid_unexported = tally.valid_unexported,
        invalid = tally.invalid,
        "Classified leads"
    );

    Ok(Json(tally.into()))
}

/// CSV header row, written even when nothing was exported.
pub const EXPORT_COLUMNS: [&str; 6] = ["firstName", "lastName", "companyName", "email", "subject", "body"];

/// Response header carrying the number of exported rows.
pub const EXPORTED_COUNT_HEADER: &str = "x-leads-exported";

/// POST /leads/export - Export valid, unexported leads as CSV and flag them exported
#[utoipa::path(
    post,
    path = "/leads/export",
    tag = "Leads",
    responses(
        (status = 200, description = "CSV of the leads flagged by this export", body = String, content_type = "text/csv"),
        (status = 503, description = "Store unreachable", body = ErrorBody),
    ),
)]
pub async fn export_leads(State(aggregator): State<Aggregator>) -> ApiResult<Response> {
    let report = observe_store_op("export", aggregator.export_valid()).await?;
    let csv = render_csv(&report.rows)?;

    tracing::info!(
        exported = report.exported(),
        with_draft = report.with_draft(),
        failed = report.failed,
        "Exported leads"
    );

    let mut response = csv.into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/csv; charset=utf-8"),
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_static("attachment; filename=\"valid_leads.csv\""),
    );
    headers.insert(
        HeaderName::from_static(EXPORTED_COUNT_HEADER),
        HeaderValue::from(report.exported()),
    );
    Ok(response)
}

fn render_csv(rows: &[ExportRow]) -> ApiResult<Vec<u8>> {
    let csv_error = |e: csv::Error| ApiError::internal_error(format!("Failed to render CSV: {}", e));

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(EXPORT_COLUMNS).map_err(csv_error)?;
    for row in rows {
        writer.serialize(row).map_err(csv_error)?;
    }
    writer
        .into_inner()
        .map_err(|e| ApiError::internal_error(format!("Failed to flush CSV: {}", e.error())))
}

/// Create aggregate router
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/stats", get(stats))
        .route("/leads/count", get(lead_count))
        .route("/leads/export", post(export_leads))
}
