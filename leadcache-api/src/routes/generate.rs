//! Email suggestion route.
//!
//! The provider call runs on its own task and reports back through a
//! one-shot delivery. If this handler is dropped before the result arrives
//! (client disconnect, shutdown), the worker sees the closed channel and
//! abandons the call.

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use leadcache_llm::{deliver_unless_abandoned, delivery_channel, DeliveryOutcome, DraftRequest};

use crate::error::{ApiError, ApiResult, ErrorBody};
use crate::state::{AppState, SharedGenerator};
use crate::telemetry::METRICS;
use crate::types::{GenerateEmailRequest, GenerateEmailResponse};

fn record_outcome(outcome: &str) {
    if let Ok(metrics) = METRICS.as_ref() {
        metrics.record_generation(outcome);
    }
}

/// POST /generate-email-suggestion - Draft a cold email for a lead
#[utoipa::path(
    post,
    path = "/generate-email-suggestion",
    tag = "Generation",
    request_body = GenerateEmailRequest,
    responses(
        (status = 200, description = "Generated draft; `fallback` marks unparsed model output", body = GenerateEmailResponse),
        (status = 400, description = "Missing companyInfo or personName", body = ErrorBody),
        (status = 502, description = "Provider call failed", body = ErrorBody),
        (status = 503, description = "Generation not configured", body = ErrorBody),
        (status = 504, description = "Provider call timed out", body = ErrorBody),
    ),
)]
pub async fn generate_email_suggestion(
    State(generator): State<SharedGenerator>,
    body: Result<Json<GenerateEmailRequest>, JsonRejection>,
) -> ApiResult<Json<GenerateEmailResponse>> {
    let Json(input) = body?;
    let request = DraftRequest::new(input.company_info, input.person_name)?;
    let provider = generator.ok_or_else(ApiError::not_configured)?;

    let (delivery, result) = delivery_channel();
    tokio::spawn(async move {
        let work = async { provider.generate(&request).await };
        if deliver_unless_abandoned(delivery, work).await == DeliveryOutcome::CallerGone {
            record_outcome("abandoned");
            tracing::info!("Caller left before the draft was ready, discarded");
        }
    });

    let generated = result
        .await
        .map_err(|_| ApiError::internal_error("Generation worker stopped without a result"))?
        .inspect_err(|_| record_outcome("error"))?;

    record_outcome(if generated.fallback { "fallback" } else { "parsed" });
    tracing::info!(fallback = generated.fallback, "Generated email suggestion");

    Ok(Json(GenerateEmailResponse {
        success: true,
        subject: generated.draft.subject,
        body: generated.draft.body,
        fallback: generated.fallback,
    }))
}

/// Create generation router
pub fn create_router() -> Router<AppState> {
    Router::new().route("/generate-email-suggestion", post(generate_email_suggestion))
}
