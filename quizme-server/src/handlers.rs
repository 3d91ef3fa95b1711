//! HTTP request handlers

use crate::api::{
    EmbedEnvelope, HealthResponse, HealthStatus, RegisterDomainRequest, SuccessResponse,
};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::viewer;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, HeaderMap, HeaderValue},
    response::{Html, IntoResponse, Response},
    Json,
};
use std::time::Instant;
use tracing::{debug, info, warn, Instrument};

/// Serve quiz data to an embedder, subject to the access gate
pub async fn get_embed_quiz(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let start = Instant::now();
    let origin = request_origin(&headers);

    let span = crate::telemetry::embed_request_span(&id, &origin);
    async move {
        let grant = match state.gate.authorize(&id, Some(&origin)) {
            Ok(grant) => grant,
            Err(e) => {
                let err = ApiError::from_core(e, "Failed to load quiz");
                if matches!(err, ApiError::Forbidden(_)) {
                    crate::metrics::record_embed_request("deny", start.elapsed().as_secs_f64());
                    warn!("Embed of '{}' refused for origin '{}'", id, origin);
                }
                return Err(err);
            }
        };

        let allow_origin = HeaderValue::from_str(&grant.allow_origin).map_err(|e| {
            ApiError::from_core(
                quizme_core::QuizMeError::Storage(format!(
                    "allowed domains of '{}' do not form a header value: {}",
                    id, e
                )),
                "Failed to load quiz",
            )
        })?;

        let mut response_headers = HeaderMap::new();
        response_headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, allow_origin);
        response_headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("GET"),
        );
        response_headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type"),
        );
        if grant.varies_by_origin {
            response_headers.insert(header::VARY, HeaderValue::from_static("Origin"));
        }

        let elapsed = start.elapsed().as_secs_f64();
        crate::metrics::record_embed_request(grant.decision.as_str(), elapsed);
        info!(
            "Embed: {} -> {} ({:.2}ms)",
            id,
            grant.decision.as_str(),
            elapsed * 1000.0
        );

        Ok((response_headers, Json(EmbedEnvelope { quiz: grant.quiz })).into_response())
    }
    .instrument(span)
    .await
}

/// Add a domain to a quiz's embed allowlist
pub async fn register_domain(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<RegisterDomainRequest>, JsonRejection>,
) -> ApiResult<Json<SuccessResponse>> {
    let Json(request) = payload?;
    let domain = request.domain.unwrap_or_default();

    debug!("Domain registration for '{}': {:?}", id, domain);

    let update = state
        .gate
        .register_allowed_domain(&id, &domain)
        .map_err(|e| ApiError::from_core(e, "Failed to add domain"))?;

    crate::metrics::record_domain_registration(update.as_str());
    Ok(Json(SuccessResponse::ok()))
}

/// Viewer page that plays the quiz inside an iframe
pub async fn embed_page(Path(id): Path<String>) -> Html<String> {
    Html(viewer::render(&id))
}

/// Health check - liveness
pub async fn health_live(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(health(&state, HealthStatus::Healthy))
}

/// Health check - readiness
pub async fn health_ready(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    if state.gate.quiz_count() == 0 {
        warn!("Readiness check failed: store holds no quizzes");
        return Err(ApiError::ServiceUnavailable("No quizzes loaded".to_string()));
    }
    Ok(Json(health(&state, HealthStatus::Healthy)))
}

/// Prometheus metrics endpoint
pub async fn metrics(State(state): State<AppState>) -> String {
    crate::metrics::update_loaded_quizzes(state.gate.quiz_count());
    crate::metrics::render()
}

/// Origin of the embedding page; empty only when the header is absent or empty
fn request_origin(headers: &HeaderMap) -> String {
    headers
        .get(header::ORIGIN)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
        .unwrap_or_default()
}

fn health(state: &AppState, status: HealthStatus) -> HealthResponse {
    let loaded_quizzes = state.gate.quiz_count();
    HealthResponse {
        status: if loaded_quizzes == 0 {
            HealthStatus::Degraded
        } else {
            status
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
        loaded_quizzes,
        cors_policy: state.gate.cors_policy(),
    }
}
