use crate::catalog::{CatalogHandle, CatalogSource, CatalogSummary};
use crate::domain::{FundingProgram, FundingQuery, FundingRequest};
use crate::engine::{self, MatchOptions, TracingObserver};
use crate::error::MatchError;
use crate::observability::metrics;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use hyper::Server;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::field::Empty;
use tracing::{info, instrument, warn, Span};
use uuid::Uuid;

/// Shared state for every handler. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub catalog: CatalogHandle,
    pub source: Arc<dyn CatalogSource>,
    pub options: MatchOptions,
    /// Log the per-program predicate breakdown of each query
    pub diagnostics: bool,
}

/// Errors surfaced to API clients as structured JSON.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("No funding option named '{0}'")]
    ProgramNotFound(String),

    #[error("No funding options found for state '{0}'")]
    RegionNotFound(String),

    #[error("No funding options found for company size '{0}'")]
    SizeClassNotFound(String),

    #[error("No matching funding options found.")]
    NoMatchFound,

    #[error("{0}")]
    InvalidQuery(String),

    #[error("Catalog reload failed: {0}")]
    ReloadFailed(String),
}

impl ApiError {
    fn kind(&self) -> &'static str {
        match self {
            ApiError::ProgramNotFound(_) => "ProgramNotFound",
            ApiError::RegionNotFound(_) => "RegionNotFound",
            ApiError::SizeClassNotFound(_) => "SizeClassNotFound",
            ApiError::NoMatchFound => "NoMatchFound",
            ApiError::InvalidQuery(_) => "InvalidQuery",
            ApiError::ReloadFailed(_) => "ReloadFailed",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidQuery(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::ReloadFailed(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::NOT_FOUND,
        }
    }
}

impl From<MatchError> for ApiError {
    fn from(err: MatchError) -> Self {
        match err {
            MatchError::NoMatchFound => ApiError::NoMatchFound,
            MatchError::InvalidQuery(detail) => ApiError::InvalidQuery(detail),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.kind(),
            detail: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Health check endpoint
async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let catalog = state.catalog.snapshot();
    Json(serde_json::json!({
        "status": "healthy",
        "service": "funding-matcher",
        "version": env!("CARGO_PKG_VERSION"),
        "catalog": catalog.summary(),
    }))
}

async fn list_funding_options(State(state): State<AppState>) -> Json<Vec<FundingProgram>> {
    let catalog = state.catalog.snapshot();
    Json(catalog.programs().to_vec())
}

async fn funding_option_by_name(State(state): State<AppState>, Path(name): Path<String>) -> ApiResult<FundingProgram> {
    let catalog = state.catalog.snapshot();
    let found = catalog.find_by_name(&name).cloned();
    metrics::lookup::request("by_name", found.is_some());
    found.map(Json).ok_or(ApiError::ProgramNotFound(name))
}

async fn funding_options_by_state(
    State(state): State<AppState>,
    Path(region): Path<String>,
) -> ApiResult<Vec<FundingProgram>> {
    let catalog = state.catalog.snapshot();
    let programs: Vec<FundingProgram> = catalog.filter_by_region(&region).into_iter().cloned().collect();
    metrics::lookup::request("by_state", !programs.is_empty());
    if programs.is_empty() {
        return Err(ApiError::RegionNotFound(region));
    }
    Ok(Json(programs))
}

async fn funding_options_by_company_size(
    State(state): State<AppState>,
    Path(size): Path<String>,
) -> ApiResult<Vec<FundingProgram>> {
    let catalog = state.catalog.snapshot();
    let programs: Vec<FundingProgram> = catalog.filter_by_size_class(&size).into_iter().cloned().collect();
    metrics::lookup::request("by_company_size", !programs.is_empty());
    if programs.is_empty() {
        return Err(ApiError::SizeClassNotFound(size));
    }
    Ok(Json(programs))
}

#[instrument(
    skip(state, payload),
    fields(request_id = %Uuid::new_v4(), region = Empty, company_size = Empty)
)]
async fn find_best_funding(
    State(state): State<AppState>,
    payload: Result<Json<FundingRequest>, JsonRejection>,
) -> ApiResult<Vec<FundingProgram>> {
    let Json(request) = payload.map_err(|rejection| {
        metrics::matching::invalid_query();
        ApiError::InvalidQuery(rejection.body_text())
    })?;

    let span = Span::current();
    span.record("region", request.state.as_str());
    span.record("company_size", request.company_size.as_str());

    let query = FundingQuery::try_from(request).map_err(|e| {
        metrics::matching::invalid_query();
        ApiError::from(e)
    })?;

    let catalog = state.catalog.snapshot();
    let started = Instant::now();
    let outcome = if state.diagnostics {
        engine::find_best_funding_observed(&catalog, &query, &state.options, &TracingObserver)
    } else {
        engine::find_best_funding(&catalog, &query, &state.options)
    };
    let elapsed = started.elapsed().as_secs_f64();

    match outcome {
        Ok(outcome) => {
            metrics::matching::query_matched(outcome.eligible, elapsed);
            info!(eligible = outcome.eligible, returned = outcome.programs.len(), "Matched funding options");
            Ok(Json(outcome.programs.into_iter().cloned().collect()))
        }
        Err(e) => {
            metrics::matching::no_match(elapsed);
            info!("No eligible funding options");
            Err(e.into())
        }
    }
}

#[derive(Serialize)]
struct ReloadResponse {
    catalog: CatalogSummary,
    total_records: usize,
    skipped_records: usize,
    recovered_fields: usize,
}

async fn reload_catalog(State(state): State<AppState>) -> ApiResult<ReloadResponse> {
    let (catalog, report) = state
        .catalog
        .reload_from(state.source.as_ref())
        .await
        .map_err(|e| ApiError::ReloadFailed(e.to_string()))?;

    Ok(Json(ReloadResponse {
        catalog: catalog.summary(),
        total_records: report.total_records,
        skipped_records: report.skipped.len(),
        recovered_fields: report.recovered_fields,
    }))
}

/// CORS for the configured front-end origins. `*` allows any origin.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::from(Any)
    } else {
        let values: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(%origin, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(values)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Create the HTTP router with all routes
pub fn create_router(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/funding-options", get(list_funding_options))
        .route("/funding-options/name/:name", get(funding_option_by_name))
        .route("/funding-options/state/:state", get(funding_options_by_state))
        .route("/funding-options/company-size/:size", get(funding_options_by_company_size))
        .route("/find-best-funding", post(find_best_funding))
        .route("/admin/reload", post(reload_catalog))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(cors_origins)),
        )
        .with_state(state)
}

/// Start the HTTP server and run until Ctrl-C
pub async fn start_server(
    state: AppState,
    addr: SocketAddr,
    cors_origins: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_router(state, cors_origins);

    info!(%addr, "HTTP server listening");
    println!("🚀 Funding matcher running on http://{addr}");
    println!("💚 Health check: http://{addr}/health");
    println!("🔎 Matching:     POST http://{addr}/find-best-funding");

    Server::bind(&addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
