use crate::infra::AppState;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use visa_pathways::calculators::report::render_points_report;
use visa_pathways::calculators::router::{points_table, EvaluationRequest};
use visa_pathways::calculators::{
    calculator_router, estimate_student_funds, evaluate, StudentFundsRequest,
};
use visa_pathways::occupations::router::occupation_error_response;
use visa_pathways::occupations::{
    occupation_router, OccupationCode, OccupationDirectory, OccupationError, OccupationRoutes,
    TableSource,
};
use visa_pathways::tenancy::{
    tenancy_error_response, tenancy_router, CallerContext, ClaimsPublisher, Feature,
    TenancyRepository, TenancyService, TenantId, UsageCounter,
};

/// State for tenant-scoped calculator and lookup routes.
pub(crate) struct TenantRoutes<S, R, C> {
    pub(crate) tenancy: Arc<TenancyService<R, C>>,
    pub(crate) directory: Arc<OccupationDirectory<S>>,
}

impl<S, R, C> Clone for TenantRoutes<S, R, C> {
    fn clone(&self) -> Self {
        Self {
            tenancy: self.tenancy.clone(),
            directory: self.directory.clone(),
        }
    }
}

/// Result of a metered call together with the tenant's usage after it.
#[derive(Debug, Serialize)]
pub(crate) struct Metered<T> {
    pub(crate) used: u32,
    pub(crate) result: T,
}

pub(crate) fn with_service_routes<S, R, C>(
    tenancy: Arc<TenancyService<R, C>>,
    occupations: OccupationRoutes<S>,
) -> Router
where
    S: TableSource + 'static,
    R: TenancyRepository + 'static,
    C: ClaimsPublisher + 'static,
{
    let tenant_routes = TenantRoutes {
        tenancy: tenancy.clone(),
        directory: occupations.directory.clone(),
    };

    calculator_router()
        .merge(occupation_router(occupations))
        .merge(tenancy_router(tenancy))
        .merge(tenant_scoped_router(tenant_routes))
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

fn tenant_scoped_router<S, R, C>(routes: TenantRoutes<S, R, C>) -> Router
where
    S: TableSource + 'static,
    R: TenancyRepository + 'static,
    C: ClaimsPublisher + 'static,
{
    Router::new()
        .route(
            "/api/v1/tenants/:tenant_id/evaluations/:variant",
            post(metered_evaluation::<S, R, C>),
        )
        .route(
            "/api/v1/tenants/:tenant_id/reports/:variant",
            post(metered_report::<S, R, C>),
        )
        .route(
            "/api/v1/tenants/:tenant_id/funds/student",
            post(tenant_student_funds::<S, R, C>),
        )
        .route(
            "/api/v1/tenants/:tenant_id/occupations/:code",
            get(metered_lookup::<S, R, C>),
        )
        .route(
            "/api/v1/tenants/:tenant_id/checklists/:subclass",
            get(tenant_checklist::<S, R, C>),
        )
        .with_state(routes)
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn metered_evaluation<S, R, C>(
    State(routes): State<TenantRoutes<S, R, C>>,
    caller: CallerContext,
    Path((tenant_id, variant)): Path<(String, String)>,
    Json(request): Json<EvaluationRequest>,
) -> Response
where
    S: TableSource + 'static,
    R: TenancyRepository + 'static,
    C: ClaimsPublisher + 'static,
{
    let table = match points_table(&variant) {
        Ok(table) => table,
        Err(response) => return response,
    };
    let tenant_id = TenantId(tenant_id);
    let used = match routes
        .tenancy
        .consume(&caller, &tenant_id, UsageCounter::Evaluations)
    {
        Ok(used) => used,
        Err(err) => return tenancy_error_response(&err),
    };

    let outcome = evaluate(&table, &request.selections);
    info!(
        %tenant_id,
        variant = %table.variant,
        total = outcome.total,
        status = outcome.status.label(),
        "metered evaluation"
    );
    (
        StatusCode::OK,
        Json(Metered {
            used,
            result: outcome,
        }),
    )
        .into_response()
}

pub(crate) async fn metered_report<S, R, C>(
    State(routes): State<TenantRoutes<S, R, C>>,
    caller: CallerContext,
    Path((tenant_id, variant)): Path<(String, String)>,
    Json(request): Json<EvaluationRequest>,
) -> Response
where
    S: TableSource + 'static,
    R: TenancyRepository + 'static,
    C: ClaimsPublisher + 'static,
{
    let table = match points_table(&variant) {
        Ok(table) => table,
        Err(response) => return response,
    };
    let tenant_id = TenantId(tenant_id);
    let metered = routes
        .tenancy
        .authorize_feature(&caller, &tenant_id, Feature::EligibilityReports)
        .and_then(|_| {
            routes
                .tenancy
                .consume(&caller, &tenant_id, UsageCounter::Evaluations)
        });
    if let Err(err) = metered {
        return tenancy_error_response(&err);
    }

    let outcome = evaluate(&table, &request.selections);
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        render_points_report(&table, &outcome),
    )
        .into_response()
}

pub(crate) async fn tenant_student_funds<S, R, C>(
    State(routes): State<TenantRoutes<S, R, C>>,
    caller: CallerContext,
    Path(tenant_id): Path<String>,
    Json(request): Json<StudentFundsRequest>,
) -> Response
where
    S: TableSource + 'static,
    R: TenancyRepository + 'static,
    C: ClaimsPublisher + 'static,
{
    let tenant_id = TenantId(tenant_id);
    if let Err(err) = routes
        .tenancy
        .authorize_feature(&caller, &tenant_id, Feature::StudentFunds)
    {
        return tenancy_error_response(&err);
    }
    (StatusCode::OK, Json(estimate_student_funds(&request))).into_response()
}

pub(crate) async fn metered_lookup<S, R, C>(
    State(routes): State<TenantRoutes<S, R, C>>,
    caller: CallerContext,
    Path((tenant_id, code)): Path<(String, String)>,
) -> Response
where
    S: TableSource + 'static,
    R: TenancyRepository + 'static,
    C: ClaimsPublisher + 'static,
{
    // Malformed codes are rejected before they cost the tenant a lookup.
    let code = match OccupationCode::parse(&code) {
        Ok(code) => code,
        Err(err) => return occupation_error_response(&OccupationError::from(err)),
    };
    let tenant_id = TenantId(tenant_id);
    let used = match routes
        .tenancy
        .consume(&caller, &tenant_id, UsageCounter::OccupationLookups)
    {
        Ok(used) => used,
        Err(err) => return tenancy_error_response(&err),
    };

    match routes.directory.lookup(code.as_str()).await {
        Ok(found) => (
            StatusCode::OK,
            Json(Metered {
                used,
                result: found,
            }),
        )
            .into_response(),
        Err(err) => occupation_error_response(&err),
    }
}

pub(crate) async fn tenant_checklist<S, R, C>(
    State(routes): State<TenantRoutes<S, R, C>>,
    caller: CallerContext,
    Path((tenant_id, subclass)): Path<(String, String)>,
) -> Response
where
    S: TableSource + 'static,
    R: TenancyRepository + 'static,
    C: ClaimsPublisher + 'static,
{
    let tenant_id = TenantId(tenant_id);
    if let Err(err) = routes
        .tenancy
        .authorize_feature(&caller, &tenant_id, Feature::DocumentChecklists)
    {
        return tenancy_error_response(&err);
    }
    match routes.directory.checklist(&subclass).await {
        Ok(checklist) => (StatusCode::OK, Json(checklist)).into_response(),
        Err(err) => occupation_error_response(&err),
    }
}
