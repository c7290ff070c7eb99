use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Path, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{
    CallerContext, CreateLeadRequest, CreateTenantRequest, CreateUserRequest, LeadId, LeadStatus,
    Plan, Role, TenantId, UserId,
};
use super::repository::{ClaimsPublisher, TenancyRepository};
use super::service::{TenancyError, TenancyService};

pub const CALLER_UID_HEADER: &str = "x-caller-uid";
pub const CALLER_ROLE_HEADER: &str = "x-caller-role";
pub const CALLER_TENANT_HEADER: &str = "x-caller-tenant";

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Reads the verified identity forwarded by the auth gateway.
#[axum::async_trait]
impl<S> FromRequestParts<S> for CallerContext
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let unauthorized = |message: String| {
            (StatusCode::UNAUTHORIZED, Json(json!({ "error": message }))).into_response()
        };

        let uid = header_value(&parts.headers, CALLER_UID_HEADER)
            .ok_or_else(|| unauthorized(format!("missing {CALLER_UID_HEADER} header")))?;
        let raw_role = header_value(&parts.headers, CALLER_ROLE_HEADER)
            .ok_or_else(|| unauthorized(format!("missing {CALLER_ROLE_HEADER} header")))?;
        let role = Role::parse(raw_role)
            .ok_or_else(|| unauthorized(format!("unknown caller role {raw_role}")))?;
        let tenant_id = header_value(&parts.headers, CALLER_TENANT_HEADER).map(TenantId::from);

        Ok(CallerContext {
            uid: UserId::from(uid),
            role,
            tenant_id,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct PlanChange {
    pub plan: Plan,
}

#[derive(Debug, Deserialize)]
pub struct RoleChange {
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct StatusChange {
    pub status: LeadStatus,
}

/// Tenant administration and lead management endpoints.
pub fn tenancy_router<R, C>(service: Arc<TenancyService<R, C>>) -> Router
where
    R: TenancyRepository + 'static,
    C: ClaimsPublisher + 'static,
{
    Router::new()
        .route("/api/v1/tenants", post(create_tenant_handler::<R, C>))
        .route(
            "/api/v1/tenants/:tenant_id",
            delete(delete_tenant_handler::<R, C>),
        )
        .route(
            "/api/v1/tenants/:tenant_id/plan",
            put(change_plan_handler::<R, C>),
        )
        .route(
            "/api/v1/tenants/:tenant_id/users",
            post(create_user_handler::<R, C>),
        )
        .route("/api/v1/users/:uid/role", put(update_role_handler::<R, C>))
        .route(
            "/api/v1/tenants/:tenant_id/usage",
            get(usage_handler::<R, C>),
        )
        .route(
            "/api/v1/tenants/:tenant_id/leads",
            post(create_lead_handler::<R, C>).get(list_leads_handler::<R, C>),
        )
        .route(
            "/api/v1/tenants/:tenant_id/leads/export",
            get(export_leads_handler::<R, C>),
        )
        .route(
            "/api/v1/tenants/:tenant_id/leads/:lead_id/status",
            put(lead_status_handler::<R, C>),
        )
        .with_state(service)
}

pub fn tenancy_error_response(err: &TenancyError) -> Response {
    let payload = json!({ "error": err.to_string() });
    (err.status_code(), Json(payload)).into_response()
}

fn respond<T: serde::Serialize>(status: StatusCode, result: Result<T, TenancyError>) -> Response {
    match result {
        Ok(body) => (status, Json(body)).into_response(),
        Err(err) => tenancy_error_response(&err),
    }
}

pub(crate) async fn create_tenant_handler<R, C>(
    State(service): State<Arc<TenancyService<R, C>>>,
    caller: CallerContext,
    Json(request): Json<CreateTenantRequest>,
) -> Response
where
    R: TenancyRepository + 'static,
    C: ClaimsPublisher + 'static,
{
    respond(StatusCode::CREATED, service.create_tenant(&caller, request))
}

pub(crate) async fn delete_tenant_handler<R, C>(
    State(service): State<Arc<TenancyService<R, C>>>,
    caller: CallerContext,
    Path(tenant_id): Path<String>,
) -> Response
where
    R: TenancyRepository + 'static,
    C: ClaimsPublisher + 'static,
{
    respond(
        StatusCode::OK,
        service.delete_tenant(&caller, &TenantId(tenant_id)),
    )
}

pub(crate) async fn change_plan_handler<R, C>(
    State(service): State<Arc<TenancyService<R, C>>>,
    caller: CallerContext,
    Path(tenant_id): Path<String>,
    Json(change): Json<PlanChange>,
) -> Response
where
    R: TenancyRepository + 'static,
    C: ClaimsPublisher + 'static,
{
    respond(
        StatusCode::OK,
        service.change_plan(&caller, &TenantId(tenant_id), change.plan),
    )
}

pub(crate) async fn create_user_handler<R, C>(
    State(service): State<Arc<TenancyService<R, C>>>,
    caller: CallerContext,
    Path(tenant_id): Path<String>,
    Json(request): Json<CreateUserRequest>,
) -> Response
where
    R: TenancyRepository + 'static,
    C: ClaimsPublisher + 'static,
{
    respond(
        StatusCode::CREATED,
        service.create_tenant_user(&caller, &TenantId(tenant_id), request),
    )
}

pub(crate) async fn update_role_handler<R, C>(
    State(service): State<Arc<TenancyService<R, C>>>,
    caller: CallerContext,
    Path(uid): Path<String>,
    Json(change): Json<RoleChange>,
) -> Response
where
    R: TenancyRepository + 'static,
    C: ClaimsPublisher + 'static,
{
    respond(
        StatusCode::OK,
        service.update_user_role(&caller, &UserId(uid), change.role),
    )
}

pub(crate) async fn usage_handler<R, C>(
    State(service): State<Arc<TenancyService<R, C>>>,
    caller: CallerContext,
    Path(tenant_id): Path<String>,
) -> Response
where
    R: TenancyRepository + 'static,
    C: ClaimsPublisher + 'static,
{
    respond(StatusCode::OK, service.usage(&caller, &TenantId(tenant_id)))
}

pub(crate) async fn create_lead_handler<R, C>(
    State(service): State<Arc<TenancyService<R, C>>>,
    caller: CallerContext,
    Path(tenant_id): Path<String>,
    Json(request): Json<CreateLeadRequest>,
) -> Response
where
    R: TenancyRepository + 'static,
    C: ClaimsPublisher + 'static,
{
    respond(
        StatusCode::CREATED,
        service.create_lead(&caller, &TenantId(tenant_id), request),
    )
}

pub(crate) async fn list_leads_handler<R, C>(
    State(service): State<Arc<TenancyService<R, C>>>,
    caller: CallerContext,
    Path(tenant_id): Path<String>,
) -> Response
where
    R: TenancyRepository + 'static,
    C: ClaimsPublisher + 'static,
{
    respond(
        StatusCode::OK,
        service.list_leads(&caller, &TenantId(tenant_id)),
    )
}

pub(crate) async fn export_leads_handler<R, C>(
    State(service): State<Arc<TenancyService<R, C>>>,
    caller: CallerContext,
    Path(tenant_id): Path<String>,
) -> Response
where
    R: TenancyRepository + 'static,
    C: ClaimsPublisher + 'static,
{
    match service.export_leads_csv(&caller, &TenantId(tenant_id)) {
        Ok(csv) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
            csv,
        )
            .into_response(),
        Err(err) => tenancy_error_response(&err),
    }
}

pub(crate) async fn lead_status_handler<R, C>(
    State(service): State<Arc<TenancyService<R, C>>>,
    caller: CallerContext,
    Path((tenant_id, lead_id)): Path<(String, String)>,
    Json(change): Json<StatusChange>,
) -> Response
where
    R: TenancyRepository + 'static,
    C: ClaimsPublisher + 'static,
{
    respond(
        StatusCode::OK,
        service.update_lead_status(
            &caller,
            &TenantId(tenant_id),
            &LeadId(lead_id),
            change.status,
        ),
    )
}
