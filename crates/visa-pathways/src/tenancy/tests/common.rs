use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::tenancy::domain::{
    AuthClaims, CallerContext, CreateLeadRequest, CreateTenantRequest, Plan, ProvisionedTenant,
    Role, TenantId, UserId,
};
use crate::tenancy::memory::{InMemoryClaims, InMemoryTenancyRepository};
use crate::tenancy::repository::{ClaimsError, ClaimsPublisher};
use crate::tenancy::service::TenancyService;

pub(super) type MemoryService = TenancyService<InMemoryTenancyRepository, InMemoryClaims>;

pub(super) fn october() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 19, 10, 0, 0).unwrap()
}

pub(super) fn november() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 11, 2, 8, 0, 0).unwrap()
}

pub(super) fn build_service() -> (
    MemoryService,
    Arc<InMemoryTenancyRepository>,
    Arc<InMemoryClaims>,
) {
    let repository = Arc::new(InMemoryTenancyRepository::default());
    let claims = Arc::new(InMemoryClaims::default());
    let service = TenancyService::new(repository.clone(), claims.clone()).with_clock(october);
    (service, repository, claims)
}

pub(super) fn operator() -> CallerContext {
    CallerContext {
        uid: UserId::from("ops-1"),
        role: Role::SuperAdmin,
        tenant_id: None,
    }
}

pub(super) fn caller(role: Role, tenant_id: &TenantId) -> CallerContext {
    CallerContext {
        uid: UserId::from("caller-1"),
        role,
        tenant_id: Some(tenant_id.clone()),
    }
}

pub(super) fn tenant_request(plan: Plan) -> CreateTenantRequest {
    CreateTenantRequest {
        name: "Harbour Migration".to_string(),
        plan,
        admin_email: "owner@harbour.example".to_string(),
        admin_display_name: "Dana Okafor".to_string(),
    }
}

pub(super) fn provision<R, C>(service: &TenancyService<R, C>, plan: Plan) -> ProvisionedTenant
where
    R: crate::tenancy::repository::TenancyRepository + 'static,
    C: ClaimsPublisher + 'static,
{
    service
        .create_tenant(&operator(), tenant_request(plan))
        .expect("tenant provisioned")
}

pub(super) fn lead_request(name: &str) -> CreateLeadRequest {
    CreateLeadRequest {
        name: name.to_string(),
        email: format!("{}@client.example", name.to_ascii_lowercase().replace(' ', ".")),
        occupation_code: Some("261313".to_string()),
        visa_subclass: Some("189".to_string()),
        points: Some(80),
        ..CreateLeadRequest::default()
    }
}

pub(super) struct OfflineClaims;

impl ClaimsPublisher for OfflineClaims {
    fn publish(&self, _uid: &UserId, _claims: Option<AuthClaims>) -> Result<(), ClaimsError> {
        Err(ClaimsError::Transport("identity provider offline".to_string()))
    }
}

/// Lets the first `pass` publishes through, fails the next `fail`, then recovers.
pub(super) struct FlakyClaims {
    inner: InMemoryClaims,
    calls: AtomicUsize,
    pass: usize,
    fail: usize,
}

impl FlakyClaims {
    pub(super) fn new(pass: usize, fail: usize) -> Self {
        Self {
            inner: InMemoryClaims::default(),
            calls: AtomicUsize::new(0),
            pass,
            fail,
        }
    }

    pub(super) fn claims_for(&self, uid: &UserId) -> Option<AuthClaims> {
        self.inner.claims_for(uid)
    }
}

impl ClaimsPublisher for FlakyClaims {
    fn publish(&self, uid: &UserId, claims: Option<AuthClaims>) -> Result<(), ClaimsError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call >= self.pass && call < self.pass + self.fail {
            return Err(ClaimsError::Transport("blip".to_string()));
        }
        self.inner.publish(uid, claims)
    }
}

pub(super) fn build_flaky_service(
    pass: usize,
    fail: usize,
) -> (
    TenancyService<InMemoryTenancyRepository, FlakyClaims>,
    Arc<InMemoryTenancyRepository>,
    Arc<FlakyClaims>,
) {
    let repository = Arc::new(InMemoryTenancyRepository::default());
    let claims = Arc::new(FlakyClaims::new(pass, fail));
    let service = TenancyService::new(repository.clone(), claims.clone()).with_clock(october);
    (service, repository, claims)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
