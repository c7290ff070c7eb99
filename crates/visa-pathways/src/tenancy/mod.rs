//! Agency tenants, their users and plans, monthly usage metering, and lead capture.
//!
//! Authorization follows the caller's verified claims: super admins operate on every tenant,
//! admins manage their own tenant, and agents use features their tenant's plan includes.

pub mod domain;
pub mod export;
pub mod memory;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    AuthClaims, CallerContext, CounterUsage, CreateLeadRequest, CreateTenantRequest,
    CreateUserRequest, Feature, Lead, LeadId, LeadStatus, Plan, PlanLimits, ProvisionedTenant,
    Role, Tenant, TenantDeletion, TenantId, TenantUser, UsageCounter, UsageKey, UsagePeriod,
    UsageReport, UserId,
};
pub use memory::{InMemoryClaims, InMemoryTenancyRepository};
pub use repository::{
    ClaimsError, ClaimsPublisher, RepositoryError, TenancyRepository, UsageIncrement, UserInsert,
};
pub use router::{
    tenancy_error_response, tenancy_router, CALLER_ROLE_HEADER, CALLER_TENANT_HEADER,
    CALLER_UID_HEADER,
};
pub use service::{TenancyError, TenancyService};
