use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::domain::{
    AuthClaims, CallerContext, CounterUsage, CreateLeadRequest, CreateTenantRequest,
    CreateUserRequest, Feature, Lead, LeadId, LeadStatus, Plan, ProvisionedTenant, Role, Tenant,
    TenantDeletion, TenantId, TenantUser, UsageCounter, UsageKey, UsagePeriod, UsageReport,
    UserId,
};
use super::export;
use super::repository::{
    ClaimsError, ClaimsPublisher, RepositoryError, TenancyRepository, UsageIncrement, UserInsert,
};

/// Tenant provisioning, plan gating, usage metering and lead capture.
pub struct TenancyService<R, C> {
    repository: Arc<R>,
    claims: Arc<C>,
    clock: fn() -> DateTime<Utc>,
}

static TENANT_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static USER_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static LEAD_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_tenant_id() -> TenantId {
    let id = TENANT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    TenantId(format!("tenant-{id:06}"))
}

fn next_user_id() -> UserId {
    let id = USER_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    UserId(format!("user-{id:06}"))
}

fn next_lead_id() -> LeadId {
    let id = LEAD_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    LeadId(format!("lead-{id:06}"))
}

impl<R, C> TenancyService<R, C>
where
    R: TenancyRepository + 'static,
    C: ClaimsPublisher + 'static,
{
    pub fn new(repository: Arc<R>, claims: Arc<C>) -> Self {
        Self {
            repository,
            claims,
            clock: Utc::now,
        }
    }

    /// Replaces the wall clock used for timestamps and usage periods.
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    pub fn current_period(&self) -> UsagePeriod {
        UsagePeriod::containing((self.clock)())
    }

    /// Create a tenant together with its first admin user.
    pub fn create_tenant(
        &self,
        caller: &CallerContext,
        request: CreateTenantRequest,
    ) -> Result<ProvisionedTenant, TenancyError> {
        if !caller.is_super_admin() {
            return Err(TenancyError::Forbidden("create tenants"));
        }
        let name = required("tenant name", &request.name)?;
        let email = valid_email(&request.admin_email)?;

        let now = (self.clock)();
        let tenant_id = next_tenant_id();
        let admin_uid = next_user_id();

        let tenant = self.repository.insert_tenant(Tenant {
            id: tenant_id.clone(),
            name,
            plan: request.plan,
            owner_uid: admin_uid.clone(),
            created_at: now,
        })?;

        let admitted = self.admit_user(
            &tenant,
            TenantUser {
                uid: admin_uid,
                display_name: display_name_or_email(&request.admin_display_name, &email),
                email,
                tenant_id,
                role: Role::Admin,
                created_at: now,
            },
        );
        let admin = match admitted {
            Ok(admin) => admin,
            Err(err) => {
                self.discard_tenant(&tenant.id);
                return Err(err);
            }
        };
        if let Err(err) = self.sync_claims(&admin) {
            self.discard_user(&admin.uid);
            self.discard_tenant(&tenant.id);
            return Err(err);
        }

        info!(tenant_id = %tenant.id, plan = %tenant.plan, "tenant created");
        Ok(ProvisionedTenant { tenant, admin })
    }

    pub fn create_tenant_user(
        &self,
        caller: &CallerContext,
        tenant_id: &TenantId,
        request: CreateUserRequest,
    ) -> Result<TenantUser, TenancyError> {
        if !caller.can_manage(tenant_id) {
            return Err(TenancyError::Forbidden("manage users of this tenant"));
        }
        if request.role == Role::SuperAdmin {
            return Err(TenancyError::Invalid(
                "tenant users cannot be super admins".to_string(),
            ));
        }
        let email = valid_email(&request.email)?;
        let tenant = self.tenant(tenant_id)?;

        let user = self.admit_user(
            &tenant,
            TenantUser {
                uid: next_user_id(),
                display_name: display_name_or_email(&request.display_name, &email),
                email,
                tenant_id: tenant_id.clone(),
                role: request.role,
                created_at: (self.clock)(),
            },
        )?;
        if let Err(err) = self.sync_claims(&user) {
            self.discard_user(&user.uid);
            return Err(err);
        }

        info!(tenant_id = %tenant_id, uid = %user.uid, role = %user.role, "tenant user created");
        Ok(user)
    }

    pub fn update_user_role(
        &self,
        caller: &CallerContext,
        uid: &UserId,
        role: Role,
    ) -> Result<TenantUser, TenancyError> {
        let mut user = self
            .repository
            .fetch_user(uid)?
            .ok_or_else(|| TenancyError::UserNotFound(uid.clone()))?;

        if !caller.can_manage(&user.tenant_id) {
            return Err(TenancyError::Forbidden("manage users of this tenant"));
        }
        if role == Role::SuperAdmin {
            return Err(TenancyError::Invalid(
                "tenant users cannot be super admins".to_string(),
            ));
        }
        if user.role == Role::Admin && role != Role::Admin {
            let admins = self
                .repository
                .users_for_tenant(&user.tenant_id)?
                .into_iter()
                .filter(|member| member.role == Role::Admin)
                .count();
            if admins <= 1 {
                return Err(TenancyError::Invalid(
                    "a tenant must keep at least one admin".to_string(),
                ));
            }
        }

        user.role = role;
        self.repository.update_user(user.clone())?;
        self.sync_claims(&user)?;
        Ok(user)
    }

    /// Mirror the user's role and tenant onto their auth identity.
    pub fn sync_claims(&self, user: &TenantUser) -> Result<(), TenancyError> {
        self.claims
            .publish(&user.uid, Some(AuthClaims::from(user)))
            .map_err(TenancyError::from)
    }

    /// Remove a tenant and everything that belongs to it.
    pub fn delete_tenant(
        &self,
        caller: &CallerContext,
        tenant_id: &TenantId,
    ) -> Result<TenantDeletion, TenancyError> {
        if !caller.is_super_admin() {
            return Err(TenancyError::Forbidden("delete tenants"));
        }
        self.tenant(tenant_id)?;

        // Revoke every identity before deleting anything.
        let users = self.repository.users_for_tenant(tenant_id)?;
        for (revoked, user) in users.iter().enumerate() {
            if let Err(err) = self.claims.publish(&user.uid, None) {
                self.restore_claims(&users[..revoked]);
                return Err(err.into());
            }
        }
        for user in &users {
            self.repository.delete_user(&user.uid)?;
        }
        let leads_removed = self.repository.delete_leads_for_tenant(tenant_id)?;
        let usage_records_removed = self.repository.delete_usage_for_tenant(tenant_id)?;
        self.repository.delete_tenant(tenant_id)?;

        let deletion = TenantDeletion {
            tenant_id: tenant_id.clone(),
            users_removed: users.len(),
            leads_removed,
            usage_records_removed,
        };
        info!(
            tenant_id = %tenant_id,
            users = deletion.users_removed,
            leads = deletion.leads_removed,
            usage = deletion.usage_records_removed,
            "tenant deleted"
        );
        Ok(deletion)
    }

    pub fn change_plan(
        &self,
        caller: &CallerContext,
        tenant_id: &TenantId,
        plan: Plan,
    ) -> Result<Tenant, TenancyError> {
        if !caller.can_manage(tenant_id) {
            return Err(TenancyError::Forbidden("change the plan of this tenant"));
        }
        let mut tenant = self.tenant(tenant_id)?;
        let previous = tenant.plan;
        tenant.plan = plan;
        self.repository.update_tenant(tenant.clone())?;

        if let Some(seats) = plan.limits().seats {
            let used = self.repository.users_for_tenant(tenant_id)?.len();
            if used > seats as usize {
                warn!(tenant_id = %tenant_id, used, seats, "tenant is over its seat allowance");
            }
        }
        info!(tenant_id = %tenant_id, from = %previous, to = %plan, "plan changed");
        Ok(tenant)
    }

    /// Check membership and that the tenant's plan includes `feature`.
    pub fn authorize_feature(
        &self,
        caller: &CallerContext,
        tenant_id: &TenantId,
        feature: Feature,
    ) -> Result<Tenant, TenancyError> {
        if !caller.is_member(tenant_id) {
            return Err(TenancyError::Forbidden("act for this tenant"));
        }
        let tenant = self.tenant(tenant_id)?;
        if !tenant.plan.allows(feature) {
            return Err(TenancyError::FeatureUnavailable {
                plan: tenant.plan,
                feature,
            });
        }
        Ok(tenant)
    }

    /// Gate on the counter's feature, then take one unit of this month's allowance.
    ///
    /// Returns the counter value after the increment.
    pub fn consume(
        &self,
        caller: &CallerContext,
        tenant_id: &TenantId,
        counter: UsageCounter,
    ) -> Result<u32, TenancyError> {
        let tenant = self.authorize_feature(caller, tenant_id, counter.feature())?;
        let key = UsageKey {
            tenant_id: tenant_id.clone(),
            period: self.current_period(),
            counter,
        };
        let limit = tenant.plan.limits().for_counter(counter);

        match self.repository.increment_usage(&key, limit)? {
            UsageIncrement::Recorded(used) => Ok(used),
            UsageIncrement::LimitReached(used) => {
                warn!(tenant_id = %tenant_id, %counter, used, "usage limit reached");
                Err(TenancyError::LimitReached {
                    counter,
                    limit: limit.unwrap_or(used),
                    period: key.period,
                })
            }
        }
    }

    pub fn usage(
        &self,
        caller: &CallerContext,
        tenant_id: &TenantId,
    ) -> Result<UsageReport, TenancyError> {
        if !caller.is_member(tenant_id) {
            return Err(TenancyError::Forbidden("view usage of this tenant"));
        }
        let tenant = self.tenant(tenant_id)?;
        let limits = tenant.plan.limits();
        let period = self.current_period();

        let mut counters = Vec::with_capacity(UsageCounter::ALL.len());
        for counter in UsageCounter::ALL {
            let used = self.repository.usage_count(&UsageKey {
                tenant_id: tenant_id.clone(),
                period: period.clone(),
                counter,
            })?;
            let limit = limits.for_counter(counter);
            counters.push(CounterUsage {
                counter,
                used,
                limit,
                remaining: limit.map(|limit| limit.saturating_sub(used)),
            });
        }

        let seats_used = self.repository.users_for_tenant(tenant_id)?.len() as u32;
        Ok(UsageReport {
            tenant_id: tenant_id.clone(),
            plan: tenant.plan,
            period,
            seats_used,
            seat_limit: limits.seats,
            counters,
        })
    }

    pub fn create_lead(
        &self,
        caller: &CallerContext,
        tenant_id: &TenantId,
        request: CreateLeadRequest,
    ) -> Result<Lead, TenancyError> {
        let name = required("lead name", &request.name)?;
        let email = valid_email(&request.email)?;
        self.consume(caller, tenant_id, UsageCounter::Leads)?;

        let lead = self.repository.insert_lead(Lead {
            id: next_lead_id(),
            tenant_id: tenant_id.clone(),
            name,
            email,
            phone: trimmed(request.phone),
            occupation_code: trimmed(request.occupation_code),
            visa_subclass: trimmed(request.visa_subclass),
            points: request.points,
            notes: trimmed(request.notes),
            status: LeadStatus::New,
            created_by: caller.uid.clone(),
            created_at: (self.clock)(),
        })?;
        info!(tenant_id = %tenant_id, lead_id = %lead.id, "lead captured");
        Ok(lead)
    }

    /// Leads of the tenant, oldest first.
    pub fn list_leads(
        &self,
        caller: &CallerContext,
        tenant_id: &TenantId,
    ) -> Result<Vec<Lead>, TenancyError> {
        self.authorize_feature(caller, tenant_id, Feature::LeadManagement)?;
        let mut leads = self.repository.leads_for_tenant(tenant_id)?;
        leads.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(leads)
    }

    pub fn update_lead_status(
        &self,
        caller: &CallerContext,
        tenant_id: &TenantId,
        lead_id: &LeadId,
        status: LeadStatus,
    ) -> Result<Lead, TenancyError> {
        self.authorize_feature(caller, tenant_id, Feature::LeadManagement)?;
        let mut lead = self
            .repository
            .fetch_lead(lead_id)?
            .filter(|lead| &lead.tenant_id == tenant_id)
            .ok_or_else(|| TenancyError::LeadNotFound(lead_id.clone()))?;

        lead.status = status;
        self.repository.update_lead(lead.clone())?;
        Ok(lead)
    }

    pub fn export_leads_csv(
        &self,
        caller: &CallerContext,
        tenant_id: &TenantId,
    ) -> Result<String, TenancyError> {
        self.authorize_feature(caller, tenant_id, Feature::LeadExport)?;
        let leads = self.list_leads(caller, tenant_id)?;
        export::leads_to_csv(&leads).map_err(|err| TenancyError::Export(err.to_string()))
    }

    fn tenant(&self, tenant_id: &TenantId) -> Result<Tenant, TenancyError> {
        self.repository
            .fetch_tenant(tenant_id)?
            .ok_or_else(|| TenancyError::TenantNotFound(tenant_id.clone()))
    }

    fn admit_user(&self, tenant: &Tenant, user: TenantUser) -> Result<TenantUser, TenancyError> {
        let seats = tenant.plan.limits().seats;
        match self.repository.insert_user(user, seats)? {
            UserInsert::Inserted(user) => Ok(user),
            UserInsert::SeatsTaken(taken) => Err(TenancyError::SeatLimit {
                plan: tenant.plan,
                limit: seats.unwrap_or(taken),
            }),
        }
    }

    fn discard_user(&self, uid: &UserId) {
        if let Err(err) = self.repository.delete_user(uid) {
            warn!(%uid, error = %err, "could not roll back user");
        }
    }

    fn discard_tenant(&self, tenant_id: &TenantId) {
        if let Err(err) = self.repository.delete_tenant(tenant_id) {
            warn!(%tenant_id, error = %err, "could not roll back tenant");
        }
    }

    fn restore_claims(&self, users: &[TenantUser]) {
        for user in users {
            if let Err(err) = self.sync_claims(user) {
                warn!(uid = %user.uid, error = %err, "could not restore revoked claims");
            }
        }
    }
}

fn required(field: &str, value: &str) -> Result<String, TenancyError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(TenancyError::Invalid(format!("{field} is required")));
    }
    Ok(value.to_string())
}

fn valid_email(raw: &str) -> Result<String, TenancyError> {
    let email = raw.trim();
    let well_formed = email
        .split_once('@')
        .map(|(local, domain)| !local.is_empty() && domain.contains('.') && !domain.ends_with('.'))
        .unwrap_or(false);
    if !well_formed {
        return Err(TenancyError::Invalid(format!("invalid e-mail address: {raw}")));
    }
    Ok(email.to_ascii_lowercase())
}

fn display_name_or_email(display_name: &str, email: &str) -> String {
    match display_name.trim() {
        "" => email.to_string(),
        name => name.to_string(),
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[derive(Debug, thiserror::Error)]
pub enum TenancyError {
    #[error("caller is not permitted to {0}")]
    Forbidden(&'static str),
    #[error("tenant {0} not found")]
    TenantNotFound(TenantId),
    #[error("user {0} not found")]
    UserNotFound(UserId),
    #[error("lead {0} not found")]
    LeadNotFound(LeadId),
    #[error("the {plan} plan does not include {feature}")]
    FeatureUnavailable { plan: Plan, feature: Feature },
    #[error("limit reached: {counter} allowance of {limit} used for {period}")]
    LimitReached {
        counter: UsageCounter,
        limit: u32,
        period: UsagePeriod,
    },
    #[error("the {plan} plan allows {limit} user seat(s)")]
    SeatLimit { plan: Plan, limit: u32 },
    #[error("invalid request: {0}")]
    Invalid(String),
    #[error("failed to export leads: {0}")]
    Export(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Claims(#[from] ClaimsError),
}

impl TenancyError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            TenancyError::Forbidden(_) | TenancyError::FeatureUnavailable { .. } => {
                StatusCode::FORBIDDEN
            }
            TenancyError::TenantNotFound(_)
            | TenancyError::UserNotFound(_)
            | TenancyError::LeadNotFound(_)
            | TenancyError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
            TenancyError::LimitReached { .. } => StatusCode::TOO_MANY_REQUESTS,
            TenancyError::SeatLimit { .. } | TenancyError::Repository(RepositoryError::Conflict) => {
                StatusCode::CONFLICT
            }
            TenancyError::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
            TenancyError::Claims(_) => StatusCode::BAD_GATEWAY,
            TenancyError::Export(_) | TenancyError::Repository(RepositoryError::Unavailable(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}
