use super::domain::{AuthClaims, Lead, LeadId, Tenant, TenantId, TenantUser, UsageKey, UserId};

/// Storage abstraction so the service can be exercised without a database.
pub trait TenancyRepository: Send + Sync {
    fn insert_tenant(&self, tenant: Tenant) -> Result<Tenant, RepositoryError>;
    fn update_tenant(&self, tenant: Tenant) -> Result<(), RepositoryError>;
    fn fetch_tenant(&self, id: &TenantId) -> Result<Option<Tenant>, RepositoryError>;
    fn delete_tenant(&self, id: &TenantId) -> Result<(), RepositoryError>;

    /// Stores the user unless its tenant already holds `seat_limit` users. Counting the seats and
    /// writing the user must be atomic with respect to other inserts for the same tenant.
    fn insert_user(
        &self,
        user: TenantUser,
        seat_limit: Option<u32>,
    ) -> Result<UserInsert, RepositoryError>;
    fn update_user(&self, user: TenantUser) -> Result<(), RepositoryError>;
    fn fetch_user(&self, uid: &UserId) -> Result<Option<TenantUser>, RepositoryError>;
    fn users_for_tenant(&self, id: &TenantId) -> Result<Vec<TenantUser>, RepositoryError>;
    fn delete_user(&self, uid: &UserId) -> Result<(), RepositoryError>;

    /// Adds one to the counter unless it already sits at `limit`. The check and the write must be
    /// atomic with respect to other increments of the same key.
    fn increment_usage(
        &self,
        key: &UsageKey,
        limit: Option<u32>,
    ) -> Result<UsageIncrement, RepositoryError>;
    fn usage_count(&self, key: &UsageKey) -> Result<u32, RepositoryError>;
    fn delete_usage_for_tenant(&self, id: &TenantId) -> Result<usize, RepositoryError>;

    fn insert_lead(&self, lead: Lead) -> Result<Lead, RepositoryError>;
    fn update_lead(&self, lead: Lead) -> Result<(), RepositoryError>;
    fn fetch_lead(&self, id: &LeadId) -> Result<Option<Lead>, RepositoryError>;
    fn leads_for_tenant(&self, id: &TenantId) -> Result<Vec<Lead>, RepositoryError>;
    fn delete_leads_for_tenant(&self, id: &TenantId) -> Result<usize, RepositoryError>;
}

/// Result of a guarded usage increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageIncrement {
    /// Counter value after the increment.
    Recorded(u32),
    /// Counter left untouched at this value.
    LimitReached(u32),
}

/// Result of a seat-checked user insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserInsert {
    Inserted(TenantUser),
    /// Nothing was written; the tenant already holds this many users.
    SeatsTaken(u32),
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Outbound hook that mirrors roles onto the identity provider.
///
/// `None` revokes whatever claims the user carried.
pub trait ClaimsPublisher: Send + Sync {
    fn publish(&self, uid: &UserId, claims: Option<AuthClaims>) -> Result<(), ClaimsError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ClaimsError {
    #[error("identity provider unavailable: {0}")]
    Transport(String),
}
