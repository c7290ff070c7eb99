use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

string_id!(
    /// Identifier of an agency (tenant) workspace.
    TenantId
);
string_id!(
    /// Auth identity of a user.
    UserId
);
string_id!(LeadId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Platform operator; not bound to a tenant.
    SuperAdmin,
    Admin,
    Agent,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::Admin => "admin",
            Role::Agent => "agent",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "super_admin" | "superadmin" => Some(Role::SuperAdmin),
            "admin" => Some(Role::Admin),
            "agent" | "user" => Some(Role::Agent),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Capabilities a subscription plan can switch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    PointsCalculators,
    StudentFunds,
    OccupationLookup,
    DocumentChecklists,
    EligibilityReports,
    LeadManagement,
    LeadExport,
}

impl Feature {
    pub const fn label(self) -> &'static str {
        match self {
            Feature::PointsCalculators => "points calculators",
            Feature::StudentFunds => "student funds calculator",
            Feature::OccupationLookup => "occupation lookup",
            Feature::DocumentChecklists => "document checklists",
            Feature::EligibilityReports => "eligibility reports",
            Feature::LeadManagement => "lead management",
            Feature::LeadExport => "lead export",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Monthly allowances; `None` means unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanLimits {
    pub seats: Option<u32>,
    pub evaluations: Option<u32>,
    pub occupation_lookups: Option<u32>,
    pub leads: Option<u32>,
}

impl PlanLimits {
    pub const fn for_counter(&self, counter: UsageCounter) -> Option<u32> {
        match counter {
            UsageCounter::Evaluations => self.evaluations,
            UsageCounter::OccupationLookups => self.occupation_lookups,
            UsageCounter::Leads => self.leads,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Plan {
    #[default]
    Free,
    Starter,
    Professional,
    Enterprise,
}

impl Plan {
    pub const fn label(self) -> &'static str {
        match self {
            Plan::Free => "free",
            Plan::Starter => "starter",
            Plan::Professional => "professional",
            Plan::Enterprise => "enterprise",
        }
    }

    pub const fn limits(self) -> PlanLimits {
        match self {
            Plan::Free => PlanLimits {
                seats: Some(1),
                evaluations: Some(25),
                occupation_lookups: Some(50),
                leads: Some(0),
            },
            Plan::Starter => PlanLimits {
                seats: Some(3),
                evaluations: Some(250),
                occupation_lookups: Some(500),
                leads: Some(100),
            },
            Plan::Professional => PlanLimits {
                seats: Some(10),
                evaluations: Some(2_500),
                occupation_lookups: Some(5_000),
                leads: Some(1_000),
            },
            Plan::Enterprise => PlanLimits {
                seats: None,
                evaluations: None,
                occupation_lookups: None,
                leads: None,
            },
        }
    }

    pub const fn allows(self, feature: Feature) -> bool {
        match self {
            Plan::Free => matches!(
                feature,
                Feature::PointsCalculators | Feature::OccupationLookup
            ),
            Plan::Starter => matches!(
                feature,
                Feature::PointsCalculators
                    | Feature::OccupationLookup
                    | Feature::StudentFunds
                    | Feature::EligibilityReports
                    | Feature::LeadManagement
            ),
            Plan::Professional | Plan::Enterprise => true,
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Metered actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageCounter {
    Evaluations,
    OccupationLookups,
    Leads,
}

impl UsageCounter {
    pub const ALL: [UsageCounter; 3] = [
        UsageCounter::Evaluations,
        UsageCounter::OccupationLookups,
        UsageCounter::Leads,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            UsageCounter::Evaluations => "evaluations",
            UsageCounter::OccupationLookups => "occupation_lookups",
            UsageCounter::Leads => "leads",
        }
    }

    /// Feature a plan must include before the counter may be consumed.
    pub const fn feature(self) -> Feature {
        match self {
            UsageCounter::Evaluations => Feature::PointsCalculators,
            UsageCounter::OccupationLookups => Feature::OccupationLookup,
            UsageCounter::Leads => Feature::LeadManagement,
        }
    }
}

impl fmt::Display for UsageCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Calendar month usage is counted in, formatted `YYYY-MM`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UsagePeriod(pub String);

impl UsagePeriod {
    pub fn containing(at: DateTime<Utc>) -> Self {
        Self(at.format("%Y-%m").to_string())
    }
}

impl fmt::Display for UsagePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UsageKey {
    pub tenant_id: TenantId,
    pub period: UsagePeriod,
    pub counter: UsageCounter,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: TenantId,
    pub name: String,
    pub plan: Plan,
    pub owner_uid: UserId,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantUser {
    pub uid: UserId,
    pub email: String,
    pub display_name: String,
    pub tenant_id: TenantId,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Custom claims mirrored onto the auth identity so clients can gate on them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthClaims {
    pub role: Role,
    pub tenant_id: Option<TenantId>,
}

impl From<&TenantUser> for AuthClaims {
    fn from(user: &TenantUser) -> Self {
        Self {
            role: user.role,
            tenant_id: Some(user.tenant_id.clone()),
        }
    }
}

/// Verified identity of whoever is calling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerContext {
    pub uid: UserId,
    pub role: Role,
    pub tenant_id: Option<TenantId>,
}

impl CallerContext {
    pub fn is_super_admin(&self) -> bool {
        self.role == Role::SuperAdmin
    }

    pub fn is_member(&self, tenant_id: &TenantId) -> bool {
        self.is_super_admin() || self.tenant_id.as_ref() == Some(tenant_id)
    }

    pub fn can_manage(&self, tenant_id: &TenantId) -> bool {
        self.is_super_admin()
            || (self.role == Role::Admin && self.tenant_id.as_ref() == Some(tenant_id))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    #[default]
    New,
    Contacted,
    Qualified,
    Converted,
    Lost,
}

impl LeadStatus {
    pub const fn label(self) -> &'static str {
        match self {
            LeadStatus::New => "new",
            LeadStatus::Contacted => "contacted",
            LeadStatus::Qualified => "qualified",
            LeadStatus::Converted => "converted",
            LeadStatus::Lost => "lost",
        }
    }
}

/// Prospective client captured by an agency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    pub id: LeadId,
    pub tenant_id: TenantId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub occupation_code: Option<String>,
    pub visa_subclass: Option<String>,
    pub points: Option<u32>,
    pub notes: Option<String>,
    pub status: LeadStatus,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTenantRequest {
    pub name: String,
    #[serde(default)]
    pub plan: Plan,
    pub admin_email: String,
    #[serde(default)]
    pub admin_display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default = "default_role")]
    pub role: Role,
}

fn default_role() -> Role {
    Role::Agent
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CreateLeadRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub occupation_code: Option<String>,
    #[serde(default)]
    pub visa_subclass: Option<String>,
    #[serde(default)]
    pub points: Option<u32>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// First tenant admin created alongside the tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisionedTenant {
    pub tenant: Tenant,
    pub admin: TenantUser,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CounterUsage {
    pub counter: UsageCounter,
    pub used: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsageReport {
    pub tenant_id: TenantId,
    pub plan: Plan,
    pub period: UsagePeriod,
    pub seats_used: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seat_limit: Option<u32>,
    pub counters: Vec<CounterUsage>,
}

/// What a cascading tenant deletion removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TenantDeletion {
    pub tenant_id: TenantId,
    pub users_removed: usize,
    pub leads_removed: usize,
    pub usage_records_removed: usize,
}
