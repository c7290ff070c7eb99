use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use super::domain::{AuthClaims, Lead, LeadId, Tenant, TenantId, TenantUser, UsageKey, UserId};
use super::repository::{
    ClaimsError, ClaimsPublisher, RepositoryError, TenancyRepository, UsageIncrement, UserInsert,
};

#[derive(Default)]
struct Tables {
    tenants: HashMap<TenantId, Tenant>,
    users: HashMap<UserId, TenantUser>,
    usage: BTreeMap<UsageKey, u32>,
    leads: HashMap<LeadId, Lead>,
}

/// Process-local repository used by the API binary and tests.
#[derive(Default, Clone)]
pub struct InMemoryTenancyRepository {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryTenancyRepository {
    fn with_tables<T>(&self, apply: impl FnOnce(&mut Tables) -> T) -> T {
        let mut tables = self.tables.lock().expect("repository mutex poisoned");
        apply(&mut tables)
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.with_tables(|tables| {
            tables.tenants.is_empty()
                && tables.users.is_empty()
                && tables.usage.is_empty()
                && tables.leads.is_empty()
        })
    }
}

impl TenancyRepository for InMemoryTenancyRepository {
    fn insert_tenant(&self, tenant: Tenant) -> Result<Tenant, RepositoryError> {
        self.with_tables(|tables| {
            if tables.tenants.contains_key(&tenant.id) {
                return Err(RepositoryError::Conflict);
            }
            tables.tenants.insert(tenant.id.clone(), tenant.clone());
            Ok(tenant)
        })
    }

    fn update_tenant(&self, tenant: Tenant) -> Result<(), RepositoryError> {
        self.with_tables(|tables| match tables.tenants.get_mut(&tenant.id) {
            Some(existing) => {
                *existing = tenant;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        })
    }

    fn fetch_tenant(&self, id: &TenantId) -> Result<Option<Tenant>, RepositoryError> {
        Ok(self.with_tables(|tables| tables.tenants.get(id).cloned()))
    }

    fn delete_tenant(&self, id: &TenantId) -> Result<(), RepositoryError> {
        self.with_tables(|tables| {
            tables
                .tenants
                .remove(id)
                .map(|_| ())
                .ok_or(RepositoryError::NotFound)
        })
    }

    fn insert_user(
        &self,
        user: TenantUser,
        seat_limit: Option<u32>,
    ) -> Result<UserInsert, RepositoryError> {
        self.with_tables(|tables| {
            let members: Vec<&TenantUser> = tables
                .users
                .values()
                .filter(|existing| existing.tenant_id == user.tenant_id)
                .collect();
            let duplicate_email = members
                .iter()
                .any(|existing| existing.email.eq_ignore_ascii_case(&user.email));
            if duplicate_email || tables.users.contains_key(&user.uid) {
                return Err(RepositoryError::Conflict);
            }
            let seats = members.len() as u32;
            if seat_limit.is_some_and(|limit| seats >= limit) {
                return Ok(UserInsert::SeatsTaken(seats));
            }
            tables.users.insert(user.uid.clone(), user.clone());
            Ok(UserInsert::Inserted(user))
        })
    }

    fn update_user(&self, user: TenantUser) -> Result<(), RepositoryError> {
        self.with_tables(|tables| match tables.users.get_mut(&user.uid) {
            Some(existing) => {
                *existing = user;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        })
    }

    fn fetch_user(&self, uid: &UserId) -> Result<Option<TenantUser>, RepositoryError> {
        Ok(self.with_tables(|tables| tables.users.get(uid).cloned()))
    }

    fn users_for_tenant(&self, id: &TenantId) -> Result<Vec<TenantUser>, RepositoryError> {
        Ok(self.with_tables(|tables| {
            let mut users: Vec<TenantUser> = tables
                .users
                .values()
                .filter(|user| &user.tenant_id == id)
                .cloned()
                .collect();
            users.sort_by(|a, b| a.uid.cmp(&b.uid));
            users
        }))
    }

    fn delete_user(&self, uid: &UserId) -> Result<(), RepositoryError> {
        self.with_tables(|tables| {
            tables
                .users
                .remove(uid)
                .map(|_| ())
                .ok_or(RepositoryError::NotFound)
        })
    }

    fn increment_usage(
        &self,
        key: &UsageKey,
        limit: Option<u32>,
    ) -> Result<UsageIncrement, RepositoryError> {
        Ok(self.with_tables(|tables| {
            let count = tables.usage.entry(key.clone()).or_insert(0);
            match limit {
                Some(limit) if *count >= limit => UsageIncrement::LimitReached(*count),
                _ => {
                    *count += 1;
                    UsageIncrement::Recorded(*count)
                }
            }
        }))
    }

    fn usage_count(&self, key: &UsageKey) -> Result<u32, RepositoryError> {
        Ok(self.with_tables(|tables| tables.usage.get(key).copied().unwrap_or(0)))
    }

    fn delete_usage_for_tenant(&self, id: &TenantId) -> Result<usize, RepositoryError> {
        Ok(self.with_tables(|tables| {
            let before = tables.usage.len();
            tables.usage.retain(|key, _| &key.tenant_id != id);
            before - tables.usage.len()
        }))
    }

    fn insert_lead(&self, lead: Lead) -> Result<Lead, RepositoryError> {
        self.with_tables(|tables| {
            if tables.leads.contains_key(&lead.id) {
                return Err(RepositoryError::Conflict);
            }
            tables.leads.insert(lead.id.clone(), lead.clone());
            Ok(lead)
        })
    }

    fn update_lead(&self, lead: Lead) -> Result<(), RepositoryError> {
        self.with_tables(|tables| match tables.leads.get_mut(&lead.id) {
            Some(existing) => {
                *existing = lead;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        })
    }

    fn fetch_lead(&self, id: &LeadId) -> Result<Option<Lead>, RepositoryError> {
        Ok(self.with_tables(|tables| tables.leads.get(id).cloned()))
    }

    fn leads_for_tenant(&self, id: &TenantId) -> Result<Vec<Lead>, RepositoryError> {
        Ok(self.with_tables(|tables| {
            tables
                .leads
                .values()
                .filter(|lead| &lead.tenant_id == id)
                .cloned()
                .collect()
        }))
    }

    fn delete_leads_for_tenant(&self, id: &TenantId) -> Result<usize, RepositoryError> {
        Ok(self.with_tables(|tables| {
            let before = tables.leads.len();
            tables.leads.retain(|_, lead| &lead.tenant_id != id);
            before - tables.leads.len()
        }))
    }
}

/// Records published claims instead of calling an identity provider.
#[derive(Default, Clone)]
pub struct InMemoryClaims {
    claims: Arc<Mutex<HashMap<UserId, AuthClaims>>>,
    revoked: Arc<Mutex<Vec<UserId>>>,
}

impl InMemoryClaims {
    pub fn claims_for(&self, uid: &UserId) -> Option<AuthClaims> {
        self.claims
            .lock()
            .expect("claims mutex poisoned")
            .get(uid)
            .cloned()
    }

    pub fn revoked(&self) -> Vec<UserId> {
        self.revoked.lock().expect("claims mutex poisoned").clone()
    }
}

impl ClaimsPublisher for InMemoryClaims {
    fn publish(&self, uid: &UserId, claims: Option<AuthClaims>) -> Result<(), ClaimsError> {
        let mut published = self.claims.lock().expect("claims mutex poisoned");
        match claims {
            Some(claims) => {
                published.insert(uid.clone(), claims);
            }
            None => {
                published.remove(uid);
                self.revoked
                    .lock()
                    .expect("claims mutex poisoned")
                    .push(uid.clone());
            }
        }
        Ok(())
    }
}
