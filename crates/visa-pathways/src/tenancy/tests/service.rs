use super::common::*;
use axum::http::StatusCode;
use std::sync::Arc;

use crate::tenancy::domain::{
    AuthClaims, CreateUserRequest, Feature, LeadStatus, Plan, Role, TenantId, UsageCounter,
    UsageKey, UsagePeriod,
};
use crate::tenancy::memory::InMemoryTenancyRepository;
use crate::tenancy::repository::{RepositoryError, TenancyRepository};
use crate::tenancy::service::{TenancyError, TenancyService};

fn agent_request(email: &str) -> CreateUserRequest {
    CreateUserRequest {
        email: email.to_string(),
        display_name: String::new(),
        role: Role::Agent,
    }
}

#[test]
fn only_super_admins_create_tenants() {
    let (service, _, _) = build_service();
    let outsider = caller(Role::Admin, &TenantId::from("tenant-elsewhere"));

    let err = service
        .create_tenant(&outsider, tenant_request(Plan::Free))
        .expect_err("admins cannot create tenants");
    assert!(matches!(err, TenancyError::Forbidden(_)));
    assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
}

#[test]
fn create_tenant_provisions_first_admin_and_mirrors_claims() {
    let (service, repository, claims) = build_service();
    let provisioned = provision(&service, Plan::Starter);

    assert!(provisioned.tenant.id.0.starts_with("tenant-"));
    assert_eq!(provisioned.tenant.owner_uid, provisioned.admin.uid);
    assert_eq!(provisioned.admin.role, Role::Admin);
    assert_eq!(provisioned.admin.email, "owner@harbour.example");
    assert_eq!(
        claims.claims_for(&provisioned.admin.uid),
        Some(AuthClaims {
            role: Role::Admin,
            tenant_id: Some(provisioned.tenant.id.clone()),
        })
    );
    assert!(repository
        .fetch_tenant(&provisioned.tenant.id)
        .expect("fetch")
        .is_some());
}

#[test]
fn invalid_admin_email_is_rejected() {
    let (service, _, _) = build_service();
    let mut request = tenant_request(Plan::Free);
    request.admin_email = "owner-at-harbour".to_string();

    let err = service
        .create_tenant(&operator(), request)
        .expect_err("malformed e-mail");
    assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[test]
fn seat_limit_follows_the_plan() {
    let (service, _, _) = build_service();
    let free = provision(&service, Plan::Free);
    let admin = caller(Role::Admin, &free.tenant.id);

    let err = service
        .create_tenant_user(&admin, &free.tenant.id, agent_request("agent@harbour.example"))
        .expect_err("free plan has a single seat");
    assert!(matches!(err, TenancyError::SeatLimit { limit: 1, .. }));
    assert_eq!(err.status_code(), StatusCode::CONFLICT);

    let starter = provision(&service, Plan::Starter);
    let admin = caller(Role::Admin, &starter.tenant.id);
    for email in ["one@harbour.example", "two@harbour.example"] {
        service
            .create_tenant_user(&admin, &starter.tenant.id, agent_request(email))
            .expect("seat available");
    }
    assert!(matches!(
        service.create_tenant_user(&admin, &starter.tenant.id, agent_request("three@harbour.example")),
        Err(TenancyError::SeatLimit { limit: 3, .. })
    ));
}

#[test]
fn duplicate_email_within_tenant_conflicts() {
    let (service, _, _) = build_service();
    let tenant = provision(&service, Plan::Professional);
    let admin = caller(Role::Admin, &tenant.tenant.id);

    let err = service
        .create_tenant_user(&admin, &tenant.tenant.id, agent_request("OWNER@harbour.example"))
        .expect_err("admin already uses this address");
    assert!(matches!(
        err,
        TenancyError::Repository(RepositoryError::Conflict)
    ));
}

#[test]
fn agents_and_foreign_admins_cannot_manage_users() {
    let (service, _, _) = build_service();
    let tenant = provision(&service, Plan::Professional);
    let other = provision(&service, Plan::Professional);

    for actor in [
        caller(Role::Agent, &tenant.tenant.id),
        caller(Role::Admin, &other.tenant.id),
    ] {
        let err = service
            .create_tenant_user(&actor, &tenant.tenant.id, agent_request("new@harbour.example"))
            .expect_err("not permitted");
        assert!(matches!(err, TenancyError::Forbidden(_)));
    }
}

#[test]
fn role_changes_are_mirrored_and_keep_an_admin() {
    let (service, _, claims) = build_service();
    let tenant = provision(&service, Plan::Professional);
    let admin = caller(Role::Admin, &tenant.tenant.id);

    let agent = service
        .create_tenant_user(&admin, &tenant.tenant.id, agent_request("agent@harbour.example"))
        .expect("agent created");
    let promoted = service
        .update_user_role(&admin, &agent.uid, Role::Admin)
        .expect("promotion");
    assert_eq!(promoted.role, Role::Admin);
    assert_eq!(
        claims.claims_for(&agent.uid).map(|claims| claims.role),
        Some(Role::Admin)
    );

    service
        .update_user_role(&admin, &tenant.admin.uid, Role::Agent)
        .expect("another admin remains");
    let err = service
        .update_user_role(&admin, &agent.uid, Role::Agent)
        .expect_err("last admin stays");
    assert!(matches!(err, TenancyError::Invalid(_)));

    assert!(matches!(
        service.update_user_role(&admin, &agent.uid, Role::SuperAdmin),
        Err(TenancyError::Invalid(_))
    ));
}

#[test]
fn consume_stops_exactly_at_the_plan_limit() {
    let (service, repository, _) = build_service();
    let tenant = provision(&service, Plan::Free);
    let agent = caller(Role::Agent, &tenant.tenant.id);
    let limit = Plan::Free
        .limits()
        .for_counter(UsageCounter::Evaluations)
        .expect("free plan is metered");

    for expected in 1..=limit {
        let used = service
            .consume(&agent, &tenant.tenant.id, UsageCounter::Evaluations)
            .expect("within allowance");
        assert_eq!(used, expected);
    }

    let err = service
        .consume(&agent, &tenant.tenant.id, UsageCounter::Evaluations)
        .expect_err("allowance exhausted");
    assert!(err.to_string().starts_with("limit reached"));
    assert_eq!(err.status_code(), StatusCode::TOO_MANY_REQUESTS);

    let key = UsageKey {
        tenant_id: tenant.tenant.id.clone(),
        period: UsagePeriod("2026-10".to_string()),
        counter: UsageCounter::Evaluations,
    };
    assert_eq!(repository.usage_count(&key).expect("count"), limit);
}

#[test]
fn usage_restarts_each_calendar_month() {
    let (service, repository, claims) = build_service();
    let tenant = provision(&service, Plan::Free);
    let agent = caller(Role::Agent, &tenant.tenant.id);
    for _ in 0..25 {
        service
            .consume(&agent, &tenant.tenant.id, UsageCounter::Evaluations)
            .expect("october allowance");
    }

    let next_month = TenancyService::new(repository, claims).with_clock(november);
    assert_eq!(
        next_month
            .consume(&agent, &tenant.tenant.id, UsageCounter::Evaluations)
            .expect("november allowance"),
        1
    );
}

#[test]
fn features_outside_the_plan_are_refused() {
    let (service, _, _) = build_service();
    let tenant = provision(&service, Plan::Free);
    let agent = caller(Role::Agent, &tenant.tenant.id);

    let err = service
        .create_lead(&agent, &tenant.tenant.id, lead_request("Priya Sharma"))
        .expect_err("free plan has no lead management");
    assert!(matches!(
        err,
        TenancyError::FeatureUnavailable {
            plan: Plan::Free,
            feature: Feature::LeadManagement
        }
    ));
    assert_eq!(err.status_code(), StatusCode::FORBIDDEN);

    let outsider = caller(Role::Agent, &TenantId::from("tenant-elsewhere"));
    assert!(matches!(
        service.authorize_feature(&outsider, &tenant.tenant.id, Feature::PointsCalculators),
        Err(TenancyError::Forbidden(_))
    ));
}

#[test]
fn usage_report_lists_every_counter() {
    let (service, _, _) = build_service();
    let tenant = provision(&service, Plan::Starter);
    let agent = caller(Role::Agent, &tenant.tenant.id);
    service
        .consume(&agent, &tenant.tenant.id, UsageCounter::OccupationLookups)
        .expect("lookup metered");

    let report = service.usage(&agent, &tenant.tenant.id).expect("report");
    assert_eq!(report.period.0, "2026-10");
    assert_eq!(report.seats_used, 1);
    assert_eq!(report.seat_limit, Some(3));
    let lookups = report
        .counters
        .iter()
        .find(|usage| usage.counter == UsageCounter::OccupationLookups)
        .expect("lookup counter");
    assert_eq!(lookups.used, 1);
    assert_eq!(lookups.remaining, Some(499));
}

#[test]
fn leads_are_captured_listed_and_exported() {
    let (service, _, _) = build_service();
    let tenant = provision(&service, Plan::Starter);
    let id = tenant.tenant.id.clone();
    let agent = caller(Role::Agent, &id);
    let admin = caller(Role::Admin, &id);

    let first = service
        .create_lead(&agent, &id, lead_request("Priya Sharma"))
        .expect("first lead");
    let second = service
        .create_lead(&agent, &id, lead_request("Tomas Varga"))
        .expect("second lead");
    assert_eq!(first.status, LeadStatus::New);
    assert_eq!(first.created_by, agent.uid);

    let leads = service.list_leads(&agent, &id).expect("list");
    let ids: Vec<_> = leads.iter().map(|lead| lead.id.clone()).collect();
    assert_eq!(ids, vec![first.id.clone(), second.id.clone()]);

    let updated = service
        .update_lead_status(&agent, &id, &second.id, LeadStatus::Contacted)
        .expect("status change");
    assert_eq!(updated.status, LeadStatus::Contacted);

    assert!(matches!(
        service.export_leads_csv(&agent, &id),
        Err(TenancyError::FeatureUnavailable {
            feature: Feature::LeadExport,
            ..
        })
    ));

    service
        .change_plan(&admin, &id, Plan::Professional)
        .expect("upgrade");
    let csv = service.export_leads_csv(&agent, &id).expect("export");
    assert_eq!(csv.lines().count(), 3);
    assert!(csv.contains("tomas.varga@client.example"));
    assert!(csv.contains("contacted"));
}

#[test]
fn leads_of_other_tenants_are_not_found() {
    let (service, _, _) = build_service();
    let first = provision(&service, Plan::Starter);
    let second = provision(&service, Plan::Starter);

    let lead = service
        .create_lead(
            &caller(Role::Agent, &first.tenant.id),
            &first.tenant.id,
            lead_request("Priya Sharma"),
        )
        .expect("lead");

    let err = service
        .update_lead_status(
            &caller(Role::Agent, &second.tenant.id),
            &second.tenant.id,
            &lead.id,
            LeadStatus::Lost,
        )
        .expect_err("lead belongs to another tenant");
    assert!(matches!(err, TenancyError::LeadNotFound(_)));
    assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
}

#[test]
fn deleting_a_tenant_cascades() {
    let (service, repository, claims) = build_service();
    let tenant = provision(&service, Plan::Starter);
    let id = tenant.tenant.id.clone();
    let admin = caller(Role::Admin, &id);
    let agent = service
        .create_tenant_user(&admin, &id, agent_request("agent@harbour.example"))
        .expect("agent");
    service
        .create_lead(&admin, &id, lead_request("Priya Sharma"))
        .expect("lead");

    assert!(matches!(
        service.delete_tenant(&admin, &id),
        Err(TenancyError::Forbidden(_))
    ));

    let deletion = service.delete_tenant(&operator(), &id).expect("deleted");
    assert_eq!(deletion.users_removed, 2);
    assert_eq!(deletion.leads_removed, 1);
    assert_eq!(deletion.usage_records_removed, 1);

    assert!(repository.fetch_tenant(&id).expect("fetch").is_none());
    assert!(repository.users_for_tenant(&id).expect("users").is_empty());
    assert!(repository.leads_for_tenant(&id).expect("leads").is_empty());
    assert_eq!(claims.claims_for(&agent.uid), None);
    assert!(claims.revoked().contains(&tenant.admin.uid));

    assert!(matches!(
        service.delete_tenant(&operator(), &id),
        Err(TenancyError::TenantNotFound(_))
    ));
}

#[test]
fn claims_outage_surfaces_as_bad_gateway() {
    let repository = Arc::new(InMemoryTenancyRepository::default());
    let service = TenancyService::new(repository.clone(), Arc::new(OfflineClaims));

    let err = service
        .create_tenant(&operator(), tenant_request(Plan::Free))
        .expect_err("claims cannot be mirrored");
    assert!(matches!(err, TenancyError::Claims(_)));
    assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    assert!(repository.is_empty(), "failed provisioning leaves nothing behind");
}

#[test]
fn tenant_creation_can_be_retried_after_a_claims_failure() {
    let (service, repository, claims) = build_flaky_service(0, 1);

    service
        .create_tenant(&operator(), tenant_request(Plan::Starter))
        .expect_err("first mirror fails");
    assert!(repository.is_empty());

    let provisioned = provision(&service, Plan::Starter);
    let users = repository
        .users_for_tenant(&provisioned.tenant.id)
        .expect("users");
    assert_eq!(users, vec![provisioned.admin.clone()]);
    assert!(claims.claims_for(&provisioned.admin.uid).is_some());
}

#[test]
fn user_creation_can_be_retried_after_a_claims_failure() {
    let (service, repository, claims) = build_flaky_service(1, 1);
    let tenant = provision(&service, Plan::Starter);
    let admin = caller(Role::Admin, &tenant.tenant.id);

    let err = service
        .create_tenant_user(&admin, &tenant.tenant.id, agent_request("agent@harbour.example"))
        .expect_err("mirror fails once");
    assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    assert_eq!(
        repository
            .users_for_tenant(&tenant.tenant.id)
            .expect("users")
            .len(),
        1
    );

    let agent = service
        .create_tenant_user(&admin, &tenant.tenant.id, agent_request("agent@harbour.example"))
        .expect("retry succeeds");
    assert_eq!(
        claims.claims_for(&agent.uid),
        Some(AuthClaims {
            role: Role::Agent,
            tenant_id: Some(tenant.tenant.id.clone()),
        })
    );
}

#[test]
fn claims_outage_during_deletion_keeps_the_tenant_whole() {
    // Two publishes provision the admin and agent; the second revocation fails.
    let (service, repository, claims) = build_flaky_service(3, 1);
    let tenant = provision(&service, Plan::Starter);
    let id = tenant.tenant.id.clone();
    let agent = service
        .create_tenant_user(&caller(Role::Admin, &id), &id, agent_request("agent@harbour.example"))
        .expect("agent");

    let err = service
        .delete_tenant(&operator(), &id)
        .expect_err("revocation fails midway");
    assert!(matches!(err, TenancyError::Claims(_)));

    assert!(repository.fetch_tenant(&id).expect("fetch").is_some());
    assert_eq!(repository.users_for_tenant(&id).expect("users").len(), 2);
    assert!(claims.claims_for(&tenant.admin.uid).is_some());
    assert!(claims.claims_for(&agent.uid).is_some());

    let deletion = service.delete_tenant(&operator(), &id).expect("retry deletes");
    assert_eq!(deletion.users_removed, 2);
    assert!(repository.is_empty());
    assert!(claims.claims_for(&agent.uid).is_none());
}
