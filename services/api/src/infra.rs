use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;
use visa_pathways::config::DataSourceConfig;
use visa_pathways::error::AppError;
use visa_pathways::occupations::{
    HttpTableSource, OccupationDirectory, OccupationRoutes, SearchSessions,
};
use visa_pathways::tenancy::{
    AuthClaims, ClaimsError, ClaimsPublisher, InMemoryClaims, InMemoryTenancyRepository,
    TenancyService, UserId,
};

/// Search sessions kept per process before the least recently used is dropped.
const SEARCH_SESSION_CAPACITY: usize = 1_024;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type ApiTenancy = TenancyService<InMemoryTenancyRepository, LoggedClaims>;

/// Keeps claims in memory and logs every change so operators can replay them to the identity
/// provider.
#[derive(Default, Clone)]
pub(crate) struct LoggedClaims {
    inner: InMemoryClaims,
}

impl LoggedClaims {
    #[cfg(test)]
    pub(crate) fn claims_for(&self, uid: &UserId) -> Option<AuthClaims> {
        self.inner.claims_for(uid)
    }
}

impl ClaimsPublisher for LoggedClaims {
    fn publish(&self, uid: &UserId, claims: Option<AuthClaims>) -> Result<(), ClaimsError> {
        match &claims {
            Some(claims) => info!(
                %uid,
                role = %claims.role,
                tenant_id = claims.tenant_id.as_ref().map(|id| id.0.as_str()).unwrap_or("-"),
                "claims mirrored"
            ),
            None => info!(%uid, "claims revoked"),
        }
        self.inner.publish(uid, claims)
    }
}

pub(crate) fn tenancy_service() -> Arc<ApiTenancy> {
    Arc::new(TenancyService::new(
        Arc::new(InMemoryTenancyRepository::default()),
        Arc::new(LoggedClaims::default()),
    ))
}

pub(crate) fn occupation_directory(
    config: &DataSourceConfig,
) -> Result<Arc<OccupationDirectory<HttpTableSource>>, AppError> {
    let source = HttpTableSource::from_config(config)?;
    Ok(Arc::new(OccupationDirectory::new(source, config)))
}

pub(crate) fn occupation_routes(
    config: &DataSourceConfig,
) -> Result<OccupationRoutes<HttpTableSource>, AppError> {
    let directory = occupation_directory(config)?;
    let sessions = Arc::new(SearchSessions::new(
        directory.clone(),
        config.search_debounce,
        SEARCH_SESSION_CAPACITY,
    ));
    Ok(OccupationRoutes {
        directory,
        sessions,
    })
}
