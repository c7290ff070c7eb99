use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::StatusCode;
use serde::Deserialize;
use tokio::sync::RwLock;
use tokio_retry::strategy::FixedInterval;
use tokio_retry::Retry;
use tracing::{info, warn};

use super::code::{CodeError, OccupationCode};
use super::domain::{ChecklistRecord, OccupationMatch, SearchHit, TableSnapshot};
use super::matcher;
use super::source::{decode_rows, SourceError, TableKind, TableSource};
use crate::config::DataSourceConfig;

#[derive(Debug, thiserror::Error)]
pub enum OccupationError {
    #[error(transparent)]
    InvalidCode(#[from] CodeError),
    #[error("failed to load the {table} table: {source}")]
    Unavailable {
        table: TableKind,
        #[source]
        source: SourceError,
    },
    #[error("no document checklist for visa subclass {0}")]
    ChecklistNotFound(String),
}

impl OccupationError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            OccupationError::InvalidCode(_) => StatusCode::BAD_REQUEST,
            OccupationError::Unavailable { .. } => StatusCode::BAD_GATEWAY,
            OccupationError::ChecklistNotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

/// How often a table fetch is retried and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retries: usize,
    pub delay: Duration,
}

struct CachedSnapshot {
    loaded_at: Instant,
    snapshot: Arc<TableSnapshot>,
}

/// Cached view over the occupation tables.
///
/// The snapshot is loaded on first use and reloaded once it is older than the configured TTL.
/// ANZSCO and OSCA must load; the authority and checklist tables degrade to empty.
pub struct OccupationDirectory<S> {
    source: S,
    retry: RetryPolicy,
    ttl: Duration,
    cache: RwLock<Option<CachedSnapshot>>,
}

impl<S> OccupationDirectory<S>
where
    S: TableSource,
{
    pub fn new(source: S, config: &DataSourceConfig) -> Self {
        Self {
            source,
            retry: RetryPolicy {
                retries: config.fetch_retries,
                delay: config.retry_delay,
            },
            ttl: config.cache_ttl,
            cache: RwLock::new(None),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub async fn snapshot(&self) -> Result<Arc<TableSnapshot>, OccupationError> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.loaded_at.elapsed() < self.ttl {
                    return Ok(cached.snapshot.clone());
                }
            }
        }

        let mut cache = self.cache.write().await;
        if let Some(cached) = cache.as_ref() {
            if cached.loaded_at.elapsed() < self.ttl {
                return Ok(cached.snapshot.clone());
            }
        }

        let snapshot = Arc::new(self.load().await?);
        *cache = Some(CachedSnapshot {
            loaded_at: Instant::now(),
            snapshot: snapshot.clone(),
        });
        Ok(snapshot)
    }

    /// Drops the cached snapshot and loads a fresh one.
    pub async fn refresh(&self) -> Result<Arc<TableSnapshot>, OccupationError> {
        self.cache.write().await.take();
        self.snapshot().await
    }

    pub async fn lookup(&self, raw_code: &str) -> Result<OccupationMatch, OccupationError> {
        let code = OccupationCode::parse(raw_code)?;
        let snapshot = self.snapshot().await?;
        Ok(matcher::lookup(&snapshot, &code))
    }

    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, OccupationError> {
        let snapshot = self.snapshot().await?;
        Ok(matcher::search(&snapshot, query, limit))
    }

    pub async fn checklist(&self, subclass: &str) -> Result<ChecklistRecord, OccupationError> {
        let wanted = subclass.trim();
        let snapshot = self.snapshot().await?;
        snapshot
            .checklists
            .iter()
            .find(|checklist| checklist.subclass.eq_ignore_ascii_case(wanted))
            .cloned()
            .ok_or_else(|| OccupationError::ChecklistNotFound(wanted.to_string()))
    }

    async fn load(&self) -> Result<TableSnapshot, OccupationError> {
        let (anzsco, osca, authorities, checklists) = tokio::join!(
            self.table(TableKind::Anzsco),
            self.table(TableKind::Osca),
            self.table(TableKind::Authorities),
            self.table(TableKind::Checklists),
        );

        let snapshot = TableSnapshot {
            anzsco: anzsco?,
            osca: osca?,
            authorities: authorities.unwrap_or_else(degrade),
            checklists: checklists.unwrap_or_else(degrade),
        };

        info!(
            anzsco = snapshot.anzsco.len(),
            osca = snapshot.osca.len(),
            authorities = snapshot.authorities.len(),
            checklists = snapshot.checklists.len(),
            "occupation tables loaded"
        );
        Ok(snapshot)
    }

    async fn table<T>(&self, table: TableKind) -> Result<Vec<T>, OccupationError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let strategy = FixedInterval::new(self.retry.delay).take(self.retry.retries);
        let bytes = Retry::spawn(strategy, || async {
            self.source.fetch(table).await.map_err(|err| {
                warn!(%table, error = %err, "table fetch failed");
                err
            })
        })
        .await
        .map_err(|source| OccupationError::Unavailable { table, source })?;

        let (records, skipped) = decode_rows(table, &bytes)
            .map_err(|source| OccupationError::Unavailable { table, source })?;
        if skipped > 0 {
            warn!(%table, skipped, "skipped malformed table rows");
        }
        Ok(records)
    }
}

fn degrade<T>(err: OccupationError) -> Vec<T> {
    warn!(error = %err, "continuing without optional table");
    Vec::new()
}
