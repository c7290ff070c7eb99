use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::Serialize;

use super::directory::{OccupationDirectory, OccupationError};
use super::domain::SearchHit;
use super::source::TableSource;

pub const DEFAULT_SEARCH_LIMIT: usize = 20;

/// Result of a debounced search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SearchOutcome {
    Current { ticket: u64, hits: Vec<SearchHit> },
    /// A newer query arrived on the same session before this one finished.
    Superseded { ticket: u64 },
}

/// Search-as-you-type for one client.
///
/// Each query takes a ticket from a generation counter. After the debounce delay and again after
/// the search completes, a query whose ticket is no longer the latest resolves to
/// [`SearchOutcome::Superseded`], so rapid typing never surfaces stale results.
pub struct SearchSession<S> {
    directory: Arc<OccupationDirectory<S>>,
    debounce: Duration,
    generation: AtomicU64,
}

impl<S> SearchSession<S>
where
    S: TableSource,
{
    pub fn new(directory: Arc<OccupationDirectory<S>>, debounce: Duration) -> Self {
        Self {
            directory,
            debounce,
            generation: AtomicU64::new(0),
        }
    }

    pub fn latest_ticket(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub async fn search(&self, query: &str, limit: usize) -> Result<SearchOutcome, OccupationError> {
        let ticket = self.generation.fetch_add(1, Ordering::AcqRel) + 1;

        if !self.debounce.is_zero() {
            tokio::time::sleep(self.debounce).await;
        }
        if self.latest_ticket() != ticket {
            return Ok(SearchOutcome::Superseded { ticket });
        }

        let hits = self.directory.search(query, limit).await?;
        if self.latest_ticket() != ticket {
            return Ok(SearchOutcome::Superseded { ticket });
        }

        Ok(SearchOutcome::Current { ticket, hits })
    }
}

struct SessionEntry<S> {
    session: Arc<SearchSession<S>>,
    last_used: Instant,
}

/// Sessions keyed by a client-chosen id, evicting the least recently used beyond `capacity`.
pub struct SearchSessions<S> {
    directory: Arc<OccupationDirectory<S>>,
    debounce: Duration,
    capacity: usize,
    sessions: Mutex<HashMap<String, SessionEntry<S>>>,
}

impl<S> SearchSessions<S>
where
    S: TableSource,
{
    pub fn new(directory: Arc<OccupationDirectory<S>>, debounce: Duration, capacity: usize) -> Self {
        Self {
            directory,
            debounce,
            capacity: capacity.max(1),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn session(&self, id: &str) -> Arc<SearchSession<S>> {
        let mut sessions = self.sessions.lock().expect("search session mutex poisoned");
        let now = Instant::now();

        if let Some(entry) = sessions.get_mut(id) {
            entry.last_used = now;
            return entry.session.clone();
        }

        if sessions.len() >= self.capacity {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(key, _)| key.clone());
            if let Some(oldest) = oldest {
                sessions.remove(&oldest);
            }
        }

        let session = Arc::new(SearchSession::new(self.directory.clone(), self.debounce));
        sessions.insert(
            id.to_string(),
            SessionEntry {
                session: session.clone(),
                last_used: now,
            },
        );
        session
    }

    pub fn len(&self) -> usize {
        self.sessions
            .lock()
            .expect("search session mutex poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
