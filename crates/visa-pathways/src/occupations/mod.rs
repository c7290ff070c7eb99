//! Occupation lookup over the ANZSCO and OSCA code tables.
//!
//! Tables are fetched as JSON, cached as a [`TableSnapshot`], and queried by code or title. A code
//! that no table knows about still resolves, through a major-group heuristic.

pub mod code;
pub mod directory;
pub mod domain;
pub mod matcher;
pub mod router;
pub mod search;
pub mod source;

pub use code::{CodeError, OccupationCode};
pub use directory::{OccupationDirectory, OccupationError, RetryPolicy};
pub use domain::{
    AnzscoRecord, AuthorityRecord, ChecklistItem, ChecklistRecord, HitTable, MatchSource,
    OccupationList, OccupationMatch, OscaRecord, SearchHit, TableSnapshot,
};
pub use router::{occupation_router, OccupationRoutes, SEARCH_SESSION_HEADER};
pub use search::{SearchOutcome, SearchSession, SearchSessions, DEFAULT_SEARCH_LIMIT};
pub use source::{BundledTables, HttpTableSource, SourceError, StaticTables, TableKind, TableSource};
