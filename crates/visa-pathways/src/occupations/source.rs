use std::collections::BTreeMap;
use std::fmt;

use futures::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::DataSourceConfig;

/// The remote JSON tables the lookup layer reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    Anzsco,
    Osca,
    Authorities,
    Checklists,
}

impl TableKind {
    pub const ALL: [TableKind; 4] = [
        TableKind::Anzsco,
        TableKind::Osca,
        TableKind::Authorities,
        TableKind::Checklists,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            TableKind::Anzsco => "ANZSCO",
            TableKind::Osca => "OSCA",
            TableKind::Authorities => "assessing authority",
            TableKind::Checklists => "document checklist",
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("could not build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} responded with HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("{table} table is not valid JSON: {source}")]
    Decode {
        table: TableKind,
        #[source]
        source: serde_json::Error,
    },
    #[error("{table} table must be a JSON array of records")]
    Shape { table: TableKind },
    #[error("no {0} table is available")]
    Missing(TableKind),
}

/// Anything that can hand back the raw bytes of a table.
pub trait TableSource: Send + Sync {
    fn fetch(&self, table: TableKind) -> BoxFuture<'_, Result<Vec<u8>, SourceError>>;
}

/// Sample tables compiled into the crate, used when no URL is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledTables;

impl BundledTables {
    pub fn bytes(table: TableKind) -> &'static [u8] {
        match table {
            TableKind::Anzsco => include_bytes!("../../data/anzsco.json"),
            TableKind::Osca => include_bytes!("../../data/osca.json"),
            TableKind::Authorities => include_bytes!("../../data/authorities.json"),
            TableKind::Checklists => include_bytes!("../../data/checklists.json"),
        }
    }
}

impl TableSource for BundledTables {
    fn fetch(&self, table: TableKind) -> BoxFuture<'_, Result<Vec<u8>, SourceError>> {
        futures::future::ready(Ok(Self::bytes(table).to_vec())).boxed()
    }
}

/// Fixed in-memory tables; anything not provided is reported missing.
#[derive(Debug, Clone, Default)]
pub struct StaticTables {
    tables: BTreeMap<TableKind, Vec<u8>>,
}

impl StaticTables {
    pub fn with_table(mut self, table: TableKind, json: impl Into<Vec<u8>>) -> Self {
        self.tables.insert(table, json.into());
        self
    }
}

impl TableSource for StaticTables {
    fn fetch(&self, table: TableKind) -> BoxFuture<'_, Result<Vec<u8>, SourceError>> {
        let result = self
            .tables
            .get(&table)
            .cloned()
            .ok_or(SourceError::Missing(table));
        futures::future::ready(result).boxed()
    }
}

/// Fetches configured tables over HTTP and serves the rest from [`BundledTables`].
#[derive(Debug, Clone)]
pub struct HttpTableSource {
    client: reqwest::Client,
    urls: BTreeMap<TableKind, String>,
}

impl HttpTableSource {
    pub fn from_config(config: &DataSourceConfig) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("visa-pathways/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(SourceError::Client)?;

        let urls = [
            (TableKind::Anzsco, &config.anzsco_url),
            (TableKind::Osca, &config.osca_url),
            (TableKind::Authorities, &config.authorities_url),
            (TableKind::Checklists, &config.checklists_url),
        ]
        .into_iter()
        .filter_map(|(table, url)| url.clone().map(|url| (table, url)))
        .collect();

        Ok(Self { client, urls })
    }

    pub fn url(&self, table: TableKind) -> Option<&str> {
        self.urls.get(&table).map(String::as_str)
    }

    async fn get(&self, url: &str) -> Result<Vec<u8>, SourceError> {
        debug!(%url, "fetching table");
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|source| SourceError::Http {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|source| SourceError::Http {
            url: url.to_string(),
            source,
        })?;
        Ok(body.to_vec())
    }
}

impl TableSource for HttpTableSource {
    fn fetch(&self, table: TableKind) -> BoxFuture<'_, Result<Vec<u8>, SourceError>> {
        async move {
            match self.urls.get(&table) {
                Some(url) => self.get(url).await,
                None => Ok(BundledTables::bytes(table).to_vec()),
            }
        }
        .boxed()
    }
}

/// Parses a table body into records.
///
/// Accepts a bare array or an object wrapping one under `data`, `records` or `items`. Rows that do
/// not fit the record shape are skipped and counted.
pub fn decode_rows<T>(table: TableKind, bytes: &[u8]) -> Result<(Vec<T>, usize), SourceError>
where
    T: for<'de> Deserialize<'de>,
{
    let value: serde_json::Value =
        serde_json::from_slice(bytes).map_err(|source| SourceError::Decode { table, source })?;

    let rows = match value {
        serde_json::Value::Array(rows) => rows,
        serde_json::Value::Object(mut object) => ["data", "records", "items"]
            .iter()
            .find_map(|key| match object.remove(*key) {
                Some(serde_json::Value::Array(rows)) => Some(rows),
                _ => None,
            })
            .ok_or(SourceError::Shape { table })?,
        _ => return Err(SourceError::Shape { table }),
    };

    let total = rows.len();
    let records: Vec<T> = rows
        .into_iter()
        .filter_map(|row| serde_json::from_value(row).ok())
        .collect();
    let skipped = total - records.len();
    Ok((records, skipped))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::occupations::domain::{AnzscoRecord, AuthorityRecord, ChecklistRecord, OscaRecord};

    #[test]
    fn bundled_tables_decode_cleanly() {
        let (anzsco, skipped) =
            decode_rows::<AnzscoRecord>(TableKind::Anzsco, BundledTables::bytes(TableKind::Anzsco))
                .expect("anzsco decodes");
        assert!(!anzsco.is_empty());
        assert_eq!(skipped, 0);

        let (osca, skipped) =
            decode_rows::<OscaRecord>(TableKind::Osca, BundledTables::bytes(TableKind::Osca))
                .expect("osca decodes");
        assert!(!osca.is_empty());
        assert_eq!(skipped, 0);

        let (authorities, _) = decode_rows::<AuthorityRecord>(
            TableKind::Authorities,
            BundledTables::bytes(TableKind::Authorities),
        )
        .expect("authorities decode");
        assert!(!authorities.is_empty());

        let (checklists, _) = decode_rows::<ChecklistRecord>(
            TableKind::Checklists,
            BundledTables::bytes(TableKind::Checklists),
        )
        .expect("checklists decode");
        assert!(checklists.iter().any(|list| list.subclass == "189"));
    }

    #[test]
    fn wrapped_arrays_are_unwrapped_and_bad_rows_skipped() {
        let body = br#"{"data": [
            {"anzsco_code": "261313", "title": "Software Engineer"},
            {"title": "missing code"}
        ]}"#;
        let (records, skipped) =
            decode_rows::<AnzscoRecord>(TableKind::Anzsco, body).expect("decodes");
        assert_eq!(records.len(), 1);
        assert_eq!(skipped, 1);
    }

    #[test]
    fn scalars_are_rejected() {
        let err = decode_rows::<AnzscoRecord>(TableKind::Anzsco, b"42").expect_err("not a table");
        assert!(matches!(err, SourceError::Shape { .. }));

        let err =
            decode_rows::<AnzscoRecord>(TableKind::Anzsco, b"{not json").expect_err("bad json");
        assert!(matches!(err, SourceError::Decode { .. }));
    }

    #[tokio::test]
    async fn unconfigured_tables_fall_back_to_bundled_copies() {
        let source =
            HttpTableSource::from_config(&DataSourceConfig::default()).expect("client builds");
        assert!(source.url(TableKind::Anzsco).is_none());
        let bytes = source.fetch(TableKind::Anzsco).await.expect("bundled table");
        assert_eq!(bytes, BundledTables::bytes(TableKind::Anzsco));
    }

    #[tokio::test]
    async fn static_tables_report_missing_entries() {
        let source = StaticTables::default().with_table(TableKind::Anzsco, "[]");
        assert!(source.fetch(TableKind::Anzsco).await.is_ok());
        assert!(matches!(
            source.fetch(TableKind::Osca).await,
            Err(SourceError::Missing(TableKind::Osca))
        ));
    }
}
