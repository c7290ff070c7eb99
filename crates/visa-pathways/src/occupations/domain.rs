use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Row of the ANZSCO occupation table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnzscoRecord {
    #[serde(alias = "code", alias = "anzsco", deserialize_with = "lenient_string")]
    pub anzsco_code: String,
    #[serde(alias = "occupation", alias = "name")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_level")]
    pub skill_level: Option<u8>,
    /// Free-text classification, e.g. "MLTSSL; 189, 190, 491".
    #[serde(default, alias = "list", alias = "classification")]
    pub lists: String,
}

/// Row of the OSCA table, optionally cross-referenced to an ANZSCO code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OscaRecord {
    #[serde(alias = "code", alias = "osca", deserialize_with = "lenient_string")]
    pub osca_code: String,
    #[serde(default, deserialize_with = "lenient_optional_string")]
    pub anzsco_code: Option<String>,
    #[serde(alias = "occupation", alias = "name")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_level")]
    pub skill_level: Option<u8>,
    #[serde(default, alias = "list", alias = "classification")]
    pub lists: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorityRecord {
    #[serde(alias = "code", deserialize_with = "lenient_string")]
    pub anzsco_code: String,
    #[serde(alias = "assessing_authority")]
    pub authority: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default = "default_required")]
    pub required: bool,
}

fn default_required() -> bool {
    true
}

/// Documents expected for a visa subclass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistRecord {
    #[serde(alias = "visa", deserialize_with = "lenient_string")]
    pub subclass: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub items: Vec<ChecklistItem>,
}

/// Skilled occupation lists, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OccupationList {
    Mltssl,
    Stsol,
    Rol,
}

impl OccupationList {
    pub const ALL: [OccupationList; 3] = [
        OccupationList::Mltssl,
        OccupationList::Stsol,
        OccupationList::Rol,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            OccupationList::Mltssl => "MLTSSL",
            OccupationList::Stsol => "STSOL",
            OccupationList::Rol => "ROL",
        }
    }

    const fn token(self) -> &'static str {
        match self {
            OccupationList::Mltssl => "mltssl",
            OccupationList::Stsol => "stsol",
            OccupationList::Rol => "rol",
        }
    }

    /// Visa subclasses an occupation on this list can be nominated for.
    pub const fn visa_subclasses(self) -> &'static [&'static str] {
        match self {
            OccupationList::Mltssl => &["189", "190", "491", "482"],
            OccupationList::Stsol => &["190", "491", "482"],
            OccupationList::Rol => &["491", "494"],
        }
    }
}

impl fmt::Display for OccupationList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Lists named in free-text classification fields.
///
/// Matching is a case-insensitive substring test, so "rol" also fires inside longer words.
pub fn lists_in_text<'a, I>(texts: I) -> Vec<OccupationList>
where
    I: IntoIterator<Item = &'a str>,
{
    let haystack = texts
        .into_iter()
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join(" ");

    OccupationList::ALL
        .into_iter()
        .filter(|list| haystack.contains(list.token()))
        .collect()
}

/// Normalised list-membership string, e.g. "MLTSSL / ROL" or "Unlisted".
pub fn membership_label(lists: &[OccupationList]) -> String {
    if lists.is_empty() {
        return "Unlisted".to_string();
    }
    lists
        .iter()
        .map(|list| list.label())
        .collect::<Vec<_>>()
        .join(" / ")
}

/// Which tables produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchSource {
    Anzsco,
    Osca,
    AnzscoAndOsca,
    Heuristic,
}

/// Merged view of one occupation across the code tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccupationMatch {
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anzsco_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub osca_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skill_level: Option<u8>,
    pub lists: Vec<OccupationList>,
    pub list_membership: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assessing_authority: Option<String>,
    pub visa_subclasses: Vec<String>,
    pub source: MatchSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HitTable {
    Anzsco,
    Osca,
}

/// Search-as-you-type result row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub code: String,
    pub title: String,
    pub table: HitTable,
    pub list_membership: String,
}

/// Everything fetched from the remote tables at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableSnapshot {
    pub anzsco: Vec<AnzscoRecord>,
    pub osca: Vec<OscaRecord>,
    pub authorities: Vec<AuthorityRecord>,
    pub checklists: Vec<ChecklistRecord>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    Text(String),
    Number(serde_json::Number),
}

impl StringOrNumber {
    fn into_string(self) -> String {
        match self {
            StringOrNumber::Text(text) => text.trim().to_string(),
            StringOrNumber::Number(number) => number.to_string(),
        }
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    StringOrNumber::deserialize(deserializer).map(StringOrNumber::into_string)
}

fn lenient_optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<StringOrNumber>::deserialize(deserializer)?;
    Ok(value
        .map(StringOrNumber::into_string)
        .filter(|text| !text.is_empty()))
}

fn lenient_level<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<StringOrNumber>::deserialize(deserializer)?;
    Ok(value
        .map(StringOrNumber::into_string)
        .and_then(|text| text.parse::<u8>().ok())
        .filter(|level| (1..=5).contains(level)))
}
