use std::collections::BTreeMap;

use super::code::{digits_only, OccupationCode};
use super::domain::{
    lists_in_text, membership_label, AnzscoRecord, HitTable, MatchSource, OccupationList,
    OccupationMatch, OscaRecord, SearchHit, TableSnapshot,
};

/// Resolves a code against both tables, merging whatever matched.
pub fn lookup(snapshot: &TableSnapshot, code: &OccupationCode) -> OccupationMatch {
    let anzsco = snapshot
        .anzsco
        .iter()
        .find(|record| code.matches(&record.anzsco_code));
    let osca = snapshot.osca.iter().find(|record| {
        code.matches(&record.osca_code)
            || record
                .anzsco_code
                .as_deref()
                .is_some_and(|cross_ref| code.matches(cross_ref))
    });

    match (anzsco, osca) {
        (None, None) => heuristic_match(snapshot, code),
        (anzsco, osca) => merged_match(snapshot, code, anzsco, osca),
    }
}

fn merged_match(
    snapshot: &TableSnapshot,
    code: &OccupationCode,
    anzsco: Option<&AnzscoRecord>,
    osca: Option<&OscaRecord>,
) -> OccupationMatch {
    let source = match (anzsco.is_some(), osca.is_some()) {
        (true, true) => MatchSource::AnzscoAndOsca,
        (true, false) => MatchSource::Anzsco,
        _ => MatchSource::Osca,
    };

    let anzsco_code = anzsco
        .map(|record| digits_only(&record.anzsco_code))
        .or_else(|| osca.and_then(|record| record.anzsco_code.as_deref().map(digits_only)));
    let osca_code = osca.map(|record| digits_only(&record.osca_code));
    let title = anzsco
        .map(|record| record.title.clone())
        .or_else(|| osca.map(|record| record.title.clone()));
    let skill_level = anzsco
        .and_then(|record| record.skill_level)
        .or_else(|| osca.and_then(|record| record.skill_level))
        .or_else(|| default_skill_level(code.major_group()));

    let classification = anzsco
        .map(|record| record.lists.as_str())
        .into_iter()
        .chain(osca.map(|record| record.lists.as_str()));
    let lists = lists_in_text(classification);

    let authority_code = anzsco_code.clone().unwrap_or_else(|| code.to_string());

    finish(
        code,
        title,
        anzsco_code,
        osca_code,
        skill_level,
        lists,
        assessing_authority(snapshot, &authority_code),
        source,
    )
}

fn heuristic_match(snapshot: &TableSnapshot, code: &OccupationCode) -> OccupationMatch {
    let lists = default_list(code.major_group()).into_iter().collect();
    finish(
        code,
        None,
        None,
        None,
        default_skill_level(code.major_group()),
        lists,
        assessing_authority(snapshot, code.as_str()),
        MatchSource::Heuristic,
    )
}

#[allow(clippy::too_many_arguments)]
fn finish(
    code: &OccupationCode,
    title: Option<String>,
    anzsco_code: Option<String>,
    osca_code: Option<String>,
    skill_level: Option<u8>,
    lists: Vec<OccupationList>,
    assessing_authority: Option<String>,
    source: MatchSource,
) -> OccupationMatch {
    let mut visa_subclasses: Vec<String> = Vec::new();
    for list in &lists {
        for subclass in list.visa_subclasses() {
            if !visa_subclasses.iter().any(|known| known == subclass) {
                visa_subclasses.push((*subclass).to_string());
            }
        }
    }

    OccupationMatch {
        code: code.to_string(),
        title,
        anzsco_code,
        osca_code,
        skill_level,
        list_membership: membership_label(&lists),
        lists,
        assessing_authority,
        visa_subclasses,
        source,
    }
}

fn assessing_authority(snapshot: &TableSnapshot, anzsco_code: &str) -> Option<String> {
    snapshot
        .authorities
        .iter()
        .find(|record| digits_only(&record.anzsco_code) == anzsco_code)
        .map(|record| record.authority.clone())
}

/// List assumed for a code no table knows about, by ANZSCO major group.
pub fn default_list(major_group: u8) -> Option<OccupationList> {
    match major_group {
        1 => Some(OccupationList::Stsol),
        2 | 3 => Some(OccupationList::Mltssl),
        4..=8 => Some(OccupationList::Rol),
        _ => None,
    }
}

/// Typical ANZSCO skill level of a major group.
pub fn default_skill_level(major_group: u8) -> Option<u8> {
    match major_group {
        1 | 2 => Some(1),
        3 => Some(3),
        4..=6 => Some(4),
        7 | 8 => Some(5),
        _ => None,
    }
}

/// Code-prefix or title-substring search across both tables, ordered by code.
pub fn search(snapshot: &TableSnapshot, query: &str, limit: usize) -> Vec<SearchHit> {
    let query = query.trim();
    if query.is_empty() || limit == 0 {
        return Vec::new();
    }

    let digits = digits_only(query);
    let by_code = looks_like_code(query);
    let needle = query.to_lowercase();
    let matches = |code: &str, title: &str| {
        if by_code {
            digits_only(code).starts_with(&digits)
        } else {
            title.to_lowercase().contains(&needle)
        }
    };

    let mut hits: BTreeMap<String, SearchHit> = BTreeMap::new();
    for record in &snapshot.anzsco {
        if matches(&record.anzsco_code, &record.title) {
            let code = digits_only(&record.anzsco_code);
            hits.entry(code.clone()).or_insert_with(|| SearchHit {
                code,
                title: record.title.clone(),
                table: HitTable::Anzsco,
                list_membership: membership_label(&lists_in_text([record.lists.as_str()])),
            });
        }
    }
    for record in &snapshot.osca {
        if matches(&record.osca_code, &record.title) {
            let code = digits_only(&record.osca_code);
            hits.entry(code.clone()).or_insert_with(|| SearchHit {
                code,
                title: record.title.clone(),
                table: HitTable::Osca,
                list_membership: membership_label(&lists_in_text([record.lists.as_str()])),
            });
        }
    }

    hits.into_values().take(limit).collect()
}

/// Digits with optional spaces or dashes, as typed into a code field.
fn looks_like_code(query: &str) -> bool {
    query.chars().any(|c| c.is_ascii_digit())
        && query
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_whitespace() || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::occupations::domain::AuthorityRecord;

    fn anzsco(code: &str, title: &str, level: Option<u8>, lists: &str) -> AnzscoRecord {
        AnzscoRecord {
            anzsco_code: code.to_string(),
            title: title.to_string(),
            skill_level: level,
            lists: lists.to_string(),
        }
    }

    fn osca(code: &str, cross_ref: Option<&str>, title: &str, lists: &str) -> OscaRecord {
        OscaRecord {
            osca_code: code.to_string(),
            anzsco_code: cross_ref.map(str::to_string),
            title: title.to_string(),
            skill_level: None,
            lists: lists.to_string(),
        }
    }

    fn snapshot() -> TableSnapshot {
        TableSnapshot {
            anzsco: vec![
                anzsco("261313", "Software Engineer", Some(1), "MLTSSL"),
                anzsco("351311", "Chef", Some(2), "MLTSSL; ROL"),
                anzsco("149212", "Customer Service Manager", None, "STSOL"),
            ],
            osca: vec![
                osca("261313", Some("261313"), "Software Engineer", "MLTSSL"),
                osca("224116", Some("224115"), "Data Analyst", "STSOL"),
            ],
            authorities: vec![
                AuthorityRecord {
                    anzsco_code: "261313".to_string(),
                    authority: "ACS".to_string(),
                },
                AuthorityRecord {
                    anzsco_code: "224115".to_string(),
                    authority: "VETASSESS".to_string(),
                },
            ],
            checklists: Vec::new(),
        }
    }

    fn code(raw: &str) -> OccupationCode {
        OccupationCode::parse(raw).expect("valid code")
    }

    #[test]
    fn merges_records_found_in_both_tables() {
        let found = lookup(&snapshot(), &code("261313"));
        assert_eq!(found.source, MatchSource::AnzscoAndOsca);
        assert_eq!(found.title.as_deref(), Some("Software Engineer"));
        assert_eq!(found.list_membership, "MLTSSL");
        assert_eq!(found.assessing_authority.as_deref(), Some("ACS"));
        assert_eq!(found.visa_subclasses, vec!["189", "190", "491", "482"]);
    }

    #[test]
    fn osca_rows_resolve_through_their_anzsco_cross_reference() {
        let found = lookup(&snapshot(), &code("224115"));
        assert_eq!(found.source, MatchSource::Osca);
        assert_eq!(found.anzsco_code.as_deref(), Some("224115"));
        assert_eq!(found.osca_code.as_deref(), Some("224116"));
        assert_eq!(found.assessing_authority.as_deref(), Some("VETASSESS"));
        assert_eq!(found.skill_level, Some(1));
    }

    #[test]
    fn multiple_lists_are_joined_in_precedence_order() {
        let found = lookup(&snapshot(), &code("351311"));
        assert_eq!(found.lists, vec![OccupationList::Mltssl, OccupationList::Rol]);
        assert_eq!(found.list_membership, "MLTSSL / ROL");
        assert_eq!(found.visa_subclasses, vec!["189", "190", "491", "482", "494"]);
    }

    #[test]
    fn missing_skill_level_falls_back_to_major_group() {
        let found = lookup(&snapshot(), &code("149212"));
        assert_eq!(found.skill_level, Some(1));
        assert_eq!(found.list_membership, "STSOL");
    }

    #[test]
    fn unknown_codes_use_the_prefix_heuristic() {
        let found = lookup(&snapshot(), &code("721111"));
        assert_eq!(found.source, MatchSource::Heuristic);
        assert_eq!(found.title, None);
        assert_eq!(found.list_membership, "ROL");
        assert_eq!(found.skill_level, Some(5));

        let found = lookup(&snapshot(), &code("133111"));
        assert_eq!(found.list_membership, "STSOL");

        let found = lookup(&snapshot(), &code("911111"));
        assert_eq!(found.list_membership, "Unlisted");
        assert_eq!(found.skill_level, None);
    }

    #[test]
    fn lookup_is_idempotent() {
        let snapshot = snapshot();
        let first = lookup(&snapshot, &code("2613-13"));
        let second = lookup(&snapshot, &code("261313"));
        assert_eq!(first, second);
    }

    #[test]
    fn search_matches_titles_and_code_prefixes() {
        let snapshot = snapshot();

        let hits = search(&snapshot, "engineer", 10);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].code, "261313");
        assert_eq!(hits[0].table, HitTable::Anzsco);

        let hits = search(&snapshot, "2", 10);
        let codes: Vec<&str> = hits.iter().map(|hit| hit.code.as_str()).collect();
        assert_eq!(codes, vec!["224116", "261313"]);

        assert_eq!(search(&snapshot, "2", 1).len(), 1);
        assert!(search(&snapshot, "   ", 10).is_empty());
    }
}
