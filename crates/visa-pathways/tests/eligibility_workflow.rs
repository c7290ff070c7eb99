//! End-to-end checks of the calculators and occupation lookup through the public crate API and
//! HTTP routers.

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use visa_pathways::calculators::{
    calculator_router, estimate_student_funds, evaluate, CalculatorVariant, EligibilityStatus,
    Selections, StudentFundsRequest, POINTS_THRESHOLD,
};
use visa_pathways::config::DataSourceConfig;
use visa_pathways::occupations::{
    occupation_router, BundledTables, MatchSource, OccupationDirectory, OccupationList,
    OccupationRoutes, SearchSessions, StaticTables, TableKind,
};

fn selections(pairs: &[(&str, &str)]) -> Selections {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

fn config() -> DataSourceConfig {
    DataSourceConfig {
        fetch_retries: 0,
        retry_delay: Duration::from_millis(1),
        ..DataSourceConfig::default()
    }
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("json payload")
}

#[test]
fn skilled_applicant_crosses_the_pass_mark() {
    let table = CalculatorVariant::Gsm.table();
    let outcome = evaluate(
        &table,
        &selections(&[
            ("age", "25-32"),
            ("english", "superior"),
            ("education", "bachelor"),
        ]),
    );

    assert_eq!(outcome.total, 65);
    assert_eq!(outcome.threshold, POINTS_THRESHOLD);
    assert_eq!(outcome.status, EligibilityStatus::Eligible);
    assert_eq!(outcome.shortfall, 0);
}

#[test]
fn empty_selection_scores_zero_and_lists_every_question() {
    let table = CalculatorVariant::CanberraMatrix.table();
    let outcome = evaluate(&table, &Selections::new());

    assert_eq!(outcome.total, 0);
    assert_eq!(outcome.status, EligibilityStatus::NeedsMorePoints);
    assert_eq!(outcome.unanswered.len(), table.questions.len());
}

#[test]
fn funds_estimate_compares_declared_funds() {
    let estimate = estimate_student_funds(&StudentFundsRequest {
        selections: selections(&[("partner", "accompanying")]),
        annual_tuition: 20_000,
        declared_funds: 50_000,
    });

    assert_eq!(estimate.required, 29_710 + 10_394 + 20_000);
    assert!(!estimate.sufficient);
    assert_eq!(estimate.shortfall, estimate.required - 50_000);
}

#[tokio::test]
async fn evaluate_route_returns_breakdown() {
    let response = calculator_router()
        .oneshot(
            Request::post("/api/v1/calculators/gsm/evaluate")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({ "selections": { "age": "45-plus", "english": "competent" } })
                        .to_string(),
                ))
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = json_body(response).await;
    assert_eq!(payload["total"], 0);
    assert_eq!(payload["status"], "needs_more_points");
    assert_eq!(payload["shortfall"], 65);
}

#[tokio::test]
async fn unlisted_codes_fall_back_to_the_major_group() {
    let directory = OccupationDirectory::new(BundledTables, &config());

    let found = directory.lookup("139999").await.expect("lookup succeeds");
    assert_eq!(found.source, MatchSource::Heuristic);
    assert_eq!(found.lists, vec![OccupationList::Stsol]);
    assert_eq!(found.skill_level, Some(1));
}

#[tokio::test]
async fn multi_list_occupations_join_their_labels() {
    let directory = OccupationDirectory::new(BundledTables, &config());

    let chef = directory.lookup("351311").await.expect("chef");
    assert_eq!(chef.list_membership, "MLTSSL / ROL");
    assert!(chef.visa_subclasses.contains(&"494".to_string()));
}

#[tokio::test]
async fn optional_tables_do_not_block_lookups() {
    let source = StaticTables::default()
        .with_table(
            TableKind::Anzsco,
            r#"{"data": [{"anzsco_code": "2613-13", "title": "Software Engineer", "lists": "MLTSSL"}]}"#,
        )
        .with_table(TableKind::Osca, "[]");
    let directory = OccupationDirectory::new(source, &config());

    let found = directory.lookup("261313").await.expect("lookup succeeds");
    assert_eq!(found.source, MatchSource::Anzsco);
    assert_eq!(found.assessing_authority, None);
}

#[tokio::test]
async fn search_route_supports_sessions() {
    let directory = Arc::new(OccupationDirectory::new(BundledTables, &config()));
    let sessions = Arc::new(SearchSessions::new(directory.clone(), Duration::ZERO, 4));
    let router = occupation_router(OccupationRoutes {
        directory,
        sessions,
    });

    let response = router
        .oneshot(
            Request::get("/api/v1/occupations?q=engineer&limit=3")
                .header("x-search-session", "tab-1")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = json_body(response).await;
    assert_eq!(payload["state"], "current");
    assert_eq!(payload["ticket"], 1);
    let hits = payload["hits"].as_array().expect("hits");
    assert!(!hits.is_empty() && hits.len() <= 3);
}
