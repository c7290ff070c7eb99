use axum::{
    extract::Path,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{
    estimate_student_funds, evaluate, CalculatorVariant, OptionTable, ScoreUnit, Selections,
    StudentFundsRequest,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvaluationRequest {
    #[serde(default)]
    pub selections: Selections,
}

#[derive(Debug, Clone, Serialize)]
pub struct CalculatorSummary {
    pub variant: CalculatorVariant,
    pub title: &'static str,
    pub unit: ScoreUnit,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<u32>,
    pub questions: usize,
}

impl CalculatorSummary {
    fn from_table(table: &OptionTable) -> Self {
        Self {
            variant: table.variant,
            title: table.variant.title(),
            unit: table.unit,
            threshold: table.threshold(),
            questions: table.questions.len(),
        }
    }
}

/// Unauthenticated calculator endpoints. Nothing here is metered.
pub fn calculator_router() -> Router {
    Router::new()
        .route("/api/v1/calculators", get(list_handler))
        .route("/api/v1/calculators/:variant", get(table_handler))
        .route("/api/v1/calculators/:variant/evaluate", post(evaluate_handler))
        .route("/api/v1/funds/student", post(student_funds_handler))
}

pub(crate) async fn list_handler() -> Json<Vec<CalculatorSummary>> {
    Json(
        CalculatorVariant::ALL
            .iter()
            .map(|variant| CalculatorSummary::from_table(&variant.table()))
            .collect(),
    )
}

pub(crate) async fn table_handler(Path(variant): Path<String>) -> Response {
    match CalculatorVariant::parse(&variant) {
        Some(variant) => (StatusCode::OK, Json(variant.table())).into_response(),
        None => unknown_variant(&variant),
    }
}

pub(crate) async fn evaluate_handler(
    Path(variant): Path<String>,
    Json(request): Json<EvaluationRequest>,
) -> Response {
    match points_table(&variant) {
        Ok(table) => {
            let outcome = evaluate(&table, &request.selections);
            (StatusCode::OK, Json(outcome)).into_response()
        }
        Err(response) => response,
    }
}

pub(crate) async fn student_funds_handler(Json(request): Json<StudentFundsRequest>) -> Response {
    (StatusCode::OK, Json(estimate_student_funds(&request))).into_response()
}

/// Resolves a path segment to a points-test table, or the error response to send instead.
pub fn points_table(raw: &str) -> Result<OptionTable, Response> {
    let Some(variant) = CalculatorVariant::parse(raw) else {
        return Err(unknown_variant(raw));
    };

    let table = variant.table();
    if table.threshold().is_none() {
        let payload = json!({
            "error": format!("{variant} is not a points test; use /api/v1/funds/student"),
        });
        return Err((StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response());
    }
    Ok(table)
}

fn unknown_variant(raw: &str) -> Response {
    let payload = json!({
        "error": format!("unknown calculator '{raw}'"),
        "available": CalculatorVariant::ALL.iter().map(|variant| variant.slug()).collect::<Vec<_>>(),
    });
    (StatusCode::NOT_FOUND, Json(payload)).into_response()
}
