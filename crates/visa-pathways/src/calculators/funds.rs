//! Student visa financial capacity estimate.
//!
//! The household answers run through the same option-table reduction as the points tests; the
//! primary applicant's living costs and tuition are added on top and the result is compared with
//! the funds the applicant declares.

use serde::{Deserialize, Serialize};

use super::tables::student_funds::PRIMARY_LIVING_COSTS;
use super::{tally, CalculatorVariant, PointsComponent, Selections, UnrecognisedSelection};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentFundsRequest {
    #[serde(default)]
    pub selections: Selections,
    /// First-year course fees in AUD.
    #[serde(default)]
    pub annual_tuition: u32,
    /// Funds the applicant can evidence in AUD.
    #[serde(default)]
    pub declared_funds: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundsEstimate {
    pub required: u32,
    pub declared: u32,
    pub sufficient: bool,
    pub shortfall: u32,
    pub components: Vec<PointsComponent>,
    pub unrecognised: Vec<UnrecognisedSelection>,
}

pub fn estimate_student_funds(request: &StudentFundsRequest) -> FundsEstimate {
    let table = CalculatorVariant::StudentFunds.table();
    let household = tally(&table, &request.selections);

    let mut components = vec![PointsComponent {
        question: "primary_applicant".to_string(),
        value: "living-costs".to_string(),
        label: "Primary applicant living costs".to_string(),
        points: PRIMARY_LIVING_COSTS,
    }];
    if request.annual_tuition > 0 {
        components.push(PointsComponent {
            question: "tuition".to_string(),
            value: request.annual_tuition.to_string(),
            label: "First-year tuition".to_string(),
            points: request.annual_tuition,
        });
    }
    components.extend(household.components);

    let required = household
        .total
        .saturating_add(PRIMARY_LIVING_COSTS)
        .saturating_add(request.annual_tuition);

    FundsEstimate {
        required,
        declared: request.declared_funds,
        sufficient: request.declared_funds >= required,
        shortfall: required.saturating_sub(request.declared_funds),
        components,
        unrecognised: household.unrecognised,
    }
}
