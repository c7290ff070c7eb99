//! Points-test calculators built on a shared option-table reduction.
//!
//! Every calculator is a list of questions, each with an ordered set of options. A caller picks at
//! most one option per question and the selected points are summed. The points-test variants
//! compare the total against [`POINTS_THRESHOLD`]; the student funds calculator reuses the same
//! table shape with dollar amounts (see [`funds`]).

mod evaluation;
pub mod funds;
pub mod report;
pub mod router;
mod tables;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use evaluation::{
    evaluate, tally, EligibilityStatus, PointsComponent, PointsOutcome, Tally,
    UnrecognisedSelection,
};
pub use funds::{estimate_student_funds, FundsEstimate, StudentFundsRequest};
pub use router::calculator_router;

/// Pass mark shared by every points-test variant.
pub const POINTS_THRESHOLD: u32 = 65;

/// Question key → selected option value.
pub type Selections = BTreeMap<String, String>;

/// Calculators offered to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CalculatorVariant {
    Gsm,
    BusinessInnovation,
    CanberraMatrix,
    StudentFunds,
}

impl CalculatorVariant {
    pub const ALL: [CalculatorVariant; 4] = [
        CalculatorVariant::Gsm,
        CalculatorVariant::BusinessInnovation,
        CalculatorVariant::CanberraMatrix,
        CalculatorVariant::StudentFunds,
    ];

    pub const fn slug(self) -> &'static str {
        match self {
            CalculatorVariant::Gsm => "gsm",
            CalculatorVariant::BusinessInnovation => "business-innovation",
            CalculatorVariant::CanberraMatrix => "canberra-matrix",
            CalculatorVariant::StudentFunds => "student-funds",
        }
    }

    pub const fn title(self) -> &'static str {
        match self {
            CalculatorVariant::Gsm => "General Skilled Migration points test (189/190/491)",
            CalculatorVariant::BusinessInnovation => "Business Innovation points test (188A)",
            CalculatorVariant::CanberraMatrix => "Canberra Matrix (ACT nomination)",
            CalculatorVariant::StudentFunds => "Student visa financial capacity (500)",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_ascii_lowercase().replace('_', "-");
        match normalized.as_str() {
            "gsm" | "skilled" | "points" => Some(CalculatorVariant::Gsm),
            "business-innovation" | "business" | "biip" => {
                Some(CalculatorVariant::BusinessInnovation)
            }
            "canberra-matrix" | "canberra" | "act" => Some(CalculatorVariant::CanberraMatrix),
            "student-funds" | "student" | "funds" => Some(CalculatorVariant::StudentFunds),
            _ => None,
        }
    }

    pub const fn unit(self) -> ScoreUnit {
        match self {
            CalculatorVariant::StudentFunds => ScoreUnit::Dollars,
            _ => ScoreUnit::Points,
        }
    }

    /// Option table for the variant. The student funds table sums AUD amounts.
    pub fn table(self) -> OptionTable {
        let questions = match self {
            CalculatorVariant::Gsm => tables::gsm::questions(),
            CalculatorVariant::BusinessInnovation => tables::business::questions(),
            CalculatorVariant::CanberraMatrix => tables::canberra::questions(),
            CalculatorVariant::StudentFunds => tables::student_funds::questions(),
        };

        OptionTable {
            variant: self,
            unit: self.unit(),
            questions,
        }
    }
}

impl std::fmt::Display for CalculatorVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}

/// What a table's option values are summed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreUnit {
    Points,
    Dollars,
}

/// One selectable answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsOption {
    pub value: String,
    pub label: String,
    pub points: u32,
}

/// A question and its ordered options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsQuestion {
    pub key: String,
    pub label: String,
    pub options: Vec<PointsOption>,
}

impl PointsQuestion {
    pub fn option(&self, value: &str) -> Option<&PointsOption> {
        self.options.iter().find(|option| option.value == value)
    }

    pub fn max_points(&self) -> u32 {
        self.options
            .iter()
            .map(|option| option.points)
            .max()
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionTable {
    pub variant: CalculatorVariant,
    pub unit: ScoreUnit,
    pub questions: Vec<PointsQuestion>,
}

impl OptionTable {
    pub fn question(&self, key: &str) -> Option<&PointsQuestion> {
        self.questions.iter().find(|question| question.key == key)
    }

    /// Points-test pass mark; `None` for dollar-denominated tables.
    pub fn threshold(&self) -> Option<u32> {
        match self.unit {
            ScoreUnit::Points => Some(POINTS_THRESHOLD),
            ScoreUnit::Dollars => None,
        }
    }

    pub fn max_total(&self) -> u32 {
        self.questions.iter().map(PointsQuestion::max_points).sum()
    }
}

/// Parses `key=value` pairs as typed on the command line.
pub fn selections_from_pairs<I, S>(pairs: I) -> Result<Selections, String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut selections = Selections::new();
    for pair in pairs {
        let raw = pair.as_ref();
        let (key, value) = raw
            .split_once('=')
            .ok_or_else(|| format!("selection '{raw}' must look like question=value"))?;
        let key = key.trim();
        let value = value.trim();
        if key.is_empty() || value.is_empty() {
            return Err(format!("selection '{raw}' has an empty question or value"));
        }
        selections.insert(key.to_string(), value.to_string());
    }
    Ok(selections)
}
