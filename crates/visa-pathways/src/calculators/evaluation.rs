use serde::{Deserialize, Serialize};

use super::{CalculatorVariant, OptionTable, Selections, POINTS_THRESHOLD};

/// Points contributed by one answered question, kept for transparent breakdowns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsComponent {
    pub question: String,
    pub value: String,
    pub label: String,
    pub points: u32,
}

/// A selection that did not resolve against the table and so contributed nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnrecognisedSelection {
    pub question: String,
    pub value: String,
}

/// Sum of selected option values with the trail that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub total: u32,
    pub components: Vec<PointsComponent>,
    pub unanswered: Vec<String>,
    pub unrecognised: Vec<UnrecognisedSelection>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EligibilityStatus {
    Eligible,
    NeedsMorePoints,
}

impl EligibilityStatus {
    pub fn from_total(total: u32, threshold: u32) -> Self {
        if total >= threshold {
            EligibilityStatus::Eligible
        } else {
            EligibilityStatus::NeedsMorePoints
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            EligibilityStatus::Eligible => "eligible",
            EligibilityStatus::NeedsMorePoints => "needs more points",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsOutcome {
    pub variant: CalculatorVariant,
    pub total: u32,
    pub threshold: u32,
    pub status: EligibilityStatus,
    pub shortfall: u32,
    pub components: Vec<PointsComponent>,
    pub unanswered: Vec<String>,
    pub unrecognised: Vec<UnrecognisedSelection>,
}

/// Sums the selected option of every question. Unselected questions and values missing from the
/// table contribute 0.
pub fn tally(table: &OptionTable, selections: &Selections) -> Tally {
    let mut total = 0u32;
    let mut components = Vec::new();
    let mut unanswered = Vec::new();
    let mut unrecognised = Vec::new();

    for question in &table.questions {
        let Some(value) = selections.get(&question.key) else {
            unanswered.push(question.key.clone());
            continue;
        };

        match question.option(value) {
            Some(option) => {
                total = total.saturating_add(option.points);
                components.push(PointsComponent {
                    question: question.key.clone(),
                    value: option.value.clone(),
                    label: option.label.clone(),
                    points: option.points,
                });
            }
            None => {
                unanswered.push(question.key.clone());
                unrecognised.push(UnrecognisedSelection {
                    question: question.key.clone(),
                    value: value.clone(),
                });
            }
        }
    }

    for (key, value) in selections {
        if table.question(key).is_none() {
            unrecognised.push(UnrecognisedSelection {
                question: key.clone(),
                value: value.clone(),
            });
        }
    }

    Tally {
        total,
        components,
        unanswered,
        unrecognised,
    }
}

/// Scores a points-test table and compares the total to its pass mark.
pub fn evaluate(table: &OptionTable, selections: &Selections) -> PointsOutcome {
    let threshold = table.threshold().unwrap_or(POINTS_THRESHOLD);
    let Tally {
        total,
        components,
        unanswered,
        unrecognised,
    } = tally(table, selections);

    PointsOutcome {
        variant: table.variant,
        total,
        threshold,
        status: EligibilityStatus::from_total(total, threshold),
        shortfall: threshold.saturating_sub(total),
        components,
        unanswered,
        unrecognised,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculators::{PointsOption, PointsQuestion, ScoreUnit};

    fn option(value: &str, points: u32) -> PointsOption {
        PointsOption {
            value: value.to_string(),
            label: value.to_uppercase(),
            points,
        }
    }

    fn table() -> OptionTable {
        OptionTable {
            variant: CalculatorVariant::Gsm,
            unit: ScoreUnit::Points,
            questions: vec![
                PointsQuestion {
                    key: "age".to_string(),
                    label: "Age".to_string(),
                    options: vec![option("young", 30), option("older", 15)],
                },
                PointsQuestion {
                    key: "english".to_string(),
                    label: "English".to_string(),
                    options: vec![option("competent", 0), option("superior", 20)],
                },
                PointsQuestion {
                    key: "nomination".to_string(),
                    label: "Nomination".to_string(),
                    options: vec![option("none", 0), option("regional", 15)],
                },
            ],
        }
    }

    fn selections(pairs: &[(&str, &str)]) -> Selections {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn empty_selection_scores_zero() {
        let outcome = evaluate(&table(), &Selections::new());
        assert_eq!(outcome.total, 0);
        assert_eq!(outcome.status, EligibilityStatus::NeedsMorePoints);
        assert_eq!(outcome.shortfall, 65);
        assert_eq!(outcome.unanswered, vec!["age", "english", "nomination"]);
        assert!(outcome.components.is_empty());
    }

    #[test]
    fn total_is_sum_of_selected_points() {
        let outcome = evaluate(
            &table(),
            &selections(&[("age", "young"), ("english", "superior"), ("nomination", "regional")]),
        );
        assert_eq!(outcome.total, 65);
        assert_eq!(
            outcome.components.iter().map(|c| c.points).sum::<u32>(),
            outcome.total
        );
        assert!(outcome.unanswered.is_empty());
    }

    #[test]
    fn exactly_threshold_is_eligible_and_one_below_is_not() {
        assert_eq!(
            EligibilityStatus::from_total(65, POINTS_THRESHOLD),
            EligibilityStatus::Eligible
        );
        assert_eq!(
            EligibilityStatus::from_total(64, POINTS_THRESHOLD),
            EligibilityStatus::NeedsMorePoints
        );

        let outcome = evaluate(
            &table(),
            &selections(&[("age", "older"), ("english", "superior"), ("nomination", "regional")]),
        );
        assert_eq!(outcome.total, 50);
        assert_eq!(outcome.shortfall, 15);
        assert_eq!(outcome.status.label(), "needs more points");
    }

    #[test]
    fn unknown_values_and_questions_contribute_nothing() {
        let outcome = evaluate(
            &table(),
            &selections(&[("age", "ancient"), ("english", "superior"), ("height", "tall")]),
        );
        assert_eq!(outcome.total, 20);
        assert_eq!(outcome.unanswered, vec!["age", "nomination"]);
        assert_eq!(
            outcome.unrecognised,
            vec![
                UnrecognisedSelection {
                    question: "age".to_string(),
                    value: "ancient".to_string(),
                },
                UnrecognisedSelection {
                    question: "height".to_string(),
                    value: "tall".to_string(),
                },
            ]
        );
    }
}
