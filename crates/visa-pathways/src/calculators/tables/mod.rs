//! Option tables for each calculator. Values mirror the published points tests.

pub(super) mod business;
pub(super) mod canberra;
pub(super) mod gsm;
pub(super) mod student_funds;

use super::{PointsOption, PointsQuestion};

pub(super) fn question(key: &str, label: &str, options: &[(&str, &str, u32)]) -> PointsQuestion {
    PointsQuestion {
        key: key.to_string(),
        label: label.to_string(),
        options: options
            .iter()
            .map(|(value, label, points)| PointsOption {
                value: value.to_string(),
                label: label.to_string(),
                points: *points,
            })
            .collect(),
    }
}

pub(super) fn yes_no(key: &str, label: &str, points: u32) -> PointsQuestion {
    question(key, label, &[("no", "No", 0), ("yes", "Yes", points)])
}
