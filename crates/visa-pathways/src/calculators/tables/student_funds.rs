//! Subclass 500 financial capacity amounts in AUD per year.

use super::question;
use crate::calculators::PointsQuestion;

pub(in crate::calculators) const PRIMARY_LIVING_COSTS: u32 = 29_710;

pub(in crate::calculators) fn questions() -> Vec<PointsQuestion> {
    vec![
        question(
            "partner",
            "Partner accompanying the student",
            &[("none", "No partner", 0), ("accompanying", "Partner accompanying", 10_394)],
        ),
        question(
            "dependent_children",
            "Dependent children accompanying",
            &[
                ("0", "No children", 0),
                ("1", "One child", 4_449),
                ("2", "Two children", 8_898),
                ("3", "Three children", 13_347),
                ("4", "Four children", 17_796),
            ],
        ),
        question(
            "school_age_children",
            "School-age children needing schooling",
            &[
                ("0", "None", 0),
                ("1", "One child", 13_502),
                ("2", "Two children", 27_004),
                ("3", "Three children", 40_506),
                ("4", "Four children", 54_008),
            ],
        ),
        question(
            "travel",
            "Return travel from",
            &[
                ("onshore", "Already in Australia", 0),
                ("asia-pacific", "Asia and the Pacific", 1_500),
                ("europe-middle-east", "Europe and the Middle East", 2_500),
                ("africa-americas", "Africa and the Americas", 3_000),
            ],
        ),
    ]
}
