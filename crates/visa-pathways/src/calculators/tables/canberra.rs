use super::{question, yes_no};
use crate::calculators::PointsQuestion;

pub(in crate::calculators) fn questions() -> Vec<PointsQuestion> {
    vec![
        question(
            "english",
            "English language ability",
            &[
                ("competent", "Competent English", 0),
                ("proficient", "Proficient English", 10),
                ("superior", "Superior English", 20),
            ],
        ),
        question(
            "canberra_employment",
            "Skilled employment in Canberra",
            &[
                ("none", "Not employed in Canberra", 0),
                ("6-months", "At least 6 months", 5),
                ("12-months", "At least 12 months", 10),
                ("2-years", "At least 2 years", 15),
                ("3-years", "3 years or more", 20),
            ],
        ),
        yes_no(
            "critical_skills",
            "Nominated occupation is on the ACT Critical Skills List",
            20,
        ),
        question(
            "qualifications",
            "Highest qualification",
            &[
                ("none", "No recognised qualification", 0),
                ("diploma", "Diploma or trade qualification", 5),
                ("bachelor", "Bachelor degree", 10),
                ("masters", "Masters degree", 15),
                ("doctorate", "Doctorate", 20),
            ],
        ),
        question(
            "act_study",
            "Study completed at an ACT institution",
            &[
                ("none", "No ACT study", 0),
                ("1-year", "At least 1 year", 10),
                ("2-years", "At least 2 years", 15),
            ],
        ),
        question(
            "partner",
            "Partner circumstances",
            &[
                ("none", "Partner does not meet any criteria", 0),
                ("employed-in-canberra", "Partner employed in Canberra", 10),
                ("skilled", "Partner has a positive skills assessment", 10),
                ("single", "Single applicant", 10),
            ],
        ),
        yes_no(
            "close_family",
            "Close family member who is an ACT resident citizen or permanent resident",
            10,
        ),
        yes_no("small_business_owner", "Owns and operates a small business in Canberra", 10),
    ]
}
