use super::{question, yes_no};
use crate::calculators::PointsQuestion;

pub(in crate::calculators) fn questions() -> Vec<PointsQuestion> {
    vec![
        question(
            "age",
            "Age at time of invitation",
            &[
                ("18-24", "18 to 24", 25),
                ("25-32", "25 to 32", 30),
                ("33-39", "33 to 39", 25),
                ("40-44", "40 to 44", 15),
                ("45-plus", "45 or older", 0),
            ],
        ),
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
            "overseas_employment",
            "Skilled employment outside Australia (last 10 years)",
            &[
                ("under-3", "Less than 3 years", 0),
                ("3-4", "3 to 4 years", 5),
                ("5-7", "5 to 7 years", 10),
                ("8-10", "8 to 10 years", 15),
            ],
        ),
        question(
            "australian_employment",
            "Skilled employment in Australia (last 10 years)",
            &[
                ("under-1", "Less than 1 year", 0),
                ("1-2", "1 to 2 years", 5),
                ("3-4", "3 to 4 years", 10),
                ("5-7", "5 to 7 years", 15),
                ("8-10", "8 to 10 years", 20),
            ],
        ),
        question(
            "education",
            "Highest qualification",
            &[
                ("none", "No recognised qualification", 0),
                ("diploma", "Diploma or trade qualification", 10),
                ("assessed-award", "Award recognised by the assessing authority", 10),
                ("bachelor", "Bachelor or Masters degree", 15),
                ("doctorate", "Doctorate", 20),
            ],
        ),
        yes_no(
            "specialist_education",
            "Masters by research or doctorate from an Australian institution in STEM",
            10,
        ),
        yes_no("australian_study", "Meets the Australian study requirement", 5),
        yes_no("regional_study", "Studied in regional Australia", 5),
        yes_no("professional_year", "Completed a Professional Year in Australia", 5),
        yes_no(
            "community_language",
            "Accredited in a credentialled community language",
            5,
        ),
        question(
            "partner",
            "Partner skills",
            &[
                ("none", "Partner does not meet any criteria", 0),
                ("competent-english", "Partner has competent English", 5),
                ("skilled", "Partner has competent English and a positive skills assessment", 10),
                ("single-or-citizen", "Single, or partner is a citizen or permanent resident", 10),
            ],
        ),
        question(
            "nomination",
            "Nomination or sponsorship",
            &[
                ("none", "Independent (subclass 189)", 0),
                ("state", "State or territory nomination (subclass 190)", 5),
                ("regional", "Regional nomination or sponsorship (subclass 491)", 15),
            ],
        ),
    ]
}
