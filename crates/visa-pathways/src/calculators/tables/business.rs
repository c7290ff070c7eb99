use super::{question, yes_no};
use crate::calculators::PointsQuestion;

pub(in crate::calculators) fn questions() -> Vec<PointsQuestion> {
    vec![
        question(
            "age",
            "Age at time of invitation",
            &[
                ("18-24", "18 to 24", 20),
                ("25-32", "25 to 32", 30),
                ("33-39", "33 to 39", 25),
                ("40-44", "40 to 44", 20),
                ("45-54", "45 to 54", 15),
                ("55-plus", "55 or older", 0),
            ],
        ),
        question(
            "english",
            "English language ability",
            &[
                ("none", "Below vocational English", 0),
                ("vocational", "Vocational English", 5),
                ("proficient", "Proficient English", 10),
            ],
        ),
        question(
            "qualifications",
            "Qualifications",
            &[
                ("none", "No recognised qualification", 0),
                ("trade-diploma-bachelor", "Trade certificate, diploma or bachelor degree", 5),
                (
                    "business-science-technology",
                    "Bachelor degree in business, science or technology",
                    10,
                ),
            ],
        ),
        question(
            "business_experience",
            "Years holding an ownership interest in a main business",
            &[
                ("none", "Less than 4 of the last 5 years", 0),
                ("4-of-5", "At least 4 of the last 5 years", 10),
                ("7-of-8", "At least 7 of the last 8 years", 15),
            ],
        ),
        question(
            "net_assets",
            "Net personal and business assets",
            &[
                ("under-1.25m", "Less than AUD 1.25 million", 0),
                ("1.25m", "At least AUD 1.25 million", 5),
                ("1.8m", "At least AUD 1.8 million", 15),
                ("2.25m", "At least AUD 2.25 million", 25),
                ("2.75m", "At least AUD 2.75 million", 35),
            ],
        ),
        question(
            "business_turnover",
            "Annual turnover of main business",
            &[
                ("under-750k", "Less than AUD 750,000", 0),
                ("750k", "At least AUD 750,000", 5),
                ("1.25m", "At least AUD 1.25 million", 15),
                ("1.75m", "At least AUD 1.75 million", 25),
                ("2.25m", "At least AUD 2.25 million", 35),
            ],
        ),
        yes_no("innovation_patents", "Registered patents or designs used in the business", 15),
        yes_no("innovation_trademarks", "Registered trade marks used in the business", 10),
        yes_no("innovation_joint_venture", "Joint venture agreement of at least 2 years", 5),
        yes_no("innovation_export", "At least 50% of turnover from export trade", 15),
        yes_no("innovation_high_growth", "High-growth business for 3 consecutive years", 10),
        yes_no("innovation_venture_capital", "Received venture capital funding", 10),
        yes_no("innovation_awards", "Received a business innovation award", 15),
        yes_no(
            "special_endorsement",
            "Business endorsed as having special importance to a state or territory",
            10,
        ),
    ]
}
