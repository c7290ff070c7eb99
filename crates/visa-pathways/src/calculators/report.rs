use std::fmt::Write as _;

use super::{EligibilityStatus, FundsEstimate, OptionTable, PointsOutcome};

/// Plain-text eligibility summary suitable for terminals and e-mail attachments.
pub fn render_points_report(table: &OptionTable, outcome: &PointsOutcome) -> String {
    let mut out = String::new();
    let title = outcome.variant.title();
    writeln!(&mut out, "{title}").expect("write title");
    writeln!(&mut out, "{}", "=".repeat(title.len())).expect("write underline");

    for component in &outcome.components {
        let question = table
            .question(&component.question)
            .map(|question| question.label.as_str())
            .unwrap_or(component.question.as_str());
        writeln!(
            &mut out,
            "  {:>3}  {} - {}",
            component.points, question, component.label
        )
        .expect("write component");
    }

    if !outcome.unanswered.is_empty() {
        writeln!(&mut out, "  unanswered: {}", outcome.unanswered.join(", "))
            .expect("write unanswered");
    }
    for selection in &outcome.unrecognised {
        writeln!(
            &mut out,
            "  ignored: {}={} (not in the table)",
            selection.question, selection.value
        )
        .expect("write ignored selection");
    }

    out.push('\n');
    writeln!(&mut out, "Total: {} / {}", outcome.total, outcome.threshold).expect("write total");
    match outcome.status {
        EligibilityStatus::Eligible => {
            out.push_str("Result: eligible to lodge an expression of interest\n");
        }
        EligibilityStatus::NeedsMorePoints => {
            writeln!(
                &mut out,
                "Result: needs {} more point(s) to reach {}",
                outcome.shortfall, outcome.threshold
            )
            .expect("write result");
        }
    }

    out
}

pub fn render_funds_report(estimate: &FundsEstimate) -> String {
    let mut out = String::from("Student visa financial capacity (500)\n");
    for component in &estimate.components {
        writeln!(&mut out, "  AUD {:>7}  {}", component.points, component.label)
            .expect("write component");
    }
    for selection in &estimate.unrecognised {
        writeln!(&mut out, "  ignored: {}={}", selection.question, selection.value)
            .expect("write ignored selection");
    }
    out.push('\n');
    writeln!(&mut out, "Required: AUD {}", estimate.required).expect("write required");
    writeln!(&mut out, "Declared: AUD {}", estimate.declared).expect("write declared");
    if estimate.sufficient {
        out.push_str("Result: declared funds are sufficient\n");
    } else {
        writeln!(&mut out, "Result: short by AUD {}", estimate.shortfall).expect("write shortfall");
    }
    out
}
