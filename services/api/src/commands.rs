use crate::infra::occupation_directory;
use chrono::Utc;
use clap::{Args, Subcommand};
use serde::Serialize;
use std::fmt::Write as _;
use visa_pathways::calculators::report::{render_funds_report, render_points_report};
use visa_pathways::calculators::{
    estimate_student_funds, evaluate, selections_from_pairs, CalculatorVariant, OptionTable,
    Selections, StudentFundsRequest,
};
use visa_pathways::config::AppConfig;
use visa_pathways::error::AppError;
use visa_pathways::occupations::{OccupationMatch, SearchHit, DEFAULT_SEARCH_LIMIT};

#[derive(Args, Debug)]
pub(crate) struct CalculateArgs {
    /// Points test to score (gsm, business-innovation, canberra-matrix)
    #[arg(value_parser = parse_points_variant)]
    pub(crate) variant: CalculatorVariant,
    /// Selected answer as question=value; repeat for each question
    #[arg(short = 's', long = "select", value_name = "QUESTION=VALUE", value_parser = parse_selection)]
    pub(crate) selections: Vec<(String, String)>,
    /// Print the plain-text eligibility report instead of the summary
    #[arg(long)]
    pub(crate) report: bool,
    /// Print the outcome as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct FundsArgs {
    /// Household answer as question=value; repeat for each question
    #[arg(short = 's', long = "select", value_name = "QUESTION=VALUE", value_parser = parse_selection)]
    pub(crate) selections: Vec<(String, String)>,
    /// First-year tuition in AUD
    #[arg(long, default_value_t = 0)]
    pub(crate) tuition: u32,
    /// Funds the applicant can evidence in AUD
    #[arg(long, default_value_t = 0)]
    pub(crate) declared: u32,
    /// Print the estimate as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Subcommand, Debug)]
pub(crate) enum OccupationCommand {
    /// Resolve a 4 to 6 digit ANZSCO or OSCA code
    Lookup {
        code: String,
        /// Print the match as JSON
        #[arg(long)]
        json: bool,
    },
    /// Search occupations by title or code prefix
    Search {
        query: String,
        #[arg(long, default_value_t = DEFAULT_SEARCH_LIMIT)]
        limit: usize,
    },
}

#[derive(Args, Debug)]
pub(crate) struct OptionsArgs {
    /// Calculator whose questions to list
    #[arg(value_parser = parse_variant)]
    pub(crate) variant: CalculatorVariant,
}

pub(crate) fn parse_variant(raw: &str) -> Result<CalculatorVariant, String> {
    CalculatorVariant::parse(raw).ok_or_else(|| {
        let known: Vec<&str> = CalculatorVariant::ALL
            .iter()
            .map(|variant| variant.slug())
            .collect();
        format!("unknown calculator '{raw}' (expected one of {})", known.join(", "))
    })
}

pub(crate) fn parse_points_variant(raw: &str) -> Result<CalculatorVariant, String> {
    let variant = parse_variant(raw)?;
    if variant.table().threshold().is_none() {
        return Err(format!(
            "{variant} is not a points test; use the funds command"
        ));
    }
    Ok(variant)
}

pub(crate) fn parse_selection(raw: &str) -> Result<(String, String), String> {
    selections_from_pairs([raw])?
        .into_iter()
        .next()
        .ok_or_else(|| format!("selection '{raw}' is empty"))
}

fn collect(pairs: Vec<(String, String)>) -> Selections {
    pairs.into_iter().collect()
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(err) => println!("JSON output unavailable: {err}"),
    }
}

pub(crate) fn run_calculate(args: CalculateArgs) -> Result<(), AppError> {
    let table = args.variant.table();
    let outcome = evaluate(&table, &collect(args.selections));

    if args.json {
        print_json(&outcome);
    } else if args.report {
        println!("Generated {}", Utc::now().format("%Y-%m-%d %H:%M UTC"));
        print!("{}", render_points_report(&table, &outcome));
    } else {
        println!(
            "{}: {} / {} points -> {}",
            outcome.variant.title(),
            outcome.total,
            outcome.threshold,
            outcome.status.label()
        );
        if outcome.shortfall > 0 {
            println!("- {} more points needed", outcome.shortfall);
        }
        for unrecognised in &outcome.unrecognised {
            println!(
                "- ignored {}={} (not an option of this test)",
                unrecognised.question, unrecognised.value
            );
        }
    }
    Ok(())
}

pub(crate) fn run_funds(args: FundsArgs) -> Result<(), AppError> {
    let estimate = estimate_student_funds(&StudentFundsRequest {
        selections: collect(args.selections),
        annual_tuition: args.tuition,
        declared_funds: args.declared,
    });

    if args.json {
        print_json(&estimate);
    } else {
        print!("{}", render_funds_report(&estimate));
    }
    Ok(())
}

pub(crate) async fn run_occupation(command: OccupationCommand) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let directory = occupation_directory(&config.data)?;

    match command {
        OccupationCommand::Lookup { code, json } => {
            let found = directory.lookup(&code).await?;
            if json {
                print_json(&found);
            } else {
                print!("{}", render_match(&found));
            }
        }
        OccupationCommand::Search { query, limit } => {
            let hits = directory.search(&query, limit).await?;
            print!("{}", render_hits(&query, &hits));
        }
    }
    Ok(())
}

pub(crate) fn run_options(args: OptionsArgs) -> Result<(), AppError> {
    print!("{}", render_options(&args.variant.table()));
    Ok(())
}

pub(crate) fn render_match(found: &OccupationMatch) -> String {
    let mut out = String::new();
    writeln!(
        &mut out,
        "{} {}",
        found.code,
        found.title.as_deref().unwrap_or("(title unknown)")
    )
    .expect("write heading");
    writeln!(&mut out, "- lists: {}", found.list_membership).expect("write lists");
    if let Some(level) = found.skill_level {
        writeln!(&mut out, "- skill level: {level}").expect("write skill level");
    }
    if let Some(authority) = &found.assessing_authority {
        writeln!(&mut out, "- assessing authority: {authority}").expect("write authority");
    }
    if !found.visa_subclasses.is_empty() {
        writeln!(
            &mut out,
            "- visa subclasses: {}",
            found.visa_subclasses.join(", ")
        )
        .expect("write subclasses");
    }
    writeln!(&mut out, "- source: {:?}", found.source).expect("write source");
    out
}

pub(crate) fn render_hits(query: &str, hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return format!("No occupations match '{query}'\n");
    }
    let mut out = String::new();
    for hit in hits {
        writeln!(
            &mut out,
            "{:<8} {:<40} {}",
            hit.code, hit.title, hit.list_membership
        )
        .expect("write hit");
    }
    out
}

pub(crate) fn render_options(table: &OptionTable) -> String {
    let mut out = format!("{} ({})\n", table.variant.title(), table.variant.slug());
    for question in &table.questions {
        writeln!(&mut out, "{}: {}", question.key, question.label).expect("write question");
        for option in &question.options {
            writeln!(
                &mut out,
                "  {:<22} {:>6}  {}",
                option.value, option.points, option.label
            )
            .expect("write option");
        }
    }
    match table.threshold() {
        Some(threshold) => {
            writeln!(
                &mut out,
                "Pass mark {threshold} of {} available",
                table.max_total()
            )
            .expect("write pass mark");
        }
        None => out.push_str("Amounts in AUD; compared with declared funds\n"),
    }
    out
}
