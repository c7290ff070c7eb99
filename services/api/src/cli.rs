use crate::commands::{
    run_calculate, run_funds, run_occupation, run_options, CalculateArgs, FundsArgs,
    OccupationCommand, OptionsArgs,
};
use crate::server;
use clap::{Args, Parser, Subcommand};
use visa_pathways::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Visa Pathways",
    about = "Run the visa pathways service or its calculators and occupation lookup from a terminal",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Score a points test from question=value selections
    Calculate(CalculateArgs),
    /// Estimate student visa financial capacity
    Funds(FundsArgs),
    /// Look up or search ANZSCO / OSCA occupations
    Occupation {
        #[command(subcommand)]
        command: OccupationCommand,
    },
    /// List the questions and options of a calculator
    Options(OptionsArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Calculate(args) => run_calculate(args),
        Command::Funds(args) => run_funds(args),
        Command::Occupation { command } => run_occupation(command).await,
        Command::Options(args) => run_options(args),
    }
}
