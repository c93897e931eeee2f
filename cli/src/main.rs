mod cli;
mod commands;

use cli::{Cli, Commands};
use commands::{aggregate, annotate, assign, export, names, overlap, redistribute};

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .target(env_logger::Target::Stderr)
        .init();
}

pub fn run() -> anyhow::Result<()> {
    use clap::Parser;

    let cli = Cli::parse();
    init_logging(cli.verbose);
    let settings = cellgraph::Settings::load(cli.config.as_deref())?;

    match &cli.command {
        Commands::Overlap(args) => overlap::run(&settings, args),
        Commands::Aggregate(args) => aggregate::run(&settings, args),
        Commands::Redistribute(args) => redistribute::run(&settings, args),
        Commands::Annotate(args) => annotate::run(&settings, args),
        Commands::Export(args) => export::run(&settings, args),
        Commands::Names(args) => names::run(&settings, args),
        Commands::Assign(args) => assign::run(&settings, args),
    }
}

fn main() -> anyhow::Result<()> { run() }
