mod cli;
mod commands;
mod logging;

use cli::{Cli, Commands};
use commands::{load, tables};

pub fn run() -> anyhow::Result<()> {
    use clap::Parser;

    let cli = Cli::parse();
    logging::init(cli.verbose);
    match &cli.command {
        Commands::Load(args) => load::run(&cli, args),
        Commands::Budget(args) => tables::budget(&cli, args),
        Commands::Series(args) => tables::series(&cli, args),
        Commands::Years(args) => tables::years(&cli, args),
    }
}

fn main() -> anyhow::Result<()> { run() }
