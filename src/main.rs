mod classifier;
mod cli;
mod console;
mod dates;
mod error;
mod fmt;
mod importer;
mod ledger;
mod models;
mod processor;
mod reports;
mod settings;
mod splitter;

use clap::Parser;
use colored::Colorize;

use cli::{CategoriesCommands, Cli, Commands, MappingsCommands, ReportCommands};
use console::StdConsole;

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    let mut console = StdConsole;

    let result = match cli.command {
        Commands::Init => cli::init::run(&mut console),
        Commands::Import { file } => cli::import::run(file.as_deref(), &mut console),
        Commands::Add => cli::add::run(&mut console),
        Commands::Edit => cli::edit::run(&mut console),
        Commands::Categories { command } => match command {
            CategoriesCommands::List => cli::categories::list(),
            CategoriesCommands::Add { name } => cli::categories::add(&name),
            CategoriesCommands::Delete { name } => cli::categories::delete(&name),
        },
        Commands::Mappings { command } => match command {
            MappingsCommands::List => cli::mappings::list(),
            MappingsCommands::Delete { pattern } => cli::mappings::delete(&pattern),
        },
        Commands::Report { command } => match command {
            ReportCommands::Month { month } => {
                cli::report::month(month.as_deref(), &mut console)
            }
            ReportCommands::Category { name } => {
                cli::report::category(name.as_deref(), &mut console)
            }
            ReportCommands::Tag { name } => cli::report::tag(name.as_deref(), &mut console),
        },
    };

    if let Err(e) = result {
        eprintln!("{}", format!("Error: {e}").red());
        std::process::exit(1);
    }
}
