pub mod add;
pub mod categories;
pub mod edit;
pub mod import;
pub mod init;
pub mod mappings;
pub mod report;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tally", about = "Personal expense tracking from bank CSV exports.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set up tally: write a starter config and create the data directory.
    Init,
    /// Import and classify transactions from the new-transactions CSV.
    Import {
        /// CSV file to import (default: the configured new-transactions file)
        file: Option<String>,
    },
    /// Add a single transaction by hand.
    Add,
    /// Edit a recorded transaction: recategorize, tag, set merchant, or split.
    Edit,
    /// Manage categories.
    Categories {
        #[command(subcommand)]
        command: CategoriesCommands,
    },
    /// Manage learned description mappings.
    Mappings {
        #[command(subcommand)]
        command: MappingsCommands,
    },
    /// Spending reports.
    Report {
        #[command(subcommand)]
        command: ReportCommands,
    },
}

#[derive(Subcommand)]
pub enum CategoriesCommands {
    /// List all categories and their subcategories.
    List,
    /// Add a new category.
    Add {
        /// Category name
        name: String,
    },
    /// Delete a category with no recorded transactions.
    Delete {
        /// Category name
        name: String,
    },
}

#[derive(Subcommand)]
pub enum MappingsCommands {
    /// List learned mappings in match order.
    List,
    /// Delete a mapping by its pattern.
    Delete {
        /// Pattern exactly as shown in `tally mappings list`
        pattern: String,
    },
}

#[derive(Subcommand)]
pub enum ReportCommands {
    /// Spending for one month, by category.
    Month {
        /// Month: YYYY-MM (prompts when omitted)
        #[arg(long)]
        month: Option<String>,
    },
    /// Spending history for one category, by year.
    Category {
        /// Category name (prompts when omitted)
        name: Option<String>,
    },
    /// All transactions carrying a tag.
    Tag {
        /// Tag name (prompts when omitted)
        name: Option<String>,
    },
}
