use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use log::{error, info, warn};

use crate::classifier::Classifier;
use crate::console::Console;
use crate::error::Result;
use crate::fmt::money_in;
use crate::importer::parse_row;
use crate::ledger::LedgerStore;
use crate::models::{RawTransaction, Transaction, IGNORED_CATEGORY};
use crate::settings::ImportSchema;
use crate::splitter::split_transaction;

/// Tally of one import batch, for the end-of-run summary.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportOutcome {
    pub rows_seen: usize,
    pub added: usize,
    pub skipped_duplicates: usize,
}

enum Decision {
    Save(String, String),
    Split,
}

/// Run the import pipeline over the inbox file: parse each row, drop
/// duplicates against everything already in the ledger (and earlier rows of
/// this batch), auto-categorize by mapping rule, and prompt for the rest.
/// Row-scoped failures are logged and skipped; the batch always continues.
pub fn process_new_transactions(
    new_file: &Path,
    ledger: &LedgerStore,
    classifier: &mut Classifier,
    schema: &ImportSchema,
    console: &mut dyn Console,
) -> Result<ImportOutcome> {
    let mut outcome = ImportOutcome::default();
    if !new_file.exists() {
        console.message(&format!(
            "No new transactions file at {}; nothing to import.",
            new_file.display()
        ));
        return Ok(outcome);
    }

    let mut reader = csv::ReaderBuilder::new().from_reader(File::open(new_file)?);
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .enumerate()
        // Some bank exports lead with a UTF-8 BOM glued to the first header.
        .map(|(i, h)| {
            if i == 0 {
                h.trim_start_matches('\u{feff}').to_string()
            } else {
                h.to_string()
            }
        })
        .collect();

    let mut seen = ledger.known_identities()?;

    for (i, record) in reader.records().enumerate() {
        let line = i + 2;
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                warn!("line {line}: unreadable row skipped: {e}");
                continue;
            }
        };
        outcome.rows_seen += 1;

        let row: HashMap<String, String> = headers
            .iter()
            .cloned()
            .zip(record.iter().map(str::to_string))
            .collect();

        let raw = match parse_row(&row, schema) {
            Ok(raw) => raw,
            Err(e) if e.is_row_scoped() => {
                warn!("line {line}: row skipped: {e}");
                continue;
            }
            Err(e) => return Err(e),
        };

        if seen.contains(&raw.identity()) {
            info!(
                "line {line}: duplicate of an existing transaction ('{}'), skipped",
                raw.description
            );
            outcome.skipped_duplicates += 1;
            continue;
        }

        // Persistence failures are row-scoped too: the row stays out of the
        // seen-set so a rerun picks it up again, and the batch continues.
        if let Some((category, subcategory)) = classifier.find_category(&raw.description) {
            let transaction = Transaction::from_raw(&raw, category, subcategory);
            match ledger.append(&transaction) {
                Ok(()) => {
                    seen.insert(transaction.identity());
                    outcome.added += 1;
                    info!(
                        "line {line}: '{}' auto-categorized as {category}",
                        raw.description
                    );
                }
                Err(e) => error!(
                    "line {line}: could not record '{}': {e}",
                    raw.description
                ),
            }
            continue;
        }

        let decision = review_transaction(&raw, classifier, console);
        match decision {
            Decision::Save(category, subcategory) => {
                let transaction = Transaction::from_raw(&raw, &category, &subcategory);
                match ledger.append(&transaction) {
                    Ok(()) => {
                        seen.insert(transaction.identity());
                        outcome.added += 1;
                    }
                    Err(e) => error!(
                        "line {line}: could not record '{}': {e}",
                        raw.description
                    ),
                }
            }
            Decision::Split => match split_transaction(&raw, ledger, classifier, console) {
                Ok(marker) => {
                    seen.insert(marker.identity());
                    outcome.added += 1;
                }
                Err(e) => error!(
                    "line {line}: could not record split of '{}': {e}",
                    raw.description
                ),
            },
        }
    }

    console.message(&format!(
        "\nImport finished: {} rows read, {} added, {} duplicates skipped.",
        outcome.rows_seen, outcome.added, outcome.skipped_duplicates
    ));
    Ok(outcome)
}

/// Menu loop for one unrecognized transaction. Always ends in a decision;
/// "ignore" is just saving under the reserved IGNORED category.
fn review_transaction(
    raw: &RawTransaction,
    classifier: &mut Classifier,
    console: &mut dyn Console,
) -> Decision {
    loop {
        console.message(&format!(
            "\nNew transaction: {}  {}  {}",
            raw.date.format("%Y-%m-%d"),
            raw.description,
            money_in(raw.amount, &raw.currency)
        ));
        console.menu_item(1, "Show full details");
        console.menu_item(2, "Categorize");
        console.menu_item(3, "Split into parts");
        console.menu_item(4, "Ignore");

        match console.prompt("\nChoose an option: ").as_str() {
            "1" => show_details(raw, console),
            "2" => {
                let (category, subcategory) =
                    classifier.prompt_for_category(&raw.description, console);
                offer_mapping(raw, &category, &subcategory, classifier, console);
                return Decision::Save(category, subcategory);
            }
            "3" => return Decision::Split,
            "4" => return Decision::Save(IGNORED_CATEGORY.to_string(), String::new()),
            _ => console.warn("Please choose 1-4."),
        }
    }
}

fn show_details(raw: &RawTransaction, console: &mut dyn Console) {
    console.message("\nOriginal row:");
    let mut fields: Vec<(&String, &String)> = raw
        .source_row
        .iter()
        .filter(|(_, value)| !value.trim().is_empty())
        .collect();
    fields.sort();
    for (column, value) in fields {
        console.message(&format!("  {column}: {value}"));
    }
}

fn offer_mapping(
    raw: &RawTransaction,
    category: &str,
    subcategory: &str,
    classifier: &mut Classifier,
    console: &mut dyn Console,
) {
    let answer = console.prompt("Save this mapping for future transactions? (y/n): ");
    if !answer.eq_ignore_ascii_case("y") {
        return;
    }
    match classifier.save_mapping(&raw.description, category, subcategory) {
        Ok(()) => console.message("Mapping saved."),
        Err(e) => console.error(&format!("Could not save mapping: {e}")),
    }
}
