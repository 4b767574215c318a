use chrono::{Local, NaiveDate};

use crate::classifier::Classifier;
use crate::console::Console;
use crate::dates::parse_input_date;
use crate::error::Result;
use crate::fmt::money_in;
use crate::importer::clean_amount;
use crate::ledger::LedgerStore;
use crate::models::{IdentityKey, Transaction};
use crate::settings::load_config;

pub fn run(console: &mut dyn Console) -> Result<()> {
    let config = load_config()?;
    let ledger = LedgerStore::new(config.ledger_path());
    ledger.ensure_exists()?;
    let mut classifier = Classifier::load(config.categories_path(), config.mappings_path())?;
    let default_currency = config
        .import_schema
        .as_ref()
        .map(|s| s.default_currency.clone())
        .unwrap_or_else(|| "CAD".to_string());

    let date = prompt_date(console);
    let description = prompt_description(console);
    let amount = prompt_amount(console);
    let currency = prompt_currency(&default_currency, console);

    if ledger
        .known_identities()?
        .contains(&IdentityKey::new(date, &description, amount))
    {
        console.warn("An identical transaction is already recorded.");
        let answer = console.prompt("Add it anyway? (y/n): ");
        if !answer.eq_ignore_ascii_case("y") {
            console.message("Cancelled.");
            return Ok(());
        }
    }

    let suggestion = classifier
        .find_category(&description)
        .map(|(category, subcategory)| (category.to_string(), subcategory.to_string()));
    let (category, subcategory) = match suggestion {
        Some((category, subcategory)) => {
            let answer = console.prompt(&format!(
                "Matched mapping suggests {category}. Use it? (y/n): "
            ));
            if answer.eq_ignore_ascii_case("y") {
                (category, subcategory)
            } else {
                classifier.prompt_for_category(&description, console)
            }
        }
        None => classifier.prompt_for_category(&description, console),
    };

    let transaction = Transaction {
        date,
        description,
        amount,
        currency,
        category,
        subcategory,
        tag: String::new(),
        merchant: String::new(),
    };
    ledger.append(&transaction)?;
    console.message(&format!(
        "Recorded {} on {} under {}.",
        money_in(transaction.amount, &transaction.currency),
        transaction.date.format("%Y-%m-%d"),
        transaction.category
    ));
    Ok(())
}

fn prompt_date(console: &mut dyn Console) -> NaiveDate {
    let today = Local::now().date_naive();
    loop {
        let input = console.prompt(&format!(
            "Date [{}]: ",
            today.format("%Y-%m-%d")
        ));
        if input.is_empty() {
            return today;
        }
        match parse_input_date(&input) {
            Ok(date) => return date,
            Err(e) => console.warn(&e.to_string()),
        }
    }
}

fn prompt_description(console: &mut dyn Console) -> String {
    loop {
        let input = console.prompt("Description: ");
        if !input.is_empty() {
            return input;
        }
        console.warn("Description cannot be empty.");
    }
}

fn prompt_amount(console: &mut dyn Console) -> f64 {
    loop {
        let input = console.prompt("Amount (positive = expense): ");
        match clean_amount(&input).parse::<f64>() {
            Ok(amount) if amount != 0.0 => return amount,
            Ok(_) => console.warn("Amount cannot be zero."),
            Err(_) => console.warn("Please enter a numeric amount."),
        }
    }
}

fn prompt_currency(default: &str, console: &mut dyn Console) -> String {
    let input = console.prompt(&format!("Currency [{default}]: "));
    if input.is_empty() {
        default.to_string()
    } else {
        input.to_uppercase()
    }
}
