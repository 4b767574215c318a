use comfy_table::Table;

use crate::console::Console;
use crate::error::{Result, TallyError};
use crate::fmt::money;
use crate::ledger::LedgerStore;
use crate::models::Transaction;
use crate::reports::{
    available_categories, available_months, available_tags, group_by_category, group_by_month,
    month_label, percent_change, reportable, transactions_with_tag, yearly_totals_for_category,
};
use crate::settings::load_config;

pub fn month(month: Option<&str>, console: &mut dyn Console) -> Result<()> {
    let transactions = load_transactions()?;
    let months = available_months(&transactions);
    if months.is_empty() {
        console.message("No transactions to report on.");
        return Ok(());
    }

    let key = match month {
        Some(raw) => parse_month_arg(raw)?,
        None => match pick_from_menu(
            "Select a month:",
            &months
                .iter()
                .map(|(y, m)| month_label(*y, *m))
                .collect::<Vec<_>>(),
            console,
        ) {
            Some(i) => months[i],
            None => return Ok(()),
        },
    };

    print_month_report(&transactions, key, console);
    Ok(())
}

pub fn category(name: Option<&str>, console: &mut dyn Console) -> Result<()> {
    let transactions = load_transactions()?;
    let categories = available_categories(&transactions);
    if categories.is_empty() {
        console.message("No transactions to report on.");
        return Ok(());
    }

    let name = match name {
        Some(name) => {
            if !categories.iter().any(|c| c == name) {
                return Err(TallyError::UnknownCategory(name.to_string()));
            }
            name.to_string()
        }
        None => match pick_from_menu("Select a category:", &categories, console) {
            Some(i) => categories[i].clone(),
            None => return Ok(()),
        },
    };

    console.message(&format!("\nSpending on {name} by year:"));
    let mut table = Table::new();
    table.set_header(vec!["Year", "Currency", "Total"]);
    for ((year, currency), total) in yearly_totals_for_category(&transactions, &name) {
        table.add_row(vec![year.to_string(), currency, money(total)]);
    }
    console.message(&table.to_string());
    Ok(())
}

pub fn tag(name: Option<&str>, console: &mut dyn Console) -> Result<()> {
    let transactions = load_transactions()?;
    let tags = available_tags(&transactions);
    if tags.is_empty() {
        console.message("No tagged transactions yet.");
        return Ok(());
    }

    let name = match name {
        Some(name) => name.to_string(),
        None => match pick_from_menu("Select a tag:", &tags, console) {
            Some(i) => tags[i].clone(),
            None => return Ok(()),
        },
    };

    let tagged = transactions_with_tag(&transactions, &name);
    if tagged.is_empty() {
        console.message(&format!("No transactions tagged '{name}'."));
        return Ok(());
    }

    console.message(&format!("\nTransactions tagged '{name}':"));
    let mut table = Table::new();
    table.set_header(vec!["Date", "Description", "Amount", "Category"]);
    let mut total = 0.0;
    for t in &tagged {
        table.add_row(vec![
            t.date.format("%Y-%m-%d").to_string(),
            t.description.clone(),
            money(t.amount),
            t.category.clone(),
        ]);
        total += t.amount;
    }
    console.message(&table.to_string());
    console.message(&format!("Total: {}", money(total)));
    Ok(())
}

fn load_transactions() -> Result<Vec<Transaction>> {
    let config = load_config()?;
    LedgerStore::new(config.ledger_path()).read_all()
}

/// Category table for one month, with a percent change column against the
/// previous calendar month and indented subcategory breakdown rows.
fn print_month_report(
    transactions: &[Transaction],
    key: (i32, u32),
    console: &mut dyn Console,
) {
    let visible = reportable(transactions);
    let months = group_by_month(&visible);
    let Some(month_transactions) = months.get(&key) else {
        console.message(&format!(
            "No transactions in {}.",
            month_label(key.0, key.1)
        ));
        return;
    };
    let categories = group_by_category(month_transactions);
    let previous = months
        .get(&previous_month(key))
        .map(|t| group_by_category(t))
        .unwrap_or_default();

    console.message(&format!("\nSpending for {}:", month_label(key.0, key.1)));
    let mut table = Table::new();
    table.set_header(vec!["Category", "Currency", "Total", "vs prev month"]);
    for (category, totals) in &categories {
        for (currency, total) in &totals.by_currency {
            let change = previous
                .get(category)
                .and_then(|p| p.by_currency.get(currency))
                .and_then(|prev| percent_change(*total, *prev))
                .map(|pct| format!("{pct:+.1}%"))
                .unwrap_or_default();
            table.add_row(vec![
                category.clone(),
                currency.clone(),
                money(*total),
                change,
            ]);
        }
        for (subcategory, by_currency) in &totals.subcategories {
            for (currency, total) in by_currency {
                table.add_row(vec![
                    format!("  └─ {subcategory}"),
                    currency.clone(),
                    money(*total),
                    String::new(),
                ]);
            }
        }
    }
    console.message(&table.to_string());
}

fn previous_month((year, month): (i32, u32)) -> (i32, u32) {
    if month == 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    }
}

/// Parse a YYYY-MM argument into a (year, month) key.
pub(crate) fn parse_month_arg(raw: &str) -> Result<(i32, u32)> {
    let invalid = || TallyError::Validation(format!("'{raw}' is not a YYYY-MM month"));
    let (year, month) = raw.split_once('-').ok_or_else(invalid)?;
    let year: i32 = year.parse().map_err(|_| invalid())?;
    let month: u32 = month.parse().map_err(|_| invalid())?;
    if !(1..=12).contains(&month) {
        return Err(invalid());
    }
    Ok((year, month))
}

/// Numbered menu over `choices`; None when the pick is invalid.
fn pick_from_menu(
    title: &str,
    choices: &[String],
    console: &mut dyn Console,
) -> Option<usize> {
    console.message(&format!("\n{title}"));
    for (i, choice) in choices.iter().enumerate() {
        console.menu_item(i + 1, choice);
    }
    let choice = console.prompt("\nEnter a number: ").parse::<usize>().ok()?;
    if (1..=choices.len()).contains(&choice) {
        Some(choice - 1)
    } else {
        console.warn("Invalid choice.");
        None
    }
}
