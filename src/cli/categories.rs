use comfy_table::Table;

use crate::classifier::Classifier;
use crate::error::{Result, TallyError};
use crate::ledger::LedgerStore;
use crate::models::Transaction;
use crate::settings::load_config;

pub fn list() -> Result<()> {
    let config = load_config()?;
    let classifier = Classifier::load(config.categories_path(), config.mappings_path())?;

    let mut table = Table::new();
    table.set_header(vec!["Category", "Subcategories"]);
    for category in classifier.categories() {
        let mut subcategories: Vec<&str> = classifier
            .subcategories_of(category)
            .iter()
            .map(String::as_str)
            .collect();
        subcategories.sort_unstable();
        table.add_row(vec![category.to_string(), subcategories.join(", ")]);
    }
    println!("Categories\n{table}");
    Ok(())
}

pub fn add(name: &str) -> Result<()> {
    let config = load_config()?;
    let mut classifier = Classifier::load(config.categories_path(), config.mappings_path())?;
    classifier.add_category(name)?;
    println!("Added category: {}", name.trim());
    Ok(())
}

pub fn delete(name: &str) -> Result<()> {
    let config = load_config()?;
    let mut classifier = Classifier::load(config.categories_path(), config.mappings_path())?;
    let transactions = LedgerStore::new(config.ledger_path()).read_all()?;
    if let Some(reason) = blocking_reason(&transactions, name) {
        return Err(TallyError::Validation(reason));
    }
    classifier.delete_category(name)?;
    println!("Deleted category: {name}");
    Ok(())
}

/// Why a category cannot be deleted, or None when deletion is safe. A
/// category with recorded transactions must stay so old entries keep a valid
/// classification.
pub fn blocking_reason(transactions: &[Transaction], category: &str) -> Option<String> {
    let count = transactions
        .iter()
        .filter(|t| t.category == category)
        .count();
    if count == 0 {
        return None;
    }
    let noun = if count == 1 { "transaction" } else { "transactions" };
    Some(format!(
        "cannot delete '{category}': used by {count} recorded {noun}"
    ))
}
