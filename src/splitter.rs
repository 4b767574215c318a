use log::info;

use crate::classifier::Classifier;
use crate::console::Console;
use crate::error::Result;
use crate::fmt::money;
use crate::ledger::LedgerStore;
use crate::models::{RawTransaction, Transaction, SPLIT_CATEGORY};

/// Remainders at or below this are treated as fully allocated.
pub const EPSILON: f64 = 0.009;

/// Interactively split one imported transaction into parts. The original is
/// recorded immediately under the SPLIT marker category so its identity is
/// on file before any part exists; parts are appended one at a time as the
/// user enters them. Stopping early is allowed and leaves the unallocated
/// remainder under SPLIT.
pub fn split_transaction(
    raw: &RawTransaction,
    ledger: &LedgerStore,
    classifier: &mut Classifier,
    console: &mut dyn Console,
) -> Result<Transaction> {
    let marker = Transaction::from_raw(raw, SPLIT_CATEGORY, "");
    ledger.append(&marker)?;
    info!("recorded split marker for '{}'", raw.description);

    let mut remaining = raw.amount.abs();
    while remaining > EPSILON {
        console.message(&format!(
            "\nRemaining to allocate: {}",
            money(remaining)
        ));
        let answer = console.prompt("Add a split part? (y/n): ");
        if !answer.eq_ignore_ascii_case("y") {
            console.warn(&format!(
                "{} will remain categorized as {SPLIT_CATEGORY}.",
                money(remaining)
            ));
            break;
        }

        let Some(part_amount) = prompt_split_amount(remaining, console) else {
            continue;
        };

        let default_description = format!("Split: {}", raw.description);
        let entered = console.prompt(&format!(
            "Description for this part [{default_description}]: "
        ));
        let description = if entered.is_empty() {
            default_description
        } else {
            entered
        };

        let (category, subcategory) = classifier.prompt_for_category(&description, console);
        let part = Transaction {
            date: raw.date,
            description,
            amount: part_amount.copysign(raw.amount),
            currency: raw.currency.clone(),
            category,
            subcategory,
            tag: String::new(),
            merchant: String::new(),
        };
        if let Err(e) = ledger.append(&part) {
            console.error(&format!("Could not record split part: {e}"));
            break;
        }
        remaining -= part_amount;
    }

    if remaining <= EPSILON {
        console.message("Transaction fully split.");
    }
    Ok(marker)
}

/// Ask for one part amount; positive and at most the remainder (with a small
/// overshoot tolerance for typed rounding). Returns None on invalid input so
/// the caller re-asks.
pub(crate) fn prompt_split_amount(remaining: f64, console: &mut dyn Console) -> Option<f64> {
    let input = console.prompt("Amount for this part: ");
    let Ok(amount) = crate::importer::clean_amount(&input).parse::<f64>() else {
        console.warn("Please enter a numeric amount.");
        return None;
    };
    if amount <= EPSILON {
        console.warn("Amount must be positive.");
        return None;
    }
    if amount > remaining + 0.001 {
        console.warn(&format!(
            "Amount exceeds the {} remaining.",
            money(remaining)
        ));
        return None;
    }
    Some(amount)
}

/// Split an already-recorded transaction in memory: returns the marker that
/// replaces the original plus the categorized parts. The caller rewrites the
/// ledger with the result.
pub fn split_existing(
    original: &Transaction,
    classifier: &mut Classifier,
    console: &mut dyn Console,
) -> (Transaction, Vec<Transaction>) {
    let mut marker = original.clone();
    marker.category = SPLIT_CATEGORY.to_string();
    marker.subcategory.clear();

    let mut parts = Vec::new();
    let mut remaining = original.amount.abs();
    while remaining > EPSILON {
        console.message(&format!("\nRemaining to allocate: {}", money(remaining)));
        let answer = console.prompt("Add a split part? (y/n): ");
        if !answer.eq_ignore_ascii_case("y") {
            console.warn(&format!(
                "{} will remain categorized as {SPLIT_CATEGORY}.",
                money(remaining)
            ));
            break;
        }
        let Some(part_amount) = prompt_split_amount(remaining, console) else {
            continue;
        };
        let default_description = format!("Split: {}", original.description);
        let entered = console.prompt(&format!(
            "Description for this part [{default_description}]: "
        ));
        let description = if entered.is_empty() {
            default_description
        } else {
            entered
        };
        let (category, subcategory) = classifier.prompt_for_category(&description, console);
        parts.push(Transaction {
            date: original.date,
            description,
            amount: part_amount.copysign(original.amount),
            currency: original.currency.clone(),
            category,
            subcategory,
            tag: String::new(),
            merchant: String::new(),
        });
        remaining -= part_amount;
    }
    (marker, parts)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::NaiveDate;

    use super::*;
    use crate::console::testing::ScriptedConsole;

    fn raw(amount: f64) -> RawTransaction {
        RawTransaction {
            date: NaiveDate::from_ymd_opt(2023, 3, 10).unwrap(),
            description: "COSTCO #55".to_string(),
            amount,
            currency: "CAD".to_string(),
            source_row: HashMap::new(),
        }
    }

    fn fixtures() -> (tempfile::TempDir, LedgerStore, Classifier) {
        let dir = tempfile::tempdir().unwrap();
        let ledger = LedgerStore::new(dir.path().join("transactions.csv"));
        let mut classifier = Classifier::load(
            dir.path().join("categories.json"),
            dir.path().join("mappings.json"),
        )
        .unwrap();
        classifier.add_category("Groceries").unwrap();
        classifier.add_category("Household").unwrap();
        (dir, ledger, classifier)
    }

    #[test]
    fn test_full_split_leaves_no_remainder() {
        let (_dir, ledger, mut classifier) = fixtures();
        // 100 = 40 (Groceries) + 60 (Household); category menu has
        // 1 Groceries, 2 Household.
        let mut console = ScriptedConsole::new(&[
            "y", "40", "", "1", "0",
            "y", "60", "", "2", "0",
        ]);
        let marker =
            split_transaction(&raw(100.0), &ledger, &mut classifier, &mut console).unwrap();
        assert_eq!(marker.category, SPLIT_CATEGORY);

        let rows = ledger.read_all().unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].category, SPLIT_CATEGORY);
        assert_eq!(rows[0].amount, 100.0);
        assert_eq!(rows[1].description, "Split: COSTCO #55");
        assert_eq!(rows[1].amount, 40.0);
        assert_eq!(rows[1].category, "Groceries");
        assert_eq!(rows[2].amount, 60.0);
        assert_eq!(rows[2].category, "Household");
        assert!(console.output_contains("fully split"));
    }

    #[test]
    fn test_partial_split_warns_about_remainder() {
        let (_dir, ledger, mut classifier) = fixtures();
        let mut console = ScriptedConsole::new(&["y", "40", "", "1", "0", "n"]);
        split_transaction(&raw(100.0), &ledger, &mut classifier, &mut console).unwrap();

        let rows = ledger.read_all().unwrap();
        assert_eq!(rows.len(), 2);
        assert!(console.output_contains("$60.00 will remain categorized as SPLIT."));
    }

    #[test]
    fn test_declining_immediately_keeps_only_marker() {
        let (_dir, ledger, mut classifier) = fixtures();
        let mut console = ScriptedConsole::new(&["n"]);
        split_transaction(&raw(25.0), &ledger, &mut classifier, &mut console).unwrap();
        let rows = ledger.read_all().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].category, SPLIT_CATEGORY);
    }

    #[test]
    fn test_part_amount_validation() {
        let mut console = ScriptedConsole::new(&["abc"]);
        assert_eq!(prompt_split_amount(50.0, &mut console), None);

        let mut console = ScriptedConsole::new(&["-5"]);
        assert_eq!(prompt_split_amount(50.0, &mut console), None);

        // At or below the remainder epsilon is as good as zero.
        let mut console = ScriptedConsole::new(&["0.005"]);
        assert_eq!(prompt_split_amount(50.0, &mut console), None);

        let mut console = ScriptedConsole::new(&["50.002"]);
        assert_eq!(prompt_split_amount(50.0, &mut console), None);

        // Within the overshoot tolerance.
        let mut console = ScriptedConsole::new(&["50.0005"]);
        assert_eq!(prompt_split_amount(50.0, &mut console), Some(50.0005));
    }

    #[test]
    fn test_negative_amount_keeps_sign_on_parts() {
        let (_dir, ledger, mut classifier) = fixtures();
        let mut console = ScriptedConsole::new(&["y", "25", "", "1", "0"]);
        split_transaction(&raw(-25.0), &ledger, &mut classifier, &mut console).unwrap();
        let rows = ledger.read_all().unwrap();
        assert_eq!(rows[0].amount, -25.0);
        assert_eq!(rows[1].amount, -25.0);
    }

    #[test]
    fn test_split_existing_returns_marker_and_parts() {
        let (_dir, _ledger, mut classifier) = fixtures();
        let original = Transaction {
            date: NaiveDate::from_ymd_opt(2023, 3, 10).unwrap(),
            description: "COSTCO #55".to_string(),
            amount: 80.0,
            currency: "CAD".to_string(),
            category: "Groceries".to_string(),
            subcategory: String::new(),
            tag: "bulk".to_string(),
            merchant: String::new(),
        };
        let mut console = ScriptedConsole::new(&["y", "80", "", "2", "0"]);
        let (marker, parts) = split_existing(&original, &mut classifier, &mut console);
        assert_eq!(marker.category, SPLIT_CATEGORY);
        assert_eq!(marker.tag, "bulk");
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].category, "Household");
        assert_eq!(parts[0].amount, 80.0);
    }
}
