use crate::classifier::Classifier;
use crate::console::Console;
use crate::error::Result;
use crate::fmt::money_in;
use crate::ledger::LedgerStore;
use crate::models::Transaction;
use crate::reports::{group_by_month, month_label};
use crate::settings::load_config;
use crate::splitter::split_existing;

pub fn run(console: &mut dyn Console) -> Result<()> {
    let config = load_config()?;
    let ledger = LedgerStore::new(config.ledger_path());
    let mut classifier = Classifier::load(config.categories_path(), config.mappings_path())?;

    let mut transactions = ledger.read_all()?;
    if edit_transactions(&mut transactions, &mut classifier, console) {
        ledger.rewrite_all(&transactions)?;
        console.message("Saved.");
    }
    Ok(())
}

/// Walk the month/transaction pickers and apply one edit in memory. Returns
/// true when something changed and the ledger needs rewriting.
fn edit_transactions(
    transactions: &mut Vec<Transaction>,
    classifier: &mut Classifier,
    console: &mut dyn Console,
) -> bool {
    let Some(index) = pick_transaction(transactions, console) else {
        return false;
    };

    let current = transactions[index].clone();
    console.message(&format!(
        "\nEditing: {}  {}  {}  [{} / {}]",
        current.date.format("%Y-%m-%d"),
        current.description,
        money_in(current.amount, &current.currency),
        current.category,
        if current.subcategory.is_empty() {
            "-"
        } else {
            &current.subcategory
        }
    ));
    console.menu_item(1, "Change category");
    console.menu_item(2, "Set tag");
    console.menu_item(3, "Set merchant");
    console.menu_item(4, "Split into parts");
    console.menu_item(5, "Cancel");

    loop {
        match console.prompt("\nChoose an option: ").as_str() {
            "1" => {
                let (category, subcategory) =
                    classifier.prompt_for_category(&current.description, console);
                transactions[index].category = category;
                transactions[index].subcategory = subcategory;
                return true;
            }
            "2" => {
                transactions[index].tag = console.prompt("Tag (empty to clear): ");
                return true;
            }
            "3" => {
                transactions[index].merchant = console.prompt("Merchant (empty to clear): ");
                return true;
            }
            "4" => {
                let (marker, parts) = split_existing(&current, classifier, console);
                transactions[index] = marker;
                transactions.extend(parts);
                return true;
            }
            "5" => return false,
            _ => console.warn("Please choose 1-5."),
        }
    }
}

/// Month picker followed by a transaction picker; None when the ledger is
/// empty or the user backs out. Unlike reports, the editor lists every
/// stored entry, reserved categories included, so an IGNORED transaction can
/// be reclassified.
fn pick_transaction(
    transactions: &[Transaction],
    console: &mut dyn Console,
) -> Option<usize> {
    if transactions.is_empty() {
        console.message("No transactions recorded yet.");
        return None;
    }
    let all: Vec<&Transaction> = transactions.iter().collect();
    let months = group_by_month(&all);
    let keys: Vec<(i32, u32)> = months.keys().copied().collect();

    console.message("\nSelect a month:");
    for (i, (year, month)) in keys.iter().enumerate() {
        console.menu_item(i + 1, &month_label(*year, *month));
    }
    let choice = console.prompt("\nEnter month number: ").parse::<usize>().ok()?;
    let key = keys.get(choice.checked_sub(1)?)?;

    let month_transactions = &months[key];
    console.message(&format!("\nTransactions in {}:", month_label(key.0, key.1)));
    for (i, t) in month_transactions.iter().enumerate() {
        console.menu_item(
            i + 1,
            &format!(
                "{}  {}  {}  [{}]",
                t.date.format("%d"),
                t.description,
                money_in(t.amount, &t.currency),
                t.category
            ),
        );
    }
    let choice = console
        .prompt("\nEnter transaction number: ")
        .parse::<usize>()
        .ok()?;
    let selected = *month_transactions.get(choice.checked_sub(1)?)?;

    // Map the borrowed pick back to its index in the full list.
    transactions
        .iter()
        .position(|t| std::ptr::eq(t, selected))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::console::testing::ScriptedConsole;
    use crate::models::SPLIT_CATEGORY;

    fn txn(day: u32, description: &str) -> Transaction {
        Transaction {
            date: NaiveDate::from_ymd_opt(2023, 3, day).unwrap(),
            description: description.to_string(),
            amount: 50.0,
            currency: "CAD".to_string(),
            category: "Groceries".to_string(),
            subcategory: String::new(),
            tag: String::new(),
            merchant: String::new(),
        }
    }

    fn classifier() -> (tempfile::TempDir, Classifier) {
        let dir = tempfile::tempdir().unwrap();
        let mut classifier = Classifier::load(
            dir.path().join("categories.json"),
            dir.path().join("mappings.json"),
        )
        .unwrap();
        classifier.add_category("Dining").unwrap();
        classifier.add_category("Groceries").unwrap();
        (dir, classifier)
    }

    #[test]
    fn test_change_category() {
        let (_dir, mut classifier) = classifier();
        let mut transactions = vec![txn(10, "A"), txn(12, "B")];
        // Month 1, transaction 2, option 1, category 1 (Dining), no subcategory.
        let mut console = ScriptedConsole::new(&["1", "2", "1", "1", "0"]);
        assert!(edit_transactions(
            &mut transactions,
            &mut classifier,
            &mut console
        ));
        assert_eq!(transactions[1].category, "Dining");
        assert_eq!(transactions[0].category, "Groceries");
    }

    #[test]
    fn test_set_tag() {
        let (_dir, mut classifier) = classifier();
        let mut transactions = vec![txn(10, "A")];
        let mut console = ScriptedConsole::new(&["1", "1", "2", "vacation"]);
        assert!(edit_transactions(
            &mut transactions,
            &mut classifier,
            &mut console
        ));
        assert_eq!(transactions[0].tag, "vacation");
    }

    #[test]
    fn test_cancel_changes_nothing() {
        let (_dir, mut classifier) = classifier();
        let mut transactions = vec![txn(10, "A")];
        let mut console = ScriptedConsole::new(&["1", "1", "5"]);
        assert!(!edit_transactions(
            &mut transactions,
            &mut classifier,
            &mut console
        ));
        assert_eq!(transactions[0], txn(10, "A"));
    }

    #[test]
    fn test_split_replaces_original_with_marker_and_parts() {
        let (_dir, mut classifier) = classifier();
        let mut transactions = vec![txn(10, "COSTCO")];
        // Pick it, option 4, one 50.00 part as Dining.
        let mut console = ScriptedConsole::new(&["1", "1", "4", "y", "50", "", "1", "0"]);
        assert!(edit_transactions(
            &mut transactions,
            &mut classifier,
            &mut console
        ));
        assert_eq!(transactions.len(), 2);
        assert_eq!(transactions[0].category, SPLIT_CATEGORY);
        assert_eq!(transactions[1].category, "Dining");
    }

    #[test]
    fn test_ignored_transaction_can_be_recategorized() {
        let (_dir, mut classifier) = classifier();
        let mut ignored = txn(10, "PAYROLL");
        ignored.category = crate::models::IGNORED_CATEGORY.to_string();
        let mut transactions = vec![ignored];
        // It must show up in the picker despite being reserved.
        let mut console = ScriptedConsole::new(&["1", "1", "1", "2", "0"]);
        assert!(edit_transactions(
            &mut transactions,
            &mut classifier,
            &mut console
        ));
        assert_eq!(transactions[0].category, "Groceries");
    }

    #[test]
    fn test_empty_ledger_backs_out() {
        let (_dir, mut classifier) = classifier();
        let mut transactions = Vec::new();
        let mut console = ScriptedConsole::new(&[]);
        assert!(!edit_transactions(
            &mut transactions,
            &mut classifier,
            &mut console
        ));
        assert!(console.output_contains("No transactions"));
    }
}
