use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};

use crate::models::Transaction;

/// Per-category totals for one month, broken out by currency and by
/// subcategory. BTreeMaps keep the rendering order stable.
#[derive(Debug, Default, PartialEq)]
pub struct CategoryTotals {
    pub by_currency: BTreeMap<String, f64>,
    pub subcategories: BTreeMap<String, BTreeMap<String, f64>>,
}

/// Only classified, non-reserved entries count toward any report.
pub fn reportable(transactions: &[Transaction]) -> Vec<&Transaction> {
    transactions.iter().filter(|t| t.is_reportable()).collect()
}

pub fn group_by_month<'a>(
    transactions: &[&'a Transaction],
) -> BTreeMap<(i32, u32), Vec<&'a Transaction>> {
    let mut months: BTreeMap<(i32, u32), Vec<&Transaction>> = BTreeMap::new();
    for transaction in transactions {
        months
            .entry((transaction.date.year(), transaction.date.month()))
            .or_default()
            .push(transaction);
    }
    months
}

pub fn group_by_category(transactions: &[&Transaction]) -> BTreeMap<String, CategoryTotals> {
    let mut categories: BTreeMap<String, CategoryTotals> = BTreeMap::new();
    for transaction in transactions {
        let totals = categories.entry(transaction.category.clone()).or_default();
        *totals
            .by_currency
            .entry(transaction.currency.clone())
            .or_insert(0.0) += transaction.amount;
        if !transaction.subcategory.is_empty() {
            *totals
                .subcategories
                .entry(transaction.subcategory.clone())
                .or_default()
                .entry(transaction.currency.clone())
                .or_insert(0.0) += transaction.amount;
        }
    }
    categories
}

/// Months with at least one reportable transaction, ascending.
pub fn available_months(transactions: &[Transaction]) -> Vec<(i32, u32)> {
    group_by_month(&reportable(transactions)).into_keys().collect()
}

pub fn available_categories(transactions: &[Transaction]) -> Vec<String> {
    group_by_category(&reportable(transactions))
        .into_keys()
        .collect()
}

pub fn available_tags(transactions: &[Transaction]) -> Vec<String> {
    let mut tags: Vec<String> = reportable(transactions)
        .iter()
        .filter(|t| !t.tag.is_empty())
        .map(|t| t.tag.clone())
        .collect();
    tags.sort();
    tags.dedup();
    tags
}

/// "March 2023" style label for a (year, month) key.
pub fn month_label(year: i32, month: u32) -> String {
    match NaiveDate::from_ymd_opt(year, month, 1) {
        Some(date) => date.format("%B %Y").to_string(),
        None => format!("{year}-{month:02}"),
    }
}

/// Percent change from `previous` to `current`. None when there is no
/// meaningful baseline.
pub fn percent_change(current: f64, previous: f64) -> Option<f64> {
    if previous.abs() < f64::EPSILON {
        return None;
    }
    Some((current - previous) / previous.abs() * 100.0)
}

/// Yearly totals for one category across the whole ledger, keyed by
/// (year, currency).
pub fn yearly_totals_for_category(
    transactions: &[Transaction],
    category: &str,
) -> BTreeMap<(i32, String), f64> {
    let mut totals: BTreeMap<(i32, String), f64> = BTreeMap::new();
    for transaction in reportable(transactions) {
        if transaction.category != category {
            continue;
        }
        *totals
            .entry((transaction.date.year(), transaction.currency.clone()))
            .or_insert(0.0) += transaction.amount;
    }
    totals
}

/// Transactions carrying the given tag, oldest first.
pub fn transactions_with_tag<'a>(
    transactions: &'a [Transaction],
    tag: &str,
) -> Vec<&'a Transaction> {
    let mut tagged: Vec<&Transaction> = reportable(transactions)
        .into_iter()
        .filter(|t| t.tag == tag)
        .collect();
    tagged.sort_by_key(|t| t.date);
    tagged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{IGNORED_CATEGORY, SPLIT_CATEGORY};

    fn txn(date: (i32, u32, u32), category: &str, amount: f64) -> Transaction {
        Transaction {
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            description: "X".to_string(),
            amount,
            currency: "CAD".to_string(),
            category: category.to_string(),
            subcategory: String::new(),
            tag: String::new(),
            merchant: String::new(),
        }
    }

    #[test]
    fn test_reserved_categories_excluded_from_reports() {
        let transactions = vec![
            txn((2023, 1, 10), "Groceries", 50.0),
            txn((2023, 1, 11), IGNORED_CATEGORY, 2000.0),
            txn((2023, 1, 12), SPLIT_CATEGORY, 100.0),
        ];
        assert_eq!(reportable(&transactions).len(), 1);
        assert_eq!(available_categories(&transactions), vec!["Groceries"]);
    }

    #[test]
    fn test_group_by_month_orders_keys() {
        let transactions = vec![
            txn((2023, 3, 1), "A", 1.0),
            txn((2022, 12, 31), "A", 2.0),
            txn((2023, 3, 15), "A", 3.0),
        ];
        let months = group_by_month(&reportable(&transactions));
        let keys: Vec<(i32, u32)> = months.keys().copied().collect();
        assert_eq!(keys, vec![(2022, 12), (2023, 3)]);
        assert_eq!(months[&(2023, 3)].len(), 2);
    }

    #[test]
    fn test_category_totals_split_by_currency_and_subcategory() {
        let mut groceries_usd = txn((2023, 1, 5), "Groceries", 20.0);
        groceries_usd.currency = "USD".to_string();
        let mut produce = txn((2023, 1, 6), "Groceries", 30.0);
        produce.subcategory = "Produce".to_string();
        let transactions = vec![txn((2023, 1, 4), "Groceries", 50.0), groceries_usd, produce];

        let categories = group_by_category(&reportable(&transactions));
        let totals = &categories["Groceries"];
        assert_eq!(totals.by_currency["CAD"], 80.0);
        assert_eq!(totals.by_currency["USD"], 20.0);
        assert_eq!(totals.subcategories["Produce"]["CAD"], 30.0);
    }

    #[test]
    fn test_refunds_net_against_expenses() {
        let transactions = vec![
            txn((2023, 1, 4), "Shopping", 100.0),
            txn((2023, 1, 9), "Shopping", -40.0),
        ];
        let categories = group_by_category(&reportable(&transactions));
        assert_eq!(categories["Shopping"].by_currency["CAD"], 60.0);
    }

    #[test]
    fn test_percent_change() {
        assert_eq!(percent_change(150.0, 100.0), Some(50.0));
        assert_eq!(percent_change(50.0, 100.0), Some(-50.0));
        assert_eq!(percent_change(10.0, 0.0), None);
    }

    #[test]
    fn test_month_label() {
        assert_eq!(month_label(2023, 3), "March 2023");
    }

    #[test]
    fn test_yearly_totals_for_category() {
        let transactions = vec![
            txn((2022, 6, 1), "Rent", 1500.0),
            txn((2022, 7, 1), "Rent", 1500.0),
            txn((2023, 1, 1), "Rent", 1600.0),
            txn((2023, 1, 2), "Groceries", 50.0),
        ];
        let totals = yearly_totals_for_category(&transactions, "Rent");
        assert_eq!(totals[&(2022, "CAD".to_string())], 3000.0);
        assert_eq!(totals[&(2023, "CAD".to_string())], 1600.0);
        assert_eq!(totals.len(), 2);
    }

    #[test]
    fn test_tags() {
        let mut a = txn((2023, 2, 1), "Travel", 300.0);
        a.tag = "vacation".to_string();
        let mut b = txn((2023, 1, 1), "Dining", 80.0);
        b.tag = "vacation".to_string();
        let transactions = vec![a, b, txn((2023, 1, 5), "Rent", 1500.0)];

        assert_eq!(available_tags(&transactions), vec!["vacation"]);
        let tagged = transactions_with_tag(&transactions, "vacation");
        assert_eq!(tagged.len(), 2);
        assert!(tagged[0].date < tagged[1].date);
    }
}
