use std::collections::HashMap;

use chrono::NaiveDate;

/// Excluded from all reporting but retained in storage; dedup still applies.
pub const IGNORED_CATEGORY: &str = "IGNORED";
/// Marks an original transaction that has been decomposed into split parts.
pub const SPLIT_CATEGORY: &str = "SPLIT";

pub const RESERVED_CATEGORIES: [&str; 2] = [IGNORED_CATEGORY, SPLIT_CATEGORY];

pub fn is_reserved_category(name: &str) -> bool {
    RESERVED_CATEGORIES.contains(&name)
}

/// Duplicate-detection key: day-precision date, normalized description, and
/// the absolute amount in cents. Sign and currency are deliberately excluded
/// so the same charge imported under a different sign convention or currency
/// column is still recognized. Known limitation: a genuine refund (negative
/// of an existing expense) is treated as a duplicate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityKey {
    date: NaiveDate,
    description: String,
    amount_cents: i64,
}

impl IdentityKey {
    pub fn new(date: NaiveDate, description: &str, amount: f64) -> Self {
        Self {
            date,
            description: description.trim().to_lowercase(),
            amount_cents: (amount.abs() * 100.0).round() as i64,
        }
    }
}

/// A transaction parsed from an external CSV row, before classification.
/// Exists only for the duration of one import batch.
#[derive(Debug, Clone)]
pub struct RawTransaction {
    pub date: NaiveDate,
    pub description: String,
    /// Signed, positive = expense (internal convention).
    pub amount: f64,
    pub currency: String,
    /// Original row values, kept for the "show full details" view.
    pub source_row: HashMap<String, String>,
}

impl RawTransaction {
    pub fn identity(&self) -> IdentityKey {
        IdentityKey::new(self.date, &self.description, self.amount)
    }
}

/// A classified ledger entry, the unit of persistence.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub date: NaiveDate,
    pub description: String,
    /// Signed, positive = expense.
    pub amount: f64,
    pub currency: String,
    pub category: String,
    pub subcategory: String,
    pub tag: String,
    pub merchant: String,
}

impl Transaction {
    pub fn from_raw(raw: &RawTransaction, category: &str, subcategory: &str) -> Self {
        Self {
            date: raw.date,
            description: raw.description.clone(),
            amount: raw.amount,
            currency: raw.currency.clone(),
            category: category.to_string(),
            subcategory: subcategory.to_string(),
            tag: String::new(),
            merchant: String::new(),
        }
    }

    pub fn identity(&self) -> IdentityKey {
        IdentityKey::new(self.date, &self.description, self.amount)
    }

    /// Reserved categories are stored but never aggregated into reports.
    pub fn is_reportable(&self) -> bool {
        !is_reserved_category(&self.category)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    use super::*;

    fn txn(amount: f64, currency: &str, description: &str) -> Transaction {
        Transaction {
            date: NaiveDate::from_ymd_opt(2023, 1, 15).unwrap(),
            description: description.to_string(),
            amount,
            currency: currency.to_string(),
            category: "Groceries".to_string(),
            subcategory: String::new(),
            tag: String::new(),
            merchant: String::new(),
        }
    }

    fn hash_of(key: &IdentityKey) -> u64 {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_identity_is_reflexive_and_hash_consistent() {
        let t = txn(42.50, "CAD", "METRO #123");
        assert_eq!(t.identity(), t.identity());
        assert_eq!(hash_of(&t.identity()), hash_of(&t.identity()));
    }

    #[test]
    fn test_sign_does_not_affect_identity() {
        let expense = txn(25.50, "CAD", "COFFEE SHOP");
        let refund = txn(-25.50, "CAD", "COFFEE SHOP");
        assert_eq!(expense.identity(), refund.identity());
        assert_eq!(hash_of(&expense.identity()), hash_of(&refund.identity()));
    }

    #[test]
    fn test_currency_does_not_affect_identity() {
        let cad = txn(99.99, "CAD", "AMAZON.CA");
        let usd = txn(99.99, "USD", "AMAZON.CA");
        assert_eq!(cad.identity(), usd.identity());
    }

    #[test]
    fn test_description_is_normalized() {
        let a = txn(10.0, "CAD", "  Netflix ");
        let b = txn(10.0, "CAD", "NETFLIX");
        assert_eq!(a.identity(), b.identity());
    }

    #[test]
    fn test_amount_rounds_to_cents() {
        let a = txn(10.004, "CAD", "X");
        let b = txn(10.0, "CAD", "X");
        let c = txn(10.01, "CAD", "X");
        assert_eq!(a.identity(), b.identity());
        assert_ne!(a.identity(), c.identity());
    }

    #[test]
    fn test_different_dates_differ() {
        let a = txn(10.0, "CAD", "X");
        let mut b = a.clone();
        b.date = NaiveDate::from_ymd_opt(2023, 1, 16).unwrap();
        assert_ne!(a.identity(), b.identity());
    }

    #[test]
    fn test_reserved_categories_are_not_reportable() {
        let mut t = txn(10.0, "CAD", "X");
        assert!(t.is_reportable());
        t.category = IGNORED_CATEGORY.to_string();
        assert!(!t.is_reportable());
        t.category = SPLIT_CATEGORY.to_string();
        assert!(!t.is_reportable());
    }
}
