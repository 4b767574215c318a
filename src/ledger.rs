use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use log::{error, warn};

use crate::dates::{format_storage_date, parse_storage_date};
use crate::error::Result;
use crate::models::{IdentityKey, Transaction};

/// Fixed ledger CSV columns, in storage order.
pub const LEDGER_COLUMNS: [&str; 8] = [
    "Transaction Date",
    "Description",
    "Amount",
    "Currency",
    "Category",
    "Subcategory",
    "Tag",
    "Merchant",
];

/// Append/read/rewrite access to the ledger CSV, the durable source of truth.
/// Every append is an independent operation; there are no multi-row
/// transactions. Rewrites go through a temp file plus rename so a crash
/// mid-rewrite cannot lose the original.
pub struct LedgerStore {
    path: PathBuf,
}

impl LedgerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the ledger file with a header row if it does not exist yet.
    pub fn ensure_exists(&self) -> Result<()> {
        if self.path.exists() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut writer = csv::Writer::from_path(&self.path)?;
        writer.write_record(LEDGER_COLUMNS)?;
        writer.flush()?;
        Ok(())
    }

    /// Append one transaction, writing the header first when the file is new
    /// or empty.
    pub fn append(&self, transaction: &Transaction) -> Result<()> {
        let needs_header =
            !self.path.exists() || fs::metadata(&self.path).map(|m| m.len() == 0).unwrap_or(true);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if needs_header {
            writer.write_record(LEDGER_COLUMNS)?;
        }
        writer.write_record(to_record(transaction))?;
        writer.flush()?;
        Ok(())
    }

    /// Read every transaction. Malformed rows are logged with their line
    /// number and skipped; they never abort the read.
    pub fn read_all(&self) -> Result<Vec<Transaction>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(&self.path)?;
        let headers = reader.headers()?.clone();
        if headers.iter().collect::<HashSet<_>>() != LEDGER_COLUMNS.iter().copied().collect() {
            warn!(
                "unexpected header in {}: {:?}",
                self.path.display(),
                headers
            );
        }
        let index_of = |name: &str| headers.iter().position(|h| h == name);
        let columns: Option<Vec<usize>> = LEDGER_COLUMNS.iter().map(|c| index_of(c)).collect();

        let mut transactions = Vec::new();
        for (i, record) in reader.records().enumerate() {
            let line = i + 2;
            let record = match record {
                Ok(record) => record,
                Err(e) => {
                    error!("{}: unreadable row at line {line}: {e}", self.path.display());
                    continue;
                }
            };
            let Some(columns) = &columns else {
                error!("{}: line {line} skipped, header is missing required columns", self.path.display());
                continue;
            };
            match from_record(&record, columns) {
                Ok(transaction) => transactions.push(transaction),
                Err(e) => {
                    error!("{}: skipping row at line {line}: {e}", self.path.display());
                }
            }
        }
        Ok(transactions)
    }

    /// Replace the whole ledger. Used by edit flows; a single record changes
    /// in memory and the entire file is rewritten atomically.
    pub fn rewrite_all(&self, transactions: &[Transaction]) -> Result<()> {
        let tmp = self.path.with_extension("csv.tmp");
        {
            let mut writer = csv::Writer::from_path(&tmp)?;
            writer.write_record(LEDGER_COLUMNS)?;
            for transaction in transactions {
                writer.write_record(to_record(transaction))?;
            }
            writer.flush()?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Identity keys of every stored transaction, for seeding dedup before a
    /// batch import.
    pub fn known_identities(&self) -> Result<HashSet<IdentityKey>> {
        Ok(self.read_all()?.iter().map(Transaction::identity).collect())
    }
}

fn to_record(t: &Transaction) -> [String; 8] {
    [
        format_storage_date(t.date),
        t.description.clone(),
        format!("{:.2}", t.amount),
        t.currency.clone(),
        t.category.clone(),
        t.subcategory.clone(),
        t.tag.clone(),
        t.merchant.clone(),
    ]
}

fn from_record(record: &csv::StringRecord, columns: &[usize]) -> Result<Transaction> {
    let field = |slot: usize| record.get(columns[slot]).unwrap_or("").to_string();
    let date = parse_storage_date(&field(0))?;
    let amount = field(2)
        .parse::<f64>()
        .map_err(|_| crate::error::TallyError::AmountParse(field(2)))?;
    Ok(Transaction {
        date,
        description: field(1),
        amount,
        currency: field(3),
        category: field(4),
        subcategory: field(5),
        tag: field(6),
        merchant: field(7),
    })
}
