use std::collections::HashMap;

use log::warn;

use crate::dates::parse_input_date;
use crate::error::{Result, TallyError};
use crate::models::RawTransaction;
use crate::settings::{DescriptionColumns, ImportSchema};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Strip currency symbols, thousands separators and surrounding whitespace.
pub fn clean_amount(raw: &str) -> String {
    raw.replace('$', "").replace(',', "").trim().to_string()
}

fn resolve_description(row: &HashMap<String, String>, columns: &DescriptionColumns) -> String {
    match columns {
        DescriptionColumns::Single(column) => row
            .get(column)
            .map(|value| value.trim().to_string())
            .unwrap_or_default(),
        DescriptionColumns::Joined(names) => names
            .iter()
            .filter_map(|column| row.get(column))
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
            .collect::<Vec<_>>()
            .join(" "),
    }
}

/// Resolve (currency, amount) by trying each configured currency column in
/// priority order; the first non-zero parseable value wins. Falls back to the
/// default currency at 0.0 when nothing matches. In single-column mode a
/// non-numeric value is a hard row error instead of a fallthrough.
fn resolve_amount(row: &HashMap<String, String>, schema: &ImportSchema) -> Result<(String, f64)> {
    let lookup = schema.amount_lookup();
    let single_column = lookup.len() == 1;

    for (currency, column) in &lookup {
        let raw = row.get(column).map(String::as_str).unwrap_or("");
        let cleaned = clean_amount(raw);
        if cleaned.is_empty() {
            continue;
        }
        match cleaned.parse::<f64>() {
            Ok(value) if value != 0.0 => return Ok((currency.clone(), value)),
            Ok(_) => continue,
            Err(_) if single_column => {
                return Err(TallyError::AmountParse(raw.trim().to_string()));
            }
            Err(_) => {
                warn!(
                    "could not parse amount '{}' in column '{column}'; trying next currency",
                    raw.trim()
                );
            }
        }
    }

    Ok((schema.default_currency.clone(), 0.0))
}

// ---------------------------------------------------------------------------
// Row parser
// ---------------------------------------------------------------------------

/// Map one imported CSV row onto a `RawTransaction` using the configured
/// schema. All failures are row-scoped; the caller skips the row and
/// continues the batch.
pub fn parse_row(row: &HashMap<String, String>, schema: &ImportSchema) -> Result<RawTransaction> {
    let raw_date = row
        .get(&schema.date_column)
        .ok_or_else(|| TallyError::MissingColumn(schema.date_column.clone()))?;
    let date = parse_input_date(raw_date)?;

    let description = resolve_description(row, &schema.description_column);

    let (currency, mut amount) = resolve_amount(row, schema)?;
    // Internal convention is positive = expense; sources that encode expenses
    // as negative get flipped.
    if !schema.expenses_are_positive {
        amount = -amount;
    }

    Ok(RawTransaction {
        date,
        description,
        amount,
        currency,
        source_row: row.clone(),
    })
}
