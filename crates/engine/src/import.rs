//! Row normalization for CSV imports.
//!
//! Uploaded files come from arbitrary export tools with inconsistent
//! headers, so each target field is resolved by trying a prioritized list of
//! case-variant column aliases. A row is admitted iff `item` is non-empty,
//! `price > 0` and `date` parses; everything else is rejected with an
//! explicit reason. Rejections are silent at the HTTP level but the reasons
//! are first-class so callers and tests can assert on them.

use chrono::NaiveDate;
use std::collections::HashMap;

use crate::categories::{self, DEFAULT_CATEGORY};
use crate::expenses::ExpenseKind;

pub const DATE_ALIASES: &[&str] = &["date", "Date", "Purchase Date"];
pub const ITEM_ALIASES: &[&str] = &["item", "Item", "Description", "Product"];
pub const STORE_ALIASES: &[&str] = &["store", "Store", "Shop", "Merchant"];
pub const PRICE_ALIASES: &[&str] = &["price", "Price", "Amount", "Total"];
pub const CATEGORY_ALIASES: &[&str] = &["category", "Category"];
pub const KIND_ALIASES: &[&str] = &["type", "Type", "category_type"];

/// Placeholder used when a row carries no store column.
pub const UNKNOWN_STORE: &str = "Unknown Store";

/// A string-keyed record as parsed from one CSV line.
#[derive(Clone, Debug, Default)]
pub struct RawRow {
    values: HashMap<String, String>,
}

impl RawRow {
    pub fn new(values: HashMap<String, String>) -> Self {
        Self { values }
    }

    /// Builds a row from `(header, value)` pairs. Later duplicate headers
    /// overwrite earlier ones, matching loose CSV parsers.
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    /// Returns the first alias present with a non-empty value.
    ///
    /// Empty cells count as absent so that e.g. an empty `date` column does
    /// not shadow a populated `Purchase Date` one.
    pub fn field(&self, aliases: &[&str]) -> Option<&str> {
        aliases
            .iter()
            .filter_map(|alias| self.values.get(*alias))
            .map(String::as_str)
            .find(|value| !value.trim().is_empty())
    }
}

/// Why a row was excluded from the import.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectReason {
    MissingItem,
    NonPositivePrice,
    MissingDate,
    InvalidDate,
}

impl RejectReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MissingItem => "missing item",
            Self::NonPositivePrice => "price not positive",
            Self::MissingDate => "missing date",
            Self::InvalidDate => "invalid date",
        }
    }
}

/// A normalized, admitted row ready for persistence.
///
/// `user_id` and `wallet_id` are intentionally absent: they are stamped by
/// the import operation from the authenticated request and never trusted
/// from file content.
#[derive(Clone, Debug, PartialEq)]
pub struct ExpenseRow {
    pub item: String,
    pub price: f64,
    pub store: String,
    pub date: NaiveDate,
    pub category: String,
    pub kind: ExpenseKind,
}

/// A rejected row with its 1-based data-row index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RejectedRow {
    pub line: usize,
    pub reason: RejectReason,
}

/// Result of normalizing a whole upload.
#[derive(Clone, Debug, Default)]
pub struct ImportOutcome {
    pub admitted: Vec<ExpenseRow>,
    pub rejected: Vec<RejectedRow>,
}

/// Normalizes a single raw row, applying the admission rule.
///
/// Checks run in the same order as the original admission filter: item,
/// then price, then date, so a row failing several conditions reports the
/// first one.
pub fn normalize_row(row: &RawRow) -> Result<ExpenseRow, RejectReason> {
    let item = row
        .field(ITEM_ALIASES)
        .map(str::trim)
        .unwrap_or_default()
        .to_string();
    if item.is_empty() {
        return Err(RejectReason::MissingItem);
    }

    // Unparsable or missing prices coerce to 0 and then fail the `> 0` check.
    let price = row
        .field(PRICE_ALIASES)
        .and_then(|raw| raw.trim().parse::<f64>().ok())
        .unwrap_or(0.0);
    if price <= 0.0 {
        return Err(RejectReason::NonPositivePrice);
    }

    let raw_date = row.field(DATE_ALIASES).ok_or(RejectReason::MissingDate)?;
    let date = NaiveDate::parse_from_str(raw_date.trim(), "%Y-%m-%d")
        .map_err(|_| RejectReason::InvalidDate)?;

    let store = row
        .field(STORE_ALIASES)
        .map(str::trim)
        .unwrap_or(UNKNOWN_STORE)
        .to_string();

    // Only canonical labels are stored; anything else degrades to the
    // default rather than leaking free-form text into the closed set.
    let category = row
        .field(CATEGORY_ALIASES)
        .map(|raw| raw.trim().to_lowercase())
        .filter(|label| categories::is_known_category(label))
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());

    let kind = match row.field(KIND_ALIASES).map(|raw| raw.trim().to_lowercase()) {
        Some(raw) if raw == "income" => ExpenseKind::Income,
        _ => ExpenseKind::Expense,
    };

    Ok(ExpenseRow {
        item,
        price,
        store,
        date,
        category,
        kind,
    })
}

/// Normalizes a finite sequence of raw rows into admitted and rejected sets.
pub fn normalize<I>(rows: I) -> ImportOutcome
where
    I: IntoIterator<Item = RawRow>,
{
    let mut outcome = ImportOutcome::default();
    for (index, row) in rows.into_iter().enumerate() {
        match normalize_row(&row) {
            Ok(expense) => outcome.admitted.push(expense),
            Err(reason) => outcome.rejected.push(RejectedRow {
                line: index + 1,
                reason,
            }),
        }
    }
    outcome
}
