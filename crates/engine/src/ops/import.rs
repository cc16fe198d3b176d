//! CSV import: streaming parse, normalization, batch insert.

use std::path::Path;

use sea_orm::{ActiveValue, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::import::{ImportOutcome, RawRow, normalize};
use crate::{EngineError, ResultEngine, expenses};

use super::{Engine, with_tx};

impl Engine {
    /// Imports a delimited file into one wallet as the acting user.
    ///
    /// Every admitted row is stamped with the caller's id and the request's
    /// wallet id; file content is never trusted for either. Admitted rows
    /// are persisted in a single batch write, so a storage failure fails the
    /// whole import. Returns the normalization outcome (`admitted.len()` is
    /// the `inserted` count reported to the caller).
    pub async fn import_expenses(
        &self,
        path: &Path,
        wallet_id: &str,
        user_id: &str,
    ) -> ResultEngine<ImportOutcome> {
        let rows = read_rows(path)?;
        let outcome = normalize(rows);

        with_tx!(self, |db_tx| {
            self.require_wallet_access(&db_tx, wallet_id, user_id)
                .await?;

            if !outcome.admitted.is_empty() {
                let models = outcome.admitted.iter().map(|row| expenses::ActiveModel {
                    id: ActiveValue::Set(Uuid::new_v4().to_string()),
                    user_id: ActiveValue::Set(user_id.to_string()),
                    wallet_id: ActiveValue::Set(wallet_id.to_string()),
                    item: ActiveValue::Set(row.item.clone()),
                    price: ActiveValue::Set(row.price),
                    store: ActiveValue::Set(row.store.clone()),
                    date: ActiveValue::Set(row.date),
                    category: ActiveValue::Set(row.category.clone()),
                    kind: ActiveValue::Set(row.kind.as_str().to_string()),
                });
                expenses::Entity::insert_many(models).exec(&db_tx).await?;
            }

            Ok::<(), EngineError>(())
        })?;

        tracing::info!(
            wallet_id,
            inserted = outcome.admitted.len(),
            rejected = outcome.rejected.len(),
            "csv import finished"
        );
        Ok(outcome)
    }
}

/// Streams a CSV file into string-keyed rows.
///
/// Ragged rows are tolerated (export tools disagree about trailing
/// columns); a malformed file surfaces as an `InvalidField` whose message
/// reaches the caller.
fn read_rows(path: &Path) -> ResultEngine<Vec<RawRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(csv_error)?;

    let headers = reader.headers().map_err(csv_error)?.clone();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_error)?;
        let row = RawRow::from_pairs(
            headers
                .iter()
                .zip(record.iter())
                .collect::<Vec<(&str, &str)>>(),
        );
        rows.push(row);
    }
    Ok(rows)
}

fn csv_error(err: csv::Error) -> EngineError {
    EngineError::InvalidField(format!("csv parse error: {err}"))
}
