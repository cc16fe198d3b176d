//! CSV upload endpoint.

use std::io::Write;

use api_types::import::{ImportResult, RejectedRowView};
use axum::{
    Extension,
    Json,
    extract::{Multipart, State},
};
use tempfile::NamedTempFile;

use crate::{ServerError, server::ServerState};
use engine::Caller;

/// `POST /upload`: multipart form with a `file` part (the CSV) and a
/// `wallet_id` part naming the destination wallet.
///
/// The body is spooled to a temp file so the engine can stream it; rows are
/// admitted or rejected one by one and the split is reported back.
pub async fn upload(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    mut multipart: Multipart,
) -> Result<Json<ImportResult>, ServerError> {
    let mut file: Option<NamedTempFile> = None;
    let mut wallet_id: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ServerError::Generic(format!("malformed multipart body: {err}")))?
    {
        match field.name() {
            Some("file") => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|err| ServerError::Generic(format!("failed to read file: {err}")))?;
                let mut tmp = NamedTempFile::new()
                    .map_err(|err| ServerError::Generic(format!("failed to spool file: {err}")))?;
                tmp.write_all(&bytes)
                    .map_err(|err| ServerError::Generic(format!("failed to spool file: {err}")))?;
                file = Some(tmp);
            }
            Some("wallet_id") => {
                let value = field.text().await.map_err(|err| {
                    ServerError::Generic(format!("failed to read wallet_id: {err}"))
                })?;
                wallet_id = Some(value);
            }
            _ => {}
        }
    }

    let file = file.ok_or_else(|| ServerError::Generic("missing file".to_string()))?;
    let wallet_id = wallet_id.ok_or_else(|| ServerError::Generic("missing wallet_id".to_string()))?;

    let outcome = state
        .engine
        .import_expenses(file.path(), &wallet_id, &caller.id)
        .await?;

    let rejected = outcome
        .rejected
        .iter()
        .map(|row| RejectedRowView {
            line: row.line,
            reason: row.reason.as_str().to_string(),
        })
        .collect();

    Ok(Json(ImportResult {
        success: true,
        inserted: outcome.admitted.len(),
        rejected,
    }))
}
