//! Load and save paths shared by the record editor forms.

use super::StageContext;
use crate::outcome::{Outcome, StageName};
use keeper_client_sdk::TransferError;
use keeper_protocol::{Record, RecordType};
use tracing::{info, warn};

pub const SAVE_LABEL: &str = "Сохранить";
pub const BACK_BUTTON: &str = "Назад";
pub const FOOTER: &str = "[ Ctrl+s ] - Сохранить\n[ Ctrl+b ] - Назад\n";

/// Fetches and decrypts the record being edited.
///
/// `Ok(None)` when creating a new record or when the record could not be
/// fetched; that failure is only logged. A decrypt failure becomes an error
/// notice so corrupt plaintext never reaches the form.
pub async fn load(ctx: &StageContext<'_>, kind: RecordType) -> Result<Option<Record>, Outcome> {
    let session = ctx.session;
    if session.record_id.is_empty() {
        return Ok(None);
    }

    match ctx
        .services
        .transfer()
        .fetch(&session.token, &session.user_id, &session.record_id)
        .await
    {
        Ok(record) if record.record_type == kind => Ok(Some(record)),
        Ok(record) => {
            warn!(id = %record.id, expected = %kind, got = %record.record_type, "record type mismatch");
            Ok(None)
        }
        Err(TransferError::Crypto(e)) => {
            warn!(id = %session.record_id, "failed to decrypt record: {e}");
            Err(Outcome::error(
                format!("Не удалось расшифровать запись. {}", e.user_message()),
                StageName::RecordList,
            ))
        }
        Err(e) => {
            warn!(id = %session.record_id, "failed to load record: {e}");
            Ok(None)
        }
    }
}

/// Record metadata for a save. Body is attached by the transfer.
pub fn template(kind: RecordType, id: &str, name: &str, description: &str) -> Record {
    let mut record = Record::new(kind);
    record.id = id.to_string();
    record.name = name.as_bytes().to_vec();
    record.description = description.as_bytes().to_vec();
    record
}

/// Encrypts and uploads `plaintext`. Success returns to the list; failure
/// shows the server message and comes back to `from`.
pub async fn save(ctx: &StageContext<'_>, from: StageName, record: &Record, plaintext: &[u8]) -> Outcome {
    let session = ctx.session;
    match ctx
        .services
        .transfer()
        .upsert(&session.token, &session.user_id, record, plaintext)
        .await
    {
        Ok(stored) => {
            info!(id = %stored.id, kind = %stored.record_type, "record saved");
            Outcome::SwitchStage(StageName::RecordList)
        }
        Err(e) => {
            warn!(kind = %record.record_type, "save failed: {e}");
            Outcome::info(e.user_message(), from, BACK_BUTTON)
        }
    }
}
