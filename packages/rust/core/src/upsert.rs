//! Per-record create-or-update with a single conflict retry.
//!
//! The remote service rejects an upsert with HTTP 400 when the record's phone
//! number is already stored as the `SMS` attribute of a different contact.
//! The executor then sends the same payload once more without `SMS`. A
//! conflict on that second request is a plain failure. When dropping `SMS`
//! leaves no attributes, there is nothing left to change and the second
//! request is not sent at all.

use tracing::{debug, info, instrument, warn};

use contactsync_remote::{BrevoClient, RawResponse, UpsertPayload};
use contactsync_shared::{ContactSyncError, RecordAction, Result, SourceRecord, UpsertResolution};

use crate::attributes::{ContactAttribute, map_attributes};
use crate::index::ExistingContactIndex;

/// Body fragment identifying the duplicate-SMS rejection.
pub const SMS_CONFLICT_MESSAGE: &str = "SMS is already associated with another Contact";

/// A successful upsert, classified against the run-start snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpsertSuccess {
    pub action: RecordAction,
    pub resolution: UpsertResolution,
}

/// Which of the (at most two) requests produced a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    First,
    WithoutConflictingAttribute,
}

/// Whether a response is the duplicate-SMS rejection.
pub fn is_sms_conflict(response: &RawResponse) -> bool {
    response.status == 400 && response.body.contains(SMS_CONFLICT_MESSAGE)
}

/// Turn a response into success, a conflict, or a remote error.
fn settle(response: RawResponse, attempt: Attempt) -> Result<()> {
    debug!(?attempt, status = response.status, body = %response.body, "upsert response");

    if is_sms_conflict(&response) {
        return Err(ContactSyncError::Conflict {
            attribute: ContactAttribute::Sms.as_str().to_string(),
            body: response.body,
        });
    }
    if !response.is_success() {
        return Err(ContactSyncError::remote(response.status, response.body));
    }
    Ok(())
}

/// Create or update `email` in the remote service and link it to `list_ids`.
///
/// [`ContactSyncError::Conflict`] never escapes: a conflict on the retry is
/// reported as the remote 400 it was.
#[instrument(skip_all, fields(email = %email))]
pub async fn execute_upsert(
    client: &BrevoClient,
    email: &str,
    existing: &ExistingContactIndex,
    list_ids: &[i64],
    record: Option<&SourceRecord>,
) -> Result<UpsertSuccess> {
    let action = existing.classify(email);
    if action == RecordAction::Updated {
        debug!("contact already exists; updating with new data");
    }

    let payload = UpsertPayload::new(email, map_attributes(record), list_ids.to_vec());

    // Attempted
    let first = client.upsert_contact(&payload).await?;
    let conflicting = match settle(first, Attempt::First) {
        Ok(()) => {
            info!(?action, "contact upserted");
            return Ok(UpsertSuccess {
                action,
                resolution: UpsertResolution::Applied,
            });
        }
        Err(ContactSyncError::Conflict { attribute, .. }) => attribute,
        Err(e) => return Err(e),
    };

    // ConflictDetected
    warn!(
        attribute = %conflicting,
        "unique attribute owned by another contact; retrying without it"
    );
    let stripped = payload.without_attribute(&conflicting);
    if stripped.attributes.is_empty() {
        info!(?action, "no attributes left after dropping conflict; nothing to send");
        return Ok(UpsertSuccess {
            action,
            resolution: UpsertResolution::NoOp,
        });
    }

    // RetriedOnce
    let retry = client.upsert_contact(&stripped).await?;
    match settle(retry, Attempt::WithoutConflictingAttribute) {
        Ok(()) => {
            info!(?action, "contact upserted without conflicting attribute");
            Ok(UpsertSuccess {
                action,
                resolution: UpsertResolution::AppliedWithoutConflictingAttribute,
            })
        }
        Err(ContactSyncError::Conflict { body, .. }) => Err(ContactSyncError::remote(400, body)),
        Err(e) => Err(e),
    }
}
