//! Snapshot of the emails already known to the remote service.
//!
//! The index is built once at the start of a run and only read afterward.
//! It decides whether a successful upsert is reported as added or updated;
//! it never decides whether a record is sent.

use std::collections::HashSet;
use std::time::Duration;

use tracing::{debug, info, instrument};

use contactsync_remote::BrevoClient;
use contactsync_shared::{ContactSyncError, RecordAction, Result};

/// Lower-cased emails of every remote contact at run start.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExistingContactIndex {
    emails: HashSet<String>,
}

impl ExistingContactIndex {
    /// Build an index from raw emails. Empty entries are dropped, case is folded.
    pub fn from_emails<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut index = Self::default();
        for email in emails {
            index.insert(email.as_ref());
        }
        index
    }

    fn insert(&mut self, email: &str) {
        if !email.is_empty() {
            self.emails.insert(email.to_lowercase());
        }
    }

    /// Case-insensitive membership.
    pub fn contains(&self, email: &str) -> bool {
        self.emails.contains(&email.to_lowercase())
    }

    /// `Updated` when the email was known at run start, `Added` otherwise.
    pub fn classify(&self, email: &str) -> RecordAction {
        if self.contains(email) {
            RecordAction::Updated
        } else {
            RecordAction::Added
        }
    }

    pub fn len(&self) -> usize {
        self.emails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }
}

/// Page through `GET /contacts` and collect every email.
///
/// Stops on an empty page or one shorter than `page_size`, sleeping
/// `page_delay` between pages. Any failed page fails the whole build.
#[instrument(skip(client))]
pub async fn build_index(
    client: &BrevoClient,
    page_size: usize,
    page_delay: Duration,
) -> Result<ExistingContactIndex> {
    if page_size == 0 {
        return Err(ContactSyncError::validation("contact page size must be positive"));
    }

    let mut index = ExistingContactIndex::default();
    let mut offset = 0;

    loop {
        let page = client.list_contacts(page_size, offset).await?;
        let fetched = page.contacts.len();

        for contact in &page.contacts {
            if let Some(email) = contact.email.as_deref() {
                index.insert(email);
            }
        }

        debug!(fetched, offset, total = index.len(), "fetched contacts page");

        if fetched < page_size {
            break;
        }

        offset += page_size;
        tokio::time::sleep(page_delay).await;
    }

    info!(total = index.len(), "existing contact index built");
    Ok(index)
}
