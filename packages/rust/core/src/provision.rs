//! Folder and recipient-list provisioning.
//!
//! Every run targets a fresh list inside a long-lived, named folder. Any
//! failure here ends the run: without a valid list there is nothing to
//! attach contacts or the campaign to.

use chrono::{DateTime, Local};
use tracing::{debug, info, instrument};

use contactsync_remote::BrevoClient;
use contactsync_shared::{ContactSyncError, Result};

/// The list a run's contacts are linked to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactList {
    pub id: i64,
    pub folder_id: i64,
    pub name: String,
}

/// `"<prefix> - YYYY-MM-DD HH:MM:SS"` in local time.
pub fn list_name(prefix: &str, at: DateTime<Local>) -> String {
    format!("{prefix} - {}", at.format("%Y-%m-%d %H:%M:%S"))
}

/// Find the folder called `name` (exact match), creating it if absent.
///
/// Folders are listed page by page. A matching folder with a non-positive
/// id is an [`ContactSyncError::InvalidState`].
#[instrument(skip(client))]
pub async fn get_or_create_folder(
    client: &BrevoClient,
    name: &str,
    page_size: usize,
) -> Result<i64> {
    if page_size == 0 {
        return Err(ContactSyncError::validation("folder page size must be positive"));
    }

    let mut offset = 0;
    loop {
        let page = client.list_folders(page_size, offset).await?;
        let fetched = page.folders.len();
        debug!(fetched, offset, "fetched folders page");

        if let Some(folder) = page.folders.into_iter().find(|f| f.name == name) {
            if folder.id <= 0 {
                return Err(ContactSyncError::invalid_state(format!(
                    "invalid folder ID {} for folder '{name}'",
                    folder.id
                )));
            }
            info!(folder_id = folder.id, "found existing folder");
            return Ok(folder.id);
        }

        if fetched < page_size {
            break;
        }
        offset += page_size;
    }

    info!("folder not found; creating it");
    let id = client.create_folder(name).await?;
    info!(folder_id = id, "created folder");
    Ok(id)
}

/// Resolve the folder, then create this run's list inside it.
#[instrument(skip(client, created_at))]
pub async fn provision_list(
    client: &BrevoClient,
    folder_name: &str,
    list_prefix: &str,
    folder_page_size: usize,
    created_at: DateTime<Local>,
) -> Result<ContactList> {
    let folder_id = get_or_create_folder(client, folder_name, folder_page_size).await?;

    let name = list_name(list_prefix, created_at);
    let id = client.create_list(&name, folder_id).await?;
    info!(list_id = id, folder_id, list = %name, "created contact list");

    Ok(ContactList {
        id,
        folder_id,
        name,
    })
}
