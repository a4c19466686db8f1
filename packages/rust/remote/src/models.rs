//! Request and response bodies for the Brevo v3 contact and campaign endpoints.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use contactsync_shared::{ContactSyncError, Result, SenderIdentity};

/// Contact attributes keyed by the remote attribute name (`SMS`, `COMPANY_NAME`, ...).
pub type AttributeMap = BTreeMap<String, String>;

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// A raw answer from the service: status plus the body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A contact as returned by `GET /contacts`. Only the fields we read.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteContact {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub email: Option<String>,
}

/// One page of `GET /contacts`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactsPage {
    #[serde(default)]
    pub contacts: Vec<RemoteContact>,
    #[serde(default)]
    pub count: u64,
}

/// A contact folder.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteFolder {
    pub id: i64,
    pub name: String,
}

/// One page of `GET /contacts/folders`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FoldersPage {
    #[serde(default)]
    pub folders: Vec<RemoteFolder>,
    #[serde(default)]
    pub count: u64,
}

/// Extract the positive integer `id` from a creation response body.
///
/// Malformed JSON is a decode error; a missing, non-integer or non-positive
/// id is a validation error.
pub fn parse_created_id(body: &str) -> Result<i64> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| ContactSyncError::decode(format!("creation response: {e}")))?;

    value
        .get("id")
        .and_then(serde_json::Value::as_i64)
        .filter(|id| *id > 0)
        .ok_or_else(|| {
            ContactSyncError::validation(format!("invalid or missing id in response: {value}"))
        })
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Body of `POST /contacts` (create, or update when the email exists).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertPayload {
    pub email: String,
    pub update_enabled: bool,
    #[serde(skip_serializing_if = "AttributeMap::is_empty")]
    pub attributes: AttributeMap,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub list_ids: Vec<i64>,
}

impl UpsertPayload {
    /// An update-enabled payload; empty attributes or list ids are left out of the body.
    pub fn new(email: impl Into<String>, attributes: AttributeMap, list_ids: Vec<i64>) -> Self {
        Self {
            email: email.into(),
            update_enabled: true,
            attributes,
            list_ids,
        }
    }

    /// A copy of this payload with one attribute removed.
    pub fn without_attribute(&self, name: &str) -> Self {
        let mut stripped = self.clone();
        stripped.attributes.remove(name);
        stripped
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateFolderRequest<'a> {
    pub name: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateListRequest<'a> {
    pub name: &'a str,
    pub folder_id: i64,
}

/// Body of `POST /emailCampaigns`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignPayload {
    pub sender: SenderIdentity,
    pub name: String,
    pub subject: String,
    pub html_content: String,
    pub recipients: CampaignRecipients,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignRecipients {
    pub list_ids: Vec<i64>,
}
