//! Core domain types for contact synchronization runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ContactSyncError, Result};

// ---------------------------------------------------------------------------
// RunId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper identifying one pipeline run (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Generate a new time-sortable run identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RunId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ---------------------------------------------------------------------------
// SourceRecord
// ---------------------------------------------------------------------------

/// One row of the vendor export, in column order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecord {
    pub nat: String,
    pub stop: String,
    pub category: String,
    pub id: String,
    pub contacts: String,
    pub email: String,
    pub website: String,
    pub vendor_name: String,
    pub address: String,
    pub id_code: String,
    pub phone: String,
    pub fax: String,
    pub city: String,
    pub country: String,
}

impl SourceRecord {
    /// Number of columns every data row must carry.
    pub const FIELD_COUNT: usize = 14;

    /// Build a record from a row's fields, in column order.
    ///
    /// Fails with a validation error unless exactly [`Self::FIELD_COUNT`]
    /// fields are given.
    pub fn from_fields<I, S>(fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        let Ok(cols) = <[String; Self::FIELD_COUNT]>::try_from(fields) else {
            return Err(ContactSyncError::validation(format!(
                "expected {} fields",
                Self::FIELD_COUNT
            )));
        };

        let [
            nat,
            stop,
            category,
            id,
            contacts,
            email,
            website,
            vendor_name,
            address,
            id_code,
            phone,
            fax,
            city,
            country,
        ] = cols;

        Ok(Self {
            nat,
            stop,
            category,
            id,
            contacts,
            email,
            website,
            vendor_name,
            address,
            id_code,
            phone,
            fax,
            city,
            country,
        })
    }

    /// The record's fields in column order.
    pub fn fields(&self) -> [&str; Self::FIELD_COUNT] {
        [
            &self.nat,
            &self.stop,
            &self.category,
            &self.id,
            &self.contacts,
            &self.email,
            &self.website,
            &self.vendor_name,
            &self.address,
            &self.id_code,
            &self.phone,
            &self.fax,
            &self.city,
            &self.country,
        ]
    }
}

// ---------------------------------------------------------------------------
// Record outcomes
// ---------------------------------------------------------------------------

/// Whether a successfully upserted contact was new to the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordAction {
    Added,
    Updated,
}

/// How a successful upsert terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertResolution {
    /// The first request was accepted.
    Applied,
    /// The first request conflicted; the retry without the attribute was accepted.
    AppliedWithoutConflictingAttribute,
    /// The first request conflicted and nothing was left to send.
    NoOp,
}

/// A record that was upserted successfully.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordOutcome {
    pub email: String,
    pub data: SourceRecord,
    pub action: RecordAction,
    pub resolution: UpsertResolution,
}

/// A failure recorded against one record, or against the campaign stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorOutcome {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

// ---------------------------------------------------------------------------
// Campaign
// ---------------------------------------------------------------------------

/// Lifecycle of the run's single campaign.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignState {
    #[default]
    NotCreated,
    Created,
    SendRequested,
    Sent,
    Failed,
}

impl std::fmt::Display for CampaignState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::NotCreated => "not_created",
            Self::Created => "created",
            Self::SendRequested => "send_requested",
            Self::Sent => "sent",
            Self::Failed => "failed",
        })
    }
}

/// Campaign outcome as it appears in the report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CampaignInfo {
    pub state: CampaignState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campaign_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campaign_name: Option<String>,
    /// Status of the last request made for this campaign (0 when none was answered).
    #[serde(default)]
    pub status_code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CampaignInfo {
    /// Whether creation succeeded, regardless of how the send went.
    pub fn was_created(&self) -> bool {
        self.campaign_id.is_some()
    }
}

// ---------------------------------------------------------------------------
// ProcessingReport
// ---------------------------------------------------------------------------

/// The outcome of one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingReport {
    pub run_id: RunId,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_id: Option<i64>,
    pub added_to_campaign: Vec<RecordOutcome>,
    pub updated_contacts: Vec<RecordOutcome>,
    pub errors: Vec<ErrorOutcome>,
    pub campaign_info: CampaignInfo,
    pub total_existing_contacts: usize,
}

impl ProcessingReport {
    /// An empty report for a run starting now.
    pub fn new(run_id: RunId) -> Self {
        Self {
            run_id,
            started_at: Utc::now(),
            finished_at: None,
            folder_id: None,
            list_id: None,
            added_to_campaign: Vec::new(),
            updated_contacts: Vec::new(),
            errors: Vec::new(),
            campaign_info: CampaignInfo::default(),
            total_existing_contacts: 0,
        }
    }

    /// Number of records that ended in success.
    pub fn succeeded(&self) -> usize {
        self.added_to_campaign.len() + self.updated_contacts.len()
    }

    /// Stamp the finish time.
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }
}
