//! End-to-end sync run: index → provision → upsert each record → campaign → report.
//!
//! Indexing and provisioning failures abort the run with [`RunAborted`],
//! which still carries the partial report. Per-record failures and campaign
//! failures are recorded in the report and the run completes normally.

use std::time::Instant;

use chrono::{Local, Utc};
use tracing::{error, info, instrument};

use contactsync_remote::BrevoClient;
use contactsync_shared::{
    CampaignState, ContactSyncError, ProcessingReport, RunId, SourceRecord, SyncSettings,
};

use crate::campaign::{CampaignDraft, CampaignRun, campaign_name};
use crate::index::build_index;
use crate::provision::provision_list;
use crate::report::ResultAggregator;
use crate::upsert::execute_upsert;

/// The step a run was in when it aborted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Index,
    Provision,
    Campaign,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Index => "existing-contact indexing",
            Self::Provision => "folder/list provisioning",
            Self::Campaign => "campaign dispatch",
        })
    }
}

/// A run that could not continue. `report` holds everything recorded so far.
#[derive(Debug, thiserror::Error)]
#[error("run aborted during {stage}: {error}")]
pub struct RunAborted {
    pub stage: Stage,
    #[source]
    pub error: ContactSyncError,
    pub report: Box<ProcessingReport>,
}

/// Progress callback for reporting run status.
pub trait SyncProgress: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each input record has been handled.
    fn record_processed(&self, email: &str, current: usize, total: usize);
    /// Called when the run completes (not on abort).
    fn done(&self, report: &ProcessingReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl SyncProgress for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn record_processed(&self, _email: &str, _current: usize, _total: usize) {}
    fn done(&self, _report: &ProcessingReport) {}
}

fn abort(stage: Stage, error: ContactSyncError, aggregator: ResultAggregator) -> RunAborted {
    error!(%stage, error = %error, "run aborted");
    RunAborted {
        stage,
        error,
        report: Box::new(aggregator.finish()),
    }
}

/// Run one full sync of `records` and dispatch the campaign.
#[instrument(skip_all, fields(records = records.len()))]
pub async fn run_sync(
    client: &BrevoClient,
    settings: &SyncSettings,
    records: &[SourceRecord],
    html_content: &str,
    progress: &dyn SyncProgress,
) -> Result<ProcessingReport, RunAborted> {
    let start = Instant::now();
    let run_id = RunId::new();
    let mut aggregator = ResultAggregator::new(run_id.clone());

    info!(%run_id, "starting sync run");

    // --- Phase 1: Existing contacts ---
    progress.phase("Indexing existing contacts");
    let existing = match build_index(client, settings.page_size, settings.page_delay).await {
        Ok(index) => index,
        Err(e) => return Err(abort(Stage::Index, e, aggregator)),
    };
    aggregator.set_existing_contacts(existing.len());

    // --- Phase 2: Folder + list ---
    progress.phase("Provisioning contact list");
    let list = match provision_list(
        client,
        &settings.folder_name,
        &settings.list_name_prefix,
        settings.folder_page_size,
        Local::now(),
    )
    .await
    {
        Ok(list) => list,
        Err(e) => return Err(abort(Stage::Provision, e, aggregator)),
    };
    aggregator.set_provisioned(list.folder_id, list.id);

    // --- Phase 3: Contacts ---
    progress.phase("Syncing contacts");
    let total = records.len();
    for (i, record) in records.iter().enumerate() {
        let email = record.email.trim();
        if email.is_empty() {
            aggregator.record_missing_email();
        } else {
            let record = SourceRecord {
                email: email.to_string(),
                ..record.clone()
            };
            let result =
                execute_upsert(client, &record.email, &existing, &[list.id], Some(&record)).await;
            aggregator.record_upsert(&record, result);
        }
        progress.record_processed(email, i + 1, total);
    }

    // --- Phase 4: Campaign ---
    progress.phase("Creating campaign");
    let draft = CampaignDraft {
        sender: settings.sender.clone(),
        name: campaign_name(&settings.campaign_name_prefix, Utc::now()),
        subject: settings.subject.clone(),
        html_content: html_content.to_string(),
    };

    let mut campaign = CampaignRun::new();
    if let Err(e) = campaign.create(client, &draft, list.id).await {
        return Err(abort(Stage::Campaign, e, aggregator));
    }
    if campaign.state() == CampaignState::Created {
        progress.phase("Sending campaign");
        if let Err(e) = campaign.send(client).await {
            return Err(abort(Stage::Campaign, e, aggregator));
        }
    }
    aggregator.record_campaign(campaign.into_info());

    let report = aggregator.finish();
    progress.done(&report);

    info!(
        %run_id,
        added = report.added_to_campaign.len(),
        updated = report.updated_contacts.len(),
        errors = report.errors.len(),
        campaign = %report.campaign_info.state,
        elapsed_ms = start.elapsed().as_millis(),
        "sync run complete"
    );

    Ok(report)
}
