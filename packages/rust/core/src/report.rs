//! Outcome aggregation into a [`ProcessingReport`].

use tracing::warn;

use contactsync_shared::{
    CampaignInfo, CampaignState, ContactSyncError, ErrorOutcome, ProcessingReport, RecordAction,
    RecordOutcome, RunId, SourceRecord,
};

use crate::upsert::UpsertSuccess;

pub const MISSING_EMAIL_ERROR: &str = "missing email";
pub const MISSING_EMAIL_DETAILS: &str = "Skipping contact with no email address";
pub const UPSERT_FAILED_DETAILS: &str = "Failed to add/update contact";
pub const CAMPAIGN_CREATE_FAILED_DETAILS: &str = "Failed to create campaign";
pub const CAMPAIGN_SEND_FAILED_DETAILS: &str = "Failed to send campaign";

/// Append-only builder for one run's report.
#[derive(Debug)]
pub struct ResultAggregator {
    report: ProcessingReport,
}

impl ResultAggregator {
    pub fn new(run_id: RunId) -> Self {
        Self {
            report: ProcessingReport::new(run_id),
        }
    }

    pub fn report(&self) -> &ProcessingReport {
        &self.report
    }

    pub fn set_existing_contacts(&mut self, total: usize) {
        self.report.total_existing_contacts = total;
    }

    pub fn set_provisioned(&mut self, folder_id: i64, list_id: i64) {
        self.report.folder_id = Some(folder_id);
        self.report.list_id = Some(list_id);
    }

    /// A record skipped because it has no email.
    pub fn record_missing_email(&mut self) {
        warn!("skipping contact with no email address");
        self.report.errors.push(ErrorOutcome {
            email: None,
            error: MISSING_EMAIL_ERROR.to_string(),
            details: Some(MISSING_EMAIL_DETAILS.to_string()),
        });
    }

    /// The upsert result for one record.
    pub fn record_upsert(
        &mut self,
        record: &SourceRecord,
        result: Result<UpsertSuccess, ContactSyncError>,
    ) {
        match result {
            Ok(success) => {
                let outcome = RecordOutcome {
                    email: record.email.clone(),
                    data: record.clone(),
                    action: success.action,
                    resolution: success.resolution,
                };
                match success.action {
                    RecordAction::Added => self.report.added_to_campaign.push(outcome),
                    RecordAction::Updated => self.report.updated_contacts.push(outcome),
                }
            }
            Err(e) => {
                warn!(email = %record.email, error = %e, "failed to add/update contact");
                self.report.errors.push(ErrorOutcome {
                    email: Some(record.email.clone()),
                    error: e.to_string(),
                    details: Some(UPSERT_FAILED_DETAILS.to_string()),
                });
            }
        }
    }

    /// The campaign's final state. A failure adds one error entry naming
    /// the step that failed.
    pub fn record_campaign(&mut self, info: CampaignInfo) {
        if info.state == CampaignState::Failed {
            let details = if info.was_created() {
                CAMPAIGN_SEND_FAILED_DETAILS
            } else {
                CAMPAIGN_CREATE_FAILED_DETAILS
            };
            self.report.errors.push(ErrorOutcome {
                email: None,
                error: info.error.clone().unwrap_or_default(),
                details: Some(details.to_string()),
            });
        }
        self.report.campaign_info = info;
    }

    /// Stamp the finish time and hand the report over.
    pub fn finish(mut self) -> ProcessingReport {
        self.report.finish();
        self.report
    }
}

#[cfg(test)]
mod tests {
    use contactsync_shared::UpsertResolution;

    use super::*;

    fn record(email: &str) -> SourceRecord {
        SourceRecord {
            email: email.into(),
            ..Default::default()
        }
    }

    fn success(action: RecordAction) -> Result<UpsertSuccess, ContactSyncError> {
        Ok(UpsertSuccess {
            action,
            resolution: UpsertResolution::Applied,
        })
    }

    #[test]
    fn splits_outcomes_by_action() {
        let mut agg = ResultAggregator::new(RunId::new());
        agg.record_upsert(&record("a@example.com"), success(RecordAction::Added));
        agg.record_upsert(&record("b@example.com"), success(RecordAction::Updated));
        agg.record_upsert(
            &record("c@example.com"),
            Err(ContactSyncError::remote(400, "invalid")),
        );
        agg.record_missing_email();

        let report = agg.finish();
        assert_eq!(report.added_to_campaign[0].email, "a@example.com");
        assert_eq!(report.updated_contacts[0].email, "b@example.com");
        assert_eq!(report.errors.len(), 2);
        assert_eq!(report.errors[0].email.as_deref(), Some("c@example.com"));
        assert_eq!(report.errors[0].details.as_deref(), Some(UPSERT_FAILED_DETAILS));
        assert_eq!(report.errors[1].error, MISSING_EMAIL_ERROR);
        assert!(report.finished_at.is_some());
    }

    #[test]
    fn campaign_failures_name_the_step() {
        let mut agg = ResultAggregator::new(RunId::new());
        agg.record_campaign(CampaignInfo {
            state: CampaignState::Failed,
            status_code: 400,
            error: Some("API Error: 400 - nope".into()),
            ..Default::default()
        });
        let report = agg.finish();
        assert_eq!(report.errors[0].details.as_deref(), Some(CAMPAIGN_CREATE_FAILED_DETAILS));

        let mut agg = ResultAggregator::new(RunId::new());
        agg.record_campaign(CampaignInfo {
            state: CampaignState::Failed,
            campaign_id: Some(3),
            error: Some("Send failed: 500 - boom".into()),
            ..Default::default()
        });
        let report = agg.finish();
        assert_eq!(report.errors[0].details.as_deref(), Some(CAMPAIGN_SEND_FAILED_DETAILS));
        assert_eq!(report.campaign_info.campaign_id, Some(3));
    }

    #[test]
    fn sent_campaign_adds_no_error() {
        let mut agg = ResultAggregator::new(RunId::new());
        agg.record_campaign(CampaignInfo {
            state: CampaignState::Sent,
            campaign_id: Some(3),
            ..Default::default()
        });
        assert!(agg.report().errors.is_empty());
    }
}
