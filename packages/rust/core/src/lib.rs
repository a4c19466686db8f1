//! Contact synchronization and campaign dispatch for contactsync.
//!
//! This crate ties the remote client into one sequential run:
//! - [`index`]: snapshot of emails already known remotely
//! - [`attributes`]: source record → remote attribute mapping
//! - [`upsert`]: per-record upsert with a single conflict retry
//! - [`provision`]: folder get-or-create and per-run list creation
//! - [`campaign`]: campaign creation and send state machine
//! - [`report`]: outcome aggregation
//! - [`pipeline`]: the end-to-end [`run_sync`] driver

pub mod attributes;
pub mod campaign;
pub mod index;
pub mod pipeline;
pub mod provision;
pub mod report;
pub mod upsert;

pub use attributes::{ContactAttribute, map_attributes};
pub use campaign::{CampaignDraft, CampaignRun, campaign_name};
pub use index::{ExistingContactIndex, build_index};
pub use pipeline::{RunAborted, SilentProgress, Stage, SyncProgress, run_sync};
pub use provision::{ContactList, get_or_create_folder, list_name, provision_list};
pub use report::ResultAggregator;
pub use upsert::{UpsertSuccess, execute_upsert, is_sms_conflict};
