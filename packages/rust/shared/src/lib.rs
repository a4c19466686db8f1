//! Shared types, error model, and configuration for contactsync.
//!
//! This crate is the foundation depended on by all other contactsync crates.
//! It provides:
//! - [`ContactSyncError`]: the unified error type
//! - Domain types ([`SourceRecord`], [`ProcessingReport`], [`CampaignInfo`], [`RunId`])
//! - Configuration ([`AppConfig`], [`SyncSettings`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    ApiKey, AppConfig, BrevoConfig, CampaignConfig, RemoteSettings, ScheduleConfig, SenderConfig,
    SenderIdentity, SyncSettings, config_dir, config_file_path, init_config, load_config,
    load_config_from,
};
pub use error::{ContactSyncError, Result};
pub use types::{
    CampaignInfo, CampaignState, ErrorOutcome, ProcessingReport, RecordAction, RecordOutcome,
    RunId, SourceRecord, UpsertResolution,
};
