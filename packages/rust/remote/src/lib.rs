//! Brevo v3 API client and wire models.
//!
//! This crate provides:
//! - [`BrevoClient`]: authenticated client for the contact, folder, list and campaign endpoints
//! - [`models`]: request/response bodies and the creation-id parser

pub mod client;
pub mod models;

pub use client::{BrevoClient, is_created};
pub use models::{
    AttributeMap, CampaignPayload, CampaignRecipients, ContactsPage, FoldersPage, RawResponse,
    RemoteContact, RemoteFolder, UpsertPayload, parse_created_id,
};
