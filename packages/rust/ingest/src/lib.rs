//! Input loading for contactsync runs.
//!
//! This crate provides:
//! - [`records`]: vendor export CSV → [`SourceRecord`](contactsync_shared::SourceRecord)s
//! - [`template`]: the campaign HTML body

pub mod records;
pub mod template;

pub use records::{parse_records, read_records};
pub use template::load_template;
