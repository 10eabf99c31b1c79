//! Two-phase publishing: prepare, relay, grouped publish.
//!
//! A released group travels through three stages. Preparation turns each
//! item into something sendable (gallery items pass through, documents are
//! fetched and possibly transcoded). Relay sends each item individually to
//! the submitter's chat to mint stable remote references. The grouped
//! publish then posts those references to the target channel in ordered
//! chunks and cleans up the relay copies.

mod config;
mod preparer;
mod relay;
mod types;
mod worker;

pub use config::PublisherConfig;
pub use preparer::Preparer;
pub use relay::Relay;
pub use types::{chunk_media, GalleryKind, PackOutcome, PreparedItem, PublishTask, RelayedItem};
pub use worker::{PublishError, Publisher};
