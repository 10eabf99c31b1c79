//! Ingress side of the pipeline: group collection and arrival tracking.
//!
//! Incoming items are appended to per-group ordered lists by the [`Grouper`]
//! while the [`Tracker`] records each group's first sequence number and last
//! arrival time. The [`IngressHub`] owns both behind one lock so the
//! sequencer can release a settled group atomically.

mod grouper;
mod hub;
mod tracker;
mod types;

pub use grouper::Grouper;
pub use hub::IngressHub;
pub use tracker::{GroupMeta, Tracker};
pub use types::{ChatId, GroupKey, IngressEvent, Item, ItemContent};
