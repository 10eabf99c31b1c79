//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Sequencer (group releases)
//! - Preparer (fetches, transcodes, drops)
//! - Relay and publish (sends, retries, pack outcomes)

use once_cell::sync::Lazy;
use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts};

/// Groups released from the sequencer, by task kind.
pub static GROUPS_RELEASED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("relaypack_groups_released_total", "Groups released"),
        &["kind"], // "text", "sticker", "media_pack"
    )
    .unwrap()
});

/// Items dropped, by pipeline stage.
pub static ITEMS_DROPPED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("relaypack_items_dropped_total", "Items dropped"),
        &["stage"], // "fetch", "prepare", "relay"
    )
    .unwrap()
});

/// Transcode outcomes, by strategy.
pub static TRANSCODES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("relaypack_transcodes_total", "Transcode outcomes"),
        &["strategy"], // "stream_copy", "hardware", "software", "copy_fallback"
    )
    .unwrap()
});

/// Relay retry attempts (beyond the first).
pub static RELAY_RETRIES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("relaypack_relay_retries_total", "Relay retries").unwrap()
});

/// Grouped publish calls emitted.
pub static PUBLISH_CALLS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("relaypack_publish_calls_total", "Grouped publish calls").unwrap()
});

/// Packs completed, by result.
pub static PACKS_COMPLETED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("relaypack_packs_completed_total", "Packs completed"),
        &["result"], // "published", "failed"
    )
    .unwrap()
});

/// End-to-end pack duration in seconds.
pub static PACK_DURATION: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "relaypack_pack_duration_seconds",
            "End-to-end pack duration",
        )
        .buckets(vec![0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0]),
    )
    .unwrap()
});

/// Registers all metrics with the given registry.
pub fn register_metrics(registry: &prometheus::Registry) -> Result<(), prometheus::Error> {
    registry.register(Box::new(GROUPS_RELEASED.clone()))?;
    registry.register(Box::new(ITEMS_DROPPED.clone()))?;
    registry.register(Box::new(TRANSCODES.clone()))?;
    registry.register(Box::new(RELAY_RETRIES.clone()))?;
    registry.register(Box::new(PUBLISH_CALLS.clone()))?;
    registry.register(Box::new(PACKS_COMPLETED.clone()))?;
    registry.register(Box::new(PACK_DURATION.clone()))?;
    Ok(())
}
