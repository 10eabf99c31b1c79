//! Sequencer module: turns accumulated groups into ordered publish tasks.

mod config;
mod worker;

pub use config::SequencerConfig;
pub use worker::Sequencer;
