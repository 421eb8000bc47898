#![forbid(unsafe_code)]

//! Change-detection core: the durable check history and the per-cycle
//! notification policy. Everything network-facing lives a crate above.

mod detector;
mod domain;
mod error;
mod history;

pub use detector::{Evaluation, evaluate, should_notify};
pub use domain::{AddressSnapshot, CheckMode};
pub use error::Error;
pub use history::{
    CheckEvent, CheckFrequency, CurrentState, FrequencyPercentage, HistoryRecord, HistoryStore,
    HistorySummary, Metadata, SCHEMA_VERSION, Statistics,
};
