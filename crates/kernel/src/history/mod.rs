#![forbid(unsafe_code)]

mod record;
mod store;

pub use record::{
    CheckEvent, CheckFrequency, CurrentState, HistoryRecord, Metadata, SCHEMA_VERSION, Statistics,
};
pub use store::{FrequencyPercentage, HistoryStore, HistorySummary};
