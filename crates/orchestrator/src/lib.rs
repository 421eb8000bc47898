#![forbid(unsafe_code)]

//! The check-cycle engine and its external collaborators: address probing,
//! webhook delivery, wall-clock scheduling.

mod clock;
mod engine;
mod error;
mod net;
pub mod schedule;

pub use clock::{Clock, SystemClock};
pub use engine::{CheckEngine, CycleReport, Services};
pub use error::Error;
pub use net::{DiscordNotifier, HttpProber, MAX_MESSAGE_LENGTH, Notifier, ProbedAddresses, Prober};
