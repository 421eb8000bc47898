#![forbid(unsafe_code)]

mod notifier;
mod prober;

pub use notifier::{DiscordNotifier, MAX_MESSAGE_LENGTH, Notifier};
pub use prober::{HttpProber, ProbedAddresses, Prober};
