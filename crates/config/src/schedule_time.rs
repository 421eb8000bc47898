#![forbid(unsafe_code)]

use serde_with::{DeserializeFromStr, SerializeDisplay};
use std::fmt;
use std::str::FromStr;

/// Wall-clock time of day in `HH:MM` form, used for the daily check schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, SerializeDisplay, DeserializeFromStr)]
pub struct ScheduleTime {
    pub hour: u8,
    pub minute: u8,
}

impl Default for ScheduleTime {
    fn default() -> Self {
        Self { hour: 9, minute: 0 }
    }
}

impl fmt::Display for ScheduleTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for ScheduleTime {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((hours, minutes)) = s.split_once(':') else {
            return Err(format!("expected HH:MM, got `{s}`"));
        };
        let hour: u8 = hours
            .parse()
            .map_err(|_| format!("`{hours}` is not a valid hour"))?;
        let minute: u8 = minutes
            .parse()
            .map_err(|_| format!("`{minutes}` is not a valid minute"))?;
        if hour > 23 {
            return Err(format!("hour must be 0-23, got {hour}"));
        }
        if minute > 59 {
            return Err(format!("minute must be 0-59, got {minute}"));
        }
        Ok(Self { hour, minute })
    }
}
