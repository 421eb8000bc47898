#![forbid(unsafe_code)]
#![allow(clippy::print_stdout)]

//! Human-readable output for the one-shot subcommands. Everything else in
//! the binary logs through `tracing`; only these reports go to stdout.

use chrono::{DateTime, Utc};
use config::Config;
use kernel::{CheckEvent, HistorySummary};
use orchestrator::CycleReport;

fn stamp(value: Option<DateTime<Utc>>) -> String {
    value.map_or_else(
        || "never".to_owned(),
        |at| at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

pub fn cycle_report(report: &CycleReport) {
    println!("Check ({}) finished in {:.2}s", report.mode, report.duration_seconds);
    println!("  public IP:  {}", report.public_ip);
    println!(
        "  local IP:   {}",
        report.local_ip.as_deref().unwrap_or("unknown")
    );
    if report.ip_changed {
        match &report.previous_public_ip {
            Some(previous) => println!("  changed:    yes (was {previous})"),
            None => println!("  changed:    yes (first observation)"),
        }
    } else {
        println!("  changed:    no");
    }
    println!(
        "  notified:   {}",
        match (report.should_notify, report.notification_sent) {
            (true, true) => "yes",
            (true, false) => "delivery failed",
            (false, _) => "not required",
        }
    );
    if !report.recorded {
        println!("  recorded:   no");
    }
}

pub fn status(summary: &HistorySummary) {
    println!("Current state");
    println!(
        "  public IP:          {}",
        summary.current.public_ip.as_deref().unwrap_or("unknown")
    );
    println!(
        "  local IP:           {}",
        summary.current.local_ip.as_deref().unwrap_or("unknown")
    );
    println!("  last updated:       {}", stamp(summary.current.last_updated));
    println!(
        "  last notification:  {}",
        stamp(summary.current.last_notification_sent)
    );

    println!("Statistics");
    println!("  total checks:       {}", summary.metadata.total_checks);
    println!(
        "  IP changes:         {}",
        summary.statistics.total_ip_changes
    );
    println!(
        "  notifications sent: {}",
        summary.statistics.total_notifications_sent
    );
    println!(
        "  last change:        {}",
        stamp(summary.statistics.last_change_date)
    );
    println!(
        "  mode split:         scheduled {:.1}% / manual {:.1}% / test {:.1}%",
        summary.frequency_percentage.scheduled,
        summary.frequency_percentage.manual,
        summary.frequency_percentage.test,
    );
    println!("  retained events:    {}", summary.retained_events);

    if !summary.recent_activity.is_empty() {
        println!("Recent checks");
        for event in &summary.recent_activity {
            println!(
                "  {}  {:9}  {}  {}",
                event.timestamp.format("%Y-%m-%d %H:%M:%S"),
                event.mode.to_string(),
                event.public_ip.as_deref().unwrap_or("unknown"),
                if event.ip_changed { "changed" } else { "-" },
            );
        }
    }
}

pub fn timeline(changes: &[CheckEvent], days: u32) {
    if changes.is_empty() {
        println!("No address changes in the last {days} days");
        return;
    }
    println!("Address changes in the last {days} days");
    for event in changes {
        println!(
            "  {}  {} -> {}",
            event.timestamp.format("%Y-%m-%d %H:%M:%S"),
            event.previous_public_ip.as_deref().unwrap_or("none"),
            event.public_ip.as_deref().unwrap_or("unknown"),
        );
    }
}

pub fn verified(config: &Config) {
    println!("Configuration OK");
    println!("  webhook:        reachable, test message delivered");
    println!("  probe services: {}", config.probe.services.len());
    println!("  history file:   {}", config.history.file_path.display());
    println!("  daily check:    {} UTC", config.scheduler.daily_time);
}
