//! Colored terminal output for the CLI.

use std::io::{self, Write};

use chrono::{DateTime, Local, Utc};
use owo_colors::OwoColorize;

use crate::analytics::{InterviewRecord, PruneReport, Stats};
use crate::trigger::InterviewOutcome;

const RULE_WIDTH: usize = 70;

/// Truncate a string to at most `max_chars` characters, adding an ellipsis.
#[must_use]
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    if max_chars <= 3 {
        return "...".to_string();
    }
    let kept: String = s.chars().take(max_chars - 3).collect();
    format!("{kept}...")
}

fn local_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

fn outcome_label(outcome: Option<InterviewOutcome>) -> String {
    match outcome {
        Some(InterviewOutcome::Passed) => "PASSED".green().bold().to_string(),
        Some(InterviewOutcome::Failed) => "FAILED".red().bold().to_string(),
        Some(InterviewOutcome::Missed) => "MISSED".yellow().bold().to_string(),
        None => "pending".dimmed().to_string(),
    }
}

/// Print the startup banner.
pub fn print_watching(channels: &[&str], topic_url: &str) {
    println!(
        "{} {} -> {}",
        "[WATCH]".blue().bold(),
        channels.join(", ").cyan(),
        topic_url.dimmed()
    );
    let _ = io::stdout().flush();
}

/// Print the statistics report.
pub fn print_stats(stats: &Stats, days: u32) {
    let rule = "=".repeat(RULE_WIDTH);
    println!("{rule}");
    match &stats.channel {
        Some(channel) => println!(
            "{} (last {days} days, {})",
            "Interview Statistics".bold(),
            channel.cyan()
        ),
        None => println!("{} (last {days} days)", "Interview Statistics".bold()),
    }
    println!("{rule}");
    println!();

    println!("Total interviews:     {}", stats.total.bold());
    println!(
        "Passed:               {} ({:.1}%)",
        stats.outcomes.passed.green(),
        stats.percentages.passed
    );
    println!(
        "Failed:               {} ({:.1}%)",
        stats.outcomes.failed.red(),
        stats.percentages.failed
    );
    println!(
        "Missed:               {} ({:.1}%)",
        stats.outcomes.missed.yellow(),
        stats.percentages.missed
    );
    println!("Pending:              {}", stats.outcomes.pending.dimmed());
    println!("Pass rate:            {:.1}%", stats.pass_rate);
    match stats.avg_queue_length {
        Some(avg) => println!("Average queue length: {avg:.1}"),
        None => println!("Average queue length: {}", "n/a".dimmed()),
    }
    println!();

    if !stats.busiest_hours.is_empty() {
        println!("{}", "Busiest hours (UTC):".bold());
        for (hour, count) in &stats.busiest_hours {
            println!("   {hour:02}:00  {count} interviews");
        }
        println!();
    }
    let _ = io::stdout().flush();
}

/// Print the most recent interviews.
pub fn print_recent(records: &[InterviewRecord]) {
    println!("{}", "-".repeat(RULE_WIDTH));
    println!("{}", "Recent interviews".bold());
    println!("{}", "-".repeat(RULE_WIDTH));

    if records.is_empty() {
        println!("{}", "No recent interviews found".dimmed());
    }
    for record in records {
        let queue = record
            .queue_length_at_start
            .map_or_else(|| "?".to_string(), |q| q.to_string());
        println!(
            "[{}] {:<20} {:<12} {} {}",
            local_time(record.started_at).dimmed(),
            truncate(&record.nick, 20),
            record.channel.cyan(),
            outcome_label(record.outcome),
            format!("(queue: {queue})").dimmed()
        );
    }
    println!();
    let _ = io::stdout().flush();
}

/// Print the result of a retention pass.
pub fn print_pruned(report: PruneReport, days: u32) {
    println!(
        "{} removed {} interviews and {} queue snapshots older than {days} days",
        "[PRUNE]".blue().bold(),
        report.interviews,
        report.snapshots
    );
    let _ = io::stdout().flush();
}

/// Print an error message.
pub fn print_error(message: &str) {
    eprintln!("{} {}", "[ERROR]".red().bold(), message);
}
