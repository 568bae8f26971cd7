use crate::commands::{DispatchEvent, DispatchReport, LineOutcome, Progress, RunStatus};
use crate::config::Config;
use crate::core::error::BooperError;
use crate::twitch::Session;
use console::{Term, style};

fn term_width() -> usize {
    let width = Term::stdout().size().1 as usize;
    std::cmp::min(width.saturating_sub(4), 100).max(40)
}

/// Shortens a queued line so a single event fits on one terminal row
fn clip(line: &str, max: usize) -> String {
    if line.chars().count() <= max {
        return line.to_string();
    }
    let kept: String = line.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", kept)
}

/// Banner shown before the first command is dispatched
pub fn display_run_header(session: &Session, total: usize, delay_ms: u64) {
    let width = term_width();
    let top_border = format!("┌─ sbooper {}┐", "─".repeat(width.saturating_sub(12)));
    let bottom_border = "└".to_string() + &"─".repeat(width.saturating_sub(2)) + "┘";
    let channel = if session.channel.display_name.is_empty() {
        &session.channel.login
    } else {
        &session.channel.display_name
    };

    println!("\n{}", style(&top_border).dim().cyan());
    println!(
        "│ {} {}",
        style("channel:").bold(),
        style(channel).bold().magenta()
    );
    println!(
        "│ {} {}",
        style("as:").bold(),
        style(&session.moderator.login).cyan()
    );
    println!(
        "│ {} {} commands, {} ms apart",
        style("queue:").bold(),
        style(total).bold().white(),
        delay_ms
    );
    println!("{}", style(&bottom_border).dim().cyan());
}

/// Rewrites the live progress line in place
pub fn display_progress(progress: &Progress) {
    let term = Term::stdout();
    let _ = term.clear_line();
    let _ = term.write_str(&format!(
        "{} processed {}  remaining {}",
        style("⏳").yellow(),
        style(progress.processed).bold().green(),
        style(progress.remaining).bold().white()
    ));
}

fn describe_outcome(outcome: &LineOutcome) -> String {
    match outcome {
        LineOutcome::Sent => style("sent").green().to_string(),
        LineOutcome::Banned { target } => style(format!("banned {}", target)).red().to_string(),
        LineOutcome::BanTargetNotFound { target } => {
            style(format!("no such user {}, skipped", target))
                .dim()
                .to_string()
        }
        LineOutcome::BanFailed { target, error } => {
            style(format!("ban of {} not applied: {}", target, error))
                .yellow()
                .to_string()
        }
        LineOutcome::TermBlocked { phrase } => {
            style(format!("blocked \"{}\"", phrase)).yellow().to_string()
        }
        LineOutcome::TermBlockFailed { phrase, error } => {
            style(format!("\"{}\" not blocked: {}", phrase, error))
                .yellow()
                .to_string()
        }
        LineOutcome::Skipped => style("nothing to do, skipped").dim().to_string(),
    }
}

/// Prints one dispatch event above the progress line
pub fn display_event(event: &DispatchEvent) {
    let term = Term::stdout();
    let _ = term.clear_line();
    let clip_at = term_width().saturating_sub(30);

    match event {
        DispatchEvent::Started { total } => {
            println!("{} {} queued", style("▶").bold().green(), total);
        }
        DispatchEvent::LineDone {
            index,
            line,
            outcome,
            ..
        } => {
            println!(
                "{} {}  {}",
                style(format!("{:>4}", index)).dim(),
                clip(line, clip_at),
                describe_outcome(outcome)
            );
        }
        DispatchEvent::LineFailed {
            index, line, error, ..
        } => {
            println!(
                "{} {}  {}",
                style(format!("{:>4}", index)).dim(),
                clip(line, clip_at),
                style(format!("failed: {}", error)).bold().red()
            );
        }
        DispatchEvent::Completed {
            processed,
            marker_error,
        } => {
            println!(
                "{} {}",
                style("✅ COMPLETED").bold().green(),
                style(format!("{} processed", processed)).dim()
            );
            if let Some(error) = marker_error {
                println!(
                    "{} {}",
                    style("⚠️").yellow(),
                    style(format!("completion message not sent: {}", error)).yellow()
                );
            }
        }
        DispatchEvent::Aborted {
            processed,
            remaining,
        } => {
            println!(
                "{} {}",
                style("🚫 STOPPED").bold().red(),
                style(format!("{} processed, {} left", processed, remaining)).dim()
            );
        }
        DispatchEvent::Failed { error } => {
            display_error(&BooperError::Dispatch(error.clone()));
        }
    }
}

/// Lists failures and any lines that never ran
pub fn display_report(report: &DispatchReport) {
    let width = term_width();

    if !report.failures.is_empty() {
        println!("\n{}", style("⚠️  FAILED LINES").bold().red());
        for failure in &report.failures {
            println!(
                "{} {}  {}",
                style(format!("{:>4}", failure.index)).dim(),
                clip(&failure.line, width.saturating_sub(30)),
                style(&failure.error).red()
            );
        }
    }

    if report.status != RunStatus::Completed && !report.pending.is_empty() {
        println!(
            "\n{}",
            style(format!("📋 NOT SENT ({})", report.pending.len()))
                .bold()
                .yellow()
        );
        println!("{}", style("─".repeat(width)).dim());
        for line in &report.pending {
            println!("{}", line);
        }
        println!("{}", style("─".repeat(width)).dim());
    }
}

pub fn display_channels(channels: &[String], current: Option<&str>) {
    println!("\n{}", style("📺 CHANNELS").bold().blue());
    for channel in channels {
        if Some(channel.as_str()) == current {
            println!("  {} {}", style("*").bold().green(), style(channel).bold());
        } else {
            println!("    {}", channel);
        }
    }
}

pub fn display_config(config: &Config) -> Result<(), BooperError> {
    let yaml = serde_yml::to_string(&config.redacted())?;
    println!("{}", style(Config::config_path().display()).dim());
    print!("{}", yaml);
    Ok(())
}

pub fn display_info(message: &str) {
    println!("{} {}", style("ℹ").bold().blue(), message);
}

/// Reports an error to the user on stderr
pub fn display_error(err: &BooperError) {
    eprintln!(
        "{} {}",
        style("❌").bold().red(),
        style(err.to_string()).bold().red()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_keeps_short_lines() {
        assert_eq!(clip("hello", 10), "hello");
    }

    #[test]
    fn test_clip_counts_chars_not_bytes() {
        assert_eq!(clip("héllo wörld", 6), "héllo…");
    }
}
