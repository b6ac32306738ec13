//! Report formatting and printing utilities.
//!
//! Issues are printed cargo-style, followed by one line per language leg and
//! a closing summary. Kept apart from the engine so locsync can be used as a
//! library.

use std::io::{self, Write};

use colored::Colorize;
use unicode_width::UnicodeWidthStr;

use super::commands::{CommandResult, CommandSummary, InitSummary};
use crate::config::CONFIG_FILE_NAME;
use crate::core::{LanguageSummary, LegStatus, SyncReport};
use crate::issues::{Issue, Report, ReportLocation, Severity};

/// Success mark for consistent output formatting.
pub const SUCCESS_MARK: &str = "\u{2713}"; // ✓

/// Failure mark for consistent output formatting.
pub const FAILURE_MARK: &str = "\u{2718}"; // ✘

/// Arrow between a language and the one it was translated from.
const FROM_MARK: &str = "\u{2190}"; // ←

/// Print issues in cargo-style format, followed by a problem count.
pub fn report_to<W: Write>(issues: &[Issue], writer: &mut W) {
    if issues.is_empty() {
        return;
    }

    let mut sorted = issues.to_vec();
    sorted.sort();

    for issue in &sorted {
        print_issue(issue, writer);
    }

    print_summary(&sorted, writer);
}

pub fn print(result: &CommandResult, verbose: bool) {
    let mut stdout = io::stdout().lock();
    match &result.summary {
        CommandSummary::Sync(report) => {
            report_to(&result.issues, &mut stdout);
            print_sync_to(report, verbose, &mut stdout);
        }
        CommandSummary::Check(report) => {
            report_to(&result.issues, &mut stdout);
            print_check_to(report, verbose, &mut stdout);
        }
        CommandSummary::Init(summary) => print_init(summary),
    }
}

/// Per-language lines and the closing line of a `sync` run.
pub fn print_sync_to<W: Write>(report: &SyncReport, verbose: bool, writer: &mut W) {
    print_languages(report, verbose, writer);

    if report.dry_run {
        print_pending_total(report, writer);
        return;
    }

    if report.has_failures() {
        let _ = writeln!(
            writer,
            "{} {}",
            FAILURE_MARK.red(),
            "Sync finished with failures".red()
        );
        return;
    }

    let languages = report.languages.len();
    let translated = report.total_translated();
    let _ = writeln!(
        writer,
        "{} {}",
        SUCCESS_MARK.green(),
        format!(
            "Synced {} {}, {} {} translated",
            languages,
            plural(languages, "language", "languages"),
            translated,
            plural(translated, "leaf", "leaves")
        )
        .green()
    );
}

/// Per-language lines and the closing line of a `check` run.
pub fn print_check_to<W: Write>(report: &SyncReport, verbose: bool, writer: &mut W) {
    print_languages(report, verbose, writer);
    print_pending_total(report, writer);
}

// ============================================================
// Internal Functions
// ============================================================

fn print_issue<W: Write>(issue: &Issue, writer: &mut W) {
    let severity_str = match issue.report_severity() {
        Severity::Error => "error".bold().red(),
        Severity::Warning => "warning".bold().yellow(),
        Severity::Info => "info".bold().blue(),
    };

    let _ = writeln!(
        writer,
        "{}: {}  {}",
        severity_str,
        issue.message(),
        issue.report_rule().to_string().dimmed().cyan()
    );

    match issue.location() {
        ReportLocation::Leaf { lang, path } => {
            let _ = writeln!(writer, "  {} {}:{}", "-->".blue(), lang, path);
        }
        ReportLocation::Language { lang } => {
            let _ = writeln!(writer, "  {} {}", "-->".blue(), lang);
        }
        ReportLocation::Run => {}
    }

    if let Some(details) = issue.details() {
        let _ = writeln!(writer, "  {} {} {}", "=".blue(), "note:".bold(), details);
    }

    let _ = writeln!(writer);
}

fn print_summary<W: Write>(issues: &[Issue], writer: &mut W) {
    let total_errors = issues
        .iter()
        .filter(|i| i.report_severity() == Severity::Error)
        .count();
    let total_warnings = issues
        .iter()
        .filter(|i| i.report_severity() == Severity::Warning)
        .count();
    let total_problems = total_errors + total_warnings;

    if total_problems > 0 {
        let _ = writeln!(
            writer,
            "{} {} problems ({} {}, {} {})\n",
            FAILURE_MARK.red(),
            total_problems,
            total_errors,
            plural(total_errors, "error", "errors").red(),
            total_warnings,
            plural(total_warnings, "warning", "warnings").yellow()
        );
    }
}

fn print_languages<W: Write>(report: &SyncReport, verbose: bool, writer: &mut W) {
    let width = report
        .languages
        .iter()
        .map(|s| UnicodeWidthStr::width(leg_label(s).as_str()))
        .max()
        .unwrap_or(0);

    for summary in &report.languages {
        let label = leg_label(summary);
        let padding = width - UnicodeWidthStr::width(label.as_str());
        let _ = writeln!(
            writer,
            "  {}{:padding$}  {}",
            label.bold(),
            "",
            leg_status(summary, verbose),
            padding = padding
        );
    }
    if !report.languages.is_empty() {
        let _ = writeln!(writer);
    }
}

fn leg_label(summary: &LanguageSummary) -> String {
    format!("{} {} {}", summary.lang, FROM_MARK, summary.upstream)
}

fn leg_status(summary: &LanguageSummary, verbose: bool) -> String {
    match &summary.status {
        LegStatus::Failed(_) => format!("{} failed", FAILURE_MARK).red().to_string(),
        LegStatus::Skipped => "skipped".yellow().to_string(),
        LegStatus::Planned if summary.pending == 0 => "up to date".green().to_string(),
        LegStatus::Planned => {
            let mut parts = vec![format!("{} pending", summary.pending)];
            if summary.pruned > 0 {
                parts.push(format!("{} to prune", summary.pruned));
            }
            if verbose {
                parts.push(format!("{} unchanged", summary.preserved));
            }
            parts.join(", ").yellow().to_string()
        }
        LegStatus::Synced => {
            let mut parts = vec![format!("{} translated", summary.translated)];
            if summary.copied > 0 {
                parts.push(format!("{} copied", summary.copied));
            }
            if summary.forced > 0 {
                parts.push(format!("{} forced", summary.forced));
            }
            if summary.fallbacks > 0 {
                parts.push(format!("{} fallback", summary.fallbacks));
            }
            if summary.pruned > 0 {
                parts.push(format!("{} pruned", summary.pruned));
            }
            if verbose {
                parts.push(format!("{} unchanged", summary.preserved));
            }
            let text = parts.join(", ");
            if summary.failed > 0 {
                format!("{}, {}", text, format!("{} failed", summary.failed).red())
            } else {
                text
            }
        }
    }
}

fn print_pending_total<W: Write>(report: &SyncReport, writer: &mut W) {
    let pending = report.pending_count();
    if pending == 0 && !report.has_failures() {
        let _ = writeln!(
            writer,
            "{} {}",
            SUCCESS_MARK.green(),
            "All locales are up to date".green()
        );
        return;
    }

    let languages = report
        .languages
        .iter()
        .filter(|s| s.has_pending_work())
        .count();
    let _ = writeln!(
        writer,
        "{} {} pending in {} {} (run {} to apply)",
        FAILURE_MARK.red(),
        format!("{} {}", pending, plural(pending, "leaf", "leaves")).bold(),
        languages,
        plural(languages, "language", "languages"),
        "locsync sync".cyan()
    );
}

fn print_init(summary: &InitSummary) {
    match &summary.error {
        Some(error) => eprintln!("Error: {}", error),
        None => println!(
            "{} {}",
            SUCCESS_MARK.green(),
            format!("Created {}", CONFIG_FILE_NAME).green()
        ),
    }
}

fn plural<'a>(count: usize, one: &'a str, many: &'a str) -> &'a str {
    if count == 1 { one } else { many }
}

// ============================================================
// Tests
// ============================================================
