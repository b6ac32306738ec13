//! Issue types collected during a sync run.
//!
//! Each issue is self-contained with everything the reporter needs to print
//! it. None of them aborts a run; fatal errors travel as `anyhow::Error`.

use enum_dispatch::enum_dispatch;

// ============================================================
// Severity and Rule
// ============================================================

/// Severity level of an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// Rule identifier for each issue type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Rule {
    TargetSkipped,
    TargetFailed,
    LeafFailed,
    SpecialCharFallback,
    ShapeConflict,
    UnknownForcedPath,
    PrunedKey,
}

impl std::fmt::Display for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rule::TargetSkipped => write!(f, "target-skipped"),
            Rule::TargetFailed => write!(f, "target-failed"),
            Rule::LeafFailed => write!(f, "leaf-failed"),
            Rule::SpecialCharFallback => write!(f, "special-char-fallback"),
            Rule::ShapeConflict => write!(f, "shape-conflict"),
            Rule::UnknownForcedPath => write!(f, "unknown-forced-path"),
            Rule::PrunedKey => write!(f, "pruned-key"),
        }
    }
}

// ============================================================
// Issue Types - Leaf level
// ============================================================

/// Provider failed for one leaf; the target keeps its previous value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafFailedIssue {
    pub lang: String,
    pub path: String,
    pub reason: String,
}

impl LeafFailedIssue {
    pub fn severity() -> Severity {
        Severity::Error
    }

    pub fn rule() -> Rule {
        Rule::LeafFailed
    }
}

/// Translation dropped special characters; the upstream value was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecialCharFallbackIssue {
    pub lang: String,
    pub path: String,
}

impl SpecialCharFallbackIssue {
    pub fn severity() -> Severity {
        Severity::Warning
    }

    pub fn rule() -> Rule {
        Rule::SpecialCharFallback
    }
}

/// Target held a leaf where upstream has a mapping, or the reverse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeConflictIssue {
    pub lang: String,
    pub path: String,
}

impl ShapeConflictIssue {
    pub fn severity() -> Severity {
        Severity::Warning
    }

    pub fn rule() -> Rule {
        Rule::ShapeConflict
    }
}

/// Key removed from a target because upstream no longer has it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrunedKeyIssue {
    pub lang: String,
    pub path: String,
}

impl PrunedKeyIssue {
    pub fn severity() -> Severity {
        Severity::Info
    }

    pub fn rule() -> Rule {
        Rule::PrunedKey
    }
}

// ============================================================
// Issue Types - Language level
// ============================================================

/// A whole target language could not be processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetFailedIssue {
    pub lang: String,
    pub reason: String,
}

impl TargetFailedIssue {
    pub fn severity() -> Severity {
        Severity::Error
    }

    pub fn rule() -> Rule {
        Rule::TargetFailed
    }
}

/// Target not attempted because the pivot leg failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSkippedIssue {
    pub lang: String,
    pub pivot: String,
}

impl TargetSkippedIssue {
    pub fn severity() -> Severity {
        Severity::Error
    }

    pub fn rule() -> Rule {
        Rule::TargetSkipped
    }
}

// ============================================================
// Issue Types - Run level
// ============================================================

/// `--force` path that matches nothing in the source tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownForcedPathIssue {
    pub path: String,
}

impl UnknownForcedPathIssue {
    pub fn severity() -> Severity {
        Severity::Warning
    }

    pub fn rule() -> Rule {
        Rule::UnknownForcedPath
    }
}

// ============================================================
// Issue Enum
// ============================================================

/// A diagnostic collected during a sync run.
#[enum_dispatch(Report)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Issue {
    LeafFailed(LeafFailedIssue),
    SpecialCharFallback(SpecialCharFallbackIssue),
    ShapeConflict(ShapeConflictIssue),
    PrunedKey(PrunedKeyIssue),
    TargetFailed(TargetFailedIssue),
    TargetSkipped(TargetSkippedIssue),
    UnknownForcedPath(UnknownForcedPathIssue),
}

impl Issue {
    pub fn severity(&self) -> Severity {
        match self {
            Issue::LeafFailed(_) => LeafFailedIssue::severity(),
            Issue::SpecialCharFallback(_) => SpecialCharFallbackIssue::severity(),
            Issue::ShapeConflict(_) => ShapeConflictIssue::severity(),
            Issue::PrunedKey(_) => PrunedKeyIssue::severity(),
            Issue::TargetFailed(_) => TargetFailedIssue::severity(),
            Issue::TargetSkipped(_) => TargetSkippedIssue::severity(),
            Issue::UnknownForcedPath(_) => UnknownForcedPathIssue::severity(),
        }
    }

    pub fn rule(&self) -> Rule {
        match self {
            Issue::LeafFailed(_) => LeafFailedIssue::rule(),
            Issue::SpecialCharFallback(_) => SpecialCharFallbackIssue::rule(),
            Issue::ShapeConflict(_) => ShapeConflictIssue::rule(),
            Issue::PrunedKey(_) => PrunedKeyIssue::rule(),
            Issue::TargetFailed(_) => TargetFailedIssue::rule(),
            Issue::TargetSkipped(_) => TargetSkippedIssue::rule(),
            Issue::UnknownForcedPath(_) => UnknownForcedPathIssue::rule(),
        }
    }
}

// ============================================================
// Report Trait (for CLI output)
// ============================================================

/// Where an issue applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportLocation<'a> {
    /// One leaf of one language.
    Leaf { lang: &'a str, path: &'a str },
    /// A whole language.
    Language { lang: &'a str },
    /// The run as a whole.
    Run,
}

/// Trait for types that can be reported to CLI.
///
/// Uses `enum_dispatch` for zero-cost dispatch on the `Issue` enum.
#[enum_dispatch]
pub trait Report {
    fn location(&self) -> ReportLocation<'_>;

    /// Primary message to display.
    fn message(&self) -> String;

    fn report_severity(&self) -> Severity;

    fn report_rule(&self) -> Rule;

    /// Optional details for the "= note:" line.
    fn details(&self) -> Option<String> {
        None
    }
}

// ============================================================
// Report Implementations
// ============================================================

impl Report for LeafFailedIssue {
    fn location(&self) -> ReportLocation<'_> {
        ReportLocation::Leaf {
            lang: &self.lang,
            path: &self.path,
        }
    }

    fn message(&self) -> String {
        "translation failed, previous value kept".to_string()
    }

    fn report_severity(&self) -> Severity {
        Self::severity()
    }

    fn report_rule(&self) -> Rule {
        Self::rule()
    }

    fn details(&self) -> Option<String> {
        Some(self.reason.clone())
    }
}

impl Report for SpecialCharFallbackIssue {
    fn location(&self) -> ReportLocation<'_> {
        ReportLocation::Leaf {
            lang: &self.lang,
            path: &self.path,
        }
    }

    fn message(&self) -> String {
        "translation dropped special characters, upstream value written".to_string()
    }

    fn report_severity(&self) -> Severity {
        Self::severity()
    }

    fn report_rule(&self) -> Rule {
        Self::rule()
    }
}

impl Report for ShapeConflictIssue {
    fn location(&self) -> ReportLocation<'_> {
        ReportLocation::Leaf {
            lang: &self.lang,
            path: &self.path,
        }
    }

    fn message(&self) -> String {
        "target shape differs from upstream, replaced".to_string()
    }

    fn report_severity(&self) -> Severity {
        Self::severity()
    }

    fn report_rule(&self) -> Rule {
        Self::rule()
    }
}

impl Report for PrunedKeyIssue {
    fn location(&self) -> ReportLocation<'_> {
        ReportLocation::Leaf {
            lang: &self.lang,
            path: &self.path,
        }
    }

    fn message(&self) -> String {
        "removed, no longer present upstream".to_string()
    }

    fn report_severity(&self) -> Severity {
        Self::severity()
    }

    fn report_rule(&self) -> Rule {
        Self::rule()
    }
}

impl Report for TargetFailedIssue {
    fn location(&self) -> ReportLocation<'_> {
        ReportLocation::Language { lang: &self.lang }
    }

    fn message(&self) -> String {
        "language could not be synchronized".to_string()
    }

    fn report_severity(&self) -> Severity {
        Self::severity()
    }

    fn report_rule(&self) -> Rule {
        Self::rule()
    }

    fn details(&self) -> Option<String> {
        Some(self.reason.clone())
    }
}

impl Report for TargetSkippedIssue {
    fn location(&self) -> ReportLocation<'_> {
        ReportLocation::Language { lang: &self.lang }
    }

    fn message(&self) -> String {
        format!("skipped because pivot '{}' failed", self.pivot)
    }

    fn report_severity(&self) -> Severity {
        Self::severity()
    }

    fn report_rule(&self) -> Rule {
        Self::rule()
    }
}

impl Report for UnknownForcedPathIssue {
    fn location(&self) -> ReportLocation<'_> {
        ReportLocation::Run
    }

    fn message(&self) -> String {
        format!("forced path '{}' matches nothing in the source", self.path)
    }

    fn report_severity(&self) -> Severity {
        Self::severity()
    }

    fn report_rule(&self) -> Rule {
        Self::rule()
    }
}

// ============================================================
// Ordering for Issue (for sorting in reports)
// ============================================================

impl Issue {
    fn sort_lang(&self) -> Option<&str> {
        match self.location() {
            ReportLocation::Leaf { lang, .. } | ReportLocation::Language { lang } => Some(lang),
            ReportLocation::Run => None,
        }
    }

    fn sort_path(&self) -> &str {
        match self.location() {
            ReportLocation::Leaf { path, .. } => path,
            _ => "",
        }
    }
}

impl Ord for Issue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use std::cmp::Ordering;

        // Run-level first, then by language, severity, path, message
        match (self.sort_lang(), other.sort_lang()) {
            (Some(a), Some(b)) => a
                .cmp(b)
                .then_with(|| self.severity().cmp(&other.severity()))
                .then_with(|| self.sort_path().cmp(other.sort_path()))
                .then_with(|| self.rule().cmp(&other.rule()))
                .then_with(|| self.message().cmp(&other.message())),
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (None, None) => self
                .rule()
                .cmp(&other.rule())
                .then_with(|| self.message().cmp(&other.message())),
        }
    }
}

impl PartialOrd for Issue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

// ============================================================
// Tests
// ============================================================
