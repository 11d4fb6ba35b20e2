//! Security scan types: severity scales, issue codes, issues, trust levels and results.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Severity of a command scanner finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Points deducted from the trust score per finding
    pub fn penalty(self) -> u8 {
        match self {
            Severity::Low => 0,
            Severity::Medium => 5,
            Severity::High => 20,
            Severity::Critical => 50,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Low => write!(f, "LOW"),
            Severity::Medium => write!(f, "MEDIUM"),
            Severity::High => write!(f, "HIGH"),
            Severity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Severity of a hook validator finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HookSeverity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for HookSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookSeverity::Info => write!(f, "INFO"),
            HookSeverity::Warning => write!(f, "WARNING"),
            HookSeverity::Error => write!(f, "ERROR"),
        }
    }
}

/// Category tag of a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueCode {
    MissingDescription,
    MissingArgumentHint,
    MissingBashPermission,
    UnquotedVariable,
    DangerousCommand,
    WildcardPermission,
    PathTraversal,
    CautionCommand,
    MissingHookType,
    InvalidHookType,
    MissingCommand,
    MissingPrompt,
    Timeout,
    UnknownEvent,
}

impl IssueCode {
    pub fn as_str(self) -> &'static str {
        match self {
            IssueCode::MissingDescription => "missing-description",
            IssueCode::MissingArgumentHint => "missing-argument-hint",
            IssueCode::MissingBashPermission => "missing-bash-permission",
            IssueCode::UnquotedVariable => "unquoted-variable",
            IssueCode::DangerousCommand => "dangerous-command",
            IssueCode::WildcardPermission => "wildcard-permission",
            IssueCode::PathTraversal => "path-traversal",
            IssueCode::CautionCommand => "caution-command",
            IssueCode::MissingHookType => "missing-hook-type",
            IssueCode::InvalidHookType => "invalid-hook-type",
            IssueCode::MissingCommand => "missing-command",
            IssueCode::MissingPrompt => "missing-prompt",
            IssueCode::Timeout => "timeout",
            IssueCode::UnknownEvent => "unknown-event",
        }
    }

    /// Codes that force a hook to red regardless of severity
    pub fn is_hook_red_flag(self) -> bool {
        matches!(
            self,
            IssueCode::UnquotedVariable | IssueCode::PathTraversal | IssueCode::DangerousCommand
        )
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single finding, generic over the severity scale
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue<S> {
    /// Severity on the scanner or validator scale
    pub severity: S,
    /// Category tag
    pub code: IssueCode,
    /// One-line summary
    pub message: String,
    /// What to change
    pub recommendation: String,
    /// Whether the auto-fix engine can remove this finding
    pub auto_fixable: bool,
    /// 1-based line in the raw text, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

impl<S> Issue<S> {
    pub fn new(
        severity: S,
        code: IssueCode,
        message: impl Into<String>,
        recommendation: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            recommendation: recommendation.into(),
            auto_fixable: false,
            line: None,
        }
    }

    pub fn at_line(mut self, line: Option<usize>) -> Self {
        self.line = line;
        self
    }

    pub fn auto_fixable(mut self) -> Self {
        self.auto_fixable = true;
        self
    }
}

/// Command scanner finding
pub type SecurityIssue = Issue<Severity>;

/// Hook validator finding
pub type HookIssue = Issue<HookSeverity>;

/// Categorical trust derived from the trust score.
///
/// Ordered from least to most trusted so that `level < threshold` reads
/// naturally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrustLevel {
    Dangerous,
    Unknown,
    Curated,
    Trusted,
}

impl TrustLevel {
    /// `≥90` trusted, `≥70` curated, `≥40` unknown, else dangerous
    pub fn from_score(score: u8) -> Self {
        match score {
            90.. => TrustLevel::Trusted,
            70..=89 => TrustLevel::Curated,
            40..=69 => TrustLevel::Unknown,
            _ => TrustLevel::Dangerous,
        }
    }
}

impl fmt::Display for TrustLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrustLevel::Dangerous => write!(f, "dangerous"),
            TrustLevel::Unknown => write!(f, "unknown"),
            TrustLevel::Curated => write!(f, "curated"),
            TrustLevel::Trusted => write!(f, "trusted"),
        }
    }
}

impl FromStr for TrustLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dangerous" => Ok(TrustLevel::Dangerous),
            "unknown" => Ok(TrustLevel::Unknown),
            "curated" => Ok(TrustLevel::Curated),
            "trusted" => Ok(TrustLevel::Trusted),
            other => Err(format!(
                "unknown trust level: {other} (expected dangerous, unknown, curated or trusted)"
            )),
        }
    }
}

/// Result of scanning one command
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanResult {
    /// Name of the scanned artifact
    pub subject_name: String,
    /// 0..=100
    pub trust_score: u8,
    /// Derived from `trust_score`
    pub trust_level: TrustLevel,
    /// Findings in detection order
    pub issues: Vec<SecurityIssue>,
}

impl ScanResult {
    /// Count issues by severity
    pub fn count_by_severity(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }

    /// Get the highest severity found, if any
    pub fn max_severity(&self) -> Option<Severity> {
        self.issues.iter().map(|i| i.severity).max()
    }

    /// Total number of issues
    pub fn total_issues(&self) -> usize {
        self.issues.len()
    }

    /// Check if there are no issues
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Issues the auto-fix engine can address
    pub fn fixable_issues(&self) -> impl Iterator<Item = &SecurityIssue> {
        self.issues.iter().filter(|i| i.auto_fixable)
    }
}

/// Three-tier hook verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HookScore {
    Green,
    Yellow,
    Red,
}

impl HookScore {
    /// Red on any error or red-flag code, yellow on any warning, else green
    pub fn from_issues(issues: &[HookIssue]) -> Self {
        if issues
            .iter()
            .any(|i| i.severity == HookSeverity::Error || i.code.is_hook_red_flag())
        {
            HookScore::Red
        } else if issues.iter().any(|i| i.severity == HookSeverity::Warning) {
            HookScore::Yellow
        } else {
            HookScore::Green
        }
    }
}

impl fmt::Display for HookScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookScore::Green => write!(f, "green"),
            HookScore::Yellow => write!(f, "yellow"),
            HookScore::Red => write!(f, "red"),
        }
    }
}

/// Result of validating one hook
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HookValidationResult {
    /// False iff any issue is an error
    pub valid: bool,
    pub score: HookScore,
    pub issues: Vec<HookIssue>,
}

impl HookValidationResult {
    pub fn from_issues(issues: Vec<HookIssue>) -> Self {
        Self {
            valid: !issues.iter().any(|i| i.severity == HookSeverity::Error),
            score: HookScore::from_issues(&issues),
            issues,
        }
    }
}
