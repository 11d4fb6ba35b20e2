//! SecurityScanner: parses a slash-command and scores it against the command rules.

use tracing::debug;

use super::patterns::is_curated_source;
use super::rules;
use super::types::{ScanResult, TrustLevel};
use crate::document::{parse_document, ParsedDocument};

/// Starting score before any deduction
const BASE_SCORE: i32 = 100;
/// Deducted when a source is given but is not curated
const UNKNOWN_SOURCE_PENALTY: i32 = 30;
/// Added when the source is curated
const CURATED_SOURCE_BONUS: i32 = 10;

/// Scores slash-command text
pub struct SecurityScanner;

impl SecurityScanner {
    /// Parse and scan raw command text.
    ///
    /// `source_url` is where the command came from; `None` means local and
    /// leaves the score untouched.
    pub fn scan_command(name: &str, raw_text: &str, source_url: Option<&str>) -> ScanResult {
        let doc = parse_document(raw_text);
        Self::scan_document(name, &doc, source_url)
    }

    /// Scan an already parsed document
    pub fn scan_document(name: &str, doc: &ParsedDocument, source_url: Option<&str>) -> ScanResult {
        let mut score = BASE_SCORE;

        match source_url {
            Some(url) if is_curated_source(url) => {
                debug!(subject = name, url, "curated source");
                score = (score + CURATED_SOURCE_BONUS).min(BASE_SCORE);
            }
            Some(url) => {
                debug!(subject = name, url, "source not in curated list");
                score -= UNKNOWN_SOURCE_PENALTY;
            }
            None => {}
        }

        let mut issues = Vec::new();
        rules::check_all_command_rules(doc, &mut issues);

        let penalty: i32 = issues.iter().map(|i| i32::from(i.severity.penalty())).sum();
        let trust_score = (score - penalty).clamp(0, BASE_SCORE) as u8;
        let trust_level = TrustLevel::from_score(trust_score);

        debug!(
            subject = name,
            issues = issues.len(),
            penalty,
            trust_score,
            %trust_level,
            "scanned command"
        );

        ScanResult {
            subject_name: name.to_string(),
            trust_score,
            trust_level,
            issues,
        }
    }
}

/// Scan raw command text; see [`SecurityScanner::scan_command`]
pub fn scan_command(name: &str, raw_text: &str, source_url: Option<&str>) -> ScanResult {
    SecurityScanner::scan_command(name, raw_text, source_url)
}
