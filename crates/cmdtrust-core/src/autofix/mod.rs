//! Auto-fix engine: rewrites a command to remove the mechanically fixable findings.
//!
//! Transforms run in a fixed order over a parsed draft. Each one is
//! independent and may be a no-op. The result is re-rendered only when at
//! least one change was made, so an untouched command comes back verbatim.

mod transforms;

use serde::Serialize;
use tracing::debug;

use crate::document::{parse_document, render_document, Metadata};

pub use transforms::{DEFAULT_BASH_GRANTS, SAFE_WRITE_SCOPE};

/// Outcome of fixing one command
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FixResult {
    pub subject_name: String,
    /// Input text
    pub before: String,
    /// Rewritten text; equal to `before` when nothing changed
    pub after: String,
    /// Human-readable change log in application order
    pub changes_applied: Vec<String>,
}

impl FixResult {
    pub fn is_changed(&self) -> bool {
        !self.changes_applied.is_empty()
    }
}

/// Mutable working copy the transforms operate on
#[derive(Debug, Clone)]
pub(crate) struct FixDraft {
    pub metadata: Metadata,
    pub body: String,
}

/// Applies the fix transforms
pub struct AutoFixer;

impl AutoFixer {
    /// Fix raw command text
    pub fn fix_command(name: &str, raw_text: &str) -> FixResult {
        let doc = parse_document(raw_text);
        let mut draft = FixDraft {
            metadata: doc.metadata,
            body: doc.body,
        };

        let mut changes_applied = Vec::new();
        for transform in transforms::TRANSFORMS {
            let changes = (transform.apply)(&mut draft);
            if !changes.is_empty() {
                debug!(subject = name, transform = transform.name, changes = changes.len(), "applied fix");
            }
            changes_applied.extend(changes);
        }

        let after = if changes_applied.is_empty() {
            raw_text.to_string()
        } else {
            render_document(&draft.metadata, &draft.body)
        };

        FixResult {
            subject_name: name.to_string(),
            before: raw_text.to_string(),
            after,
            changes_applied,
        }
    }
}

/// Fix raw command text; see [`AutoFixer::fix_command`]
pub fn fix_command(name: &str, raw_text: &str) -> FixResult {
    AutoFixer::fix_command(name, raw_text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{ALLOWED_TOOLS, ARGUMENT_HINT, DESCRIPTION};
    use crate::security::{scan_command, IssueCode};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_clean_command_is_unchanged() {
        let raw = "---\ndescription: Status\nallowed-tools: [Bash(git:*)]\n---\n\n!`git status`";
        let result = fix_command("status", raw);
        assert!(!result.is_changed());
        assert_eq!(result.after, raw);
        assert_eq!(result.before, raw);
    }

    #[test]
    fn test_bash_wildcard_restricted_once() {
        let raw = "---\ndescription: Run\nallowed-tools: [Bash(*)]\n---\n!`ls`";
        let first = fix_command("run", raw);
        assert_eq!(
            first.after,
            "---\ndescription: Run\nallowed-tools: [Bash(git:*), Bash(npm:*), Bash(ls:*), Bash(cat:*)]\n---\n\n!`ls`\n"
        );
        assert!(first.changes_applied.iter().any(|c| c.contains("Restricted Bash(*)")));

        let grants = parse_document(&first.after).metadata.list(ALLOWED_TOOLS);
        assert!(grants.iter().all(|g| g != "Bash(*)"));
        assert!(grants.iter().any(|g| g.starts_with("Bash(")));

        let second = fix_command("run", &first.after);
        assert!(!second.changes_applied.iter().any(|c| c.contains("Bash")));
        assert_eq!(second.after, first.after);
    }

    #[test]
    fn test_fix_removes_fixable_findings() {
        let raw = "---\ndescription: Deploy\n---\n!`echo $1`";
        let result = fix_command("deploy", raw);
        assert_eq!(
            result.after,
            "---\ndescription: Deploy\nargument-hint: \"[arg1]\"\n---\n\n!`echo \"$1\"`\n"
        );
        assert_eq!(result.changes_applied.len(), 2);

        let rescan = scan_command("deploy", &result.after, None);
        let codes: Vec<IssueCode> = rescan.issues.iter().map(|i| i.code).collect();
        // Missing Bash permission needs a human decision
        assert_eq!(codes, vec![IssueCode::MissingBashPermission]);
    }

    #[test]
    fn test_multi_line_description_survives_fix() {
        let raw = "---\ndescription: Deploy the app\n  note: needs creds\nallowed-tools: [Bash(*)]\n---\n!`ls`";
        let result = fix_command("deploy", raw);
        let doc = parse_document(&result.after);
        assert_eq!(doc.metadata.text(DESCRIPTION), Some("Deploy the app\nnote: needs creds"));
        let keys: Vec<&str> = doc.metadata.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![DESCRIPTION, ALLOWED_TOOLS]);

        let raw = "---\ndescription: Helper\n  allowed-tools: [Bash(*)]\n---\nSummarize $1";
        let result = fix_command("helper", raw);
        assert_eq!(result.changes_applied, vec!["Added argument-hint: [arg1]"]);
        assert!(parse_document(&result.after).tool_grants().is_empty());
    }

    #[test]
    fn test_synthesizes_metadata_without_frontmatter() {
        let raw = "# Deploy the app\n\nRuns against $2 then $1";
        let result = fix_command("deploy", raw);
        let doc = parse_document(&result.after);
        assert_eq!(doc.metadata.text(ARGUMENT_HINT), Some("[arg1] [arg2]"));
        assert_eq!(doc.metadata.text(DESCRIPTION), Some("Deploy the app"));
        assert_eq!(doc.body, "# Deploy the app\n\nRuns against $2 then $1");
    }

    #[test]
    fn test_fix_is_stable_on_second_pass() {
        let raw = "---\nallowed-tools: [Bash(*), Write(*), Edit(*)]\n---\nFix $ARGUMENTS\n!`grep -r $1 src`";
        let first = fix_command("fixer", raw);
        assert!(first.is_changed());
        let second = fix_command("fixer", &first.after);
        assert!(!second.is_changed(), "{:?}", second.changes_applied);
        assert_eq!(second.after, first.after);
    }
}
