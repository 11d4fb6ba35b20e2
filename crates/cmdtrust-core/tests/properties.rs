use cmdtrust_core::autofix::{DEFAULT_BASH_GRANTS, SAFE_WRITE_SCOPE};
use cmdtrust_core::document::syntax::quote_positional_args;
use cmdtrust_core::{fix_command, parse_document, scan_command, TrustLevel};
use proptest::prelude::*;

const BODY_LINES: &[&str] = &[
    "Deploy the app",
    "# Release checklist",
    "!`echo $1`",
    "!`git log --oneline -n 5`",
    "!`rm -rf build`",
    "@src/lib.rs",
    "Use $ARGUMENTS carefully",
    "Compare $2 with \"$1\"",
    "",
];

const GRANTS: &[&str] = &[
    "Read",
    "Bash(*)",
    "Bash(git:*)",
    "Write(*)",
    "Edit(*)",
    "Bash(git add, git commit)",
    "\"Read, Grep\"",
];

/// Indented lines that continue the description value
const CONTINUATIONS: &[&str] = &[
    "  note: needs creds",
    "  allowed-tools: [Bash(*)]",
    "  argument-hint: [x]",
    "  and then some",
];

fn description() -> impl Strategy<Value = String> {
    (
        "[A-Za-z ]{1,20}",
        proptest::collection::vec(proptest::sample::select(CONTINUATIONS), 0..3),
    )
        .prop_map(|(first, rest)| {
            let mut lines = vec![first];
            lines.extend(rest.into_iter().map(str::to_string));
            lines.join("\n")
        })
}

fn command_text() -> impl Strategy<Value = String> {
    (
        proptest::sample::subsequence(GRANTS, 0..=GRANTS.len()),
        proptest::option::of(description()),
        proptest::collection::vec(proptest::sample::select(BODY_LINES), 0..6),
    )
        .prop_map(|(grants, description, lines)| {
            let mut text = String::from("---\n");
            if !grants.is_empty() {
                text.push_str(&format!("allowed-tools: [{}]\n", grants.join(", ")));
            }
            if let Some(d) = description {
                text.push_str(&format!("description: {}\n", d));
            }
            text.push_str("---\n");
            text.push_str(&lines.join("\n"));
            text
        })
}

fn source() -> impl Strategy<Value = Option<String>> {
    proptest::option::of(prop_oneof![
        Just("https://github.com/anthropics/claude-code".to_string()),
        Just("someone/else".to_string()),
        "[a-z]{1,8}/[a-z]{1,8}",
    ])
}

proptest! {
    #[test]
    fn trust_score_within_bounds(text in ".*", source in source()) {
        let result = scan_command("any", &text, source.as_deref());
        prop_assert!(result.trust_score <= 100);
        prop_assert_eq!(result.trust_level, TrustLevel::from_score(result.trust_score));
    }

    #[test]
    fn trust_score_within_bounds_structured(text in command_text(), source in source()) {
        let result = scan_command("cmd", &text, source.as_deref());
        prop_assert!(result.trust_score <= 100);
    }

    #[test]
    fn scan_is_deterministic(text in command_text(), source in source()) {
        let a = scan_command("cmd", &text, source.as_deref());
        let b = scan_command("cmd", &text, source.as_deref());
        prop_assert_eq!(a, b);
    }

    #[test]
    fn parse_never_panics(text in "\\PC*") {
        let doc = parse_document(&text);
        prop_assert!(doc.body_line >= 1);
    }

    #[test]
    fn quoting_is_idempotent(command in "[a-z $\"0-9A-Z]{0,40}") {
        let (once, _) = quote_positional_args(&command);
        let (twice, quoted) = quote_positional_args(&once);
        prop_assert_eq!(quoted, 0);
        prop_assert_eq!(twice, once);
    }

    #[test]
    fn fixing_twice_changes_nothing(text in command_text()) {
        let first = fix_command("cmd", &text);
        let second = fix_command("cmd", &first.after);
        prop_assert!(!second.is_changed(), "{:?}", second.changes_applied);
        prop_assert_eq!(second.after, first.after);
    }

    #[test]
    fn fixing_keeps_existing_metadata(text in command_text()) {
        let before = parse_document(&text);
        let after = parse_document(&fix_command("cmd", &text).after);
        let synthesized = ["description", "argument-hint"];

        for (key, value) in before.metadata.iter() {
            if key == "allowed-tools" || (value.is_empty() && synthesized.contains(&key)) {
                continue;
            }
            prop_assert_eq!(after.metadata.get(key), Some(value), "key {}", key);
        }
        for (key, _) in after.metadata.iter() {
            prop_assert!(
                before.metadata.get(key).is_some() || synthesized.contains(&key),
                "unexpected key {}", key
            );
        }

        let scoped = [format!("Write({})", SAFE_WRITE_SCOPE), format!("Edit({})", SAFE_WRITE_SCOPE)];
        let original = before.tool_grants();
        for grant in after.tool_grants() {
            prop_assert!(
                original.contains(&grant)
                    || DEFAULT_BASH_GRANTS.contains(&grant.as_str())
                    || scoped.contains(&grant),
                "unexpected grant {}", grant
            );
        }
    }

    #[test]
    fn trust_level_is_monotonic(a in 0u8..=100, b in 0u8..=100) {
        if a <= b {
            prop_assert!(TrustLevel::from_score(a) <= TrustLevel::from_score(b));
        }
    }
}
