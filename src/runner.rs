//! Subcommand execution: read inputs, run the core checks, render output
//! and decide the exit status.

use std::io::Write;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use cmdtrust_core::{
    fix_command, hooks_from_settings, parse_definition, parse_document, scan_command,
    validate_hook, DefinitionKind, HookDefinition, HookScore, ScanResult, SecurityScanner,
};
use serde_json::Value;
use tracing::{info, warn};

use crate::config::{Command, OutputFormat, Settings};
use crate::report::{self, HookReport};

/// Whether the checked artifacts passed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Pass,
    Fail,
}

impl Outcome {
    pub fn exit_code(self) -> ExitCode {
        match self {
            Outcome::Pass => ExitCode::SUCCESS,
            Outcome::Fail => ExitCode::from(1),
        }
    }

    fn from_failed(failed: bool) -> Self {
        if failed {
            Outcome::Fail
        } else {
            Outcome::Pass
        }
    }
}

/// Run a subcommand, writing its report to `out`
pub fn run(command: &Command, settings: &Settings, out: &mut dyn Write) -> Result<Outcome> {
    match command {
        Command::Scan { files, source_url } => {
            let source = source_url.as_deref().or(settings.scan.source_url.as_deref());
            run_scan(files.as_slice(), source, settings, out)
        }
        Command::Fix { file, write } => run_fix(file, *write, settings, out),
        Command::Hooks { file } => run_hooks(file, settings, out),
        Command::Agent {
            file,
            kind,
            source_url,
        } => {
            let source = source_url.as_deref().or(settings.scan.source_url.as_deref());
            run_agent(file, *kind, source, settings, out)
        }
    }
}

fn read_input(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// File stem used as the subject name
fn subject_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn emit(out: &mut dyn Write, text: &str) -> Result<()> {
    out.write_all(text.as_bytes())
        .context("Failed to write output")
}

fn below_threshold(result: &ScanResult, settings: &Settings) -> bool {
    result.trust_level < settings.scan.fail_below
}

/// Score each command file
pub fn run_scan(
    files: &[impl AsRef<Path>],
    source_url: Option<&str>,
    settings: &Settings,
    out: &mut dyn Write,
) -> Result<Outcome> {
    let mut results = Vec::with_capacity(files.len());
    for path in files {
        let path = path.as_ref();
        let text = read_input(path)?;
        let result = scan_command(&subject_name(path), &text, source_url);
        info!(
            file = %path.display(),
            score = result.trust_score,
            level = %result.trust_level,
            issues = result.issues.len(),
            "scanned command"
        );
        results.push(result);
    }

    let failed = results.iter().any(|r| below_threshold(r, settings));
    if failed {
        warn!(threshold = %settings.scan.fail_below, "command below trust threshold");
    }

    match settings.output.format {
        OutputFormat::Json => emit(out, &(report::to_json(&results)? + "\n"))?,
        OutputFormat::Text => {
            for result in &results {
                emit(out, &report::scan_text(result))?;
            }
        }
    }

    Ok(Outcome::from_failed(failed))
}

/// Fix one command file, optionally writing it back
pub fn run_fix(path: &Path, write: bool, settings: &Settings, out: &mut dyn Write) -> Result<Outcome> {
    let text = read_input(path)?;
    let result = fix_command(&subject_name(path), &text);
    info!(file = %path.display(), changes = result.changes_applied.len(), "fixed command");

    let written = write && result.is_changed();
    if written {
        std::fs::write(path, &result.after)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(file = %path.display(), "wrote fixed command");
    }

    match settings.output.format {
        OutputFormat::Json => emit(out, &(report::to_json(&result)? + "\n"))?,
        OutputFormat::Text => emit(out, &report::fix_text(&result, !written))?,
    }

    Ok(Outcome::Pass)
}

/// Hooks from a settings file, a single hook object, an array of hook
/// objects, or hook frontmatter
fn load_hooks(path: &Path, text: &str) -> Result<Vec<HookDefinition>> {
    let is_json = path.extension().is_some_and(|e| e == "json")
        || text.trim_start().starts_with(['{', '[']);

    if !is_json {
        let doc = parse_document(text);
        return Ok(vec![HookDefinition::from_document(&doc)]);
    }

    let value: Value = serde_json::from_str(text)
        .with_context(|| format!("Failed to parse hook JSON: {}", path.display()))?;

    let hooks = match &value {
        Value::Object(map) if map.contains_key("hooks") => hooks_from_settings(&value),
        Value::Object(_) => vec![HookDefinition::from_value(&value)],
        Value::Array(items) => items.iter().map(HookDefinition::from_value).collect(),
        _ => Vec::new(),
    };
    Ok(hooks)
}

/// Validate every hook in a file
pub fn run_hooks(path: &Path, settings: &Settings, out: &mut dyn Write) -> Result<Outcome> {
    let text = read_input(path)?;
    let hooks = load_hooks(path, &text)?;
    if hooks.is_empty() {
        warn!(file = %path.display(), "no hooks found");
    }

    let reports: Vec<HookReport> = hooks
        .into_iter()
        .map(|hook| HookReport {
            result: validate_hook(&hook),
            hook,
        })
        .collect();

    let failed = reports.iter().any(|r| {
        !r.result.valid || (settings.hooks.fail_on_warning && r.result.score != HookScore::Green)
    });
    info!(file = %path.display(), hooks = reports.len(), failed, "validated hooks");

    match settings.output.format {
        OutputFormat::Json => emit(out, &(report::to_json(&reports)? + "\n"))?,
        OutputFormat::Text => emit(out, &report::hooks_text(&reports))?,
    }

    Ok(Outcome::from_failed(failed))
}

/// Strict-parse an agent or skill definition and score its body
pub fn run_agent(
    path: &Path,
    kind: DefinitionKind,
    source_url: Option<&str>,
    settings: &Settings,
    out: &mut dyn Write,
) -> Result<Outcome> {
    let text = read_input(path)?;
    let doc = parse_definition(&text, kind)
        .with_context(|| format!("Invalid {} definition: {}", kind, path.display()))?;

    let name = doc
        .metadata
        .text(cmdtrust_core::document::NAME)
        .map(str::to_string)
        .unwrap_or_else(|| subject_name(path));
    let result = SecurityScanner::scan_document(&name, &doc, source_url);
    info!(
        file = %path.display(),
        %kind,
        score = result.trust_score,
        level = %result.trust_level,
        "scanned definition"
    );

    let failed = below_threshold(&result, settings);
    match settings.output.format {
        OutputFormat::Json => emit(out, &(report::to_json(&result)? + "\n"))?,
        OutputFormat::Text => emit(out, &report::scan_text(&result))?,
    }

    Ok(Outcome::from_failed(failed))
}
