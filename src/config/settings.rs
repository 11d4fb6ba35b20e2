use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cmdtrust_core::{DefinitionKind, TrustLevel};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Screen Claude Code slash-commands and hooks before trusting them"
)]
pub struct Config {
    /// Enable debug mode
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Fail when a command scores below this trust level
    #[arg(long, global = true)]
    pub fail_below: Option<TrustLevel>,

    /// Treat yellow and red hooks as failures
    #[arg(long, global = true)]
    pub fail_on_warning: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Score slash-command files
    Scan {
        /// Command markdown files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Where the commands came from (repository URL or owner/repo)
        #[arg(long)]
        source_url: Option<String>,
    },
    /// Rewrite a command to remove fixable findings
    Fix {
        /// Command markdown file
        file: PathBuf,

        /// Write the fixed text back to the file
        #[arg(long)]
        write: bool,
    },
    /// Validate hooks from a settings JSON file, a hook object or hook frontmatter
    Hooks {
        /// settings.json, hook JSON or hook markdown
        file: PathBuf,
    },
    /// Strict-parse an agent or skill definition and score its body
    Agent {
        /// Definition markdown file
        file: PathBuf,

        /// Definition kind
        #[arg(long, default_value = "agent")]
        kind: DefinitionKind,

        /// Where the definition came from
        #[arg(long)]
        source_url: Option<String>,
    },
}

impl Config {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// Application settings (from config file)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Command scanning settings
    #[serde(default)]
    pub scan: ScanSettings,

    /// Hook validation settings
    #[serde(default)]
    pub hooks: HookSettings,

    /// Output settings
    #[serde(default)]
    pub output: OutputSettings,
}

/// Command scanning settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSettings {
    /// Lowest trust level that passes
    #[serde(default = "default_fail_below")]
    pub fail_below: TrustLevel,

    /// Source assumed when `--source-url` is not given
    #[serde(default)]
    pub source_url: Option<String>,
}

fn default_fail_below() -> TrustLevel {
    TrustLevel::Unknown
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            fail_below: default_fail_below(),
            source_url: None,
        }
    }
}

/// Hook validation settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HookSettings {
    /// Fail on yellow hooks as well as invalid ones
    #[serde(default)]
    pub fail_on_warning: bool,
}

/// Output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Output settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(default)]
    pub format: OutputFormat,
}

impl Settings {
    /// Load settings from config file or use defaults
    pub fn load(path: Option<&PathBuf>) -> Result<Self> {
        // Try custom path first
        if let Some(p) = path {
            if p.exists() {
                return Self::load_file(p);
            }
        }

        // Try default config locations
        let default_paths = [
            dirs::config_dir().map(|p| p.join("cmdtrust/config.toml")),
            dirs::home_dir().map(|p| p.join(".config/cmdtrust/config.toml")),
            dirs::home_dir().map(|p| p.join(".cmdtrust.toml")),
        ];

        for path in default_paths.iter().flatten() {
            if path.exists() {
                return Self::load_file(path);
            }
        }

        // Return defaults if no config file found
        Ok(Self::default())
    }

    fn load_file(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    /// Merge CLI config into settings (CLI takes precedence)
    pub fn merge_cli(&mut self, cli: &Config) {
        if cli.json {
            self.output.format = OutputFormat::Json;
        }
        if let Some(level) = cli.fail_below {
            self.scan.fail_below = level;
        }
        if cli.fail_on_warning {
            self.hooks.fail_on_warning = true;
        }
    }

    /// Normalize settings values
    ///
    /// A blank default source is treated as no source.
    pub fn validate(&mut self) {
        self.scan.source_url = self
            .scan
            .source_url
            .take()
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());
    }
}
