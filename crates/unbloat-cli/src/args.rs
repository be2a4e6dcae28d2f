/// Command-line arguments.
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use unbloat_core::AnalysisConfig;

#[derive(Parser, Debug)]
#[command(name = "unbloat")]
#[command(author, version, about = "Find, verify and remove unreferenced asset directories", long_about = None)]
pub struct Cli {
    /// Project root (the directory containing `Assets/`)
    #[arg(short, long, global = true, default_value = ".")]
    pub project: PathBuf,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Answer yes to every confirmation
    #[arg(short, long, global = true)]
    pub yes: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Append a CSV row for every deletion attempt to this file
    #[arg(long, global = true)]
    pub audit_log: Option<PathBuf>,

    /// Report only the outermost of nested unused directories
    #[arg(long, global = true)]
    pub collapse_nested: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List unused directories and their total size
    Analyze,

    /// Scan build scenes for references into a candidate directory
    Check {
        /// Candidate directory, e.g. `Assets/Unused/Foo`
        #[arg(required_unless_present = "all")]
        path: Option<String>,

        /// Check every candidate
        #[arg(long, conflicts_with = "path")]
        all: bool,
    },

    /// Delete one candidate directory and its metadata file
    Delete { path: String },

    /// Delete every candidate directory
    DeleteAll,

    /// Browse results and act on them one at a time
    Interactive,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl Cli {
    /// The subcommand to run; interactive when none was given.
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Interactive)
    }

    /// Apply flag overrides on top of the project's configuration file.
    pub fn apply_overrides(&self, mut config: AnalysisConfig) -> AnalysisConfig {
        if let Some(path) = &self.audit_log {
            config.audit_log = Some(path.clone());
        }
        if self.collapse_nested {
            config.collapse_nested = true;
        }
        config
    }
}
