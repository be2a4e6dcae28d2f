/// Command dispatch: wires the engine's ports to the real project and runs
/// one subcommand.
use crate::args::{Cli, Command, OutputFormat};
use crate::prompt::TerminalPrompt;
use crate::{render, session, status};
use anyhow::{anyhow, bail, Context, Result};
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;
use tracing::{info, warn};
use unbloat_core::index::UnityProjectIndex;
use unbloat_core::progress::{CancelToken, ProgressSink};
use unbloat_core::scenes::unity::BUILD_SETTINGS_PATH;
use unbloat_core::scenes::{BuildSettingsCatalog, StaticSceneCatalog, UnitySceneHost};
use unbloat_core::{AnalysisConfig, AssetPath, Coordinator, DeletionReport, LocalStorage, Ports, SceneCatalog};

/// How a command ended, for the process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// Some deletions failed; the rest went through.
    PartialFailure,
}

impl From<Outcome> for ExitCode {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Success => ExitCode::SUCCESS,
            Outcome::PartialFailure => ExitCode::FAILURE,
        }
    }
}

/// Run the parsed command line, with Ctrl+C wired to cancellation.
pub fn run(cli: &Cli) -> Result<ExitCode> {
    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    ctrlc::set_handler(move || handler_token.cancel()).context("Failed to set Ctrl+C handler")?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run_with(cli, cancel, &mut out).map(ExitCode::from)
}

/// Run the parsed command line, writing results to `out`.
pub fn run_with(cli: &Cli, cancel: CancelToken, out: &mut dyn Write) -> Result<Outcome> {
    let project_root = cli
        .project
        .canonicalize()
        .with_context(|| format!("Project directory not found: {}", cli.project.display()))?;
    let config = AnalysisConfig::load(&project_root).context("Failed to load configuration")?;
    let config = cli.apply_overrides(config);
    info!(project = %project_root.display(), "unbloat starting");

    let mut index =
        UnityProjectIndex::open(&project_root, config.asset_root(), &config.sidecar_extension)
            .context("Failed to build the asset index")?;
    let mut host = UnitySceneHost::new(&project_root).with_script_names(index.script_names());
    let catalog = project_catalog(&project_root);
    let mut prompt = TerminalPrompt::new(cli.yes);
    let mut storage = LocalStorage::new(&project_root);

    let (sink, rx) = ProgressSink::channel();
    let renderer = match cli.format {
        OutputFormat::Text => Some(status::spawn_renderer(rx).context("Failed to start status thread")?),
        OutputFormat::Json => None,
    };

    let code = {
        let ports = Ports {
            index: &mut index,
            scenes: &mut host,
            catalog: &*catalog,
            prompt: &mut prompt,
            storage: &mut storage,
        };
        let mut coordinator = Coordinator::new(&project_root, config, ports)
            .context("Failed to start session")?
            .with_cancel(cancel)
            .with_progress(sink);
        execute(cli, &mut coordinator, out)?
    };

    if let Some(handle) = renderer {
        handle.join().map_err(|_| anyhow!("status thread panicked"))?;
    }
    Ok(code)
}

/// Build settings when the project has them, otherwise no scenes.
fn project_catalog(project_root: &Path) -> Box<dyn SceneCatalog> {
    if project_root.join(BUILD_SETTINGS_PATH).is_file() {
        Box::new(BuildSettingsCatalog::for_project(project_root))
    } else {
        warn!("{BUILD_SETTINGS_PATH} not found; reference checks will scan no scenes");
        Box::new(StaticSceneCatalog::default())
    }
}

fn execute(cli: &Cli, c: &mut Coordinator<'_>, out: &mut dyn Write) -> Result<Outcome> {
    let command = cli.command();
    if command == Command::Interactive && cli.format == OutputFormat::Json {
        bail!("interactive mode only supports --format text");
    }

    let report = c.analyze().context("Analysis failed")?;
    match command {
        Command::Analyze => match cli.format {
            OutputFormat::Text => {
                write!(out, "{}", render::analysis(&report))?;
                write!(out, "{}", render::candidates(c.candidates(), c.total_size()))?;
            }
            OutputFormat::Json => {
                writeln!(out, "{}", render::json(&report, c.candidates(), c.total_size())?)?;
            }
        },
        Command::Check { path, all } => {
            let checks = if all {
                c.check_all_references().context("Reference check failed")?
            } else {
                let path = AssetPath::new(path.as_deref().unwrap_or_default());
                vec![c
                    .check_references(&path)
                    .with_context(|| format!("Cannot check {path}"))?]
            };
            match cli.format {
                OutputFormat::Text => {
                    for check in &checks {
                        write!(out, "{}", render::check(check))?;
                    }
                    write!(out, "{}", render::candidates(c.candidates(), c.total_size()))?;
                }
                OutputFormat::Json => {
                    writeln!(out, "{}", render::json(&checks, c.candidates(), c.total_size())?)?;
                }
            }
        }
        Command::Delete { path } => {
            let path = AssetPath::new(&path);
            let report = c.delete(&path).with_context(|| format!("Cannot delete {path}"))?;
            return finish_deletion(cli, c, out, &report);
        }
        Command::DeleteAll => {
            let report = c.delete_all().context("Delete all failed")?;
            return finish_deletion(cli, c, out, &report);
        }
        Command::Interactive => {
            write!(out, "{}", render::analysis(&report))?;
            return session::run(c, out);
        }
    }
    Ok(Outcome::Success)
}

fn finish_deletion(
    cli: &Cli,
    c: &Coordinator<'_>,
    out: &mut dyn Write,
    report: &DeletionReport,
) -> Result<Outcome> {
    match cli.format {
        OutputFormat::Text => {
            write!(out, "{}", render::deletion(report))?;
            write!(out, "{}", render::candidates(c.candidates(), c.total_size()))?;
        }
        OutputFormat::Json => {
            writeln!(out, "{}", render::json(report, c.candidates(), c.total_size())?)?;
        }
    }
    Ok(if report.failed.is_empty() {
        Outcome::Success
    } else {
        Outcome::PartialFailure
    })
}
