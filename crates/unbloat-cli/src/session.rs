/// Interactive session: the candidate list plus a menu of actions, repeated
/// until the user quits.
use crate::app::Outcome;
use crate::render;
use anyhow::{Context, Result};
use dialoguer::{theme::ColorfulTheme, Select};
use std::io::Write;
use unbloat_core::{AssetPath, Coordinator};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    CheckReferences,
    Skip,
    Delete,
    Locate,
    CheckAll,
    DeleteAll,
    Analyze,
    Clear,
    Quit,
}

impl Action {
    const ALL: [Action; 9] = [
        Action::CheckReferences,
        Action::Skip,
        Action::Delete,
        Action::Locate,
        Action::CheckAll,
        Action::DeleteAll,
        Action::Analyze,
        Action::Clear,
        Action::Quit,
    ];

    fn label(self) -> &'static str {
        match self {
            Action::CheckReferences => "Check references",
            Action::Skip => "Skip",
            Action::Delete => "Delete",
            Action::Locate => "Show location",
            Action::CheckAll => "Check references for all",
            Action::DeleteAll => "Delete all",
            Action::Analyze => "Analyze project",
            Action::Clear => "Clear results",
            Action::Quit => "Quit",
        }
    }

    /// Needs a candidate to act on.
    fn targets_one(self) -> bool {
        matches!(
            self,
            Action::CheckReferences | Action::Skip | Action::Delete | Action::Locate
        )
    }
}

pub fn run(c: &mut Coordinator<'_>, out: &mut dyn Write) -> Result<Outcome> {
    let theme = ColorfulTheme::default();
    let mut outcome = Outcome::Success;

    loop {
        write!(out, "\n{}", render::candidates(c.candidates(), c.total_size()))?;
        out.flush()?;

        let labels: Vec<&str> = Action::ALL.iter().map(|a| a.label()).collect();
        let choice = Select::with_theme(&theme)
            .with_prompt("Action")
            .items(&labels)
            .default(0)
            .interact()
            .context("Failed to show interactive selection")?;
        let action = Action::ALL[choice];

        let target = if action.targets_one() {
            match pick_candidate(&theme, c)? {
                Some(path) => Some(path),
                None => continue,
            }
        } else {
            None
        };

        match (action, target) {
            (Action::CheckReferences, Some(path)) => {
                let check = c.check_references(&path)?;
                write!(out, "{}", render::check(&check))?;
            }
            (Action::Skip, Some(path)) => {
                c.skip(&path)?;
            }
            (Action::Delete, Some(path)) => {
                let report = c.delete(&path)?;
                if !report.failed.is_empty() {
                    outcome = Outcome::PartialFailure;
                }
                write!(out, "{}", render::deletion(&report))?;
            }
            (Action::Locate, Some(path)) => match c.locate(&path) {
                Some(location) => writeln!(out, "{}", location.display())?,
                None => writeln!(out, "Could not find directory: {path}")?,
            },
            (Action::CheckAll, _) => {
                for check in c.check_all_references()? {
                    write!(out, "{}", render::check(&check))?;
                }
            }
            (Action::DeleteAll, _) => {
                let report = c.delete_all()?;
                if !report.failed.is_empty() {
                    outcome = Outcome::PartialFailure;
                }
                write!(out, "{}", render::deletion(&report))?;
            }
            (Action::Analyze, _) => {
                let report = c.analyze().context("Analysis failed")?;
                write!(out, "{}", render::analysis(&report))?;
            }
            (Action::Clear, _) => c.clear(),
            (Action::Quit, _) => return Ok(outcome),
            (_, None) => {}
        }
    }
}

fn pick_candidate(theme: &ColorfulTheme, c: &Coordinator<'_>) -> Result<Option<AssetPath>> {
    if c.candidates().is_empty() {
        return Ok(None);
    }
    let items: Vec<String> = c.candidates().iter().map(|cand| cand.path.to_string()).collect();
    let choice = Select::with_theme(theme)
        .with_prompt("Directory")
        .items(&items)
        .default(0)
        .interact_opt()
        .context("Failed to show interactive selection")?;
    Ok(choice.map(|i| c.candidates()[i].path.clone()))
}
