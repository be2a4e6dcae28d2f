/// Terminal confirmations and notices.
use dialoguer::{theme::ColorfulTheme, Confirm};
use tracing::warn;
use unbloat_core::Prompt;

/// Asks on the terminal with `dialoguer`, or answers yes when `--yes` was
/// given. Notices go to stderr so stdout stays machine-readable.
pub struct TerminalPrompt {
    assume_yes: bool,
}

impl TerminalPrompt {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

impl Prompt for TerminalPrompt {
    fn confirm(&mut self, title: &str, message: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        let answer = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!("{title}: {message}"))
            .default(false)
            .interact();
        match answer {
            Ok(answer) => answer,
            Err(err) => {
                // No terminal to ask on; treat as "no".
                warn!("cannot ask for confirmation ({err}); pass --yes to confirm");
                false
            }
        }
    }

    fn inform(&mut self, title: &str, message: &str) {
        eprintln!("\n{title}\n{message}\n");
    }
}
