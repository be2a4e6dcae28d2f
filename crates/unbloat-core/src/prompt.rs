/// User confirmation and notification port.
///
/// Destructive operations ask through a [`Prompt`] before touching disk;
/// summaries are delivered through [`Prompt::inform`].
use tracing::info;

pub trait Prompt {
    /// Ask a yes/no question. `false` means cancel.
    fn confirm(&mut self, title: &str, message: &str) -> bool;

    fn inform(&mut self, title: &str, message: &str);
}

/// Answers every confirmation with a fixed value and logs notifications.
#[derive(Debug, Clone, Copy)]
pub struct AutoPrompt {
    answer: bool,
}

impl AutoPrompt {
    pub fn accept() -> Self {
        Self { answer: true }
    }

    pub fn decline() -> Self {
        Self { answer: false }
    }
}

impl Prompt for AutoPrompt {
    fn confirm(&mut self, title: &str, message: &str) -> bool {
        info!(title, message, answer = self.answer, "confirmation answered automatically");
        self.answer
    }

    fn inform(&mut self, title: &str, message: &str) {
        info!("{title}: {message}");
    }
}

/// Records every interaction; for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct RecordingPrompt {
    answer: bool,
    pub confirmations: Vec<(String, String)>,
    pub notices: Vec<(String, String)>,
}

impl RecordingPrompt {
    pub fn answering(answer: bool) -> Self {
        Self {
            answer,
            ..Self::default()
        }
    }

    /// The most recent notice message, if any.
    pub fn last_notice(&self) -> Option<&str> {
        self.notices.last().map(|(_, message)| message.as_str())
    }
}

impl Prompt for RecordingPrompt {
    fn confirm(&mut self, title: &str, message: &str) -> bool {
        self.confirmations.push((title.to_string(), message.to_string()));
        self.answer
    }

    fn inform(&mut self, title: &str, message: &str) {
        self.notices.push((title.to_string(), message.to_string()));
    }
}
