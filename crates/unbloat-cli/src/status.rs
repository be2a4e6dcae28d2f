/// Live progress on stderr.
///
/// The engine runs on the main thread and sends [`Progress`] messages over
/// a bounded channel; a renderer thread drains them until every sender is
/// dropped.
use crossbeam_channel::Receiver;
use std::thread::JoinHandle;
use unbloat_core::model::format_size;
use unbloat_core::progress::Progress;

/// Render every `step`-th classification update; warnings and completion
/// are always shown.
const CLASSIFY_STEP: usize = 25;

pub fn spawn_renderer(rx: Receiver<Progress>) -> std::io::Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name("unbloat-status".into())
        .spawn(move || {
            for message in rx.iter() {
                if let Some(line) = describe(&message) {
                    eprintln!("{line}");
                }
            }
        })
}

/// One status line for a progress message, or `None` to stay quiet.
pub fn describe(message: &Progress) -> Option<String> {
    match message {
        Progress::Classifying { index, total, path } => {
            (index % CLASSIFY_STEP == 0).then(|| format!("[{}/{}] {}", index + 1, total, path))
        }
        Progress::SceneOpened { scene } => Some(format!("scanning {scene}")),
        Progress::Warning { path, message } => Some(format!("warning: {path}: {message}")),
        Progress::Deleted { path, size_bytes } => {
            Some(format!("deleted {path} ({})", format_size(*size_bytes)))
        }
        Progress::Complete { duration } => Some(format!("done in {:.2}s", duration.as_secs_f64())),
        Progress::Cancelled => Some("cancelled".to_string()),
    }
}
