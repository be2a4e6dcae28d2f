/// Progress reporting and cooperative cancellation.
///
/// The engine runs synchronously on the caller's thread. A frontend that
/// wants live feedback passes a [`ProgressSink`] wrapping a crossbeam
/// sender and drains the receiver elsewhere; the engine never blocks on a
/// full channel.
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Maximum number of progress messages that may queue up in the channel.
///
/// When the observer falls behind, further messages are dropped rather
/// than stalling the analysis.
pub const PROGRESS_CHANNEL_CAPACITY: usize = 1_024;

/// Progress updates sent from the engine to an observer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    /// Classification of directory `index` of `total` is starting.
    Classifying {
        index: usize,
        total: usize,
        path: String,
    },
    /// A scene was opened for reference scanning.
    SceneOpened { scene: String },
    /// A non-fatal problem (unreadable file, scene that failed to open).
    Warning { path: String, message: String },
    /// A directory was deleted from disk.
    Deleted { path: String, size_bytes: u64 },
    /// The operation finished.
    Complete { duration: Duration },
    /// The operation stopped early at the caller's request.
    Cancelled,
}

/// Optional progress channel. The default sink discards everything.
#[derive(Debug, Clone, Default)]
pub struct ProgressSink {
    tx: Option<Sender<Progress>>,
}

impl ProgressSink {
    /// Create a sink plus the receiver an observer should drain.
    pub fn channel() -> (Self, Receiver<Progress>) {
        let (tx, rx) = bounded(PROGRESS_CHANNEL_CAPACITY);
        (Self { tx: Some(tx) }, rx)
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn emit(&self, message: Progress) {
        if let Some(tx) = &self.tx {
            match tx.try_send(message) {
                Ok(()) | Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {}
            }
        }
    }

    pub fn warning(&self, path: impl Into<String>, message: impl Into<String>) {
        self.emit(Progress::Warning {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Flag shared between the engine and whoever may ask it to stop.
///
/// Checked between directories during analysis and between scenes during
/// reference checks, never in the middle of a scene.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Clear a previous cancellation so the token can be reused.
    pub fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}
