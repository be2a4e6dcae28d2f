/// Unbloat CLI: terminal frontend.
///
/// This crate contains argument parsing, prompts and rendering. Business
/// logic lives in `unbloat-core`.
pub mod app;
pub mod args;
pub mod prompt;
pub mod render;
pub mod session;
pub mod status;

pub use app::{run, run_with, Outcome};
pub use args::{Cli, Command, OutputFormat};
