//! Footo - local registry and launcher for shell-script modules
//!
//! Modules live under `<root>/modules/{local,bundled,community}/<name>/`.
//! Running a module never executes it: footo prints a sourcing line that a
//! wrapper shell function evaluates in the caller's own shell.

pub mod cli;
pub mod config;
pub mod logging;
pub mod modules;

pub use config::FootoConfig;
pub use modules::*;
