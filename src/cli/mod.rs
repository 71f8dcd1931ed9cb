pub mod commands;
pub mod options;
pub mod output;
pub mod shell;

pub use commands::*;
pub use options::*;
pub use output::*;
