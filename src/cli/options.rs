use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::HOME_ENV_VAR;

/// Main footo CLI interface
#[derive(Parser, Debug)]
#[command(name = "footo")]
#[command(about = "Footo: A secure command interface for reusable terminal functions.")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct FootoCli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Footo home directory (holds modules/ and footo.log)
    #[arg(long, global = true, env = HOME_ENV_VAR)]
    pub home: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbosity: u8,

    /// Do not try to open new modules in $EDITOR
    #[arg(long, global = true)]
    pub no_editor: bool,

    /// Also show the community scope in `list`
    #[arg(long, global = true)]
    pub include_community: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Create a new module
    Create {
        /// The name of the module to create
        name: String,
    },

    /// Run a module
    Run {
        /// The name of the module to run
        name: String,
        /// Arguments to pass to the module
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// List all available modules
    List,

    /// Get information about a module
    Info {
        /// The name of the module
        name: String,
    },

    /// Print the wrapper function that sources `run` output into your shell
    ShellInit {
        #[arg(value_enum, default_value = "bash")]
        shell: ShellKind,
    },

    /// Shorthand: `footo <module> [args...]` runs the module
    #[command(external_subcommand)]
    External(Vec<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ShellKind {
    Bash,
    Pwsh,
}

impl Commands {
    /// Collapse the shorthand form into an explicit `run`
    pub fn normalized(self) -> Self {
        match self {
            Commands::External(mut words) if !words.is_empty() => {
                let name = words.remove(0);
                Commands::Run { name, args: words }
            }
            other => other,
        }
    }
}
