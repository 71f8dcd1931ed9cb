use clap::CommandFactory;
use std::io::Write;
use tracing::{debug, error};

use crate::cli::options::{Commands, FootoCli};
use crate::cli::output::{write_created, write_listing, write_module_info};
use crate::cli::shell::wrapper;
use crate::config::FootoConfig;
use crate::modules::editor::{EditorLauncher, NoopEditor, SystemEditor};
use crate::modules::error::{FootoError, Result};
use crate::modules::lifecycle::ModuleLifecycle;

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_CANCELLED: i32 = 130;

/// Build the effective configuration from CLI flags and `config.yaml`
pub fn build_config(cli: &FootoCli) -> Result<FootoConfig> {
    let root = FootoConfig::resolve_root(cli.home.clone())?;
    let mut config = FootoConfig::load(root)?;
    if cli.include_community {
        config.include_community_in_list = true;
    }
    if cli.no_editor {
        config.open_editor = false;
    }
    Ok(config)
}

pub fn editor_for(config: &FootoConfig) -> Box<dyn EditorLauncher> {
    if config.open_editor {
        Box::new(SystemEditor::from_env(config.editor_timeout))
    } else {
        Box::new(NoopEditor)
    }
}

/// Execute one command, writing user-facing output to `out`
pub async fn dispatch(
    command: Option<Commands>,
    config: &FootoConfig,
    editor: Box<dyn EditorLauncher>,
    out: &mut impl Write,
) -> Result<()> {
    let lifecycle = ModuleLifecycle::new(config, editor);
    let write_err = |e: std::io::Error| FootoError::io("write output", e);

    match command.map(Commands::normalized) {
        None => {
            let help = FootoCli::command().render_help();
            write!(out, "{help}").map_err(write_err)?;
        }
        Some(Commands::Create { name }) => {
            let created = lifecycle.create(&name).await?;
            write_created(out, &created).map_err(write_err)?;
        }
        Some(Commands::Run { name, args }) => {
            let line = lifecycle.run(&name, &args)?;
            writeln!(out, "{line}").map_err(write_err)?;
        }
        Some(Commands::List) => {
            let listings = lifecycle.list();
            write_listing(out, &listings).map_err(write_err)?;
        }
        Some(Commands::Info { name }) => {
            let module = lifecycle.info(&name)?;
            write_module_info(out, &module).map_err(write_err)?;
            debug!("Displayed info for module: {}", name);
        }
        Some(Commands::ShellInit { shell }) => {
            write!(out, "{}", wrapper(shell)).map_err(write_err)?;
        }
        Some(Commands::External(_)) => {
            // normalized() only leaves an empty external list here
            let help = FootoCli::command().render_help();
            write!(out, "{help}").map_err(write_err)?;
        }
    }

    out.flush().map_err(write_err)
}

/// Log an error with context, report it on stderr and pick the exit code
pub fn report_error(context: &str, err: &FootoError) -> i32 {
    error!("{}: {}", context, err);
    eprintln!("Error: {err}");
    err.exit_code()
}

/// Full command execution against an already-built configuration
pub async fn execute(cli: FootoCli, config: &FootoConfig, out: &mut impl Write) -> i32 {
    if let Err(e) = config.initialize_directories() {
        return report_error("Failed to initialize directories", &e);
    }

    let context = match &cli.command {
        Some(Commands::Create { .. }) => "Module creation failed",
        Some(Commands::Info { .. }) => "Error getting module info",
        Some(Commands::List) => "Error listing modules",
        Some(Commands::ShellInit { .. }) => "Error printing shell wrapper",
        Some(Commands::Run { .. }) | Some(Commands::External(_)) => "Error running module",
        None => "Footo error",
    };

    match dispatch(cli.command, config, editor_for(config), out).await {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => report_error(context, &e),
    }
}
