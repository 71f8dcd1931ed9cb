use clap::Parser;
use footo::cli::{build_config, execute, FootoCli, EXIT_CANCELLED};
use footo::logging;
use tracing::{info, warn};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = FootoCli::parse();

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            // Logging is not up yet; report directly
            eprintln!("Error: {e}");
            std::process::exit(e.exit_code());
        }
    };

    if let Err(e) = std::fs::create_dir_all(&config.root) {
        eprintln!("Warning: could not create {}: {e}", config.root.display());
    }
    if let Err(e) = logging::init(&config, cli.verbosity) {
        eprintln!("Warning: logging disabled: {e}");
    }

    info!("Starting footo v{}", env!("CARGO_PKG_VERSION"));

    let code = tokio::select! {
        code = run(cli, &config) => code,
        _ = tokio::signal::ctrl_c() => {
            warn!("Operation cancelled by user");
            eprintln!("\nOperation cancelled by user");
            EXIT_CANCELLED
        }
    };

    std::process::exit(code);
}

async fn run(cli: FootoCli, config: &footo::FootoConfig) -> i32 {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    execute(cli, config, &mut out).await
}
