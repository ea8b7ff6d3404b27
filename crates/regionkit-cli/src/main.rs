//! CLI entry point.
//!
//! Infrastructure is wired in [`bootstrap`]; this file only sets up logging,
//! parses arguments and dispatches.

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use regionkit_cli::{Cli, CliConfig, CliError, Commands, bootstrap, handlers};

fn init_tracing(verbose: bool) {
    let default = if verbose { "regionkit=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let Some(command) = cli.command.as_ref() else {
        // No command provided - show help
        Cli::command().print_help()?;
        return Ok(());
    };

    match command {
        Commands::Download(args) => {
            let config = CliConfig::from_cli(&cli).with_fail_after(args.fail_after);
            let ctx = bootstrap(config)?;
            let result = handlers::download::execute(&ctx, args).await;
            ctx.shutdown().await?;
            result?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli).await {
        let code = err.downcast_ref::<CliError>().map_or(1, CliError::exit_code);
        eprintln!("Error: {err:#}");
        std::process::exit(code);
    }
}
