//! Main CLI parser and top-level argument handling.
//!
//! This module defines the root CLI structure with global options.

use clap::Parser;

use regionkit_core::DEFAULT_CHANNEL_NAME;

use crate::commands::Commands;

/// Command-line interface for offline map region downloads.
#[derive(Parser)]
#[command(name = "regionkit")]
#[command(about = "Download map regions for offline use")]
#[command(version)]
pub struct Cli {
    /// Notification channel name shown by the host
    #[arg(
        long = "channel-name",
        env = "REGIONKIT_CHANNEL_NAME",
        default_value = DEFAULT_CHANNEL_NAME,
        global = true
    )]
    pub channel_name: String,

    /// Do not group download notifications
    #[arg(long = "no-grouping", global = true)]
    pub no_grouping: bool,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parser_builds() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_args() {
        let cli = Cli::parse_from([
            "regionkit",
            "--verbose",
            "--channel-name",
            "Maps",
            "--no-grouping",
        ]);
        assert!(cli.verbose);
        assert!(cli.no_grouping);
        assert_eq!(cli.channel_name, "Maps");
        assert!(cli.command.is_none());
    }
}
