//! CLI bootstrap - the composition root.
//!
//! This module is the ONLY place where infrastructure is wired together
//! for the CLI adapter:
//! - Command channel (via regionkit-service)
//! - Registry (via regionkit-core)
//! - Background service with the simulated SDK and tracing notifier
//!
//! Command handlers receive the composed [`CliContext`].

use std::sync::Arc;

use anyhow::{Context, Result};

use regionkit_core::{OfflineRegistry, ServiceConfig};
use regionkit_service::{
    OfflineDownloadService, ServiceDeps, ServiceHandle, SimulatedRegionDownloader,
    SimulationConfig, TracingNotifier, command_channel,
};

use crate::error::CliError;
use crate::parser::Cli;

/// Bootstrap configuration for the CLI.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Background service settings.
    pub service: ServiceConfig,
    /// Simulated SDK behaviour.
    pub simulation: SimulationConfig,
}

impl CliConfig {
    /// Build the configuration from global flags.
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            service: ServiceConfig::new(cli.channel_name.clone()).with_grouping(!cli.no_grouping),
            simulation: SimulationConfig::default(),
        }
    }

    /// Make the simulated SDK fail after `resources`.
    #[must_use]
    pub const fn with_fail_after(mut self, resources: Option<u64>) -> Self {
        self.simulation.fail_after = resources;
        self
    }
}

/// Fully composed context for CLI commands.
pub struct CliContext {
    /// The shared registry.
    pub registry: Arc<OfflineRegistry>,
    /// The running background service.
    pub service: ServiceHandle,
}

impl CliContext {
    /// Stop the service and wait for it to exit.
    pub async fn shutdown(self) -> Result<()> {
        self.service.shutdown();
        self.service
            .join()
            .await
            .context("Offline download service panicked")
    }
}

/// Bootstrap the CLI context.
///
/// Must run inside a tokio runtime.
pub fn bootstrap(config: CliConfig) -> Result<CliContext> {
    let (sender, inbox) = command_channel();
    let registry = Arc::new(OfflineRegistry::new(Arc::new(sender)));

    let service = OfflineDownloadService::spawn(
        ServiceDeps {
            registry: Arc::clone(&registry),
            downloader: Arc::new(SimulatedRegionDownloader::new(config.simulation)),
            notifier: Arc::new(TracingNotifier::new()),
            config: config.service,
        },
        inbox,
    )
    .map_err(CliError::from)
    .context("Failed to start offline download service")?;

    Ok(CliContext { registry, service })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_config_from_flags() {
        let cli = Cli::parse_from(["regionkit", "--channel-name", "Maps", "--no-grouping"]);
        let config = CliConfig::from_cli(&cli);

        assert_eq!(config.service.channel_name, "Maps");
        assert!(!config.service.use_grouping);
        assert!(config.simulation.fail_after.is_none());
    }

    #[tokio::test]
    async fn test_bootstrap_rejects_empty_channel() {
        let config = CliConfig {
            service: ServiceConfig::new(""),
            ..CliConfig::default()
        };

        let err = assert_err!(bootstrap(config).map(|_| ()));
        let cli_err = err.downcast_ref::<CliError>().unwrap();
        assert_eq!(cli_err.exit_code(), 78);
    }

    #[tokio::test]
    async fn test_bootstrap_and_shutdown() {
        let ctx = assert_ok!(bootstrap(CliConfig::default()));
        assert_eq!(ctx.registry.active_count(), 0);
        assert_ok!(ctx.shutdown().await);
    }
}
