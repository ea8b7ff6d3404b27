//! In-process command channel between the registry and the service.

use tokio::sync::mpsc;

use regionkit_core::{CommandChannelPort, OfflineError, ServiceCommand};

/// Create a connected sender/inbox pair.
///
/// The sender goes to the registry, the inbox to
/// [`OfflineDownloadService::spawn`](crate::OfflineDownloadService::spawn).
pub fn command_channel() -> (ChannelCommandSender, CommandInbox) {
    let (tx, rx) = mpsc::unbounded_channel();
    let weak = tx.downgrade();
    (ChannelCommandSender { tx }, CommandInbox { rx, weak })
}

/// Sending half: implements [`CommandChannelPort`] for the registry.
#[derive(Debug, Clone)]
pub struct ChannelCommandSender {
    tx: mpsc::UnboundedSender<ServiceCommand>,
}

impl ChannelCommandSender {
    pub(crate) fn upgrade(weak: &mpsc::WeakUnboundedSender<ServiceCommand>) -> Option<Self> {
        weak.upgrade().map(|tx| Self { tx })
    }
}

impl CommandChannelPort for ChannelCommandSender {
    fn send(&self, command: ServiceCommand) -> Result<(), OfflineError> {
        tracing::debug!(
            target: "regionkit.service",
            action = command.action(),
            id = %command.download().id,
            "Enqueuing command"
        );
        self.tx.send(command).map_err(|_| OfflineError::ChannelClosed)
    }
}

/// Receiving half, consumed by the service loop.
#[derive(Debug)]
pub struct CommandInbox {
    rx: mpsc::UnboundedReceiver<ServiceCommand>,
    weak: mpsc::WeakUnboundedSender<ServiceCommand>,
}

impl CommandInbox {
    /// A new sender for this inbox, while any other sender is still alive.
    ///
    /// The inbox never keeps its own channel open.
    pub fn sender(&self) -> Option<ChannelCommandSender> {
        ChannelCommandSender::upgrade(&self.weak)
    }

    pub(crate) fn downgrade(&self) -> mpsc::WeakUnboundedSender<ServiceCommand> {
        self.weak.clone()
    }

    /// Wait for the next command; `None` once every sender is gone.
    pub async fn recv(&mut self) -> Option<ServiceCommand> {
        self.rx.recv().await
    }
}
