//! `regionkit download`: start a region download and follow it to the end.
//!
//! Ctrl-C sends a cancel command; the command then ends on the canceled
//! event like any other terminal event.

use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tokio::sync::mpsc::UnboundedReceiver;

use regionkit_core::{
    ChannelObserver, DownloadId, NotificationOptions, OfflineDownload, OfflineDownloadEvent,
    OfflineDownloadObserver, RegionDefinition,
};

use crate::bootstrap::CliContext;
use crate::commands::DownloadArgs;
use crate::error::CliError;

/// Execute the download command.
pub async fn execute(ctx: &CliContext, args: &DownloadArgs) -> Result<(), CliError> {
    args.validate().map_err(CliError::Arguments)?;
    let download = build_download(args);

    let (observer, mut events) = ChannelObserver::new();
    let observer: Arc<dyn OfflineDownloadObserver> = Arc::new(observer);
    ctx.registry
        .add_offline_download_state_change_listener(Arc::clone(&observer));

    let result = follow(ctx, download, &mut events).await;

    ctx.registry
        .remove_offline_download_state_change_listener(&observer);
    result
}

/// Build the record to submit from the command arguments.
pub fn build_download(args: &DownloadArgs) -> OfflineDownload {
    let definition = RegionDefinition::new(
        args.style_url.clone(),
        args.bounds,
        args.min_zoom,
        args.max_zoom,
        args.pixel_ratio,
    );
    let download = OfflineDownload::new(
        definition,
        NotificationOptions::default(),
        args.name.clone(),
    );

    match &args.metadata {
        Some(metadata) => download.with_metadata(metadata.as_bytes().to_vec()),
        None => download,
    }
}

async fn follow(
    ctx: &CliContext,
    download: OfflineDownload,
    events: &mut UnboundedReceiver<OfflineDownloadEvent>,
) -> Result<(), CliError> {
    let progress = DownloadProgress::new(&download.region_name);
    let mut tracker = Tracker::new(download.id);
    ctx.registry.start_download(download)?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut interrupted = false;

    loop {
        tokio::select! {
            signal = &mut ctrl_c, if !interrupted => {
                signal?;
                interrupted = true;
                progress.note("Canceling");
                if let Some(active) = tracker.active() {
                    ctx.registry.cancel_download(active.clone())?;
                }
            }

            event = events.recv() => {
                let Some(event) = event else {
                    progress.finish();
                    return Err(CliError::Service("Event stream closed".to_string()));
                };

                match tracker.apply(event) {
                    Step::Ignored => {}
                    Step::Created(active) => {
                        tracing::debug!(target: "regionkit.cli", id = %active.id, "Region created");
                        if interrupted {
                            ctx.registry.cancel_download(active)?;
                        }
                    }
                    Step::Progress(percent) => progress.update(percent),
                    Step::Finished(outcome) => {
                        progress.finish();
                        if outcome.is_ok() {
                            if let Some(done) = tracker.active() {
                                println!("Downloaded '{}' (region {})", done.region_name, done.id);
                            }
                        }
                        return outcome;
                    }
                }
            }
        }
    }
}

/// What an event means for the followed download.
#[derive(Debug)]
enum Step {
    Ignored,
    Created(OfflineDownload),
    Progress(u32),
    Finished(Result<(), CliError>),
}

/// Follows one download through the event stream.
///
/// The record is submitted under a requested id and becomes active under
/// its region id; a start failure is reported under the requested id.
struct Tracker {
    requested: DownloadId,
    active: Option<OfflineDownload>,
}

impl Tracker {
    const fn new(requested: DownloadId) -> Self {
        Self {
            requested,
            active: None,
        }
    }

    const fn active(&self) -> Option<&OfflineDownload> {
        self.active.as_ref()
    }

    fn owns(&self, id: DownloadId) -> bool {
        self.active
            .as_ref()
            .map_or(id == self.requested, |active| active.id == id)
    }

    fn apply(&mut self, event: OfflineDownloadEvent) -> Step {
        if let OfflineDownloadEvent::Created { download } = &event {
            if self.active.is_none() {
                self.active = Some(download.clone());
                return Step::Created(download.clone());
            }
            return Step::Ignored;
        }

        if !self.owns(event.id()) {
            return Step::Ignored;
        }

        match event {
            OfflineDownloadEvent::Progress { progress, .. } => Step::Progress(progress),
            OfflineDownloadEvent::Success { download } => {
                self.active = Some(download);
                Step::Finished(Ok(()))
            }
            OfflineDownloadEvent::Canceled { .. } => Step::Finished(Err(CliError::Canceled)),
            OfflineDownloadEvent::Error { error, message, .. } => {
                Step::Finished(Err(CliError::Download {
                    reason: error,
                    message,
                }))
            }
            OfflineDownloadEvent::Created { .. } => Step::Ignored,
        }
    }
}

/// Terminal progress bar for one region.
struct DownloadProgress {
    bar: ProgressBar,
}

impl DownloadProgress {
    fn new(region_name: &str) -> Self {
        let bar = ProgressBar::with_draw_target(Some(100), ProgressDrawTarget::stdout());
        bar.set_style(Self::bar_style());
        bar.set_message(region_name.to_string());
        bar.enable_steady_tick(Duration::from_millis(120));
        Self { bar }
    }

    fn update(&self, percent: u32) {
        self.bar.set_position(u64::from(percent.min(100)));
    }

    fn note(&self, text: &str) {
        self.bar.println(text);
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner} {msg} {bar:28.cyan/blue} {pos:>3}%")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regionkit_core::LatLngBounds;

    fn args() -> DownloadArgs {
        DownloadArgs {
            name: "Lisbon".to_string(),
            style_url: "mapbox://styles/mapbox/streets-v11".to_string(),
            bounds: LatLngBounds::new(38.69, -9.23, 38.80, -9.09),
            min_zoom: 0.0,
            max_zoom: 10.0,
            pixel_ratio: 2.0,
            metadata: Some("trip".to_string()),
            fail_after: None,
        }
    }

    #[test]
    fn test_build_download() {
        let download = build_download(&args());
        assert_eq!(download.region_name, "Lisbon");
        assert_eq!(download.metadata, b"trip");
        assert_eq!(download.progress, 0);
        assert!((download.definition.pixel_ratio - 2.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_tracker_follows_rekeyed_download() {
        let requested = build_download(&args());
        let active = requested.clone().with_id(DownloadId::new(9));
        let mut tracker = Tracker::new(requested.id);

        assert!(matches!(
            tracker.apply(OfflineDownloadEvent::created(&active)),
            Step::Created(_)
        ));
        assert!(matches!(
            tracker.apply(OfflineDownloadEvent::progress(&active, 40)),
            Step::Progress(40)
        ));
        assert!(matches!(
            tracker.apply(OfflineDownloadEvent::succeeded(&active)),
            Step::Finished(Ok(()))
        ));
    }

    #[test]
    fn test_tracker_ignores_other_downloads() {
        let requested = build_download(&args());
        let active = requested.clone().with_id(DownloadId::new(9));
        let other = requested.clone().with_id(DownloadId::new(10));
        let mut tracker = Tracker::new(requested.id);

        tracker.apply(OfflineDownloadEvent::created(&active));
        assert!(matches!(
            tracker.apply(OfflineDownloadEvent::created(&other)),
            Step::Ignored
        ));
        assert!(matches!(
            tracker.apply(OfflineDownloadEvent::canceled(&other)),
            Step::Ignored
        ));
        assert!(matches!(
            tracker.apply(OfflineDownloadEvent::canceled(&active)),
            Step::Finished(Err(CliError::Canceled))
        ));
    }

    #[test]
    fn test_tracker_reports_start_failure() {
        let requested = build_download(&args());
        let mut tracker = Tracker::new(requested.id);

        let step = tracker.apply(OfflineDownloadEvent::failed(
            &requested,
            "InvalidStyle",
            "Style URL is empty",
        ));
        match step {
            Step::Finished(Err(CliError::Download { reason, message })) => {
                assert_eq!(reason, "InvalidStyle");
                assert_eq!(message, "Style URL is empty");
            }
            other => panic!("Expected download failure, got {other:?}"),
        }
    }
}
