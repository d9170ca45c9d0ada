//! Client-side capture loop: polls the window list, keeps a stable display
//! order, and writes the freshest capture of every window to disk.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use consolepanel_core::scheduler::{CaptureOutcome, CaptureUpdate};
use consolepanel_core::tools::{ToolError, sanitize_handle};
use consolepanel_core::{
    CaptureGallery, CaptureScheduler, DisplayOrder, Preferences, SchedulerConfig, VisibilityMode,
    WindowBackend, WindowDescriptor,
};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("cannot create output directory '{}': {source}", .path.display())]
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("window list unavailable: {source}")]
    ListFailed { source: ToolError },
}

#[derive(Debug, Clone)]
pub struct WatchOptions {
    pub out_dir: PathBuf,
    /// Sanitized handles refreshed at the expanded interval
    pub expand: Vec<String>,
    /// Stop once every listed window has settled one capture
    pub once: bool,
    pub list_interval: Duration,
    pub scheduler: SchedulerConfig,
}

impl WatchOptions {
    fn mode_for(&self, handle: &str) -> VisibilityMode {
        let sanitized = sanitize_handle(handle);
        if self
            .expand
            .iter()
            .any(|e| e.eq_ignore_ascii_case(&sanitized))
        {
            VisibilityMode::Expanded
        } else {
            VisibilityMode::Thumbnail
        }
    }
}

/// Run until Ctrl-C (or, with `once`, until every window settled a capture).
///
/// Returns the number of images written.
pub async fn run_watch<B: WindowBackend>(
    backend: Arc<B>,
    options: WatchOptions,
    preferences: &Preferences,
) -> Result<usize, WatchError> {
    tokio::fs::create_dir_all(&options.out_dir)
        .await
        .map_err(|source| WatchError::OutputDir {
            path: options.out_dir.clone(),
            source,
        })?;

    let (mut scheduler, mut updates) =
        CaptureScheduler::new(Arc::clone(&backend), options.scheduler);
    let mut order = DisplayOrder::new();
    let mut gallery = CaptureGallery::new();
    let mut pending: Option<HashSet<String>> = None;
    let mut written = 0usize;

    let mut ticker = tokio::time::interval(options.list_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!(event = "cli.watch.interrupted");
                break;
            }
            _ = ticker.tick() => {
                let snapshot = match backend.list_windows().await {
                    Ok(snapshot) => snapshot,
                    Err(e) if options.once && pending.is_none() => {
                        scheduler.shutdown();
                        return Err(WatchError::ListFailed { source: e });
                    }
                    Err(e) => {
                        // Keep showing the previous list until a poll succeeds
                        warn!(event = "cli.watch.list_failed", error = %e);
                        continue;
                    }
                };

                apply_snapshot(&snapshot, &options, &mut order, &mut scheduler, &mut gallery, preferences);

                let waiting = pending.get_or_insert_with(|| order.handles().iter().cloned().collect());
                waiting.retain(|h| order.contains(h));
                if options.once && waiting.is_empty() {
                    break;
                }
            }
            Some(update) = updates.recv() => {
                if !scheduler.is_current(&update) {
                    debug!(event = "cli.watch.stale_update_dropped", handle = update.handle);
                    continue;
                }
                if gallery.apply(&update) {
                    if write_capture(&options.out_dir, &update).await {
                        written += 1;
                    }
                } else if let CaptureOutcome::Failed(reason) = &update.outcome {
                    warn!(
                        event = "cli.watch.capture_failed",
                        handle = update.handle,
                        consecutive = gallery.consecutive_failures(&update.handle),
                        error = reason.as_str()
                    );
                }

                if let Some(waiting) = pending.as_mut() {
                    waiting.remove(&update.handle);
                    if options.once && waiting.is_empty() {
                        break;
                    }
                }
            }
        }
    }

    scheduler.shutdown();
    Ok(written)
}

fn apply_snapshot<B: WindowBackend>(
    snapshot: &[WindowDescriptor],
    options: &WatchOptions,
    order: &mut DisplayOrder,
    scheduler: &mut CaptureScheduler<B>,
    gallery: &mut CaptureGallery,
    preferences: &Preferences,
) {
    let outcome = order.merge(snapshot);
    if outcome.is_unchanged() {
        return;
    }

    for handle in &outcome.removed {
        scheduler.hide(handle);
        gallery.release(handle);
    }
    for (index, handle) in outcome.added.iter().enumerate() {
        scheduler.show(handle, options.mode_for(handle), index);
    }

    let labels: Vec<String> = order
        .annotate(snapshot, preferences)
        .iter()
        .map(|entry| {
            let star = if entry.starred { "★" } else { "" };
            format!("{}{} ({})", star, entry.label(), entry.descriptor.handle)
        })
        .collect();
    println!(
        "Watching {} window(s) [+{} -{}]: {}",
        order.len(),
        outcome.added.len(),
        outcome.removed.len(),
        labels.join(", ")
    );
}

async fn write_capture(out_dir: &Path, update: &CaptureUpdate) -> bool {
    let CaptureOutcome::Image(image) = &update.outcome else {
        return false;
    };
    let name = sanitize_handle(&update.handle);
    if name.is_empty() {
        return false;
    }

    let path = out_dir.join(format!("{}.png", name));
    match tokio::fs::write(&path, &image.bytes).await {
        Ok(()) => {
            info!(
                event = "cli.watch.capture_written",
                handle = update.handle,
                bytes = image.bytes.len(),
                path = %path.display()
            );
            true
        }
        Err(e) => {
            warn!(event = "cli.watch.write_failed", path = %path.display(), error = %e);
            false
        }
    }
}
