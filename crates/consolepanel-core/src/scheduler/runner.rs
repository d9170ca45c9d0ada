use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Notify, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::scheduler::types::{
    CaptureOutcome, CaptureUpdate, CapturedImage, RefreshState, SchedulerConfig, VisibilityMode,
};
use crate::tools::WindowBackend;

struct Slot {
    generation: u64,
    mode_tx: watch::Sender<VisibilityMode>,
    refresh: Arc<Notify>,
    state_rx: watch::Receiver<RefreshState>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Keeps captures fresh for every visible window.
///
/// Each scheduled window owns one control loop task. The loop captures,
/// publishes a [`CaptureUpdate`], then arms a single deadline for the next
/// capture. Only the scheduler touches a window's loop: [`show`](Self::show)
/// on an already-scheduled handle updates its mode instead of starting a
/// second loop, and [`hide`](Self::hide) cancels the loop synchronously.
pub struct CaptureScheduler<B: WindowBackend> {
    backend: Arc<B>,
    config: SchedulerConfig,
    slots: HashMap<String, Slot>,
    next_generation: u64,
    updates: mpsc::UnboundedSender<CaptureUpdate>,
}

impl<B: WindowBackend> CaptureScheduler<B> {
    /// Create a scheduler and the receiver its capture updates arrive on.
    pub fn new(
        backend: Arc<B>,
        config: SchedulerConfig,
    ) -> (Self, mpsc::UnboundedReceiver<CaptureUpdate>) {
        let (updates, rx) = mpsc::unbounded_channel();
        let scheduler = Self {
            backend,
            config,
            slots: HashMap::new(),
            next_generation: 0,
            updates,
        };
        (scheduler, rx)
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Make a window visible in `mode`, `index` being its position among the
    /// windows becoming visible together.
    ///
    /// Must be called within a Tokio runtime.
    pub fn show(&mut self, handle: &str, mode: VisibilityMode, index: usize) {
        if let Some(slot) = self.slots.get(handle)
            && !slot.task.is_finished()
        {
            slot.mode_tx.send_if_modified(|current| {
                let changed = *current != mode;
                *current = mode;
                changed
            });
            return;
        }

        self.next_generation += 1;
        let generation = self.next_generation;

        let stagger = self.config.stagger_delay(mode, index);
        let initial_state = if stagger.is_zero() {
            RefreshState::Active
        } else {
            RefreshState::Staggering
        };

        let (mode_tx, mode_rx) = watch::channel(mode);
        let (state_tx, state_rx) = watch::channel(initial_state);
        let refresh = Arc::new(Notify::new());
        let cancel = CancellationToken::new();

        let control = ControlLoop {
            handle: handle.to_string(),
            generation,
            index,
            backend: self.backend.clone(),
            config: self.config,
            mode_rx,
            refresh: refresh.clone(),
            state_tx,
            cancel: cancel.clone(),
            updates: self.updates.clone(),
        };
        let task = tokio::spawn(control.run());

        debug!(
            event = "core.scheduler.slot_started",
            handle = handle,
            generation = generation,
            mode = ?mode,
            stagger_ms = stagger.as_millis() as u64
        );

        if let Some(stale) = self.slots.insert(
            handle.to_string(),
            Slot {
                generation,
                mode_tx,
                refresh,
                state_rx,
                cancel,
                task,
            },
        ) {
            stale.cancel.cancel();
        }
    }

    /// Stop scheduling a window. Any capture still in flight is discarded when
    /// it settles. Returns false when the handle was not scheduled.
    pub fn hide(&mut self, handle: &str) -> bool {
        match self.slots.remove(handle) {
            Some(slot) => {
                slot.cancel.cancel();
                debug!(
                    event = "core.scheduler.slot_stopped",
                    handle = handle,
                    generation = slot.generation
                );
                true
            }
            None => false,
        }
    }

    /// Capture now instead of waiting for the pending deadline.
    pub fn refresh_now(&self, handle: &str) -> bool {
        match self.slots.get(handle) {
            Some(slot) => {
                slot.refresh.notify_one();
                true
            }
            None => false,
        }
    }

    /// Hide every scheduled window not in `keep`. Returns the hidden handles.
    pub fn retain(&mut self, keep: &[String]) -> Vec<String> {
        let stale: Vec<String> = self
            .slots
            .keys()
            .filter(|h| !keep.contains(*h))
            .cloned()
            .collect();
        for handle in &stale {
            self.hide(handle);
        }
        stale
    }

    pub fn state(&self, handle: &str) -> RefreshState {
        self.slots
            .get(handle)
            .map(|slot| *slot.state_rx.borrow())
            .unwrap_or(RefreshState::Idle)
    }

    pub fn mode(&self, handle: &str) -> Option<VisibilityMode> {
        self.slots.get(handle).map(|slot| *slot.mode_tx.borrow())
    }

    /// Whether `update` came from the window's current schedule. Updates from
    /// a hidden (or hidden then re-shown) window must not be applied.
    pub fn is_current(&self, update: &CaptureUpdate) -> bool {
        self.slots
            .get(&update.handle)
            .is_some_and(|slot| slot.generation == update.generation)
    }

    pub fn scheduled_count(&self) -> usize {
        self.slots.len()
    }

    pub fn is_scheduled(&self, handle: &str) -> bool {
        self.slots.contains_key(handle)
    }

    /// Cancel every window's schedule.
    pub fn shutdown(&mut self) {
        let count = self.slots.len();
        for (_, slot) in self.slots.drain() {
            slot.cancel.cancel();
        }
        info!(event = "core.scheduler.shutdown_completed", cancelled = count);
    }
}

impl<B: WindowBackend> Drop for CaptureScheduler<B> {
    fn drop(&mut self) {
        for slot in self.slots.values() {
            slot.cancel.cancel();
        }
    }
}

struct ControlLoop<B: WindowBackend> {
    handle: String,
    generation: u64,
    index: usize,
    backend: Arc<B>,
    config: SchedulerConfig,
    mode_rx: watch::Receiver<VisibilityMode>,
    refresh: Arc<Notify>,
    state_tx: watch::Sender<RefreshState>,
    cancel: CancellationToken,
    updates: mpsc::UnboundedSender<CaptureUpdate>,
}

impl<B: WindowBackend> ControlLoop<B> {
    async fn run(mut self) {
        if !self.wait_stagger().await {
            return;
        }
        self.state_tx.send_replace(RefreshState::Active);

        loop {
            // In-flight captures run to completion so the tool can clean up
            // its output; the result is dropped below if we were cancelled.
            let outcome = self.capture().await;
            if self.cancel.is_cancelled() {
                return;
            }

            let update = CaptureUpdate {
                handle: self.handle.clone(),
                generation: self.generation,
                outcome,
            };
            if self.updates.send(update).is_err() {
                return;
            }
            self.state_tx.send_replace(RefreshState::Active);

            if !self.wait_next().await {
                return;
            }
        }
    }

    /// Wait out the initial stagger. The delay is recomputed from the slot's
    /// start whenever the mode changes, so expanding ends it at once.
    async fn wait_stagger(&mut self) -> bool {
        let started_at = Instant::now();
        loop {
            let stagger = self
                .config
                .stagger_delay(*self.mode_rx.borrow(), self.index);
            if stagger.is_zero() {
                return true;
            }
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return false,
                _ = self.refresh.notified() => return true,
                changed = self.mode_rx.changed() => {
                    if changed.is_err() {
                        return false;
                    }
                }
                _ = tokio::time::sleep_until(started_at + stagger) => return true,
            }
        }
    }

    async fn capture(&self) -> CaptureOutcome {
        match self.backend.capture_window(&self.handle).await {
            Ok(result) => match result.image {
                Some(bytes) if result.ok => CaptureOutcome::Image(CapturedImage {
                    bytes: bytes.into(),
                    method: result.method,
                    captured_at: chrono::Utc::now(),
                }),
                _ => CaptureOutcome::Failed(
                    result
                        .error
                        .unwrap_or_else(|| "capture produced no image".to_string()),
                ),
            },
            Err(e) => {
                debug!(
                    event = "core.scheduler.capture_failed",
                    handle = self.handle,
                    error = %e
                );
                CaptureOutcome::Failed(e.to_string())
            }
        }
    }

    /// Wait for the next capture. The deadline is recomputed from the settle
    /// time whenever the mode changes. Returns false when the slot is gone.
    async fn wait_next(&mut self) -> bool {
        let settled_at = Instant::now();
        loop {
            let deadline = settled_at + self.config.interval_for(*self.mode_rx.borrow());
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return false,
                _ = self.refresh.notified() => {
                    self.state_tx.send_replace(RefreshState::Refreshing);
                    return true;
                }
                changed = self.mode_rx.changed() => {
                    if changed.is_err() {
                        return false;
                    }
                }
                _ = tokio::time::sleep_until(deadline) => return true,
            }
        }
    }
}
