use log::{info, warn};
use swiftread_core::{
    app::{ReaderApp, SaveReason},
    input::InputProvider,
    storage::{LargeStore, SessionStore, SmallStore},
};

use super::SESSION_RETRY_MS;

/// Turns the reader's save requests into store writes, retrying failed
/// writes after a back-off.
pub(super) struct SessionSyncState {
    pending: Option<(SaveReason, u64)>,
    saves: usize,
}

impl SessionSyncState {
    pub(super) fn new() -> Self {
        Self {
            pending: None,
            saves: 0,
        }
    }

    pub(super) fn saves(&self) -> usize {
        self.saves
    }

    pub(super) fn track<IN: InputProvider>(&mut self, app: &mut ReaderApp<IN>, now_ms: u64) {
        if let Some(reason) = app.take_save_request() {
            // a newer request supersedes any retry still waiting
            self.pending = Some((reason, now_ms));
        }
    }

    pub(super) async fn flush_if_due<IN, S, L>(
        &mut self,
        app: &ReaderApp<IN>,
        store: &mut SessionStore<S, L>,
        now_ms: u64,
    ) where
        IN: InputProvider,
        S: SmallStore,
        L: LargeStore,
    {
        let Some((reason, due_ms)) = self.pending else {
            return;
        };
        if now_ms < due_ms {
            return;
        }

        if store.save(&app.snapshot_session(wall_clock_ms())).await {
            self.saves += 1;
            self.pending = None;
            info!(
                "session-save: flushed reason={} at={}",
                reason.as_str(),
                app.position()
            );
        } else {
            warn!(
                "session-save: failed reason={}, retrying in {}ms",
                reason.as_str(),
                SESSION_RETRY_MS
            );
            self.pending = Some((reason, now_ms + SESSION_RETRY_MS));
        }
    }

    /// Write whatever is pending right away, ignoring any retry back-off.
    pub(super) async fn flush_now<IN, S, L>(
        &mut self,
        app: &mut ReaderApp<IN>,
        store: &mut SessionStore<S, L>,
    ) where
        IN: InputProvider,
        S: SmallStore,
        L: LargeStore,
    {
        self.track(app, 0);
        if let Some((_, due_ms)) = self.pending.as_mut() {
            *due_ms = 0;
        }
        self.flush_if_due(app, store, 0).await;
    }
}

fn wall_clock_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |elapsed| {
            u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
        })
}
