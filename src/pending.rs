//! The transient "awaiting reply" placeholder and its animation timer.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::constants::PENDING_FRAMES;
use crate::transcript::TranscriptSurface;

/// Owns the recurring frame timer for one pending placeholder.
///
/// The timer lives until [`PendingTurn::cancel`] is called or the value is
/// dropped. Cancelling more than once is a no-op.
#[derive(Debug)]
pub struct PendingTurn {
    stop_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl PendingTurn {
    /// Shows the placeholder on `surface` and starts cycling frames every
    /// `interval`. Must be called from within a tokio runtime.
    pub fn start<S: TranscriptSurface>(surface: Arc<Mutex<S>>, interval: Duration) -> Self {
        if let Ok(mut surface) = surface.lock() {
            surface.show_pending(PENDING_FRAMES[0]);
        }

        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately; frame 0 is already shown.
            ticker.tick().await;
            let mut frame = 0usize;
            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {
                        frame = (frame + 1) % PENDING_FRAMES.len();
                        trace!(frame, "pending indicator tick");
                        match surface.lock() {
                            Ok(mut surface) => surface.animate_pending(PENDING_FRAMES[frame]),
                            Err(_) => break,
                        }
                    }
                }
            }
        });

        Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        }
    }

    /// Stops the animation timer. Returns `true` only on the call that
    /// actually stopped it.
    pub fn cancel(&mut self) -> bool {
        let Some(stop_tx) = self.stop_tx.take() else {
            return false;
        };
        // The task may already be gone if the surface lock was poisoned.
        let _ = stop_tx.send(());
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
        debug!("pending indicator timer cancelled");
        true
    }

    pub fn is_active(&self) -> bool {
        self.stop_tx.is_some()
    }
}

impl Drop for PendingTurn {
    fn drop(&mut self) {
        self.cancel();
    }
}
