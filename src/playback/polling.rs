//! Polling clock for embedded players.
//!
//! Embedded players do not push time updates, so the current time is sampled
//! on a fixed interval. Samples keep flowing while the player is paused, which
//! lets the engine retry failed control commands.

use super::{quantize, ClockEvent, ClockKind, PlaybackClock, PlaybackSurface, SurfaceError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Default sampling interval for embedded players
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Clock adapter that samples an embedded player on an interval
pub struct PollingClock {
    surface: Arc<dyn PlaybackSurface>,
    interval: Duration,
    granularity: f64,
    cancel_token: Option<CancellationToken>,
    handle: Option<JoinHandle<()>>,
}

impl PollingClock {
    /// Create a polling clock; sampling starts on [`PlaybackClock::subscribe`]
    pub fn new(surface: Arc<dyn PlaybackSurface>, interval: Duration, granularity: f64) -> Self {
        Self {
            surface,
            interval: if interval.is_zero() {
                DEFAULT_POLL_INTERVAL
            } else {
                interval
            },
            granularity,
            cancel_token: None,
            handle: None,
        }
    }

    /// Whether the sampling task is running
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().map(|h| !h.is_finished()).unwrap_or(false)
    }
}

impl PlaybackClock for PollingClock {
    fn kind(&self) -> ClockKind {
        ClockKind::Polling
    }

    fn current_time_seconds(&self) -> Result<f64, SurfaceError> {
        Ok(quantize(self.surface.current_time()?, self.granularity))
    }

    fn play(&self) -> Result<(), SurfaceError> {
        self.surface.play()
    }

    fn pause(&self) -> Result<(), SurfaceError> {
        self.surface.pause()
    }

    fn is_paused(&self) -> bool {
        self.surface.is_paused()
    }

    fn subscribe(&mut self) -> mpsc::UnboundedReceiver<ClockEvent> {
        self.stop();

        let (tx, rx) = mpsc::unbounded_channel();
        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(polling_loop(
            Arc::clone(&self.surface),
            self.interval,
            self.granularity,
            tx,
            cancel_token.clone(),
        ));

        self.cancel_token = Some(cancel_token);
        self.handle = Some(handle);
        rx
    }

    fn stop(&mut self) {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for PollingClock {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn polling_loop(
    surface: Arc<dyn PlaybackSurface>,
    interval: Duration,
    granularity: f64,
    tx: mpsc::UnboundedSender<ClockEvent>,
    cancel_token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match surface.current_time() {
                    Ok(time) => {
                        if tx.send(ClockEvent::Sample(quantize(time, granularity))).is_err() {
                            break;
                        }
                    }
                    Err(e) => tracing::debug!("Skipping time sample: {}", e),
                }
            }
            _ = cancel_token.cancelled() => {
                tracing::debug!("Polling clock shutting down");
                break;
            }
        }
    }
}
