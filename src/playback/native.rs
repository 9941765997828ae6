//! Event-driven clock for native media elements.

use super::{quantize, ClockEvent, ClockKind, MediaElement, MediaEvent, PlaybackClock, SurfaceError};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Clock adapter that forwards a media element's time updates
pub struct NativeClock {
    element: Arc<dyn MediaElement>,
    granularity: f64,
    cancel_token: Option<CancellationToken>,
    handle: Option<JoinHandle<()>>,
}

impl NativeClock {
    /// Wrap a media element; events flow after [`PlaybackClock::subscribe`]
    pub fn new(element: Arc<dyn MediaElement>, granularity: f64) -> Self {
        Self {
            element,
            granularity,
            cancel_token: None,
            handle: None,
        }
    }
}

impl PlaybackClock for NativeClock {
    fn kind(&self) -> ClockKind {
        ClockKind::Native
    }

    fn current_time_seconds(&self) -> Result<f64, SurfaceError> {
        Ok(quantize(self.element.current_time()?, self.granularity))
    }

    fn play(&self) -> Result<(), SurfaceError> {
        self.element.play()
    }

    fn pause(&self) -> Result<(), SurfaceError> {
        self.element.pause()
    }

    fn is_paused(&self) -> bool {
        self.element.is_paused()
    }

    fn subscribe(&mut self) -> mpsc::UnboundedReceiver<ClockEvent> {
        self.stop();

        let (tx, rx) = mpsc::unbounded_channel();
        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(forward_events(
            self.element.subscribe_events(),
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

impl Drop for NativeClock {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn forward_events(
    mut events: broadcast::Receiver<MediaEvent>,
    granularity: f64,
    tx: mpsc::UnboundedSender<ClockEvent>,
    cancel_token: CancellationToken,
) {
    loop {
        let event = tokio::select! {
            event = events.recv() => event,
            _ = cancel_token.cancelled() => break,
        };

        let clock_event = match event {
            Ok(MediaEvent::TimeUpdate(time)) => ClockEvent::Sample(quantize(time, granularity)),
            Ok(MediaEvent::Seeking(time)) => ClockEvent::Seeked(quantize(time, granularity)),
            Ok(_) => continue,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!("Native clock lagged, skipped {} media events", skipped);
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => break,
        };

        if tx.send(clock_event).is_err() {
            break;
        }
    }

    tracing::debug!("Native clock stopped");
}
