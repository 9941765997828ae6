//! Session harness over the simulated player and speech engine.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use vidscribe::descriptions::{DescriptionSegment, SegmentList};
use vidscribe::playback::{
    MediaElement, PlaybackSurface, SimulatedPlayer, SurfaceError, SurfaceProvider, VideoSource,
};
use vidscribe::speech::{SharedSpeech, SimulatedSpeech};
use vidscribe::storage::{NarrationSettings, SyncSettings};
use vidscribe::sync::{SessionHandle, SyncEngine, SyncSession};

/// Hands out the same simulated player for either surface kind.
pub struct MockProvider {
    pub player: Arc<SimulatedPlayer>,
}

impl SurfaceProvider for MockProvider {
    fn embedded(&self, _video_id: &str) -> Result<Arc<dyn PlaybackSurface>, SurfaceError> {
        Ok(self.player.clone())
    }

    fn native(&self, _media_url: &str) -> Result<Arc<dyn MediaElement>, SurfaceError> {
        Ok(self.player.clone())
    }
}

/// A mounted session with handles on everything it drives.
pub struct MockSession {
    pub player: Arc<SimulatedPlayer>,
    pub speech: Arc<SimulatedSpeech>,
    pub handle: SessionHandle,
    pub completed: Arc<Mutex<Vec<usize>>>,
    task: JoinHandle<SyncEngine>,
}

impl MockSession {
    /// Indices reported through the narration-complete callback so far
    pub fn completed(&self) -> Vec<usize> {
        self.completed.lock().unwrap().clone()
    }

    /// Shut the session down and return its engine
    pub async fn finish(self) -> SyncEngine {
        self.handle.shutdown().unwrap();
        self.task.await.unwrap()
    }
}

pub fn segments(ranges: &[(f64, f64, &str)]) -> SegmentList {
    SegmentList::from_segments(
        ranges
            .iter()
            .enumerate()
            .map(|(i, (start, end, text))| {
                DescriptionSegment::new(i as u64 + 1, *text, *start, *end)
            }),
    )
}

pub fn native_source() -> VideoSource {
    VideoSource::Native {
        media_url: "https://bucket.example.com/video.mp4".to_string(),
    }
}

/// Mount and start a session. Must be called inside a tokio runtime.
pub fn start_session(
    source: &VideoSource,
    player: SimulatedPlayer,
    speech: SimulatedSpeech,
    list: SegmentList,
) -> MockSession {
    let player = Arc::new(player);
    let speech = Arc::new(speech);
    let provider = MockProvider {
        player: player.clone(),
    };

    let (session, handle) = SyncSession::mount(
        "test-video",
        source,
        &provider,
        list,
        speech.clone() as SharedSpeech,
        &NarrationSettings::default(),
        &SyncSettings::default(),
    )
    .unwrap();

    let completed = Arc::new(Mutex::new(Vec::new()));
    let sink = completed.clone();
    let session = session.on_narration_complete(move |index| sink.lock().unwrap().push(index));
    let task = tokio::spawn(session.run());

    MockSession {
        player,
        speech,
        handle,
        completed,
        task,
    }
}

/// Let the clock, speech and session tasks process pending events.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(5)).await;
}
