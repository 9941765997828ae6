//! End-to-end narration on an embedded player sampled by the polling clock.

use crate::player_mock::{segments, start_session, MockSession};
use std::time::Duration;
use tokio::time::timeout;
use vidscribe::playback::{PlaybackSurface, PlayerTiming, SimulatedPlayer, VideoSource};
use vidscribe::speech::{SimulatedSpeech, SpeechTiming};

fn embedded_source() -> VideoSource {
    VideoSource::Embedded {
        video_id: "dQw4w9WgXcQ".to_string(),
    }
}

fn timed_speech() -> SimulatedSpeech {
    SimulatedSpeech::new(SpeechTiming::PerChar {
        millis_per_char: 50,
        max_duration: Duration::from_secs(5),
    })
}

/// Wait until `count` narrations have completed, polling the session's sink.
async fn wait_for_completions(session: &MockSession, count: usize) {
    timeout(Duration::from_secs(60), async {
        while session.completed().len() < count {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    })
    .await
    .expect("narrations did not complete in time");
}

#[tokio::test(start_paused = true)]
async fn test_polling_clock_narrates_each_range_once() {
    let session = start_session(
        &embedded_source(),
        SimulatedPlayer::new(30.0, PlayerTiming::RealTime),
        timed_speech(),
        segments(&[
            (2.0, 4.0, "A door opens."),
            (6.0, 9.0, "Two people shake hands."),
        ]),
    );
    session.player.play().unwrap();

    wait_for_completions(&session, 2).await;
    assert_eq!(session.completed(), vec![0, 1]);
    assert_eq!(
        session.speech.spoken(),
        vec!["A door opens.", "Two people shake hands."]
    );

    // Narration paused the video, so it is behind wall-clock time.
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(!session.player.is_paused());
    assert!(session.player.position() >= 6.0);

    let engine = session.finish().await;
    assert_eq!(engine.last_narrated(), Some(1));
    assert!(!engine.clock().is_paused());
}

#[tokio::test(start_paused = true)]
async fn test_disabled_session_never_pauses() {
    let session = start_session(
        &embedded_source(),
        SimulatedPlayer::new(10.0, PlayerTiming::RealTime),
        timed_speech(),
        segments(&[(1.0, 3.0, "A door opens.")]),
    );
    session.handle.set_enabled(false).unwrap();
    session.player.play().unwrap();

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(session.speech.spoken().is_empty());
    assert!(!session.player.is_paused());
    assert!(session.player.position() >= 4.0);

    session.finish().await;
}
