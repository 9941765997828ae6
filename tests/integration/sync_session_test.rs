//! Narration cycle through a running session on a native media element.
//!
//! The player is driven by hand: every `set_time` or `seek` is one media
//! event, and speech completes only when the test says so.

use crate::player_mock::{native_source, segments, settle, start_session, MockSession};
use vidscribe::playback::{PlaybackSurface, SimulatedPlayer};
use vidscribe::speech::{SimulatedSpeech, SpeechErrorKind, SpeechOptions};

fn native_session(ranges: &[(f64, f64, &str)]) -> MockSession {
    start_session(
        &native_source(),
        SimulatedPlayer::manual(60.0),
        SimulatedSpeech::manual(),
        segments(ranges),
    )
}

#[tokio::test(start_paused = true)]
async fn test_pause_speak_resume_cycle() {
    let session = native_session(&[
        (0.0, 5.0, "Intro title card."),
        (5.0, 10.0, "A chef chops onions."),
    ]);
    session.player.play().unwrap();

    session.player.set_time(0.0);
    settle().await;
    assert!(session.player.is_paused());
    assert_eq!(session.speech.spoken(), vec!["Intro title card."]);

    session.speech.finish();
    settle().await;
    assert!(!session.player.is_paused());
    assert_eq!(session.completed(), vec![0]);

    for t in [1.0, 2.0, 3.0, 4.0] {
        session.player.set_time(t);
    }
    settle().await;
    assert_eq!(session.speech.spoken().len(), 1);
    assert!(!session.player.is_paused());

    session.player.set_time(5.0);
    settle().await;
    assert!(session.player.is_paused());
    assert_eq!(
        session.speech.spoken().last().map(String::as_str),
        Some("A chef chops onions.")
    );

    session.speech.finish();
    settle().await;
    assert!(!session.player.is_paused());
    assert_eq!(session.completed(), vec![0, 1]);

    let engine = session.finish().await;
    assert_eq!(engine.last_narrated(), Some(1));
}

#[tokio::test(start_paused = true)]
async fn test_seek_back_narrates_again() {
    let session = native_session(&[(0.0, 5.0, "A quiet street.")]);
    session.player.play().unwrap();

    session.player.set_time(0.0);
    settle().await;
    session.speech.finish();
    settle().await;

    session.player.set_time(3.0);
    settle().await;
    assert_eq!(session.speech.spoken().len(), 1);

    session.player.seek(1.0);
    settle().await;
    assert_eq!(session.speech.spoken().len(), 2);
    assert!(session.player.is_paused());

    session.finish().await;
}

#[tokio::test(start_paused = true)]
async fn test_seek_during_narration_cancels_without_resume() {
    let session = native_session(&[
        (0.0, 5.0, "A quiet street."),
        (20.0, 25.0, "Night falls."),
    ]);
    session.player.play().unwrap();

    session.player.set_time(0.0);
    settle().await;
    assert!(session.speech.current_utterance().is_some());

    session.player.seek(12.0);
    settle().await;
    assert!(session.speech.current_utterance().is_none());
    assert!(session.player.is_paused());
    assert!(session.completed().is_empty());

    session.finish().await;
}

#[tokio::test(start_paused = true)]
async fn test_disable_during_narration() {
    let session = native_session(&[(0.0, 5.0, "A quiet street.")]);
    session.player.play().unwrap();

    session.player.set_time(0.0);
    settle().await;
    assert!(session.speech.current_utterance().is_some());

    session.handle.set_enabled(false).unwrap();
    settle().await;
    assert!(session.speech.current_utterance().is_none());
    assert!(session.player.is_paused());
    assert!(session.completed().is_empty());

    session.player.set_time(1.0);
    settle().await;
    assert_eq!(session.speech.spoken().len(), 1);

    let engine = session.finish().await;
    assert!(!engine.is_enabled());
}

#[tokio::test(start_paused = true)]
async fn test_reenable_inside_range_narrates_again() {
    let session = native_session(&[(0.0, 10.0, "A quiet street.")]);
    session.player.play().unwrap();

    session.player.set_time(0.0);
    settle().await;
    session.handle.toggle_enabled().unwrap();
    settle().await;
    session.handle.toggle_enabled().unwrap();
    settle().await;

    session.player.set_time(2.0);
    settle().await;
    assert_eq!(session.speech.spoken().len(), 2);

    session.finish().await;
}

#[tokio::test(start_paused = true)]
async fn test_skip_reports_completion() {
    let session = native_session(&[(0.0, 5.0, "A quiet street.")]);
    session.player.play().unwrap();

    session.player.set_time(0.0);
    settle().await;

    session.handle.skip().unwrap();
    settle().await;
    assert!(session.speech.current_utterance().is_none());
    assert_eq!(session.completed(), vec![0]);

    // The user resumes; the same dwell stays silent.
    session.player.play().unwrap();
    session.player.set_time(2.0);
    settle().await;
    assert!(!session.player.is_paused());
    assert_eq!(session.speech.spoken().len(), 1);

    session.finish().await;
}

#[tokio::test(start_paused = true)]
async fn test_speech_error_resumes_playback() {
    let session = native_session(&[(0.0, 5.0, "A quiet street.")]);
    session.player.play().unwrap();

    session.player.set_time(0.0);
    settle().await;

    session.speech.fail(SpeechErrorKind::Other, "synthesis failed");
    settle().await;
    assert!(!session.player.is_paused());
    assert_eq!(session.completed(), vec![0]);

    session.finish().await;
}

#[tokio::test(start_paused = true)]
async fn test_interrupted_speech_keeps_waiting() {
    let session = native_session(&[(0.0, 5.0, "A quiet street.")]);
    session.player.play().unwrap();

    session.player.set_time(0.0);
    settle().await;

    session.speech.fail(SpeechErrorKind::Interrupted, "interrupted");
    settle().await;
    assert!(session.player.is_paused());
    assert!(session.completed().is_empty());

    session.player.set_time(1.0);
    settle().await;
    assert!(session.player.is_paused());
    assert_eq!(session.speech.spoken().len(), 1);

    session.finish().await;
}

#[tokio::test(start_paused = true)]
async fn test_rejected_pause_is_retried() {
    let session = native_session(&[(0.0, 5.0, "A quiet street.")]);
    session.player.fail_next_pauses(1);
    session.player.play().unwrap();

    session.player.set_time(0.0);
    settle().await;
    assert!(session.speech.spoken().is_empty());
    assert!(!session.player.is_paused());

    session.player.set_time(0.0);
    settle().await;
    assert!(session.player.is_paused());
    assert_eq!(session.speech.spoken().len(), 1);

    session.finish().await;
}

#[tokio::test(start_paused = true)]
async fn test_player_ready_late_still_narrates() {
    let session = native_session(&[(0.0, 10.0, "A quiet street.")]);
    session.player.fail_next_pauses(2);
    session.player.play().unwrap();

    session.player.set_time(0.0);
    session.player.set_time(0.0);
    settle().await;
    assert!(session.speech.spoken().is_empty());
    assert!(!session.player.is_paused());

    for t in [1.0, 2.0, 3.0, 4.0] {
        session.player.set_time(t);
    }
    settle().await;
    assert!(session.player.is_paused());
    assert_eq!(session.speech.spoken(), vec!["A quiet street."]);

    session.speech.finish();
    settle().await;
    assert_eq!(session.completed(), vec![0]);

    session.finish().await;
}

#[tokio::test(start_paused = true)]
async fn test_unpausable_player_gives_up_on_range_exit() {
    let session = native_session(&[(0.0, 5.0, "A quiet street.")]);
    session.player.fail_next_pauses(100);
    session.player.play().unwrap();

    for t in [0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0] {
        session.player.set_time(t);
    }
    settle().await;
    assert!(session.speech.spoken().is_empty());
    assert!(!session.player.is_paused());
    assert!(session.completed().is_empty());

    session.finish().await;
}

#[tokio::test(start_paused = true)]
async fn test_skip_while_waiting_for_pause_reports_nothing() {
    let session = native_session(&[(0.0, 5.0, "A quiet street.")]);
    session.player.fail_next_pauses(1);
    session.player.play().unwrap();

    session.player.set_time(0.0);
    settle().await;
    session.handle.skip().unwrap();
    settle().await;

    session.player.set_time(1.0);
    settle().await;
    assert!(session.speech.spoken().is_empty());
    assert!(session.completed().is_empty());

    session.finish().await;
}

#[tokio::test(start_paused = true)]
async fn test_speech_options_change_mid_session() {
    let session = native_session(&[
        (0.0, 5.0, "A quiet street."),
        (5.0, 10.0, "Night falls."),
    ]);
    session.player.play().unwrap();

    session.player.set_time(0.0);
    settle().await;
    session
        .handle
        .set_speech_options(SpeechOptions {
            rate: 1.5,
            voice: Some("Samantha".to_string()),
            ..SpeechOptions::default()
        })
        .unwrap();
    session.speech.finish();
    settle().await;

    session.player.set_time(5.0);
    settle().await;
    let options = session.speech.last_options().unwrap();
    assert_eq!(options.rate, 1.5);
    assert_eq!(options.voice.as_deref(), Some("Samantha"));

    session.finish().await;
}

#[tokio::test(start_paused = true)]
async fn test_reload_segments() {
    let session = native_session(&[(0.0, 5.0, "Old text.")]);
    session.player.play().unwrap();

    session
        .handle
        .reload_segments(segments(&[(10.0, 15.0, "New text.")]))
        .unwrap();
    settle().await;

    session.player.set_time(1.0);
    settle().await;
    assert!(session.speech.spoken().is_empty());

    session.player.set_time(10.0);
    settle().await;
    assert_eq!(session.speech.spoken(), vec!["New text."]);

    session.finish().await;
}
