//! VidScribe - narration preview
//!
//! Plays a video's descriptions against a simulated player running in real
//! time, narrating each one through the configured speech engine.
//!
//! ```text
//! vidscribe <video-id>
//! vidscribe --file descriptions.json
//! vidscribe --ask <video-id> <m:ss> <question>
//! vidscribe --questions <video-id>
//! ```

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use vidscribe::descriptions::{
    format_timestamp, parse_timestamp, select_primary_author, DescriptionRecord, SegmentList,
};
use vidscribe::playback::{
    MediaElement, PlaybackSurface, PlayerTiming, SimulatedPlayer, SourceError, SurfaceError,
    SurfaceProvider, VideoSource,
};
use vidscribe::services::{AskClient, AskRequest, HttpDescriptionStore, HttpVideoCatalog, TokenAuth};
use vidscribe::speech::{SharedSpeech, SimulatedSpeech};
use vidscribe::storage::{load_config, AppConfig};
use vidscribe::sync::{load_video, SyncError, SyncSession};

/// How often the preview player reports its position, like a media element.
const TIME_UPDATE_INTERVAL: Duration = Duration::from_millis(250);

const USAGE: &str = "usage: vidscribe <video-id> | vidscribe --file <descriptions.json> \
                     | vidscribe --ask <video-id> <m:ss> <question> | vidscribe --questions <video-id>";

enum Input {
    VideoId(String),
    File(PathBuf),
    Ask {
        video_id: String,
        time_seconds: u64,
        question: String,
    },
    Questions(String),
}

fn parse_args() -> Result<Input> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.as_slice() {
        [flag, path] if flag == "--file" => Ok(Input::File(PathBuf::from(path))),
        [flag, id] if flag == "--questions" => Ok(Input::Questions(id.clone())),
        [flag, id, time, question @ ..] if flag == "--ask" && !question.is_empty() => {
            Ok(Input::Ask {
                video_id: id.clone(),
                time_seconds: parse_timestamp(time),
                question: question.join(" "),
            })
        }
        [id] if !id.starts_with('-') => Ok(Input::VideoId(id.clone())),
        _ => bail!(USAGE),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DescriptionsFile {
    Wrapped { descriptions: Vec<DescriptionRecord> },
    Bare(Vec<DescriptionRecord>),
}

/// Surfaces for the preview: both kinds are the same simulated player.
struct PreviewSurfaces {
    player: Arc<SimulatedPlayer>,
}

impl SurfaceProvider for PreviewSurfaces {
    fn embedded(&self, _video_id: &str) -> Result<Arc<dyn PlaybackSurface>, SurfaceError> {
        Ok(self.player.clone())
    }

    fn native(&self, _media_url: &str) -> Result<Arc<dyn MediaElement>, SurfaceError> {
        Ok(self.player.clone())
    }
}

async fn load_remote(config: &AppConfig, video_id: &str) -> Result<Option<(VideoSource, SegmentList)>> {
    let timeout = config.services.request_timeout();
    let catalog = HttpVideoCatalog::new(&config.services.videos_url, timeout)?;
    let store = HttpDescriptionStore::new(
        &config.services.descriptions_url,
        timeout,
        Arc::new(TokenAuth::anonymous()),
    )?;

    match load_video(&catalog, &store, video_id).await {
        Ok(loaded) => {
            tracing::info!("Video: {}", loaded.title);
            Ok(Some((loaded.source, loaded.segments)))
        }
        Err(SyncError::Source(SourceError::NoSource)) => {
            tracing::warn!("Video {} has no playable source; nothing to narrate", video_id);
            Ok(None)
        }
        Err(e) => Err(e).with_context(|| format!("loading video {}", video_id)),
    }
}

async fn ask(config: &AppConfig, video_id: String, time_seconds: u64, question: String) -> Result<()> {
    let client = AskClient::new(&config.services.ask_url)?;
    let request = AskRequest::new(video_id, question, time_seconds as f64);
    let answer = client.ask(&request).await.context("asking question")?;
    println!("{}", answer);
    Ok(())
}

async fn list_questions(config: &AppConfig, video_id: &str) -> Result<()> {
    let client = AskClient::new(&config.services.ask_url)?;
    let questions = client
        .history(video_id)
        .await
        .with_context(|| format!("loading questions for video {}", video_id))?;

    if questions.is_empty() {
        println!("No questions yet");
    }
    for q in questions {
        println!("[{}] {}\n    {}", format_timestamp(q.timestamp as u64), q.question, q.answer);
    }
    Ok(())
}

fn load_file(path: &Path) -> Result<(VideoSource, SegmentList)> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let records = match serde_json::from_str::<DescriptionsFile>(&content)
        .with_context(|| format!("parsing {}", path.display()))?
    {
        DescriptionsFile::Wrapped { descriptions } => descriptions,
        DescriptionsFile::Bare(records) => records,
    };

    let source = VideoSource::Native {
        media_url: path.display().to_string(),
    };
    Ok((source, SegmentList::from_records(select_primary_author(records))))
}

fn speech_engine() -> SharedSpeech {
    #[cfg(feature = "system-tts")]
    match vidscribe::speech::SystemSpeech::new() {
        Ok(speech) => return Arc::new(speech),
        Err(e) => tracing::warn!("{}; falling back to simulated speech", e),
    }

    Arc::new(SimulatedSpeech::default())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting VidScribe v{}", env!("CARGO_PKG_VERSION"));

    let input = parse_args()?;
    let config = load_config().context("loading configuration")?;

    let (video_id, loaded) = match input {
        Input::VideoId(id) => {
            let loaded = load_remote(&config, &id).await?;
            (id, loaded)
        }
        Input::File(path) => ("local".to_string(), Some(load_file(&path)?)),
        Input::Ask {
            video_id,
            time_seconds,
            question,
        } => return ask(&config, video_id, time_seconds, question).await,
        Input::Questions(video_id) => return list_questions(&config, &video_id).await,
    };

    let Some((source, segments)) = loaded else {
        return Ok(());
    };
    let Some(last_end) = segments.last_end_seconds() else {
        tracing::warn!("No usable descriptions for video {}", video_id);
        return Ok(());
    };
    let segment_count = segments.len();

    let player = Arc::new(SimulatedPlayer::new(last_end + 2.0, PlayerTiming::RealTime));
    let provider = PreviewSurfaces {
        player: player.clone(),
    };

    let (done_tx, mut done_rx) = mpsc::unbounded_channel();
    let (session, handle) = SyncSession::mount(
        video_id,
        &source,
        &provider,
        segments,
        speech_engine(),
        &config.narration,
        &config.sync,
    )?;
    let session = session.on_narration_complete(move |index| {
        let _ = done_tx.send(index);
    });

    let task = tokio::spawn(session.run());
    player.play()?;

    let mut ticker = tokio::time::interval(TIME_UPDATE_INTERVAL);
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                break;
            }
            Some(index) = done_rx.recv() => {
                tracing::info!("Narrated description {}/{}", index + 1, segment_count);
                if index + 1 == segment_count {
                    break;
                }
            }
            _ = ticker.tick() => {
                player.tick();
                if player.is_ended() {
                    tracing::info!("Playback ended");
                    break;
                }
            }
        }
    }

    let _ = handle.shutdown();
    let engine = task.await.context("sync session task failed")?;
    tracing::info!(
        "Preview finished at {:.0}s, last narrated {:?}",
        engine.state().current_time,
        engine.last_narrated()
    );

    Ok(())
}
