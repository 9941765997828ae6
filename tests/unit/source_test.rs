//! Video source resolution tests.

use vidscribe::playback::{extract_video_id, resolve_source, SourceError, VideoSource};

#[test]
fn test_recognized_url_shapes() {
    let urls = [
        "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
        "https://youtube.com/watch?feature=share&v=dQw4w9WgXcQ",
        "http://m.youtube.com/watch?v=dQw4w9WgXcQ&t=42s",
        "https://youtu.be/dQw4w9WgXcQ",
        "youtu.be/dQw4w9WgXcQ?si=abc",
        "https://www.youtube.com/embed/dQw4w9WgXcQ",
        "https://www.youtube-nocookie.com/embed/dQw4w9WgXcQ",
        "https://www.youtube.com/shorts/dQw4w9WgXcQ",
    ];

    for url in urls {
        assert_eq!(
            extract_video_id(url).as_deref(),
            Some("dQw4w9WgXcQ"),
            "{}",
            url
        );
    }
}

#[test]
fn test_rejected_urls() {
    let urls = [
        "",
        "unknown",
        "https://vimeo.com/12345678",
        "https://www.youtube.com/watch?v=short",
        "https://youtu.be/",
        "https://bucket.example.com/video.mp4",
    ];

    for url in urls {
        assert_eq!(extract_video_id(url), None, "{}", url);
    }
}

#[test]
fn test_resolution_preference() {
    let media = Some("https://bucket.example.com/video.mp4");

    assert_eq!(
        resolve_source(Some("https://youtu.be/dQw4w9WgXcQ"), media),
        Ok(VideoSource::Embedded {
            video_id: "dQw4w9WgXcQ".to_string()
        })
    );
    assert_eq!(
        resolve_source(Some("https://vimeo.com/1"), media),
        Ok(VideoSource::Native {
            media_url: "https://bucket.example.com/video.mp4".to_string()
        })
    );
    assert_eq!(resolve_source(None, None), Err(SourceError::NoSource));
}
