//! Stream probing and media classification.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

use super::{MediaProcessorTrait, StreamKind};
use crate::error::Result;

/// Demuxer names ffprobe reports for still images, besides the `*_pipe` family
const STILL_IMAGE_FORMATS: &[&str] = &["image2", "webp"];

/// What an uploaded file contains, as far as the pipeline cares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaClassification {
    Video,
    Audio,
    Invalid,
}

impl fmt::Display for MediaClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaClassification::Video => write!(f, "video"),
            MediaClassification::Audio => write!(f, "audio"),
            MediaClassification::Invalid => write!(f, "invalid"),
        }
    }
}

/// Parsed ffprobe output for one stream kind
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProbeReport {
    #[serde(default)]
    pub streams: Vec<ProbedStream>,
    #[serde(default)]
    pub format: Option<ProbedFormat>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProbedStream {
    pub index: u32,
    #[serde(default)]
    pub codec_type: Option<String>,
    #[serde(default)]
    pub codec_name: Option<String>,
    #[serde(default)]
    pub disposition: ProbedDisposition,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProbedDisposition {
    #[serde(default)]
    pub attached_pic: u8,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProbedFormat {
    #[serde(default)]
    pub format_name: String,
}

impl ProbeReport {
    /// Parse the JSON ffprobe writes with `-of json`
    pub fn from_json(json: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(json)?)
    }

    /// Whether the container is a still-image demuxer (jpeg, png, ...)
    pub fn is_still_image(&self) -> bool {
        self.format.as_ref().is_some_and(|format| {
            STILL_IMAGE_FORMATS.contains(&format.format_name.as_str())
                || format.format_name.ends_with("_pipe")
        })
    }

    /// Video streams that carry moving pictures
    pub fn has_motion_video(&self) -> bool {
        if self.is_still_image() {
            return false;
        }
        self.streams.iter().any(|stream| {
            stream.codec_type.as_deref().unwrap_or("video") == "video"
                && stream.disposition.attached_pic == 0
        })
    }

    pub fn has_audio(&self) -> bool {
        self.streams
            .iter()
            .any(|stream| stream.codec_type.as_deref().unwrap_or("audio") == "audio")
    }
}

/// Classifies uploads by asking the media processor which streams they hold
pub struct MediaProber;

impl MediaProber {
    /// Video wins over audio; the audio probe only runs when no video was found.
    ///
    /// A missing or crashing probe tool is returned as an error, never as `Invalid`.
    pub async fn classify(media: &dyn MediaProcessorTrait, path: &Path) -> Result<MediaClassification> {
        let video = media.probe_streams(path, StreamKind::Video).await?;
        if video.has_motion_video() {
            info!("Detected video stream in {}", path.display());
            return Ok(MediaClassification::Video);
        }

        let audio = media.probe_streams(path, StreamKind::Audio).await?;
        if audio.has_audio() {
            info!("Detected audio-only media in {}", path.display());
            return Ok(MediaClassification::Audio);
        }

        debug!("No audio or video stream found in {}", path.display());
        Ok(MediaClassification::Invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SubburnError;
    use crate::media::MockMediaProcessorTrait;
    use mockall::predicate::{always, eq};

    const MP4_VIDEO: &str = r#"{
        "programs": [],
        "streams": [
            {"index": 0, "codec_name": "h264", "codec_type": "video", "disposition": {"attached_pic": 0}}
        ],
        "format": {"format_name": "mov,mp4,m4a,3gp,3g2,mj2"}
    }"#;

    const MP3_COVER_ART: &str = r#"{
        "streams": [
            {"index": 1, "codec_name": "mjpeg", "codec_type": "video", "disposition": {"attached_pic": 1}}
        ],
        "format": {"format_name": "mp3"}
    }"#;

    const JPEG_IMAGE: &str = r#"{
        "streams": [
            {"index": 0, "codec_name": "mjpeg", "codec_type": "video", "disposition": {"attached_pic": 0}}
        ],
        "format": {"format_name": "jpeg_pipe"}
    }"#;

    const JPG_UPLOAD: &str = r#"{
        "streams": [
            {"index": 0, "codec_name": "mjpeg", "codec_type": "video", "disposition": {"attached_pic": 0}}
        ],
        "format": {"format_name": "image2"}
    }"#;

    const MP3_AUDIO: &str = r#"{
        "streams": [
            {"index": 0, "codec_name": "mp3", "codec_type": "audio", "disposition": {"attached_pic": 0}}
        ],
        "format": {"format_name": "mp3"}
    }"#;

    fn report(json: &str) -> ProbeReport {
        ProbeReport::from_json(json.as_bytes()).unwrap()
    }

    #[test]
    fn test_motion_video_detection() {
        assert!(report(MP4_VIDEO).has_motion_video());
        assert!(!report(MP3_COVER_ART).has_motion_video());
        assert!(!report(JPEG_IMAGE).has_motion_video());
        assert!(!report(JPG_UPLOAD).has_motion_video());
        assert!(!ProbeReport::default().has_motion_video());
    }

    #[test]
    fn test_audio_detection() {
        assert!(report(MP3_AUDIO).has_audio());
        assert!(!ProbeReport::default().has_audio());
    }

    #[test]
    fn test_report_without_format_section() {
        let parsed = report(r#"{"streams": []}"#);
        assert!(parsed.format.is_none());
        assert!(parsed.streams.is_empty());
    }

    #[tokio::test]
    async fn test_video_skips_audio_probe() {
        let mut media = MockMediaProcessorTrait::new();
        media
            .expect_probe_streams()
            .with(always(), eq(StreamKind::Video))
            .times(1)
            .returning(|_, _| Ok(report(MP4_VIDEO)));

        let classification = MediaProber::classify(&media, Path::new("/work/clip")).await.unwrap();
        assert_eq!(classification, MediaClassification::Video);
    }

    #[tokio::test]
    async fn test_audio_with_cover_art_is_audio() {
        let mut media = MockMediaProcessorTrait::new();
        media
            .expect_probe_streams()
            .with(always(), eq(StreamKind::Video))
            .times(1)
            .returning(|_, _| Ok(report(MP3_COVER_ART)));
        media
            .expect_probe_streams()
            .with(always(), eq(StreamKind::Audio))
            .times(1)
            .returning(|_, _| Ok(report(MP3_AUDIO)));

        let classification = MediaProber::classify(&media, Path::new("/work/song")).await.unwrap();
        assert_eq!(classification, MediaClassification::Audio);
    }

    #[tokio::test]
    async fn test_no_streams_is_invalid() {
        let mut media = MockMediaProcessorTrait::new();
        media
            .expect_probe_streams()
            .returning(|_, _| Ok(ProbeReport::default()));

        let classification = MediaProber::classify(&media, Path::new("/work/photo")).await.unwrap();
        assert_eq!(classification, MediaClassification::Invalid);
    }

    #[tokio::test]
    async fn test_tool_failure_is_not_a_classification() {
        let mut media = MockMediaProcessorTrait::new();
        media
            .expect_probe_streams()
            .returning(|_, _| Err(SubburnError::ToolUnavailable("ffprobe: not found".to_string())));

        let result = MediaProber::classify(&media, Path::new("/work/clip")).await;
        assert!(matches!(result, Err(SubburnError::ToolUnavailable(_))));
    }
}
