use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{Result, SubburnError};

/// Container extension and content type of video produced from audio
pub const CONVERTED_EXTENSION: &str = "mp4";
pub const CONVERTED_CONTENT_TYPE: &str = "video/mp4";

/// Content type of Files-mode downloads
pub const DOWNLOAD_CONTENT_TYPE: &str = "application/octet-stream";

const MAX_EXTENSION_LEN: usize = 10;

/// How the subtitled media is returned
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub enum OutputMode {
    /// Streamed file download
    #[default]
    Files,
    /// `data:` URI with the base64-encoded media
    Base64,
}

impl FromStr for OutputMode {
    type Err = SubburnError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "files" => Ok(OutputMode::Files),
            "base64" => Ok(OutputMode::Base64),
            _ => Err(SubburnError::InvalidRequest(format!(
                "output_type must be one of: Files, Base64 (got '{}')",
                value
            ))),
        }
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputMode::Files => write!(f, "Files"),
            OutputMode::Base64 => write!(f, "Base64"),
        }
    }
}

/// An upload as received from the client
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub media_bytes: Bytes,
    pub media_filename: String,
    /// Content type declared by the client, if any
    pub media_content_type: Option<String>,
    pub subtitle_bytes: Bytes,
    pub subtitle_filename: String,
    pub output_mode: OutputMode,
    /// Per-request override for the subtitles filter style
    pub force_style: Option<String>,
}

/// The file a pipeline run produced, inside its workspace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedMedia {
    pub path: PathBuf,
    pub extension: String,
    pub content_type: String,
}

/// Reject subtitle files whose name does not end in `.srt` (case-sensitive)
pub fn validate_subtitle_filename(filename: &str) -> Result<()> {
    match filename.rsplit_once('.') {
        Some((_, "srt")) => Ok(()),
        _ => Err(SubburnError::InvalidSubtitleFormat(filename.to_string())),
    }
}

/// Filename without any client-side directory components
fn base_name(filename: &str) -> &str {
    filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename)
}

/// Extension after the last dot, kept only if it is short and alphanumeric
pub fn file_extension(filename: &str) -> Option<String> {
    let (_, ext) = base_name(filename).rsplit_once('.')?;
    let valid = !ext.is_empty()
        && ext.len() <= MAX_EXTENSION_LEN
        && ext.chars().all(|c| c.is_ascii_alphanumeric());
    valid.then(|| ext.to_string())
}

/// Filename without its extension
pub fn file_stem(filename: &str) -> &str {
    let name = base_name(filename);
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    }
}

/// `subtitled_<stem>.<extension>`, restricted to characters safe in a header
pub fn download_filename(media_filename: &str, extension: &str) -> String {
    let stem: String = file_stem(media_filename)
        .chars()
        .map(|c| if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' { c } else { '_' })
        .collect();
    let stem = if stem.trim().is_empty() { "media".to_string() } else { stem };
    format!("subtitled_{}.{}", stem, extension)
}

/// Best-effort content type for a container extension
pub fn content_type_for_extension(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        "mp4" | "m4v" => "video/mp4",
        "mov" => "video/quicktime",
        "mkv" => "video/x-matroska",
        "webm" => "video/webm",
        "avi" => "video/x-msvideo",
        "wmv" => "video/x-ms-wmv",
        "flv" => "video/x-flv",
        "mpeg" | "mpg" => "video/mpeg",
        "ts" => "video/mp2t",
        "ogv" => "video/ogg",
        _ => DOWNLOAD_CONTENT_TYPE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subtitle_extension_is_case_sensitive() {
        assert!(validate_subtitle_filename("cap.srt").is_ok());
        assert!(validate_subtitle_filename("my.movie.en.srt").is_ok());
        assert!(matches!(
            validate_subtitle_filename("cap.SRT"),
            Err(SubburnError::InvalidSubtitleFormat(_))
        ));
        assert!(validate_subtitle_filename("cap.txt").is_err());
        assert!(validate_subtitle_filename("srt").is_err());
        assert!(validate_subtitle_filename("cap.srt.txt").is_err());
    }

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("clip.mp4").as_deref(), Some("mp4"));
        assert_eq!(file_extension("archive.tar.MKV").as_deref(), Some("MKV"));
        assert_eq!(file_extension("noext"), None);
        assert_eq!(file_extension("trailing."), None);
        assert_eq!(file_extension("evil.mp4/../../x"), None);
        assert_eq!(file_extension("weird.m p4"), None);
    }

    #[test]
    fn test_download_filename() {
        assert_eq!(download_filename("clip.mp4", "mp4"), "subtitled_clip.mp4");
        assert_eq!(download_filename("song.mp3", "mp4"), "subtitled_song.mp4");
        assert_eq!(download_filename("C:\\fakepath\\clip.mov", "mov"), "subtitled_clip.mov");
        assert_eq!(download_filename("my \"clip\".mp4", "mp4"), "subtitled_my _clip_.mp4");
        assert_eq!(download_filename("vidéo.mp4", "mp4"), "subtitled_vid_o.mp4");
        assert_eq!(download_filename(".mp4", "mp4"), "subtitled_.mp4.mp4");
    }

    #[test]
    fn test_output_mode_parsing() {
        assert_eq!("Files".parse::<OutputMode>().unwrap(), OutputMode::Files);
        assert_eq!("base64".parse::<OutputMode>().unwrap(), OutputMode::Base64);
        assert!(matches!(
            "Zip".parse::<OutputMode>(),
            Err(SubburnError::InvalidRequest(_))
        ));
        assert_eq!(OutputMode::default(), OutputMode::Files);
    }

    #[test]
    fn test_content_type_for_extension() {
        assert_eq!(content_type_for_extension("MP4"), "video/mp4");
        assert_eq!(content_type_for_extension("mkv"), "video/x-matroska");
        assert_eq!(content_type_for_extension("xyz"), DOWNLOAD_CONTENT_TYPE);
    }
}
