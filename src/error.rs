use thiserror::Error;

#[derive(Error, Debug)]
pub enum SubburnError {
    #[error("The file uploaded is not a valid SRT file: {0}")]
    InvalidSubtitleFormat(String),

    #[error("The file uploaded is not a valid video/audio file: {0}")]
    UnsupportedMedia(String),

    #[error("Error during conversion of audio to video")]
    ConversionFailed,

    #[error("Error during hard subtitling of video")]
    BurnFailed,

    #[error("Media processor unavailable: {0}")]
    ToolUnavailable(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Workspace error: {0}")]
    Workspace(String),
}

impl SubburnError {
    /// True for outcomes caused by the uploaded data rather than by the service.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            SubburnError::InvalidSubtitleFormat(_)
                | SubburnError::UnsupportedMedia(_)
                | SubburnError::InvalidRequest(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, SubburnError>;
