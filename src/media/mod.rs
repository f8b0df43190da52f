// Media processing architecture
//
// This module wraps the external media processor behind a trait:
// - Commands: argument-vector builders for ffmpeg/ffprobe invocations
// - Processor: ffmpeg-backed implementation of the trait
// - Probe: stream report parsing and upload classification

pub mod commands;
pub mod processor;
pub mod probe;

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

pub use commands::*;
pub use probe::{MediaClassification, MediaProber, ProbeReport};
pub use processor::*;

use crate::config::MediaConfig;
use crate::error::Result;

/// Main trait for media processing operations.
///
/// `Ok(false)` from a conversion step means the tool ran and rejected the
/// input; `Err(ToolUnavailable)` means the tool itself could not run.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaProcessorTrait: Send + Sync {
    /// Report the streams of one kind found in a file (empty if the file is not media)
    async fn probe_streams(&self, path: &Path, kind: StreamKind) -> Result<ProbeReport>;

    /// Pair an audio-only input with a static visual track, writing an mp4 container
    async fn audio_to_video(&self, input_path: &Path, output_path: &Path) -> Result<bool>;

    /// Render subtitle cues into the video frames, overwriting the output
    async fn burn_subtitles(
        &self,
        video_path: &Path,
        subtitle_path: &Path,
        output_path: &Path,
        force_style: Option<String>,
    ) -> Result<bool>;

    /// Check if media processor is available
    async fn check_availability(&self) -> Result<()>;

    /// Get media processor version information
    async fn get_version_info(&self) -> Result<String>;
}

/// Factory for creating media processor instances
pub struct MediaProcessorFactory;

impl MediaProcessorFactory {
    /// Create the default media processor implementation (FFmpeg-based)
    pub fn create_processor(config: MediaConfig) -> Arc<dyn MediaProcessorTrait> {
        Arc::new(processor::MediaProcessorImpl::new(config))
    }
}
