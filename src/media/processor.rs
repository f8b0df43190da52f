use async_trait::async_trait;
use std::path::Path;
use tracing::{debug, error, info, warn};

use crate::config::MediaConfig;
use crate::error::{Result, SubburnError};
use super::{CommandOutput, MediaCommand, MediaCommandBuilder, MediaProcessorTrait, ProbeReport, StreamKind};

/// Lines of ffmpeg stderr kept when reporting a failure
const STDERR_TAIL_LINES: usize = 20;

/// Concrete implementation of media processor (FFmpeg-based)
pub struct MediaProcessorImpl {
    config: MediaConfig,
    command_builder: MediaCommandBuilder,
}

impl MediaProcessorImpl {
    /// Create a new media processor implementation
    pub fn new(config: MediaConfig) -> Self {
        let command_builder = MediaCommandBuilder::new(&config.binary_path, &config.probe_binary_path);

        Self {
            config,
            command_builder,
        }
    }

    /// Run a conversion command, mapping a signal-terminated tool to `ToolUnavailable`
    async fn run_conversion(&self, command: MediaCommand) -> Result<bool> {
        let output = command.execute().await?;
        let output = ensure_exited(&command, output)?;

        if output.success() {
            return Ok(true);
        }

        error!(
            "{} failed with exit code {:?}: {}",
            command.description,
            output.code,
            output.stderr_tail(STDERR_TAIL_LINES)
        );
        Ok(false)
    }

    async fn version_line(&self, command: MediaCommand) -> Result<String> {
        let output = command.execute().await?;

        if output.success() {
            let version_info = String::from_utf8_lossy(&output.stdout);
            // The first line carries the version
            let first_line = version_info.lines().next().unwrap_or("Unknown version");
            Ok(first_line.to_string())
        } else {
            Err(SubburnError::ToolUnavailable(format!(
                "{} version check failed: {}",
                command.binary_path,
                output.stderr_tail(STDERR_TAIL_LINES)
            )))
        }
    }
}

/// A process without an exit code was killed by a signal: the tool crashed
fn ensure_exited(command: &MediaCommand, output: CommandOutput) -> Result<CommandOutput> {
    if output.code.is_none() {
        return Err(SubburnError::ToolUnavailable(format!(
            "{} was terminated by a signal during {}",
            command.binary_path,
            command.description.to_lowercase()
        )));
    }
    Ok(output)
}

#[async_trait]
impl MediaProcessorTrait for MediaProcessorImpl {
    async fn probe_streams(&self, path: &Path, kind: StreamKind) -> Result<ProbeReport> {
        let command = self.command_builder.probe_streams(path, kind);
        let output = command.execute().await?;
        let output = ensure_exited(&command, output)?;

        if !output.success() {
            // ffprobe refuses files it cannot demux; that is a property of the data
            debug!(
                "Probe rejected {}: {}",
                path.display(),
                output.stderr_tail(STDERR_TAIL_LINES)
            );
            return Ok(ProbeReport::default());
        }

        ProbeReport::from_json(&output.stdout).map_err(|e| {
            SubburnError::ToolUnavailable(format!("Unreadable probe output for {}: {}", path.display(), e))
        })
    }

    async fn audio_to_video(&self, input_path: &Path, output_path: &Path) -> Result<bool> {
        info!("Converting audio {} to video {}", input_path.display(), output_path.display());

        let command = self.command_builder.audio_to_video(input_path, output_path, &self.config.background);
        let converted = self.run_conversion(command).await?;

        if converted {
            info!("Audio to video conversion completed");
        }
        Ok(converted)
    }

    async fn burn_subtitles(
        &self,
        video_path: &Path,
        subtitle_path: &Path,
        output_path: &Path,
        force_style: Option<String>,
    ) -> Result<bool> {
        info!("Burning subtitles from {} into {} -> {}",
              subtitle_path.display(), video_path.display(), output_path.display());

        let style = force_style.or_else(|| self.config.force_style.clone());
        let command = self.command_builder.burn_subtitles(
            video_path,
            subtitle_path,
            output_path,
            style.as_deref(),
            &self.config.subtitle_options,
        );
        let burned = self.run_conversion(command).await?;

        if burned {
            info!("Subtitle burning completed successfully");
        }
        Ok(burned)
    }

    async fn check_availability(&self) -> Result<()> {
        for command in [self.command_builder.version_check(), self.command_builder.probe_version_check()] {
            let binary = command.binary_path.clone();
            if let Err(e) = self.version_line(command).await {
                warn!("{} is not usable: {}", binary, e);
                return Err(e);
            }
        }

        info!("Media processor is available");
        Ok(())
    }

    async fn get_version_info(&self) -> Result<String> {
        debug!("Getting media processor version information");
        self.version_line(self.command_builder.version_check()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn missing_tools() -> MediaProcessorImpl {
        MediaProcessorImpl::new(MediaConfig {
            binary_path: "/nonexistent/subburn-ffmpeg".to_string(),
            probe_binary_path: "/nonexistent/subburn-ffprobe".to_string(),
            ..MediaConfig::default()
        })
    }

    #[tokio::test]
    async fn test_missing_probe_tool_is_reported() {
        let media = missing_tools();
        let result = media.probe_streams(Path::new("clip.mp4"), StreamKind::Video).await;
        assert!(matches!(result, Err(SubburnError::ToolUnavailable(_))));
    }

    #[tokio::test]
    async fn test_missing_ffmpeg_fails_burn_with_tool_error() {
        let media = missing_tools();
        let result = media
            .burn_subtitles(Path::new("in.mp4"), Path::new("in.srt"), Path::new("out.mp4"), None)
            .await;
        assert!(matches!(result, Err(SubburnError::ToolUnavailable(_))));
    }

    #[tokio::test]
    async fn test_availability_check_fails_without_tools() {
        let media = missing_tools();
        tokio_test::assert_err!(media.check_availability().await);
    }

    #[test]
    fn test_signal_termination_is_tool_failure() {
        let command = MediaCommand::new("ffmpeg", "Subtitle burning");
        let output = CommandOutput {
            code: None,
            stdout: Vec::new(),
            stderr: String::new(),
        };
        let result = ensure_exited(&command, output);
        assert!(matches!(result, Err(SubburnError::ToolUnavailable(msg)) if msg.contains("subtitle burning")));
    }
}
