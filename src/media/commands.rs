use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::config::BackgroundConfig;
use crate::error::{Result, SubburnError};

/// Abstract media processing command representation
#[derive(Debug, Clone)]
pub struct MediaCommand {
    pub binary_path: String,
    pub args: Vec<String>,
    pub description: String,
    pub working_dir: Option<PathBuf>,
}

/// Captured result of a command that ran to completion
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Exit code; `None` when the process was terminated by a signal
    pub code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Last few lines of stderr, which is where ffmpeg puts the actual error
    pub fn stderr_tail(&self, lines: usize) -> String {
        let all: Vec<&str> = self.stderr.lines().collect();
        let start = all.len().saturating_sub(lines);
        all[start..].join("\n")
    }
}

impl MediaCommand {
    /// Create a new media processing command
    pub fn new<S1: Into<String>, S2: Into<String>>(binary_path: S1, description: S2) -> Self {
        Self {
            binary_path: binary_path.into(),
            args: Vec::new(),
            description: description.into(),
            working_dir: None,
        }
    }

    /// Add an argument
    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(|s| s.into()));
        self
    }

    /// Add input file
    pub fn input<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg("-i").arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Add output file
    pub fn output<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Force overwrite output
    pub fn overwrite(self) -> Self {
        self.arg("-y")
    }

    /// Set input format for the next input
    pub fn format<S: Into<String>>(self, format: S) -> Self {
        self.arg("-f").arg(format)
    }

    /// Set video codec
    pub fn video_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-c:v").arg(codec)
    }

    /// Set audio codec
    pub fn audio_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-c:a").arg(codec)
    }

    /// Add video filter
    pub fn video_filter<S: Into<String>>(self, filter: S) -> Self {
        self.arg("-vf").arg(filter)
    }

    /// Stop writing when the shortest input ends
    pub fn shortest(self) -> Self {
        self.arg("-shortest").arg("-fflags").arg("+shortest")
    }

    /// Run the command from the given directory
    pub fn current_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.working_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Execute the command and capture its output.
    ///
    /// Only a failure to start the process is an error here; a non-zero exit
    /// is reported through [`CommandOutput`] so callers can decide what it means.
    /// The child is killed if the returned future is dropped.
    pub async fn execute(&self) -> Result<CommandOutput> {
        debug!("Executing media processing command: {} {:?}", self.binary_path, self.args);
        debug!("Description: {}", self.description);

        let mut cmd = Command::new(&self.binary_path);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        let output = cmd.output().await.map_err(|e| {
            SubburnError::ToolUnavailable(format!("Failed to execute {}: {}", self.binary_path, e))
        })?;

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: output.stdout,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Stream selector for probing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Video,
    Audio,
}

impl StreamKind {
    pub fn selector(&self) -> &'static str {
        match self {
            StreamKind::Video => "v",
            StreamKind::Audio => "a",
        }
    }
}

/// Builder for the commands the pipeline needs
pub struct MediaCommandBuilder {
    binary_path: String,
    probe_binary_path: String,
}

impl MediaCommandBuilder {
    /// Create a new command builder
    pub fn new<S1: Into<String>, S2: Into<String>>(binary_path: S1, probe_binary_path: S2) -> Self {
        Self {
            binary_path: binary_path.into(),
            probe_binary_path: probe_binary_path.into(),
        }
    }

    /// Build stream probe command, JSON output restricted to one stream kind
    pub fn probe_streams<P: AsRef<Path>>(&self, path: P, kind: StreamKind) -> MediaCommand {
        MediaCommand::new(&self.probe_binary_path, format!("Probe {:?} streams", kind))
            .args(["-v", "error", "-select_streams", kind.selector()])
            .arg("-show_entries")
            .arg("stream=index,codec_type,codec_name:stream_disposition=attached_pic:format=format_name")
            .args(["-of", "json"])
            .output(path)
    }

    /// Build audio to video conversion command.
    ///
    /// Pairs the audio with a solid color (or a looped image) and stops at the
    /// shortest stream so the visual track does not outlive the audio.
    pub fn audio_to_video<P: AsRef<Path>>(
        &self,
        audio_path: P,
        output_path: P,
        background: &BackgroundConfig,
    ) -> MediaCommand {
        let cmd = MediaCommand::new(&self.binary_path, "Audio to video conversion").overwrite();

        let cmd = match &background.image {
            Some(image) => cmd.arg("-loop").arg("1").input(image),
            None => cmd.format("lavfi").arg("-i").arg(format!(
                "color=c={}:s={}x{}",
                background.color, background.width, background.height
            )),
        };

        cmd.input(audio_path)
            .shortest()
            .video_codec("libx264")
            .arg("-pix_fmt")
            .arg("yuv420p")
            .audio_codec("aac")
            .output(output_path)
    }

    /// Build subtitle burning command.
    ///
    /// The subtitle file is referenced by name relative to its own directory,
    /// which becomes the working directory of the process.
    pub fn burn_subtitles<P: AsRef<Path>>(
        &self,
        video_path: P,
        subtitle_path: P,
        output_path: P,
        force_style: Option<&str>,
        additional_options: &[String],
    ) -> MediaCommand {
        let subtitle_path = subtitle_path.as_ref();
        let file_name = subtitle_path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| subtitle_path.to_string_lossy().to_string());

        let mut cmd = MediaCommand::new(&self.binary_path, "Subtitle burning")
            .overwrite()
            .input(&video_path)
            .video_filter(subtitles_filter(&file_name, force_style));

        if let Some(dir) = subtitle_path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            cmd = cmd.current_dir(dir);
        }

        for option in additional_options {
            cmd = cmd.arg(option);
        }

        cmd.output(output_path)
    }

    /// Build version check command
    pub fn version_check(&self) -> MediaCommand {
        MediaCommand::new(&self.binary_path, "Version check")
            .arg("-version")
    }

    /// Build probe tool version check command
    pub fn probe_version_check(&self) -> MediaCommand {
        MediaCommand::new(&self.probe_binary_path, "Probe version check")
            .arg("-version")
    }
}

/// Build the `subtitles` filter expression
pub fn subtitles_filter(file_name: &str, force_style: Option<&str>) -> String {
    let mut filter = format!("subtitles={}", escape_filter_value(file_name));
    if let Some(style) = force_style.map(str::trim).filter(|s| !s.is_empty()) {
        // Escaped like the file name so a `:` in the style cannot start another option
        filter.push_str(&format!(":force_style={}", escape_filter_value(&style.replace('\'', ""))));
    }
    filter
}

/// Escape a value for use as a filter option inside a filtergraph.
///
/// ffmpeg parses it twice: once as a filter option value (`\ ' :`), then as
/// part of the filtergraph (`\ ' [ ] , ;`).
pub fn escape_filter_value(value: &str) -> String {
    let option_level = escape_chars(value, &['\\', '\'', ':']);
    escape_chars(&option_level, &['\\', '\'', '[', ']', ',', ';'])
}

fn escape_chars(value: &str, special: &[char]) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if special.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
