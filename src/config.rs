use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::error::{Result, SubburnError};

fn default_chunk_size() -> usize {
    1024 * 1024
}

fn default_max_upload_bytes() -> usize {
    1024 * 1024 * 1024
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub media: MediaConfig,
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind the HTTP listener to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Largest accepted request body (media + subtitle + form fields)
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Path to ffmpeg binary
    pub binary_path: String,
    /// Path to ffprobe binary
    pub probe_binary_path: String,
    /// Default style override for the subtitles filter, e.g. "Fontname=Futura,PrimaryColour=&HFF00"
    pub force_style: Option<String>,
    /// Additional encoding options for subtitle burning
    /// Common options: ["-preset", "medium", "-crf", "23", "-pix_fmt", "yuv420p"]
    /// - preset: encoding speed (ultrafast, fast, medium, slow, veryslow)
    /// - crf: quality (0-51, lower = better quality, 23 is default)
    /// - pix_fmt: pixel format for compatibility
    pub subtitle_options: Vec<String>,
    /// Visual track used when an audio-only upload is turned into a video
    pub background: BackgroundConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackgroundConfig {
    /// Solid color passed to the lavfi color source
    pub color: String,
    pub width: u32,
    pub height: u32,
    /// Static image looped instead of the solid color, when set
    pub image: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory under which per-request workspaces are created (system temp dir when unset)
    pub workspace_root: Option<PathBuf>,
    /// Block size for streamed downloads
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            binary_path: "ffmpeg".to_string(),
            probe_binary_path: "ffprobe".to_string(),
            force_style: None,
            subtitle_options: vec![
                // Example encoding options users can customize:
                // "-preset".to_string(), "medium".to_string(),
                // "-crf".to_string(), "23".to_string(),
            ],
            background: BackgroundConfig::default(),
        }
    }
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            color: "black".to_string(),
            width: 1280,
            height: 720,
            image: None,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workspace_root: None,
            chunk_size: default_chunk_size(),
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SubburnError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| SubburnError::Config(format!("Failed to parse config file: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| SubburnError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| SubburnError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Load from an explicit path, else `./config.toml` when present, else defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let local = Path::new("config.toml");
                if local.exists() {
                    Self::from_file(local)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if self.pipeline.chunk_size == 0 {
            return Err(SubburnError::Config("pipeline.chunk_size must be greater than zero".to_string()));
        }
        if self.media.background.width == 0 || self.media.background.height == 0 {
            return Err(SubburnError::Config("media.background dimensions must be non-zero".to_string()));
        }
        Ok(())
    }
}
