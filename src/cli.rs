use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP service
    Serve {
        /// Address to bind (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Burn subtitles into a local media file
    Burn {
        /// Input video or audio file
        #[arg(short, long)]
        media: PathBuf,

        /// SubRip subtitle file (.srt)
        #[arg(short, long)]
        subtitles: PathBuf,

        /// Output path (defaults to subtitled_<name> next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Subtitle style override, e.g. "Fontname=Futura,PrimaryColour=&HFF00"
        #[arg(long)]
        style: Option<String>,

        /// Write a Base64 data URI instead of the media file
        #[arg(long)]
        base64: bool,
    },

    /// Report whether a file holds video, audio only, or neither
    Probe {
        /// File to inspect
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Verify that ffmpeg and ffprobe can be run
    Check,

    /// Write the default configuration to a file
    InitConfig {
        /// Destination path
        #[arg(short, long, default_value = "config.toml")]
        output: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_burn() {
        let args = Args::parse_from([
            "subburn", "burn", "--media", "clip.mp4", "--subtitles", "cap.srt", "--base64",
        ]);
        match args.command {
            Commands::Burn {
                media,
                subtitles,
                output,
                style,
                base64,
            } => {
                assert_eq!(media, PathBuf::from("clip.mp4"));
                assert_eq!(subtitles, PathBuf::from("cap.srt"));
                assert!(output.is_none());
                assert!(style.is_none());
                assert!(base64);
            }
            _ => panic!("expected burn command"),
        }
    }

    #[test]
    fn test_parse_serve_with_globals() {
        let args = Args::parse_from(["subburn", "-v", "--config", "alt.toml", "serve", "--port", "9000"]);
        assert!(args.verbose);
        assert_eq!(args.config, Some(PathBuf::from("alt.toml")));
        assert!(matches!(args.command, Commands::Serve { host: None, port: Some(9000) }));
    }

    #[test]
    fn test_init_config_default_path() {
        let args = Args::parse_from(["subburn", "init-config"]);
        match args.command {
            Commands::InitConfig { output } => assert_eq!(output, PathBuf::from("config.toml")),
            _ => panic!("expected init-config command"),
        }
    }
}
