//! Subburn - burn SRT subtitles into video and audio files
//!
//! Entry point for the HTTP service and the local command line tools.

use anyhow::{Context, Result};
use bytes::Bytes;
use clap::Parser;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{info, Level};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use subburn::cli::{Args, Commands};
use subburn::config::Config;
use subburn::media::{MediaProber, MediaProcessorFactory};
use subburn::pipeline::{download_filename, OutputMode, PipelineResult, UploadPipeline, UploadRequest};
use subburn::server;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logging to both console and file
    setup_logging(args.verbose)?;

    let mut config = Config::load(args.config.as_deref())?;

    match args.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            server::start_server(config).await?;
        }
        Commands::Burn {
            media,
            subtitles,
            output,
            style,
            base64,
        } => {
            burn_local(&config, &media, &subtitles, output, style, base64).await?;
        }
        Commands::Probe { input } => {
            let processor = MediaProcessorFactory::create_processor(config.media.clone());
            let classification = MediaProber::classify(processor.as_ref(), &input).await?;
            println!("{}: {}", input.display(), classification);
        }
        Commands::Check => {
            let processor = MediaProcessorFactory::create_processor(config.media.clone());
            processor
                .check_availability()
                .await
                .context("Media tools are not available")?;
            println!("ffmpeg:  {}", config.media.binary_path);
            println!("ffprobe: {}", config.media.probe_binary_path);
            println!("{}", processor.get_version_info().await?);
        }
        Commands::InitConfig { output } => {
            if output.exists() {
                anyhow::bail!("Refusing to overwrite existing file {}", output.display());
            }
            Config::default().save_to_file(&output)?;
            println!("Default configuration written to {}", output.display());
        }
    }

    Ok(())
}

async fn burn_local(
    config: &Config,
    media: &Path,
    subtitles: &Path,
    output: Option<PathBuf>,
    style: Option<String>,
    base64: bool,
) -> Result<()> {
    let media_filename = file_name(media)?;
    let subtitle_filename = file_name(subtitles)?;

    let media_bytes = tokio::fs::read(media)
        .await
        .with_context(|| format!("Failed to read {}", media.display()))?;
    let subtitle_bytes = tokio::fs::read(subtitles)
        .await
        .with_context(|| format!("Failed to read {}", subtitles.display()))?;

    let output_mode = if base64 { OutputMode::Base64 } else { OutputMode::Files };
    let request = UploadRequest {
        media_bytes: Bytes::from(media_bytes),
        media_filename: media_filename.clone(),
        media_content_type: None,
        subtitle_bytes: Bytes::from(subtitle_bytes),
        subtitle_filename,
        output_mode,
        force_style: style,
    };

    let processor = MediaProcessorFactory::create_processor(config.media.clone());
    let pipeline = UploadPipeline::new(processor, &config.pipeline);
    let result = pipeline.process(request).await?;

    let default_dir = media.parent().map(Path::to_path_buf).unwrap_or_default();
    match result {
        PipelineResult::DataUri(uri) => {
            let target = output.unwrap_or_else(|| default_dir.join(download_filename(&media_filename, "txt")));
            tokio::fs::write(&target, uri.as_bytes()).await?;
            info!("Data URI ({} bytes) written to {}", uri.len(), target.display());
        }
        PipelineResult::Download(download) => {
            let target = output.unwrap_or_else(|| default_dir.join(&download.filename));
            let mut file = tokio::fs::File::create(&target)
                .await
                .with_context(|| format!("Failed to create {}", target.display()))?;

            let mut stream = download.stream;
            let mut written = 0usize;
            while let Some(chunk) = stream.next().await {
                let chunk = chunk?;
                written += chunk.len();
                file.write_all(&chunk).await?;
            }
            file.flush().await?;
            info!("Wrote {} bytes to {}", written, target.display());
        }
    }

    Ok(())
}

fn file_name(path: &Path) -> Result<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .with_context(|| format!("{} does not name a file", path.display()))
}

fn setup_logging(verbose: bool) -> Result<()> {
    // Create log directory
    let log_dir = std::env::current_dir()?.join(".subburn").join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Set up file appender with daily rotation
    let file_appender = rolling::daily(&log_dir, "subburn.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(guard);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false); // No ANSI colors in file

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!(
        "Logging initialized - console: {}, file: {}",
        log_level,
        log_dir.join("subburn.log").display()
    );

    Ok(())
}
