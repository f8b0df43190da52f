//! Upload orchestration: validate, persist, classify, convert, burn, encode.

pub mod request;
pub mod response;

use std::path::PathBuf;
use std::sync::Arc;
use tokio::{fs, task};
use tracing::{error, info, warn};

pub use request::*;
pub use response::*;

use crate::config::PipelineConfig;
use crate::error::{Result, SubburnError};
use crate::media::{MediaClassification, MediaProber, MediaProcessorTrait};
use crate::workspace::Workspace;

/// Runs one upload through the external media processor.
///
/// Each call owns a fresh [`Workspace`]. It is removed when `process` fails,
/// after the data URI is built, or once the download stream is finished.
pub struct UploadPipeline {
    media: Arc<dyn MediaProcessorTrait>,
    workspace_root: Option<PathBuf>,
    chunk_size: usize,
}

impl UploadPipeline {
    pub fn new(media: Arc<dyn MediaProcessorTrait>, config: &PipelineConfig) -> Self {
        Self {
            media,
            workspace_root: config.workspace_root.clone(),
            chunk_size: config.chunk_size.max(1),
        }
    }

    pub fn media(&self) -> &Arc<dyn MediaProcessorTrait> {
        &self.media
    }

    #[tracing::instrument(
        skip(self, request),
        fields(media = %request.media_filename, subtitles = %request.subtitle_filename, mode = %request.output_mode)
    )]
    pub async fn process(&self, request: UploadRequest) -> Result<PipelineResult> {
        // Nothing touches the disk for a bad subtitle name
        validate_subtitle_filename(&request.subtitle_filename)?;

        let root = self.workspace_root.clone();
        let workspace = task::spawn_blocking(move || Workspace::create(root.as_deref()))
            .await
            .map_err(|e| SubburnError::Workspace(format!("Workspace task failed: {}", e)))??;
        let upload_extension = file_extension(&request.media_filename);

        let media_path = workspace.media_input(upload_extension.as_deref());
        let subtitle_path = workspace.subtitle_input();
        fs::write(&media_path, &request.media_bytes).await?;
        fs::write(&subtitle_path, &request.subtitle_bytes).await?;
        info!(
            "Stored upload ({} media bytes, {} subtitle bytes) in {}",
            request.media_bytes.len(),
            request.subtitle_bytes.len(),
            workspace.path().display()
        );

        let source = match MediaProber::classify(self.media.as_ref(), &media_path).await? {
            MediaClassification::Invalid => {
                return Err(SubburnError::UnsupportedMedia(request.media_filename.clone()));
            }
            MediaClassification::Audio => {
                let converted = workspace.converted_video();
                if !self.media.audio_to_video(&media_path, &converted).await? {
                    error!("Audio to video conversion failed for {}", request.media_filename);
                    return Err(SubburnError::ConversionFailed);
                }
                ProcessedMedia {
                    path: converted,
                    extension: CONVERTED_EXTENSION.to_string(),
                    content_type: CONVERTED_CONTENT_TYPE.to_string(),
                }
            }
            MediaClassification::Video => {
                let extension = upload_extension.unwrap_or_else(|| CONVERTED_EXTENSION.to_string());
                let content_type = request
                    .media_content_type
                    .clone()
                    .filter(|ct| !ct.trim().is_empty())
                    .unwrap_or_else(|| content_type_for_extension(&extension).to_string());
                ProcessedMedia {
                    path: media_path,
                    extension,
                    content_type,
                }
            }
        };

        let output_path = workspace.output(&source.extension);
        let burned = self
            .media
            .burn_subtitles(&source.path, &subtitle_path, &output_path, request.force_style.clone())
            .await?;
        if !burned {
            error!("Subtitle burning failed for {}", request.media_filename);
            return Err(SubburnError::BurnFailed);
        }

        let processed = ProcessedMedia {
            path: output_path,
            ..source
        };
        self.encode(workspace, processed, &request).await
    }

    async fn encode(
        &self,
        workspace: Workspace,
        processed: ProcessedMedia,
        request: &UploadRequest,
    ) -> Result<PipelineResult> {
        match request.output_mode {
            OutputMode::Base64 => {
                let bytes = fs::read(&processed.path).await?;
                if let Err(e) = task::spawn_blocking(move || drop(workspace)).await {
                    warn!("Workspace removal task failed: {}", e);
                }
                info!("Encoding {} bytes as {} data URI", bytes.len(), processed.content_type);
                Ok(PipelineResult::DataUri(data_uri(&processed.content_type, &bytes)))
            }
            OutputMode::Files => {
                let file = fs::File::open(&processed.path).await?;
                let filename = download_filename(&request.media_filename, &processed.extension);
                info!("Streaming {} as {}", processed.path.display(), filename);
                Ok(PipelineResult::Download(FileDownload {
                    stream: DownloadStream::new(file, self.chunk_size, workspace),
                    filename,
                    content_type: DOWNLOAD_CONTENT_TYPE.to_string(),
                    media: processed,
                }))
            }
        }
    }
}
