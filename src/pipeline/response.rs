use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bytes::Bytes;
use futures::Stream;
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::fs::File;
use tokio::task::JoinHandle;
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

use super::ProcessedMedia;
use crate::workspace::Workspace;

/// What a successful pipeline run hands back to the caller
#[derive(Debug)]
pub enum PipelineResult {
    /// `data:<content type>;base64,<payload>` on a single line
    DataUri(String),
    /// Streamed file download
    Download(FileDownload),
}

#[derive(Debug)]
pub struct FileDownload {
    pub stream: DownloadStream,
    /// Suggested `Content-Disposition` filename
    pub filename: String,
    /// Content type of the response body
    pub content_type: String,
    /// The media being streamed; its path stays valid while `stream` is alive
    pub media: ProcessedMedia,
}

/// Build a data URI, guaranteed free of line breaks
pub fn data_uri(content_type: &str, bytes: &[u8]) -> String {
    let mut payload = STANDARD.encode(bytes);
    payload.retain(|c| c != '\n' && c != '\r');
    format!("data:{};base64,{}", content_type, payload)
}

/// Chunked reader over the output file that owns the request's workspace.
///
/// The workspace is released as soon as the last chunk has been read, or when
/// the stream is dropped early (client went away), never before. After the
/// last chunk the directory is removed on the blocking pool and the stream
/// only ends once the removal has finished.
#[derive(Debug)]
pub struct DownloadStream {
    inner: ReaderStream<File>,
    workspace: Option<Workspace>,
    release: Option<JoinHandle<()>>,
}

impl DownloadStream {
    pub fn new(file: File, chunk_size: usize, workspace: Workspace) -> Self {
        Self {
            inner: ReaderStream::with_capacity(file, chunk_size),
            workspace: Some(workspace),
            release: None,
        }
    }

    #[cfg(test)]
    fn holds_workspace(&self) -> bool {
        self.workspace.is_some()
    }
}

impl Stream for DownloadStream {
    type Item = io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            if let Some(release) = this.release.as_mut() {
                let result = std::task::ready!(Pin::new(release).poll(cx));
                this.release = None;
                if let Err(e) = result {
                    warn!("Workspace removal task failed: {}", e);
                }
                return Poll::Ready(None);
            }

            match Pin::new(&mut this.inner).poll_next(cx) {
                Poll::Ready(None) => match this.workspace.take() {
                    Some(workspace) => {
                        debug!("Download drained, releasing {}", workspace.path().display());
                        this.release = Some(tokio::task::spawn_blocking(move || drop(workspace)));
                    }
                    None => return Poll::Ready(None),
                },
                other => return other,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[test]
    fn test_data_uri_format() {
        assert_eq!(data_uri("video/mp4", b"hello"), "data:video/mp4;base64,aGVsbG8=");
        assert_eq!(data_uri("video/mp4", b""), "data:video/mp4;base64,");
    }

    #[test]
    fn test_data_uri_has_no_line_breaks_for_large_payloads() {
        let bytes: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        let uri = data_uri("video/webm", &bytes);
        assert!(uri.starts_with("data:video/webm;base64,"));
        assert!(!uri.contains('\n'));
        assert!(!uri.contains('\r'));
    }

    #[tokio::test]
    async fn test_stream_releases_workspace_after_last_chunk() {
        let parent = tempfile::tempdir().unwrap();
        let workspace = Workspace::create(Some(parent.path())).unwrap();
        let output = workspace.output("mp4");
        let content: Vec<u8> = (0..10_000u32).map(|i| i as u8).collect();
        tokio::fs::write(&output, &content).await.unwrap();
        let dir = workspace.path().to_path_buf();

        let file = File::open(&output).await.unwrap();
        let mut stream = DownloadStream::new(file, 4096, workspace);

        let mut received = Vec::new();
        let mut chunks = 0;
        while let Some(chunk) = stream.next().await {
            assert!(dir.exists(), "workspace released before the stream drained");
            received.extend_from_slice(&chunk.unwrap());
            chunks += 1;
        }

        assert_eq!(received, content);
        assert!(chunks > 1);
        assert!(!stream.holds_workspace());
        assert!(!dir.exists());
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_dropped_stream_releases_workspace() {
        let parent = tempfile::tempdir().unwrap();
        let workspace = Workspace::create(Some(parent.path())).unwrap();
        let output = workspace.output("mkv");
        tokio::fs::write(&output, vec![7u8; 8192]).await.unwrap();
        let dir = workspace.path().to_path_buf();

        let file = File::open(&output).await.unwrap();
        let mut stream = DownloadStream::new(file, 1024, workspace);
        let first = stream.next().await.unwrap().unwrap();
        assert!(!first.is_empty());
        assert!(dir.exists());

        drop(stream);
        assert!(!dir.exists());
    }
}
