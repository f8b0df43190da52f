//! Subburn - burn SRT subtitles into video and audio files
//!
//! An HTTP service (and matching CLI) that takes a media upload plus a SubRip
//! subtitle file, hard-codes the captions into the frames with ffmpeg, and
//! returns the result as a file download or a Base64 data URI.

pub mod cli;
pub mod config;
pub mod error;
pub mod media;
pub mod pipeline;
pub mod server;
pub mod workspace;
