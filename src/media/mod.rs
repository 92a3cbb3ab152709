// Modular media decoding architecture
//
// This module provides the decode surface used by frame sampling:
// - Processor: ffmpeg/ffprobe backed implementation
// - Commands: Command builders and abstractions

pub mod commands;
pub mod processor;

use async_trait::async_trait;
use std::path::Path;

pub use commands::*;
pub use processor::*;

use crate::config::FrameConfig;
use crate::error::Result;

/// Intrinsic properties of a video resource
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    /// Total duration in seconds, when the container reports one
    pub duration: Option<f64>,
}

/// Decode surface with a single current-frame state: callers must not
/// issue a capture while another one on the same video is in flight.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FrameDecoder: Send + Sync {
    /// Read dimensions and duration of a video
    async fn probe(&self, video_path: &Path) -> Result<VideoMetadata>;

    /// Seek to `timestamp` seconds and return the displayed frame as JPEG bytes
    async fn capture_frame(&self, video_path: &Path, timestamp: f64, quality: f32) -> Result<Vec<u8>>;

    /// Check if the decoder backend is available
    async fn check_availability(&self) -> Result<()>;
}

/// Factory for creating decoder instances
pub struct FrameDecoderFactory;

impl FrameDecoderFactory {
    /// Create the default decoder implementation (FFmpeg-based)
    pub fn create_decoder(config: &FrameConfig) -> Box<dyn FrameDecoder> {
        Box::new(processor::FfmpegDecoder::new(config))
    }
}
