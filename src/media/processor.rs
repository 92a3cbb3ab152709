use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

use crate::config::FrameConfig;
use crate::error::{Result, VidbookError};
use super::{FrameDecoder, MediaCommandBuilder, VideoMetadata};

/// ffprobe `-of json` output, restricted to the entries we request
#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

/// Concrete decoder backed by the ffmpeg command line tools
pub struct FfmpegDecoder {
    command_builder: MediaCommandBuilder,
}

impl FfmpegDecoder {
    pub fn new(config: &FrameConfig) -> Self {
        Self {
            command_builder: MediaCommandBuilder::new(&config.ffmpeg_path, &config.ffprobe_path),
        }
    }
}

/// Map a 0.0-1.0 quality factor onto ffmpeg's mjpeg qscale (2 best, 31 worst)
pub fn quality_to_qscale(quality: f32) -> u8 {
    let quality = if quality.is_finite() { quality.clamp(0.0, 1.0) } else { 0.8 };
    2 + ((1.0 - quality) * 29.0).round() as u8
}

fn parse_probe_output(raw: &[u8]) -> Result<VideoMetadata> {
    let probe: ProbeOutput = serde_json::from_slice(raw)
        .map_err(|e| VidbookError::Decode(format!("Unreadable probe output: {}", e)))?;

    let stream = probe.streams.first()
        .ok_or_else(|| VidbookError::Decode("No video stream found".to_string()))?;

    // "N/A" and missing durations are both reported as unavailable
    let duration = probe.format
        .and_then(|f| f.duration)
        .and_then(|d| d.trim().parse::<f64>().ok())
        .filter(|d| d.is_finite());

    Ok(VideoMetadata {
        width: stream.width.unwrap_or(0),
        height: stream.height.unwrap_or(0),
        duration,
    })
}

#[async_trait]
impl FrameDecoder for FfmpegDecoder {
    async fn probe(&self, video_path: &Path) -> Result<VideoMetadata> {
        debug!("Probing video metadata: {}", video_path.display());
        let raw = self.command_builder.probe_video(video_path).execute().await?;
        let metadata = parse_probe_output(&raw)?;
        debug!("Probed {}x{}, duration {:?}", metadata.width, metadata.height, metadata.duration);
        Ok(metadata)
    }

    async fn capture_frame(&self, video_path: &Path, timestamp: f64, quality: f32) -> Result<Vec<u8>> {
        let command = self.command_builder.capture_frame(video_path, timestamp, quality_to_qscale(quality));
        let bytes = command.execute().await?;

        if bytes.is_empty() {
            return Err(VidbookError::Decode(format!("No frame decoded at {:.3}s", timestamp)));
        }

        Ok(bytes)
    }

    async fn check_availability(&self) -> Result<()> {
        let output = self.command_builder.version_check().execute().await
            .map_err(|e| VidbookError::Config(format!("ffmpeg not available: {}", e)))?;

        let version_info = String::from_utf8_lossy(&output);
        info!("Media decoder: {}", version_info.lines().next().unwrap_or("unknown version"));
        Ok(())
    }
}
