//! Frame sampling: turns a video into time-indexed JPEG stills.
//!
//! Frames are captured one at a time in ascending timestamp order. The
//! position of a frame in the returned sequence is the index the
//! placement step refers to, so every function here keeps indices dense
//! and ordered.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::error::{Result, VidbookError};
use crate::media::FrameDecoder;

pub const FRAME_MIME_TYPE: &str = "image/jpeg";

/// Shortest accepted sampling interval in seconds
pub const MIN_FRAME_INTERVAL_SECONDS: f64 = 0.1;

/// Upper bound on the frames sampled from one video
pub const MAX_FRAMES_PER_VIDEO: usize = 2000;

/// A still image sampled from a video
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub index: usize,
    /// Source position in seconds
    pub timestamp: f64,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl Frame {
    /// Embed the encoded image as a data URL
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.bytes))
    }
}

/// Target timestamps `I, 2I, 3I, ...` strictly below `duration`. A video
/// shorter than one interval gets a single sample at its midpoint; a zero
/// or unknown duration gets none.
pub fn sample_timestamps(duration: Option<f64>, interval: f64) -> Vec<f64> {
    let duration = match duration {
        Some(d) if d.is_finite() && d > 0.0 => d,
        _ => return Vec::new(),
    };

    let mut timestamps = Vec::new();
    let mut k = 1u64;
    loop {
        let t = interval * k as f64;
        if t >= duration {
            break;
        }
        timestamps.push(t);
        k += 1;
    }

    if timestamps.is_empty() {
        timestamps.push(duration / 2.0);
    }

    timestamps
}

/// Keep only the frames at `indices`, in their original order, re-indexed
/// from zero. Unknown indices are ignored.
pub fn select_frames(frames: Vec<Frame>, indices: &[usize]) -> Vec<Frame> {
    frames
        .into_iter()
        .filter(|f| indices.contains(&f.index))
        .enumerate()
        .map(|(i, mut f)| {
            f.index = i;
            f
        })
        .collect()
}

#[derive(Clone)]
pub struct FrameSampler {
    decoder: Arc<dyn FrameDecoder>,
    quality: f32,
}

impl FrameSampler {
    pub fn new(decoder: Arc<dyn FrameDecoder>, quality: f32) -> Self {
        Self { decoder, quality }
    }

    /// Sample one video. Any probe or capture failure fails the whole call;
    /// frames captured before the failure are discarded.
    pub async fn extract_frames(&self, video: &[u8], interval: f64) -> Result<Vec<Frame>> {
        if !(interval.is_finite() && interval > 0.0) {
            return Err(VidbookError::Config(format!("Frame interval must be positive, got {}", interval)));
        }
        if interval < MIN_FRAME_INTERVAL_SECONDS {
            return Err(VidbookError::Config(format!(
                "Frame interval must be at least {}s, got {}",
                MIN_FRAME_INTERVAL_SECONDS, interval
            )));
        }

        // The temp file is the decode surface; dropping it releases it on every path.
        let surface = tempfile::Builder::new()
            .prefix("vidbook-")
            .suffix(".video")
            .tempfile()
            .map_err(|e| VidbookError::Decode(format!("Failed to create decode surface: {}", e)))?;
        tokio::fs::write(surface.path(), video).await
            .map_err(|e| VidbookError::Decode(format!("Failed to stage video for decoding: {}", e)))?;

        self.extract_from_path(surface.path(), interval).await
    }

    async fn extract_from_path(&self, video_path: &Path, interval: f64) -> Result<Vec<Frame>> {
        let metadata = self.decoder.probe(video_path).await?;
        if metadata.width == 0 || metadata.height == 0 {
            return Err(VidbookError::Decode("Video dimensions could not be determined".to_string()));
        }

        if let Some(duration) = metadata.duration.filter(|d| d.is_finite()) {
            let count = (duration / interval).floor();
            if count > MAX_FRAMES_PER_VIDEO as f64 {
                return Err(VidbookError::Config(format!(
                    "Sampling every {}s would capture {} frames from a {}s video (limit {})",
                    interval, count, duration, MAX_FRAMES_PER_VIDEO
                )));
            }
        }

        let timestamps = sample_timestamps(metadata.duration, interval);
        if timestamps.is_empty() {
            info!("Video has no usable duration, no frames sampled");
            return Ok(Vec::new());
        }

        debug!("Sampling {} frames every {}s", timestamps.len(), interval);

        let mut frames = Vec::with_capacity(timestamps.len());
        for (index, timestamp) in timestamps.into_iter().enumerate() {
            let bytes = self.decoder.capture_frame(video_path, timestamp, self.quality).await?;
            frames.push(Frame {
                index,
                timestamp,
                mime_type: FRAME_MIME_TYPE.to_string(),
                bytes,
            });
        }

        info!("Sampled {} frames", frames.len());
        Ok(frames)
    }

    /// Sample several independent videos concurrently and concatenate the
    /// results in input order, re-indexed across the whole sequence.
    pub async fn extract_frames_many(&self, videos: Vec<Vec<u8>>, interval: f64) -> Result<Vec<Frame>> {
        let count = videos.len();
        let mut tasks = JoinSet::new();

        for (source, video) in videos.into_iter().enumerate() {
            let sampler = self.clone();
            tasks.spawn(async move {
                sampler.extract_frames(&video, interval).await.map(|frames| (source, frames))
            });
        }

        let mut per_source: Vec<Vec<Frame>> = vec![Vec::new(); count];
        while let Some(joined) = tasks.join_next().await {
            let (source, frames) = joined
                .map_err(|e| VidbookError::Decode(format!("Frame sampling task failed: {}", e)))??;
            per_source[source] = frames;
        }

        Ok(per_source
            .into_iter()
            .flatten()
            .enumerate()
            .map(|(index, mut frame)| {
                frame.index = index;
                frame
            })
            .collect())
    }
}
