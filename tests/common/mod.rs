#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Mutex;

use vidbook::encoder::MediaPart;
use vidbook::error::{Result, VidbookError};
use vidbook::frames::{FRAME_MIME_TYPE, Frame};
use vidbook::generation::schema::parse_structured;
use vidbook::generation::{GenerationClient, Schema};
use vidbook::media::{FrameDecoder, VideoMetadata};
use vidbook::pipeline::CancellationToken;

/// Canned answer for the next generation call
pub enum Reply {
    Text(String),
    Json(Value),
    Fail(VidbookError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum CallKind {
    Text,
    Structured,
}

#[derive(Debug, Clone)]
pub struct Call {
    pub kind: CallKind,
    pub prompt: String,
    pub attachments: Vec<MediaPart>,
}

/// Answers calls from a queue and records every request
pub struct ScriptedClient {
    replies: Mutex<VecDeque<Reply>>,
    calls: Mutex<Vec<Call>>,
    cancel_after: Option<(usize, CancellationToken)>,
}

impl ScriptedClient {
    pub fn new(replies: Vec<Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
            cancel_after: None,
        }
    }

    /// Set `token` as soon as call number `count` (1-based) has returned
    pub fn cancelling_after(mut self, count: usize, token: CancellationToken) -> Self {
        self.cancel_after = Some((count, token));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn next(&self, kind: CallKind, prompt: &str, attachments: &[MediaPart]) -> Reply {
        let count = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(Call { kind, prompt: prompt.to_string(), attachments: attachments.to_vec() });
            calls.len()
        };

        if let Some((after, token)) = &self.cancel_after {
            if count == *after {
                token.cancel();
            }
        }

        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Reply::Fail(VidbookError::Generation("no scripted reply left".to_string())))
    }
}

#[async_trait]
impl GenerationClient for ScriptedClient {
    async fn generate_text(&self, prompt: &str, attachments: &[MediaPart]) -> Result<String> {
        match self.next(CallKind::Text, prompt, attachments) {
            Reply::Text(text) => Ok(text),
            Reply::Json(value) => Ok(value.to_string()),
            Reply::Fail(err) => Err(err),
        }
    }

    async fn generate_structured(&self, prompt: &str, attachments: &[MediaPart], schema: &Schema) -> Result<Value> {
        match self.next(CallKind::Structured, prompt, attachments) {
            Reply::Text(raw) => parse_structured(&raw, schema),
            Reply::Json(value) => {
                schema.validate(&value)?;
                Ok(value)
            }
            Reply::Fail(err) => Err(err),
        }
    }

    async fn check_availability(&self) -> Result<()> {
        Ok(())
    }
}

/// Decoder that reports a fixed duration and returns the staged video bytes
/// followed by the capture timestamp
pub struct FakeDecoder {
    pub duration: Option<f64>,
}

#[async_trait]
impl FrameDecoder for FakeDecoder {
    async fn probe(&self, _video_path: &Path) -> Result<VideoMetadata> {
        Ok(VideoMetadata { width: 640, height: 360, duration: self.duration })
    }

    async fn capture_frame(&self, video_path: &Path, timestamp: f64, _quality: f32) -> Result<Vec<u8>> {
        let mut bytes = tokio::fs::read(video_path).await?;
        bytes.push(timestamp as u8);
        Ok(bytes)
    }

    async fn check_availability(&self) -> Result<()> {
        Ok(())
    }
}

pub fn frames(count: usize) -> Vec<Frame> {
    (0..count)
        .map(|i| Frame {
            index: i,
            timestamp: (i + 1) as f64 * 30.0,
            mime_type: FRAME_MIME_TYPE.to_string(),
            bytes: vec![0xFF, 0xD8, i as u8],
        })
        .collect()
}

/// Progress sink that keeps every report in order
#[derive(Default)]
pub struct RecordingProgress {
    pub reports: Mutex<Vec<(String, Option<f32>)>>,
}

impl RecordingProgress {
    pub fn percents(&self) -> Vec<f32> {
        self.reports.lock().unwrap().iter().filter_map(|(_, p)| *p).collect()
    }

    pub fn count(&self) -> usize {
        self.reports.lock().unwrap().len()
    }
}

impl vidbook::pipeline::ProgressSink for RecordingProgress {
    fn report(&self, message: &str, percent: Option<f32>) {
        self.reports.lock().unwrap().push((message.to_string(), percent));
    }
}
