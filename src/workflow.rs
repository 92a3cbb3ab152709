use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::Config;
use crate::document::Document;
use crate::encoder::{MediaClass, MediaFile};
use crate::error::{Result, VidbookError};
use crate::frames::{Frame, FrameSampler, select_frames};
use crate::generation::{GenerationClient, GenerationClientFactory};
use crate::library::{Library, StoredDocument};
use crate::media::{FrameDecoder, FrameDecoderFactory};
use crate::pipeline::{CancellationToken, Outcome, Pipeline, ProgressSink};

/// Inputs for the detailed mode. Media files are transcribed, text files
/// are read as they are.
#[derive(Debug, Clone, Default)]
pub struct SourceSet {
    pub videos: Vec<PathBuf>,
    pub audios: Vec<PathBuf>,
    pub texts: Vec<PathBuf>,
    pub pasted: Vec<String>,
}

impl SourceSet {
    pub fn is_empty(&self) -> bool {
        self.videos.is_empty()
            && self.audios.is_empty()
            && self.texts.is_empty()
            && self.pasted.iter().all(|t| t.trim().is_empty())
    }
}

pub struct Workflow {
    config: Config,
    pipeline: Pipeline,
    sampler: FrameSampler,
    library: Library,
    client: Arc<dyn GenerationClient>,
    decoder: Arc<dyn FrameDecoder>,
}

impl Workflow {
    /// Build the workflow with the configured service client and ffmpeg decoder
    pub fn new(config: Config, cancel: CancellationToken) -> Result<Self> {
        let client: Arc<dyn GenerationClient> = Arc::from(GenerationClientFactory::create_default(&config)?);
        let decoder: Arc<dyn FrameDecoder> = Arc::from(FrameDecoderFactory::create_decoder(&config.frames));
        Ok(Self::with_components(config, client, decoder, cancel))
    }

    pub fn with_components(
        config: Config,
        client: Arc<dyn GenerationClient>,
        decoder: Arc<dyn FrameDecoder>,
        cancel: CancellationToken,
    ) -> Self {
        let sampler = FrameSampler::new(decoder.clone(), config.frames.jpeg_quality);
        let pipeline = Pipeline::new(client.clone(), cancel);
        let library = Library::new(config.output.library_path.clone());

        Self { config, pipeline, sampler, library, client, decoder }
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Fail fast when ffmpeg or the generation service is unreachable
    pub async fn check_dependencies(&self) -> Result<()> {
        self.decoder.check_availability().await?;
        self.client.check_availability().await?;
        Ok(())
    }

    /// Transcribe one file. Files without a known type are sent as video.
    pub async fn transcribe_file<P: AsRef<Path>>(&self, path: P, progress: &dyn ProgressSink) -> Result<String> {
        let media = MediaFile::open(path).await?;
        self.pipeline.transcribe(&media, MediaClass::Video, progress).await
    }

    /// Video straight to document in one structured request. Returns `None`
    /// when the run was cancelled; nothing is saved in that case.
    pub async fn quick<P: AsRef<Path>>(
        &self,
        video_path: P,
        frame_selection: Option<&[usize]>,
        progress: &dyn ProgressSink,
    ) -> Result<Option<StoredDocument>> {
        let video = MediaFile::open(video_path).await?;
        info!("Quick generation from {}", video.name);

        progress.report("Extracting frames from video...", None);
        let frames = self.sampler.extract_frames(&video.bytes, self.config.frames.interval_seconds).await?;
        let frames = apply_selection(frames, frame_selection);

        let outcome = self.pipeline
            .generate_from_video(&video, &frames, progress, &self.config.output.language)
            .await?;

        self.save(outcome).await
    }

    /// Transcribe and read every source, then run the multi-step generation
    /// over the combined transcript and the frames of all videos.
    pub async fn detailed(
        &self,
        sources: &SourceSet,
        frame_selection: Option<&[usize]>,
        progress: &dyn ProgressSink,
    ) -> Result<Option<StoredDocument>> {
        if sources.is_empty() {
            return Err(VidbookError::Config("No source material was provided".to_string()));
        }

        let cancel = self.pipeline.cancellation_token();
        let mut parts: Vec<(String, String)> = Vec::new();
        let mut video_bytes = Vec::with_capacity(sources.videos.len());

        let media_sources = sources.videos.iter().map(|p| (p, true))
            .chain(sources.audios.iter().map(|p| (p, false)));

        for (path, is_video) in media_sources {
            if cancel.is_cancelled() {
                info!("Cancelled during transcription");
                return Ok(None);
            }

            let media = MediaFile::open(path).await?;
            let fallback = if is_video { MediaClass::Video } else { MediaClass::Audio };
            let transcript = self.pipeline.transcribe(&media, fallback, progress).await?;
            if is_video {
                video_bytes.push(media.bytes);
            }
            parts.push((media.name, transcript));
        }

        for path in &sources.texts {
            let file = MediaFile::open(path).await?;
            let text = file.text()?;
            parts.push((file.name, text));
        }

        for (i, text) in sources.pasted.iter().enumerate() {
            if !text.trim().is_empty() {
                parts.push((format!("Pasted text {}", i + 1), text.clone()));
            }
        }

        if cancel.is_cancelled() {
            return Ok(None);
        }

        let transcript = combine_sources(&parts);
        if transcript.trim().is_empty() {
            return Err(VidbookError::Config("Source material contains no text".to_string()));
        }

        let frames = if video_bytes.is_empty() {
            Vec::new()
        } else {
            progress.report("Extracting frames from videos...", None);
            self.sampler
                .extract_frames_many(video_bytes, self.config.frames.interval_seconds)
                .await?
        };
        let frames = apply_selection(frames, frame_selection);

        let outcome = self.pipeline
            .generate_from_transcript_and_frames(&transcript, &frames, progress, &self.config.output.language)
            .await?;

        self.save(outcome).await
    }

    async fn save(&self, outcome: Outcome<Document>) -> Result<Option<StoredDocument>> {
        match outcome {
            Outcome::Completed(document) => {
                info!(
                    "Generated \"{}\" with {} chapters and {} images",
                    document.title,
                    document.chapters.len(),
                    document.image_count()
                );
                Ok(Some(self.library.add(document).await?))
            }
            Outcome::Cancelled => {
                warn!("Generation cancelled, nothing saved");
                Ok(None)
            }
        }
    }
}

fn apply_selection(frames: Vec<Frame>, selection: Option<&[usize]>) -> Vec<Frame> {
    match selection {
        Some(indices) => {
            let total = frames.len();
            let kept = select_frames(frames, indices);
            info!("Using {} of {} sampled frames", kept.len(), total);
            kept
        }
        None => frames,
    }
}

/// Join per-source texts. A single source is passed through untouched;
/// several get a heading naming where each part came from.
pub fn combine_sources(parts: &[(String, String)]) -> String {
    match parts {
        [] => String::new(),
        [(_, text)] => text.trim().to_string(),
        _ => parts
            .iter()
            .map(|(name, text)| format!("## Source: {}\n\n{}", name, text.trim()))
            .collect::<Vec<_>>()
            .join("\n\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_source_set() {
        assert!(SourceSet::default().is_empty());

        let blank = SourceSet { pasted: vec!["  ".to_string()], ..Default::default() };
        assert!(blank.is_empty());

        let text = SourceSet { texts: vec![PathBuf::from("notes.md")], ..Default::default() };
        assert!(!text.is_empty());
    }

    #[test]
    fn test_combine_single_source_has_no_heading() {
        let parts = vec![("talk.mp4".to_string(), " hello \n".to_string())];
        assert_eq!(combine_sources(&parts), "hello");
    }

    #[test]
    fn test_combine_keeps_input_order() {
        let parts = vec![
            ("a.mp3".to_string(), "first".to_string()),
            ("b.txt".to_string(), "second".to_string()),
        ];
        assert_eq!(
            combine_sources(&parts),
            "## Source: a.mp3\n\nfirst\n\n## Source: b.txt\n\nsecond"
        );
    }
}
