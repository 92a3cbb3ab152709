use tracing::info;

use crate::encoder::{MediaClass, MediaFile, encode_file};
use crate::error::Result;
use super::{Pipeline, ProgressSink, Stage, prompts};

impl Pipeline {
    /// Transcribe the speech in an audio or video file to Markdown text
    /// with inline timestamps. `fallback` picks the MIME type when the file
    /// declares none.
    pub async fn transcribe(
        &self,
        media: &MediaFile,
        fallback: MediaClass,
        progress: &dyn ProgressSink,
    ) -> Result<String> {
        let mut run = self.run(progress);
        run.report(&format!("Transcribing {}...", media.name), None);

        let attachment = encode_file(media, fallback);
        let prompt = prompts::transcription_prompt();

        let transcript = run
            .attempt(Stage::Transcription, self.client.generate_text(&prompt, &[attachment]))
            .await?;

        info!("Transcribed {} ({} characters)", media.name, transcript.len());
        run.report("Transcription complete.", None);
        Ok(transcript.trim().to_string())
    }
}
