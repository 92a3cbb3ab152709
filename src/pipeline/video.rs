use serde::Deserialize;
use tracing::info;

use crate::document::{Chapter, Document};
use crate::encoder::{MediaClass, MediaFile, encode_file, encode_frame};
use crate::error::Result;
use crate::frames::Frame;
use crate::generation::{Field, Schema, request_structured};
use super::placement::{ImagePlacement, image_placement_schema, resolve_images};
use super::{Outcome, Pipeline, ProgressSink, Stage, prompts};

#[derive(Debug, Deserialize)]
struct VideoChapter {
    title: String,
    content: String,
    images: Option<Vec<ImagePlacement>>,
}

#[derive(Debug, Deserialize)]
struct VideoDocument {
    title: String,
    introduction: String,
    chapters: Vec<VideoChapter>,
}

fn video_document_schema() -> Schema {
    let chapter = Schema::object(vec![
        Field::required("title", Schema::string().describe("Title of the chapter.")),
        Field::required("content", Schema::string().describe("Chapter content in Markdown.")),
        Field::optional(
            "images",
            Schema::array(image_placement_schema()).describe("Frames relevant to this chapter."),
        ),
    ]);

    Schema::object(vec![
        Field::required("title", Schema::string().describe("Main title of the ebook.")),
        Field::required("introduction", Schema::string().describe("Introduction paragraph of the ebook.")),
        Field::required("chapters", Schema::array(chapter).describe("Chapters of the ebook.")),
    ])
}

impl Pipeline {
    /// Single-call generation: the video and its frames go out together and
    /// the model writes the content and picks the images at once.
    pub async fn generate_from_video(
        &self,
        video: &MediaFile,
        frames: &[Frame],
        progress: &dyn ProgressSink,
        language: &str,
    ) -> Result<Outcome<Document>> {
        let mut run = self.run(progress);
        if run.cancelled_at(Stage::Start) {
            return Ok(Outcome::Cancelled);
        }

        run.report("Processing video for analysis...", Some(10.0));
        let mut attachments = Vec::with_capacity(frames.len() + 1);
        attachments.push(encode_file(video, MediaClass::Video));
        attachments.extend(frames.iter().map(encode_frame));
        info!("Encoded {} with {} frames", video.name, frames.len());
        if run.cancelled_at(Stage::Encoding) {
            return Ok(Outcome::Cancelled);
        }

        run.report("Generating document structure from video...", Some(30.0));
        let prompt = prompts::video_document_prompt(language, frames.len());
        let response: VideoDocument = run
            .attempt(
                Stage::Structure,
                request_structured(self.client.as_ref(), &prompt, &attachments, &video_document_schema()),
            )
            .await?;
        if run.cancelled_at(Stage::Structure) {
            return Ok(Outcome::Cancelled);
        }

        run.report("Finalizing...", Some(100.0));
        let chapters = response.chapters
            .into_iter()
            .map(|chapter| Chapter {
                images: resolve_images(chapter.images.as_deref().unwrap_or_default(), frames),
                title: chapter.title,
                content: chapter.content,
            })
            .collect();

        Ok(Outcome::Completed(Document {
            title: response.title,
            introduction: response.introduction,
            chapters,
        }))
    }
}
