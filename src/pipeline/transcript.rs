use serde::Deserialize;
use tracing::info;

use crate::document::{ChapterDraft, Document, DocumentDraft};
use crate::error::Result;
use crate::frames::Frame;
use crate::generation::{Field, Schema, request_structured};
use super::{Outcome, Pipeline, ProgressSink, Stage, chapter_progress, prompts};

#[derive(Debug, Deserialize)]
struct OutlineResponse {
    titles: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ScaffoldResponse {
    title: String,
    introduction: String,
}

fn outline_schema() -> Schema {
    Schema::object(vec![Field::required(
        "titles",
        Schema::array(Schema::string()).describe("List of chapter titles."),
    )])
}

fn scaffold_schema() -> Schema {
    Schema::object(vec![
        Field::required("title", Schema::string().describe("Title of the ebook.")),
        Field::required("introduction", Schema::string().describe("Introduction of the ebook.")),
    ])
}

/// Remove one fenced block wrapping the whole text, if the fence is plain
/// or tagged as markdown. Anything else is returned trimmed but unchanged.
pub fn strip_code_fence(content: &str) -> String {
    let trimmed = content.trim();

    let Some(inner) = trimmed.strip_prefix("```").and_then(|s| s.strip_suffix("```")) else {
        return trimmed.to_string();
    };

    let (info, body) = match inner.split_once('\n') {
        Some((first, rest)) => (first.trim(), rest),
        None => ("", inner),
    };

    if !matches!(info, "" | "markdown" | "md") {
        return trimmed.to_string();
    }

    let body = body.trim();
    if body.is_empty() {
        trimmed.to_string()
    } else {
        body.to_string()
    }
}

impl Pipeline {
    /// Multi-step generation: outline, scaffold, one call per chapter, then
    /// image placement.
    pub async fn generate_from_transcript_and_frames(
        &self,
        transcript: &str,
        frames: &[Frame],
        progress: &dyn ProgressSink,
        language: &str,
    ) -> Result<Outcome<Document>> {
        let mut run = self.run(progress);
        if run.cancelled_at(Stage::Start) {
            return Ok(Outcome::Cancelled);
        }

        run.report("Defining the chapters...", Some(5.0));
        let titles = run.attempt(Stage::Outline, self.outline(transcript, language)).await?;
        if run.cancelled_at(Stage::Outline) {
            return Ok(Outcome::Cancelled);
        }
        info!("Outline has {} chapters", titles.len());

        run.report("Generating title and introduction...", Some(15.0));
        let scaffold = run.attempt(Stage::Scaffold, self.scaffold(&titles, language)).await?;
        if run.cancelled_at(Stage::Scaffold) {
            return Ok(Outcome::Cancelled);
        }

        let total = titles.len();
        let mut chapters = Vec::with_capacity(total);
        for (index, title) in titles.into_iter().enumerate() {
            let stage = Stage::Chapter { index, total };
            run.report(
                &format!("Writing chapter {}/{}: \"{}\"", index + 1, total, title),
                Some(chapter_progress(index, total)),
            );

            let content = run.attempt(stage, self.chapter_content(&title, transcript, language)).await?;
            chapters.push(ChapterDraft { title, content });

            if run.cancelled_at(stage) {
                return Ok(Outcome::Cancelled);
            }
        }

        let draft = DocumentDraft {
            title: scaffold.title,
            introduction: scaffold.introduction,
            chapters,
        };

        run.report("Analyzing and placing images in chapters...", Some(75.0));
        let images = run.attempt(Stage::Placement, self.place_images(&draft, frames, language)).await?;
        if run.cancelled_at(Stage::Placement) {
            return Ok(Outcome::Cancelled);
        }

        run.report("Finalizing...", Some(100.0));
        Ok(Outcome::Completed(draft.into_document(images)))
    }

    async fn outline(&self, transcript: &str, language: &str) -> Result<Vec<String>> {
        let prompt = prompts::outline_prompt(transcript, language);
        let response: OutlineResponse =
            request_structured(self.client.as_ref(), &prompt, &[], &outline_schema()).await?;

        Ok(response.titles
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect())
    }

    async fn scaffold(&self, titles: &[String], language: &str) -> Result<ScaffoldResponse> {
        let prompt = prompts::scaffold_prompt(titles, language);
        request_structured(self.client.as_ref(), &prompt, &[], &scaffold_schema()).await
    }

    async fn chapter_content(&self, title: &str, transcript: &str, language: &str) -> Result<String> {
        let prompt = prompts::chapter_prompt(title, transcript, language);
        let raw = self.client.generate_text(&prompt, &[]).await?;
        Ok(strip_code_fence(&raw))
    }
}
