use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::document::{DocumentDraft, Image};
use crate::encoder::encode_frame;
use crate::error::Result;
use crate::frames::Frame;
use crate::generation::{Field, Schema, request_structured};
use super::{Pipeline, prompts};

/// One frame chosen for a chapter, as returned by the model
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagePlacement {
    /// Kept as a float: the model's numbers are untrusted and filtered later
    pub image_index: f64,
    pub caption: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChapterPlacement {
    pub title: String,
    #[serde(default)]
    pub images: Vec<ImagePlacement>,
}

#[derive(Debug, Deserialize)]
struct PlacementResponse {
    chapters: Vec<ChapterPlacement>,
}

pub fn image_placement_schema() -> Schema {
    Schema::object(vec![
        Field::required("imageIndex", Schema::number().describe("Zero-based index of the image to place.")),
        Field::required("caption", Schema::string().describe("A concise, descriptive caption for the image.")),
    ])
}

pub fn placement_schema() -> Schema {
    Schema::object(vec![Field::required(
        "chapters",
        Schema::array(Schema::object(vec![
            Field::required("title", Schema::string().describe("Exact title of the chapter receiving the images.")),
            Field::required("images", Schema::array(image_placement_schema())),
        ]))
        .describe("Image placements grouped by chapter."),
    )])
}

/// Map a model-chosen index back to frame pixels. Anything that is not a
/// whole number inside `[0, frames.len())` is rejected.
pub fn resolve_image(placement: &ImagePlacement, frames: &[Frame]) -> Option<Image> {
    let index = placement.image_index;
    if !index.is_finite() || index < 0.0 || index.fract() != 0.0 {
        return None;
    }

    frames.get(index as usize).map(|frame| Image {
        url: frame.to_data_url(),
        caption: placement.caption.trim().to_string(),
    })
}

/// Resolve a list of placements, dropping out-of-range references
pub fn resolve_images(placements: &[ImagePlacement], frames: &[Frame]) -> Vec<Image> {
    let images: Vec<Image> = placements
        .iter()
        .filter_map(|p| resolve_image(p, frames))
        .collect();

    let dropped = placements.len() - images.len();
    if dropped > 0 {
        warn!("Dropped {} image placements referencing frames outside 0..{}", dropped, frames.len());
    }

    images
}

/// Join placements back onto the draft's chapters by title. Chapters the
/// response does not mention get no images. The same frame may end up in
/// several chapters.
pub fn merge_placements(draft: &DocumentDraft, placements: &[ChapterPlacement], frames: &[Frame]) -> Vec<Vec<Image>> {
    let mut by_title: HashMap<&str, Vec<Image>> = HashMap::new();
    for placement in placements {
        by_title
            .entry(placement.title.trim())
            .or_default()
            .extend(resolve_images(&placement.images, frames));
    }

    for title in by_title.keys() {
        if !draft.chapters.iter().any(|c| c.title.trim() == *title) {
            warn!("Placement response names unknown chapter \"{}\"", title);
        }
    }

    draft.chapters
        .iter()
        .map(|chapter| by_title.get(chapter.title.trim()).cloned().unwrap_or_default())
        .collect()
}

impl Pipeline {
    /// Ask the model to place frames into the draft's chapters. With no
    /// frames or no chapters this returns empty lists without calling the
    /// service.
    pub(crate) async fn place_images(&self, draft: &DocumentDraft, frames: &[Frame], language: &str) -> Result<Vec<Vec<Image>>> {
        if frames.is_empty() || draft.chapters.is_empty() {
            debug!("Nothing to place, skipping placement request");
            return Ok(vec![Vec::new(); draft.chapters.len()]);
        }

        let draft_json = serde_json::to_string(draft)?;
        let prompt = prompts::placement_prompt(&draft_json, language, frames.len());
        let attachments: Vec<_> = frames.iter().map(encode_frame).collect();

        let response: PlacementResponse =
            request_structured(self.client.as_ref(), &prompt, &attachments, &placement_schema()).await?;

        Ok(merge_placements(draft, &response.chapters, frames))
    }
}
