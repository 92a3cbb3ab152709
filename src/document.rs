use serde::{Deserialize, Serialize};

/// A generated ebook: title, introduction and chapters in reading order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub title: String,
    pub introduction: String,
    pub chapters: Vec<Chapter>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    pub title: String,
    /// Markdown body
    pub content: String,
    pub images: Vec<Image>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    /// Data URL of the frame, or any resolvable URI
    pub url: String,
    pub caption: String,
}

/// Chapter text before image placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterDraft {
    pub title: String,
    pub content: String,
}

/// Document text before image placement. Serialized as context for the
/// placement request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentDraft {
    pub title: String,
    pub introduction: String,
    pub chapters: Vec<ChapterDraft>,
}

impl DocumentDraft {
    /// Attach one image list per chapter, index-aligned with `chapters`.
    pub fn into_document(self, mut images: Vec<Vec<Image>>) -> Document {
        images.resize_with(self.chapters.len(), Vec::new);

        let chapters = self.chapters
            .into_iter()
            .zip(images)
            .map(|(draft, images)| Chapter {
                title: draft.title,
                content: draft.content,
                images,
            })
            .collect();

        Document {
            title: self.title,
            introduction: self.introduction,
            chapters,
        }
    }
}

impl Document {
    /// Render the whole document as a single markdown text
    pub fn to_markdown(&self) -> String {
        let mut out = format!("# {}\n\n## Introduction\n{}\n", self.title.trim(), self.introduction.trim());

        for (index, chapter) in self.chapters.iter().enumerate() {
            out.push_str(&format!("\n## Chapter {}: {}\n{}\n", index + 1, chapter.title, chapter.content.trim()));
            for image in &chapter.images {
                out.push_str(&format!("\n![{}]({})\n*{}*\n", image.caption, image.url, image.caption));
            }
        }

        out
    }

    pub fn image_count(&self) -> usize {
        self.chapters.iter().map(|c| c.images.len()).sum()
    }
}
