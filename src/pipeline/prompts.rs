//! Prompt text for every generation stage.

/// Spell out common language tags so the model does not have to guess
pub fn language_name(code: &str) -> String {
    let name = match code.to_lowercase().as_str() {
        "pt-br" => "Brazilian Portuguese",
        "pt" | "pt-pt" => "Portuguese",
        "en" | "en-us" | "en-gb" => "English",
        "es" => "Spanish",
        "fr" => "French",
        "de" => "German",
        "it" => "Italian",
        "ja" => "Japanese",
        "ko" => "Korean",
        "zh" | "zh-cn" => "Simplified Chinese",
        "zh-tw" => "Traditional Chinese",
        "ru" => "Russian",
        "nl" => "Dutch",
        "pl" => "Polish",
        "tr" => "Turkish",
        "ar" => "Arabic",
        "hi" => "Hindi",
        _ => return code.to_string(),
    };
    format!("{} ({})", name, code)
}

pub fn transcription_prompt() -> String {
    "Transcribe the audio of this file in full detail.\n\
     The transcription must be continuous text in Markdown format.\n\
     Insert timestamps (e.g. [00:05:23]) at the start of paragraphs or significant utterances."
        .to_string()
}

pub fn outline_prompt(transcript: &str, language: &str) -> String {
    format!(
        "Analyze the following lecture transcription and propose a list of chapter titles for an ebook.\n\
         Titles must be concise, reflect the main topics covered, and be written in {}.\n\
         Return ONLY a JSON object with a \"titles\" key holding an array of strings.\n\
         \n\
         TRANSCRIPTION:\n\
         {}",
        language_name(language), transcript
    )
}

pub fn scaffold_prompt(titles: &[String], language: &str) -> String {
    let list = titles
        .iter()
        .map(|t| format!("- {}", t))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Based on the following list of ebook chapters, write a concise, informative main title \
         for the ebook and one introduction paragraph.\n\
         The output language must be {}.\n\
         Your answer MUST be a valid JSON object with the keys \"title\" and \"introduction\".\n\
         \n\
         CHAPTER TITLES:\n\
         {}",
        language_name(language), list
    )
}

pub fn chapter_prompt(title: &str, transcript: &str, language: &str) -> String {
    format!(
        "Using the full transcription provided, write the content of the chapter titled \"{}\".\n\
         The content must be detailed and well structured Markdown, covering ONLY the parts of the \
         transcription relevant to this title.\n\
         Write in {}.\n\
         \n\
         STRICT FORMATTING RULES:\n\
         1. Answer with ONLY the chapter content in Markdown.\n\
         2. Do NOT include any introductory or explanatory sentence such as \"Here is the content...\".\n\
         3. Do NOT wrap the answer in a code block (```). The answer must be plain Markdown text.\n\
         4. Start directly with the first heading or paragraph of the chapter.\n\
         \n\
         FULL TRANSCRIPTION FOR CONTEXT:\n\
         {}",
        title, language_name(language), transcript
    )
}

pub fn video_document_prompt(language: &str, frame_count: usize) -> String {
    let images = if frame_count == 0 {
        "No still images are attached; leave every chapter's \"images\" list empty.".to_string()
    } else {
        format!(
            "After the video, {} still images sampled from it are attached, numbered 0 to {} in order. \
             For each chapter, choose only the images that are truly relevant to its content, \
             give each a concise descriptive caption in the output language, and reference it by \
             its number in \"imageIndex\".",
            frame_count,
            frame_count - 1
        )
    };

    format!(
        "Analyze this lecture video and generate the content of an ebook in {}.\n\
         Your answer MUST be a valid JSON object following the schema.\n\
         Chapter content must be well structured Markdown, faithful to the video.\n\
         {}",
        language_name(language), images
    )
}

pub fn placement_prompt(draft_json: &str, language: &str, frame_count: usize) -> String {
    format!(
        "You will receive the content of an ebook as JSON followed by {} images, numbered 0 to {} in order.\n\
         Analyze each image, write a descriptive caption in {}, and decide which chapter it fits best.\n\
         Only place images that are truly relevant to a chapter's content.\n\
         Identify chapters by repeating their exact \"title\" from the ebook JSON.\n\
         Return a JSON object following the schema.\n\
         \n\
         EBOOK:\n\
         {}",
        frame_count,
        frame_count.saturating_sub(1),
        language_name(language),
        draft_json
    )
}
