mod common;

use serde_json::json;
use std::sync::Arc;

use common::{CallKind, RecordingProgress, Reply, ScriptedClient, frames};
use vidbook::encoder::{MediaClass, MediaFile};
use vidbook::error::VidbookError;
use vidbook::pipeline::{CancellationToken, NoProgress, Outcome, Pipeline};

const TRANSCRIPT: &str = "[00:00:05] Welcome to the lecture about borrowing.";

fn pipeline(client: &Arc<ScriptedClient>, cancel: &CancellationToken) -> Pipeline {
    Pipeline::new(client.clone(), cancel.clone())
}

fn detailed_replies(placement: Option<serde_json::Value>) -> Vec<Reply> {
    let mut replies = vec![
        Reply::Json(json!({"titles": ["Intro", "Core Idea"]})),
        Reply::Json(json!({"title": "Borrowing in Depth", "introduction": "What this book covers."})),
        Reply::Text("## Intro\nOwnership basics.".to_string()),
        Reply::Text("```markdown\n## Core Idea\nShared and mutable references.\n```".to_string()),
    ];
    if let Some(value) = placement {
        replies.push(Reply::Json(value));
    }
    replies
}

#[tokio::test]
async fn test_detailed_run_assembles_document_with_placed_images() {
    let client = Arc::new(ScriptedClient::new(detailed_replies(Some(json!({
        "chapters": [
            {"title": "Core Idea", "images": [
                {"imageIndex": 0, "caption": "Borrow checker diagram"},
                {"imageIndex": 7, "caption": "Hallucinated frame"}
            ]}
        ]
    })))));
    let cancel = CancellationToken::new();
    let frames = frames(3);
    let progress = RecordingProgress::default();

    let outcome = pipeline(&client, &cancel)
        .generate_from_transcript_and_frames(TRANSCRIPT, &frames, &progress, "en")
        .await
        .unwrap();

    let document = outcome.completed().expect("run should complete");
    assert_eq!(document.title, "Borrowing in Depth");
    assert_eq!(document.chapters.len(), 2);
    assert_eq!(document.chapters[0].title, "Intro");
    assert!(document.chapters[0].images.is_empty());
    assert_eq!(document.chapters[1].content, "## Core Idea\nShared and mutable references.");
    assert_eq!(document.chapters[1].images.len(), 1);
    assert_eq!(document.chapters[1].images[0].caption, "Borrow checker diagram");
    assert_eq!(document.chapters[1].images[0].url, frames[0].to_data_url());

    assert_eq!(progress.percents(), vec![5.0, 15.0, 45.0, 70.0, 75.0, 100.0]);
}

#[tokio::test]
async fn test_detailed_run_issues_calls_in_stage_order() {
    let client = Arc::new(ScriptedClient::new(detailed_replies(Some(json!({"chapters": []})))));
    let cancel = CancellationToken::new();

    pipeline(&client, &cancel)
        .generate_from_transcript_and_frames(TRANSCRIPT, &frames(2), &NoProgress, "en")
        .await
        .unwrap();

    let calls = client.calls();
    let kinds: Vec<CallKind> = calls.iter().map(|c| c.kind.clone()).collect();
    assert_eq!(
        kinds,
        vec![CallKind::Structured, CallKind::Structured, CallKind::Text, CallKind::Text, CallKind::Structured]
    );

    // Scaffold sees the titles, not the transcript
    assert!(calls[1].prompt.contains("- Intro\n- Core Idea"));
    assert!(!calls[1].prompt.contains(TRANSCRIPT));
    assert!(calls[2].prompt.contains("\"Intro\""));
    assert!(calls[3].prompt.contains("\"Core Idea\""));
    // Placement carries every frame
    assert_eq!(calls[4].attachments.len(), 2);
    assert!(calls[4].attachments.iter().all(|a| a.mime_type == "image/jpeg"));
}

#[tokio::test]
async fn test_chapters_without_placement_get_no_images() {
    let client = Arc::new(ScriptedClient::new(detailed_replies(Some(json!({
        "chapters": [{"title": "Intro", "images": [{"imageIndex": 1, "caption": "Slide"}]}]
    })))));
    let cancel = CancellationToken::new();

    let document = pipeline(&client, &cancel)
        .generate_from_transcript_and_frames(TRANSCRIPT, &frames(2), &NoProgress, "en")
        .await
        .unwrap()
        .completed()
        .unwrap();

    assert_eq!(document.chapters[0].images.len(), 1);
    assert!(document.chapters[1].images.is_empty());
}

#[tokio::test]
async fn test_empty_frame_sequence_skips_placement_call() {
    let client = Arc::new(ScriptedClient::new(detailed_replies(None)));
    let cancel = CancellationToken::new();
    let progress = RecordingProgress::default();

    let document = pipeline(&client, &cancel)
        .generate_from_transcript_and_frames(TRANSCRIPT, &[], &progress, "en")
        .await
        .unwrap()
        .completed()
        .unwrap();

    assert_eq!(client.call_count(), 4);
    assert_eq!(document.image_count(), 0);
    assert_eq!(progress.percents().last(), Some(&100.0));
}

#[tokio::test]
async fn test_empty_outline_yields_document_without_chapters() {
    let client = Arc::new(ScriptedClient::new(vec![
        Reply::Json(json!({"titles": ["  ", ""]})),
        Reply::Json(json!({"title": "Empty", "introduction": "Nothing to see."})),
    ]));
    let cancel = CancellationToken::new();

    let document = pipeline(&client, &cancel)
        .generate_from_transcript_and_frames(TRANSCRIPT, &frames(2), &NoProgress, "en")
        .await
        .unwrap()
        .completed()
        .unwrap();

    assert!(document.chapters.is_empty());
    assert_eq!(client.call_count(), 2);
}

#[tokio::test]
async fn test_cancellation_after_outline_stops_everything() {
    let cancel = CancellationToken::new();
    let client = Arc::new(ScriptedClient::new(detailed_replies(None)).cancelling_after(1, cancel.clone()));
    let progress = RecordingProgress::default();

    let outcome = pipeline(&client, &cancel)
        .generate_from_transcript_and_frames(TRANSCRIPT, &frames(2), &progress, "en")
        .await
        .unwrap();

    assert!(outcome.is_cancelled());
    assert_eq!(client.call_count(), 1);
    assert_eq!(progress.percents(), vec![5.0]);
}

#[tokio::test]
async fn test_cancellation_after_first_chapter_skips_remaining_chapters() {
    let cancel = CancellationToken::new();
    let client = Arc::new(ScriptedClient::new(detailed_replies(None)).cancelling_after(3, cancel.clone()));
    let progress = RecordingProgress::default();

    let outcome = pipeline(&client, &cancel)
        .generate_from_transcript_and_frames(TRANSCRIPT, &frames(2), &progress, "en")
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::Cancelled);
    assert_eq!(client.call_count(), 3);
    assert_eq!(progress.percents(), vec![5.0, 15.0, 45.0]);
}

#[tokio::test]
async fn test_cancelled_before_start_makes_no_calls() {
    let cancel = CancellationToken::new();
    cancel.cancel();
    let client = Arc::new(ScriptedClient::new(detailed_replies(None)));
    let progress = RecordingProgress::default();

    let outcome = pipeline(&client, &cancel)
        .generate_from_transcript_and_frames(TRANSCRIPT, &frames(1), &progress, "en")
        .await
        .unwrap();

    assert!(outcome.is_cancelled());
    assert_eq!(client.call_count(), 0);
    assert_eq!(progress.count(), 0);
}

#[tokio::test]
async fn test_outline_schema_violation_aborts_run() {
    let client = Arc::new(ScriptedClient::new(vec![Reply::Json(json!({"chapters": ["x"]}))]));
    let cancel = CancellationToken::new();

    let err = pipeline(&client, &cancel)
        .generate_from_transcript_and_frames(TRANSCRIPT, &frames(1), &NoProgress, "en")
        .await
        .unwrap_err();

    assert!(err.is_schema_violation());
    assert_eq!(client.call_count(), 1);
}

#[tokio::test]
async fn test_malformed_json_is_schema_violation() {
    let client = Arc::new(ScriptedClient::new(vec![Reply::Text("{\"titles\": [".to_string())]));
    let cancel = CancellationToken::new();

    let err = pipeline(&client, &cancel)
        .generate_from_transcript_and_frames(TRANSCRIPT, &[], &NoProgress, "en")
        .await
        .unwrap_err();

    assert!(err.is_schema_violation());
}

#[tokio::test]
async fn test_chapter_failure_aborts_before_placement() {
    let client = Arc::new(ScriptedClient::new(vec![
        Reply::Json(json!({"titles": ["Intro", "Core Idea"]})),
        Reply::Json(json!({"title": "T", "introduction": "I"})),
        Reply::Fail(VidbookError::Generation("HTTP 503".to_string())),
        Reply::Json(json!({"chapters": []})),
    ]));
    let cancel = CancellationToken::new();

    let err = pipeline(&client, &cancel)
        .generate_from_transcript_and_frames(TRANSCRIPT, &frames(2), &NoProgress, "en")
        .await
        .unwrap_err();

    assert!(matches!(err, VidbookError::Generation(_)));
    assert!(!err.is_schema_violation());
    assert_eq!(client.call_count(), 3);
}

#[tokio::test]
async fn test_video_run_resolves_only_valid_frame_references() {
    let client = Arc::new(ScriptedClient::new(vec![Reply::Json(json!({
        "title": "Lecture",
        "introduction": "Intro text",
        "chapters": [
            {"title": "One", "content": "Body one", "images": [
                {"imageIndex": 1, "caption": "Second frame"},
                {"imageIndex": 5, "caption": "Out of range"},
                {"imageIndex": -1, "caption": "Negative"},
                {"imageIndex": 0.5, "caption": "Fractional"}
            ]},
            {"title": "Two", "content": "Body two"}
        ]
    }))]));
    let cancel = CancellationToken::new();
    let frames = frames(2);
    let video = MediaFile::new("talk", None, b"video-bytes".to_vec());
    let progress = RecordingProgress::default();

    let document = pipeline(&client, &cancel)
        .generate_from_video(&video, &frames, &progress, "en")
        .await
        .unwrap()
        .completed()
        .unwrap();

    assert_eq!(document.chapters.len(), 2);
    assert_eq!(document.chapters[0].images.len(), 1);
    assert_eq!(document.chapters[0].images[0].url, frames[1].to_data_url());
    assert!(document.chapters[1].images.is_empty());

    let calls = client.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].kind, CallKind::Structured);
    assert_eq!(calls[0].attachments.len(), 3);
    assert_eq!(calls[0].attachments[0].mime_type, "video/mp4");
    assert_eq!(progress.percents().last(), Some(&100.0));
}

#[tokio::test]
async fn test_video_run_cancelled_during_structure_returns_no_document() {
    let cancel = CancellationToken::new();
    let client = Arc::new(
        ScriptedClient::new(vec![Reply::Json(json!({"title": "T", "introduction": "I", "chapters": []}))])
            .cancelling_after(1, cancel.clone()),
    );
    let video = MediaFile::new("talk.mp4", Some("video/mp4".to_string()), vec![1, 2, 3]);
    let progress = RecordingProgress::default();

    let outcome = pipeline(&client, &cancel)
        .generate_from_video(&video, &[], &progress, "en")
        .await
        .unwrap();

    assert!(outcome.is_cancelled());
    assert_eq!(progress.count(), 2);
}

#[tokio::test]
async fn test_transcribe_sends_media_and_trims_result() {
    let client = Arc::new(ScriptedClient::new(vec![Reply::Text("\n[00:00:01] Hello there.\n".to_string())]));
    let cancel = CancellationToken::new();
    let audio = MediaFile::new("lecture", None, b"ID3".to_vec());

    let transcript = pipeline(&client, &cancel).transcribe(&audio, MediaClass::Audio, &NoProgress).await.unwrap();

    assert_eq!(transcript, "[00:00:01] Hello there.");
    let calls = client.calls();
    assert_eq!(calls[0].kind, CallKind::Text);
    assert_eq!(calls[0].attachments[0].mime_type, "audio/mpeg");
}

#[tokio::test]
async fn test_transcribe_without_extension_uses_video_fallback() {
    let client = Arc::new(ScriptedClient::new(vec![Reply::Text("[00:00:01] Hi.".to_string())]));
    let cancel = CancellationToken::new();
    let recording = MediaFile::new("lecture_recording", None, b"vid".to_vec());

    pipeline(&client, &cancel).transcribe(&recording, MediaClass::Video, &NoProgress).await.unwrap();

    assert_eq!(client.calls()[0].attachments[0].mime_type, "video/mp4");
}

#[tokio::test]
async fn test_transcribe_reports_nothing_after_cancellation() {
    let cancel = CancellationToken::new();
    let client = Arc::new(
        ScriptedClient::new(vec![Reply::Text("[00:00:01] Hi.".to_string())]).cancelling_after(1, cancel.clone()),
    );
    let audio = MediaFile::new("talk.mp3", None, b"ID3".to_vec());
    let progress = RecordingProgress::default();

    pipeline(&client, &cancel).transcribe(&audio, MediaClass::Audio, &progress).await.unwrap();

    // Only the opening "Transcribing" message
    assert_eq!(progress.count(), 1);
}
