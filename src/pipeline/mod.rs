// Document assembly pipeline
//
// Every generation run is a linear sequence of stages:
//
//   detailed: Outline -> Scaffold -> Chapter(0..n) -> Placement -> done
//   quick:    Encoding -> Structure -> done
//
// Each stage is one awaited adapter call. The cancellation token is read
// at every stage boundary; once it is set the run returns
// `Outcome::Cancelled` and reports nothing further. Any stage failure
// aborts the run and no partial document escapes.

pub mod placement;
pub mod progress;
pub mod prompts;
pub mod transcribe;
pub mod transcript;
pub mod video;

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::{error, info};

pub use progress::{CancellationToken, ConsoleProgress, NoProgress, ProgressSink, TracingProgress};
use crate::error::{Result, VidbookError};
use crate::generation::GenerationClient;

/// Result of a run that was allowed to finish, or the marker of a run that
/// was cancelled. Cancellation is not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Completed(T),
    Cancelled,
}

impl<T> Outcome<T> {
    pub fn completed(self) -> Option<T> {
        match self {
            Self::Completed(value) => Some(value),
            Self::Cancelled => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    Transcription,
    Encoding,
    Structure,
    Outline,
    Scaffold,
    Chapter { index: usize, total: usize },
    Placement,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "start"),
            Self::Transcription => write!(f, "transcription"),
            Self::Encoding => write!(f, "encoding"),
            Self::Structure => write!(f, "structure"),
            Self::Outline => write!(f, "outline"),
            Self::Scaffold => write!(f, "scaffold"),
            Self::Chapter { index, total } => write!(f, "chapter {}/{}", index + 1, total),
            Self::Placement => write!(f, "placement"),
        }
    }
}

/// Drives the generation client through the assembly stages
pub struct Pipeline {
    client: Arc<dyn GenerationClient>,
    cancel: CancellationToken,
}

impl Pipeline {
    pub fn new(client: Arc<dyn GenerationClient>, cancel: CancellationToken) -> Self {
        Self { client, cancel }
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    fn run<'a>(&'a self, progress: &'a dyn ProgressSink) -> Run<'a> {
        Run {
            progress,
            cancel: &self.cancel,
            halted: false,
        }
    }
}

/// Per-invocation state: the progress hook and the cancellation checks
pub(crate) struct Run<'a> {
    progress: &'a dyn ProgressSink,
    cancel: &'a CancellationToken,
    halted: bool,
}

impl Run<'_> {
    pub(crate) fn report(&mut self, message: &str, percent: Option<f32>) {
        if self.halted || self.cancel.is_cancelled() {
            self.halted = true;
            return;
        }
        self.progress.report(message, percent);
    }

    /// True when the run must stop at this boundary
    pub(crate) fn cancelled_at(&mut self, stage: Stage) -> bool {
        if self.cancel.is_cancelled() {
            info!("Generation cancelled at {} boundary", stage);
            self.halted = true;
        }
        self.halted
    }

    pub(crate) async fn attempt<T, F>(&self, stage: Stage, work: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        info!("Running stage: {}", stage);
        work.await.inspect_err(|e| log_stage_failure(stage, e))
    }
}

fn log_stage_failure(stage: Stage, err: &VidbookError) {
    if err.is_schema_violation() {
        error!(stage = %stage, "Model response did not match the requested schema: {}", err);
    } else {
        error!(stage = %stage, kind = err.kind(), "Stage failed: {}", err);
    }
}

/// Linear progress for the per-chapter stage: 20% to 70% across chapters
pub fn chapter_progress(index: usize, total: usize) -> f32 {
    if total == 0 {
        return 70.0;
    }
    20.0 + ((index + 1) as f32 / total as f32) * 50.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chapter_progress_spans_twenty_to_seventy() {
        assert_eq!(chapter_progress(0, 2), 45.0);
        assert_eq!(chapter_progress(1, 2), 70.0);
        assert_eq!(chapter_progress(0, 0), 70.0);
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::Chapter { index: 1, total: 3 }.to_string(), "chapter 2/3");
    }

    #[test]
    fn test_run_stops_reporting_after_cancel() {
        let token = CancellationToken::new();
        let count = std::sync::atomic::AtomicUsize::new(0);
        let sink = |_: &str, _: Option<f32>| {
            count.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        };
        let mut run = Run { progress: &sink, cancel: &token, halted: false };

        run.report("one", None);
        assert!(!run.cancelled_at(Stage::Outline));
        token.cancel();
        assert!(run.cancelled_at(Stage::Scaffold));
        run.report("two", None);

        assert_eq!(count.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[test]
    fn test_outcome_completed() {
        assert_eq!(Outcome::Completed(3).completed(), Some(3));
        assert!(Outcome::<u8>::Cancelled.is_cancelled());
    }
}
