use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

/// Receives human readable status plus an optional 0-100 percentage
pub trait ProgressSink: Send + Sync {
    fn report(&self, message: &str, percent: Option<f32>);
}

impl<F> ProgressSink for F
where
    F: Fn(&str, Option<f32>) + Send + Sync,
{
    fn report(&self, message: &str, percent: Option<f32>) {
        self(message, percent)
    }
}

/// Discards every report
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _message: &str, _percent: Option<f32>) {}
}

/// Writes progress to the log
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn report(&self, message: &str, percent: Option<f32>) {
        match percent {
            Some(p) => info!("[{:>3.0}%] {}", p, message),
            None => info!("{}", message),
        }
    }
}

/// Terminal progress bar
pub struct ConsoleProgress {
    bar: ProgressBar,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::new(100);
        bar.set_style(ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>3}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"));
        Self { bar }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for ConsoleProgress {
    fn report(&self, message: &str, percent: Option<f32>) {
        if let Some(p) = percent {
            self.bar.set_position(p.clamp(0.0, 100.0).round() as u64);
        }
        self.bar.set_message(message.to_string());
    }
}

/// Cooperative cancellation flag shared between the caller and a pipeline run
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
