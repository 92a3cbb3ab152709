//! vidbook - Turn lecture videos into illustrated ebooks
//!
//! Entry point for the command line tool: loads configuration, sets up
//! logging and dispatches to the workflow.

use anyhow::Result;
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tracing_appender::{non_blocking, rolling};

use vidbook::cli::{Args, Commands, ConfigAction, LibraryAction};
use vidbook::config::Config;
use vidbook::encoder::MediaFile;
use vidbook::frames::FrameSampler;
use vidbook::library::{Library, StoredDocument};
use vidbook::media::FrameDecoderFactory;
use vidbook::pipeline::{CancellationToken, ConsoleProgress};
use vidbook::workflow::{SourceSet, Workflow};

const DEFAULT_CONFIG_FILE: &str = "vidbook.toml";

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    setup_logging(args.verbose)?;

    let mut config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if Path::new(DEFAULT_CONFIG_FILE).exists() {
                info!("Found {} in current directory, loading...", DEFAULT_CONFIG_FILE);
                Config::from_file(DEFAULT_CONFIG_FILE)?
            } else {
                Config::default()
            }
        }
    };

    if let Some(language) = &args.language {
        config.output.language = language.clone();
    }
    if let Some(interval) = args.interval {
        config.frames.interval_seconds = interval;
    }

    match args.command {
        Commands::Config { action } => match action {
            ConfigAction::Init { path, force } => {
                if path.exists() && !force {
                    anyhow::bail!("{} already exists, use --force to overwrite", path.display());
                }
                Config::default().save_to_file(&path)?;
                println!("Wrote default configuration to {}", path.display());
            }
        },
        Commands::Library { action } => {
            let library = Library::new(config.output.library_path.clone());
            run_library_action(&library, action).await?;
        }
        Commands::Frames { input, output_dir } => {
            // Sampling needs no generation service, so no API key either
            let decoder = FrameDecoderFactory::create_decoder(&config.frames);
            decoder.check_availability().await?;
            let sampler = FrameSampler::new(Arc::from(decoder), config.frames.jpeg_quality);

            let video = MediaFile::open(&input).await?;
            let frames = sampler.extract_frames(&video.bytes, config.frames.interval_seconds).await?;

            tokio::fs::create_dir_all(&output_dir).await?;
            for frame in &frames {
                let path = output_dir.join(format!("frame_{:03}_{:.0}s.jpg", frame.index, frame.timestamp));
                tokio::fs::write(&path, &frame.bytes).await?;
            }
            println!("Wrote {} frames to {}", frames.len(), output_dir.display());
        }
        Commands::Transcribe { input, output } => {
            let workflow = Workflow::new(config, CancellationToken::new())?;
            let progress = ConsoleProgress::new();
            let transcript = workflow.transcribe_file(&input, &progress).await;
            progress.finish();
            let transcript = transcript?;

            match output {
                Some(path) => {
                    tokio::fs::write(&path, &transcript).await?;
                    println!("Transcript written to {}", path.display());
                }
                None => println!("{}", transcript),
            }
        }
        Commands::Quick { input, frames, output } => {
            let cancel = cancel_on_ctrl_c();
            let workflow = Workflow::new(config, cancel)?;
            workflow.check_dependencies().await?;

            let progress = ConsoleProgress::new();
            let result = workflow.quick(&input, frames.as_deref(), &progress).await;
            progress.finish();

            report_result(result?, output.as_deref()).await?;
        }
        Commands::Detailed { videos, audios, texts, pasted, frames, output } => {
            let cancel = cancel_on_ctrl_c();
            let workflow = Workflow::new(config, cancel)?;
            workflow.check_dependencies().await?;

            let sources = SourceSet { videos, audios, texts, pasted };
            let progress = ConsoleProgress::new();
            let result = workflow.detailed(&sources, frames.as_deref(), &progress).await;
            progress.finish();

            report_result(result?, output.as_deref()).await?;
        }
    }

    Ok(())
}

/// Set the returned token when the user presses Ctrl-C
fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let signal_token = token.clone();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling after the current step...");
            signal_token.cancel();
        }
    });

    token
}

async fn report_result(stored: Option<StoredDocument>, output: Option<&Path>) -> Result<()> {
    let Some(stored) = stored else {
        println!("Generation cancelled. Nothing was saved.");
        return Ok(());
    };

    println!("Saved \"{}\" as {}", stored.document.title, stored.id);
    println!(
        "{} chapters, {} images",
        stored.document.chapters.len(),
        stored.document.image_count()
    );

    if let Some(path) = output {
        tokio::fs::write(path, stored.document.to_markdown()).await?;
        println!("Markdown written to {}", path.display());
    }

    Ok(())
}

async fn run_library_action(library: &Library, action: LibraryAction) -> Result<()> {
    match action {
        LibraryAction::List => {
            let documents = library.list().await?;
            if documents.is_empty() {
                println!("No saved documents.");
                return Ok(());
            }

            println!("{:<38} {:<18} {:<9} {}", "Id", "Updated", "Chapters", "Title");
            println!("{}", "-".repeat(90));
            for stored in documents {
                println!(
                    "{:<38} {:<18} {:<9} {}",
                    stored.id,
                    stored.updated_at.format("%Y-%m-%d %H:%M").to_string(),
                    stored.document.chapters.len(),
                    stored.document.title
                );
            }
        }
        LibraryAction::Show { id } => {
            let stored = find(library, &id).await?;
            println!("{}", stored.document.to_markdown());
        }
        LibraryAction::Export { id, output } => {
            let stored = find(library, &id).await?;
            tokio::fs::write(&output, stored.document.to_markdown()).await?;
            println!("Exported \"{}\" to {}", stored.document.title, output.display());
        }
        LibraryAction::Delete { id } => {
            if library.delete(&id).await? {
                println!("Deleted {}", id);
            } else {
                anyhow::bail!("No document with id {}", id);
            }
        }
    }

    Ok(())
}

async fn find(library: &Library, id: &str) -> Result<StoredDocument> {
    library
        .get(id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("No document with id {}", id))
}

fn setup_logging(verbose: bool) -> Result<()> {
    let log_dir = std::env::current_dir()?.join(".vidbook").join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Daily rotation
    let file_appender = rolling::daily(&log_dir, "vidbook.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(guard);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    // Console output goes to stderr so it does not interleave with printed results
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Logging initialized - console: {}, file: {}",
          log_level, log_dir.join("vidbook.log").display());

    Ok(())
}
