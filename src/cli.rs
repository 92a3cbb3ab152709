use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Language of the generated document (e.g. pt-BR, en)
    #[arg(short, long, global = true)]
    pub language: Option<String>,

    /// Seconds between sampled frames
    #[arg(long, global = true)]
    pub interval: Option<f64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sample still frames from a video and write them as JPEG files
    Frames {
        /// Input video file
        #[arg(short, long)]
        input: PathBuf,

        /// Directory receiving the frames
        #[arg(short, long)]
        output_dir: PathBuf,
    },

    /// Transcribe an audio or video file to Markdown
    Transcribe {
        /// Input media file
        #[arg(short, long)]
        input: PathBuf,

        /// Output text file (prints to stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate an ebook from a video in a single request
    Quick {
        /// Input video file
        #[arg(short, long)]
        input: PathBuf,

        /// Keep only these frame indices (comma-separated)
        #[arg(long, value_delimiter = ',')]
        frames: Option<Vec<usize>>,

        /// Also write the result as Markdown
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate an ebook chapter by chapter from one or more sources
    Detailed {
        /// Video files (transcribed, and sampled for frames)
        #[arg(long = "video")]
        videos: Vec<PathBuf>,

        /// Audio files (transcribed)
        #[arg(long = "audio")]
        audios: Vec<PathBuf>,

        /// Text or Markdown files (used as they are)
        #[arg(long = "text")]
        texts: Vec<PathBuf>,

        /// Inline text
        #[arg(long = "paste")]
        pasted: Vec<String>,

        /// Keep only these frame indices (comma-separated)
        #[arg(long, value_delimiter = ',')]
        frames: Option<Vec<usize>>,

        /// Also write the result as Markdown
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Manage saved documents
    Library {
        #[command(subcommand)]
        action: LibraryAction,
    },

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub enum LibraryAction {
    /// List saved documents, newest first
    List,

    /// Print a saved document as Markdown
    Show {
        /// Document id
        id: String,
    },

    /// Write a saved document to a Markdown file
    Export {
        /// Document id
        id: String,

        /// Output Markdown file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Delete a saved document
    Delete {
        /// Document id
        id: String,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Write a default configuration file
    Init {
        /// Destination path
        #[arg(short, long, default_value = "vidbook.toml")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_detailed_sources() {
        let args = Args::parse_from([
            "vidbook", "detailed",
            "--video", "a.mp4", "--audio", "b.mp3", "--text", "c.md",
            "--paste", "hello", "--frames", "0,2",
        ]);

        match args.command {
            Commands::Detailed { videos, audios, texts, pasted, frames, output } => {
                assert_eq!(videos, vec![PathBuf::from("a.mp4")]);
                assert_eq!(audios, vec![PathBuf::from("b.mp3")]);
                assert_eq!(texts, vec![PathBuf::from("c.md")]);
                assert_eq!(pasted, vec!["hello".to_string()]);
                assert_eq!(frames, Some(vec![0, 2]));
                assert!(output.is_none());
            }
            _ => panic!("expected detailed command"),
        }
    }

    #[test]
    fn test_global_language_override() {
        let args = Args::parse_from(["vidbook", "quick", "-i", "talk.mp4", "--language", "en"]);
        assert_eq!(args.language.as_deref(), Some("en"));
    }

    #[test]
    fn test_cli_is_well_formed() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
