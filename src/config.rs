use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::error::{Result, VidbookError};

fn default_timeout_secs() -> u64 {
    300
}

fn default_jpeg_quality() -> f32 {
    0.8
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub generation: GenerationConfig,
    pub frames: FrameConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Base URL of the generation REST API
    pub endpoint: String,
    /// Model used for every generation call
    pub model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameConfig {
    /// Seconds between sampled frames
    pub interval_seconds: f64,
    /// Lossy encoding quality for captured frames (0.0 - 1.0)
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: f32,
    /// Path to ffmpeg binary
    pub ffmpeg_path: String,
    /// Path to ffprobe binary
    pub ffprobe_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Language the generated document is written in
    pub language: String,
    /// JSON file holding saved documents
    pub library_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            generation: GenerationConfig {
                endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
                model: "gemini-2.5-flash".to_string(),
                api_key_env: "GEMINI_API_KEY".to_string(),
                timeout_secs: default_timeout_secs(),
            },
            frames: FrameConfig {
                interval_seconds: 30.0,
                jpeg_quality: default_jpeg_quality(),
                ffmpeg_path: "ffmpeg".to_string(),
                ffprobe_path: "ffprobe".to_string(),
            },
            output: OutputConfig {
                language: "pt-BR".to_string(),
                library_path: PathBuf::from(".vidbook").join("library.json"),
            },
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| VidbookError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| VidbookError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| VidbookError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| VidbookError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Resolve the API key from the configured environment variable
    pub fn api_key(&self) -> Result<String> {
        match std::env::var(&self.generation.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(VidbookError::Config(format!(
                "API key is not configured. Set the {} environment variable.",
                self.generation.api_key_env
            ))),
        }
    }
}
