use std::path::Path;
use tokio::process::Command;
use tracing::debug;

use crate::error::{Result, VidbookError};

/// Abstract media processing command representation
#[derive(Debug, Clone)]
pub struct MediaCommand {
    pub binary_path: String,
    pub args: Vec<String>,
    pub description: String,
}

impl MediaCommand {
    /// Create a new media processing command
    pub fn new<S1: Into<String>, S2: Into<String>>(binary_path: S1, description: S2) -> Self {
        Self {
            binary_path: binary_path.into(),
            args: Vec::new(),
            description: description.into(),
        }
    }

    /// Add an argument
    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(|s| s.into()));
        self
    }

    /// Add input file
    pub fn input<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg("-i").arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Seek the input to a position in seconds (must precede `input`)
    pub fn seek(self, seconds: f64) -> Self {
        self.arg("-ss").arg(format!("{:.3}", seconds))
    }

    /// Only show errors on stderr
    pub fn quiet(self) -> Self {
        self.arg("-v").arg("error")
    }

    /// Write the result to stdout instead of a file
    pub fn to_stdout(self) -> Self {
        self.arg("pipe:1")
    }

    /// Execute the command and return its stdout
    pub async fn execute(&self) -> Result<Vec<u8>> {
        debug!("Executing media processing command: {} {:?}", self.binary_path, self.args);
        debug!("Description: {}", self.description);

        let output = Command::new(&self.binary_path)
            .args(&self.args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| VidbookError::Decode(format!("Failed to execute {}: {}", self.binary_path, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VidbookError::Decode(format!(
                "{} failed: {}",
                self.description,
                stderr.trim()
            )));
        }

        Ok(output.stdout)
    }
}

/// Builder for the ffmpeg / ffprobe invocations used by frame sampling
pub struct MediaCommandBuilder {
    ffmpeg_path: String,
    ffprobe_path: String,
}

impl MediaCommandBuilder {
    /// Create a new command builder
    pub fn new<S1: Into<String>, S2: Into<String>>(ffmpeg_path: S1, ffprobe_path: S2) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            ffprobe_path: ffprobe_path.into(),
        }
    }

    /// Build metadata probe: first video stream dimensions plus container duration, as JSON
    pub fn probe_video<P: AsRef<Path>>(&self, video_path: P) -> MediaCommand {
        MediaCommand::new(&self.ffprobe_path, "Video metadata probe")
            .quiet()
            .args(["-select_streams", "v:0"])
            .args(["-show_entries", "stream=width,height:format=duration"])
            .args(["-of", "json"])
            .arg(video_path.as_ref().to_string_lossy().to_string())
    }

    /// Build single frame capture: seek, decode one frame, encode as JPEG to stdout
    pub fn capture_frame<P: AsRef<Path>>(&self, video_path: P, timestamp: f64, qscale: u8) -> MediaCommand {
        MediaCommand::new(&self.ffmpeg_path, format!("Frame capture at {:.3}s", timestamp))
            .quiet()
            .seek(timestamp)
            .input(video_path)
            .args(["-frames:v", "1"])
            .arg("-q:v").arg(qscale.clamp(2, 31).to_string())
            .args(["-f", "image2pipe", "-c:v", "mjpeg"])
            .to_stdout()
    }

    /// Build version check command
    pub fn version_check(&self) -> MediaCommand {
        MediaCommand::new(&self.ffmpeg_path, "Version check")
            .arg("-version")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_frame_seeks_before_input() {
        let builder = MediaCommandBuilder::new("ffmpeg", "ffprobe");
        let cmd = builder.capture_frame("/tmp/in.mp4", 30.0, 8);

        let ss = cmd.args.iter().position(|a| a == "-ss").unwrap();
        let input = cmd.args.iter().position(|a| a == "-i").unwrap();
        assert!(ss < input);
        assert_eq!(cmd.args[ss + 1], "30.000");
        assert_eq!(cmd.args.last().map(String::as_str), Some("pipe:1"));
    }

    #[test]
    fn test_capture_frame_clamps_qscale() {
        let builder = MediaCommandBuilder::new("ffmpeg", "ffprobe");
        let cmd = builder.capture_frame("in.mp4", 1.0, 0);
        let q = cmd.args.iter().position(|a| a == "-q:v").unwrap();
        assert_eq!(cmd.args[q + 1], "2");
    }

    #[test]
    fn test_probe_uses_ffprobe_binary() {
        let builder = MediaCommandBuilder::new("/opt/ffmpeg", "/opt/ffprobe");
        let cmd = builder.probe_video("in.mp4");
        assert_eq!(cmd.binary_path, "/opt/ffprobe");
        assert!(cmd.args.contains(&"json".to_string()));
    }
}
