//! # Audio Transcoder
//!
//! Bridges in-memory upload bytes to an external `ffmpeg` process through
//! two scratch files. Both scratch paths are owned `TempPath` values, so
//! they are unlinked on every exit route out of this function: success,
//! transcoder failure, timeout, or an early `?`.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use bytes::Bytes;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use domains::{PipelineError, PipelineResult};

/// Canonical audio output.
pub const CANONICAL_AUDIO_MIME: &str = "audio/mpeg";
pub const CANONICAL_AUDIO_EXT: &str = ".mp3";

#[derive(Debug, Clone)]
pub struct AudioTranscoder {
    ffmpeg_path: PathBuf,
    bitrate_kbps: u32,
    timeout: Duration,
}

impl AudioTranscoder {
    pub fn new(ffmpeg_path: PathBuf, bitrate_kbps: u32, timeout: Duration) -> Self {
        Self {
            ffmpeg_path,
            bitrate_kbps,
            timeout,
        }
    }

    /// Transcodes an arbitrary audio container to the canonical codec and
    /// bitrate, returning the encoded bytes.
    pub async fn transcode(&self, input: &[u8]) -> PipelineResult<Bytes> {
        let input_path = scratch_path("kotori-audio-in-", ".src")?;
        let output_path = scratch_path("kotori-audio-out-", CANONICAL_AUDIO_EXT)?;

        tokio::fs::write(&input_path, input)
            .await
            .map_err(|err| PipelineError::Processing(format!("scratch write failed: {err}")))?;

        let mut command = Command::new(&self.ffmpeg_path);
        command
            .arg("-y")
            .arg("-i")
            .arg(&input_path)
            .arg("-vn")
            .arg("-b:a")
            .arg(format!("{}k", self.bitrate_kbps))
            .arg("-f")
            .arg("mp3")
            .arg(&output_path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            // A timed-out transcode must not keep running after we give up.
            .kill_on_drop(true);

        debug!(ffmpeg = %self.ffmpeg_path.display(), bitrate = self.bitrate_kbps, "starting transcode");

        let output = timeout(self.timeout, command.output())
            .await
            .map_err(|_| {
                PipelineError::Processing(format!(
                    "transcode exceeded {}s",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|err| PipelineError::Processing(format!("could not run ffmpeg: {err}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PipelineError::Processing(format!(
                "ffmpeg exited with {}: {}",
                output.status,
                stderr.lines().last().unwrap_or("").trim()
            )));
        }

        let encoded = tokio::fs::read(&output_path)
            .await
            .map_err(|err| PipelineError::Processing(format!("scratch read failed: {err}")))?;

        Ok(Bytes::from(encoded))
        // input_path and output_path drop here; the scratch files are gone
        // whichever way this function was left.
    }
}

/// A uniquely named scratch file, immediately converted to an owning
/// `TempPath` so only the RAII delete-on-drop behavior remains.
fn scratch_path(prefix: &str, suffix: &str) -> PipelineResult<tempfile::TempPath> {
    tempfile::Builder::new()
        .prefix(prefix)
        .suffix(suffix)
        .tempfile()
        .map(tempfile::NamedTempFile::into_temp_path)
        .map_err(|err| PipelineError::Processing(format!("scratch file creation failed: {err}")))
}
