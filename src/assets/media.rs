use std::path::Path;

use crate::foundation::error::{ReelError, ReelResult};

/// Sample rate narration and music are resampled to before mixing.
pub const MIX_SAMPLE_RATE: u32 = 48_000;

/// Measures the playable length of an audio artifact.
pub trait AudioProbe: Send + Sync {
    /// Duration of the audio at `path` in seconds.
    fn duration_secs(&self, path: &Path) -> ReelResult<f64>;
}

/// [`AudioProbe`] backed by the system `ffprobe` binary.
#[derive(Clone, Copy, Debug, Default)]
pub struct FfprobeAudio;

impl AudioProbe for FfprobeAudio {
    fn duration_secs(&self, path: &Path) -> ReelResult<f64> {
        let out = std::process::Command::new("ffprobe")
            .args(["-v", "error", "-print_format", "json", "-show_format"])
            .arg(path)
            .output()
            .map_err(|e| ReelError::synthesis(format!("failed to run ffprobe: {e}")))?;
        if !out.status.success() {
            return Err(ReelError::synthesis(format!(
                "ffprobe failed for '{}': {}",
                path.display(),
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }
        parse_ffprobe_duration(&out.stdout)
    }
}

/// Extract `format.duration` from `ffprobe -print_format json -show_format` output.
pub fn parse_ffprobe_duration(json: &[u8]) -> ReelResult<f64> {
    #[derive(serde::Deserialize)]
    struct ProbeFormat {
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        format: Option<ProbeFormat>,
    }

    let parsed: ProbeOut = serde_json::from_slice(json)
        .map_err(|e| ReelError::serde(format!("ffprobe json parse failed: {e}")))?;
    let raw = parsed
        .format
        .and_then(|f| f.duration)
        .ok_or_else(|| ReelError::synthesis("ffprobe reported no duration"))?;
    let secs: f64 = raw
        .trim()
        .parse()
        .map_err(|_| ReelError::synthesis(format!("ffprobe duration '{raw}' is not a number")))?;
    if !secs.is_finite() || secs <= 0.0 {
        return Err(ReelError::synthesis(format!(
            "ffprobe duration {secs} is not positive"
        )));
    }
    Ok(secs)
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    tool_answers("ffmpeg")
}

/// Return `true` when `ffprobe` can be invoked from `PATH`.
pub fn is_ffprobe_on_path() -> bool {
    tool_answers("ffprobe")
}

fn tool_answers(program: &str) -> bool {
    std::process::Command::new(program)
        .arg("-version")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/media.rs"]
mod tests;
