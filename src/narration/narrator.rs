use std::io::Read as _;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// Files written by a successful narration call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NarratorOutput {
    pub audio_path: PathBuf,
    /// Word-timing sidecar, when the narrator produced one.
    pub timings_path: Option<PathBuf>,
}

/// Why a narration call produced no audio.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum NarratorFault {
    /// Quota or rate limit hit; the next provider in the chain may succeed.
    #[error("rate limited: {0}")]
    RateLimited(String),
    /// Any other failure; retrying elsewhere is not expected to help.
    #[error("narration failed: {0}")]
    Failed(String),
}

/// External speech synthesizer.
pub trait Narrator: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Speak `text` into `audio_out`, optionally writing word timings to `timings_out`.
    fn synthesize(
        &self,
        text: &str,
        audio_out: &Path,
        timings_out: &Path,
    ) -> Result<NarratorOutput, NarratorFault>;
}

/// Narrator process description, as found in the run configuration.
///
/// `args` may contain `{text}`, `{audio}` and `{timings}` placeholders, e.g.
/// `["--voice", "hi-IN-SwaraNeural", "--text", "{text}", "--write-media", "{audio}"]`.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NarratorCommand {
    pub name: String,
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    60
}

// Conventional EX_TEMPFAIL; narrator wrappers use it for quota exhaustion.
const EXIT_TEMPFAIL: i32 = 75;
const RATE_LIMIT_MARKERS: &[&str] = &["rate limit", "ratelimit", "quota", "429", "too many requests"];

/// [`Narrator`] that runs an external TTS program per section.
#[derive(Clone, Debug)]
pub struct CommandNarrator {
    cmd: NarratorCommand,
}

impl CommandNarrator {
    pub fn new(cmd: NarratorCommand) -> Self {
        Self { cmd }
    }

    fn expand_args(&self, text: &str, audio_out: &Path, timings_out: &Path) -> Vec<String> {
        let audio = audio_out.to_string_lossy();
        let timings = timings_out.to_string_lossy();
        self.cmd
            .args
            .iter()
            .map(|a| {
                a.replace("{text}", text)
                    .replace("{audio}", &audio)
                    .replace("{timings}", &timings)
            })
            .collect()
    }
}

impl Narrator for CommandNarrator {
    fn name(&self) -> &str {
        &self.cmd.name
    }

    fn synthesize(
        &self,
        text: &str,
        audio_out: &Path,
        timings_out: &Path,
    ) -> Result<NarratorOutput, NarratorFault> {
        if let Some(parent) = audio_out.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                NarratorFault::Failed(format!(
                    "failed to create narration directory '{}': {e}",
                    parent.display()
                ))
            })?;
        }
        // Stale artifacts from an earlier provider must not count as success.
        let _ = std::fs::remove_file(audio_out);
        let _ = std::fs::remove_file(timings_out);

        let args = self.expand_args(text, audio_out, timings_out);
        tracing::debug!(narrator = %self.cmd.name, chars = text.chars().count(), "narrating");

        let mut child = Command::new(&self.cmd.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                NarratorFault::Failed(format!("failed to spawn '{}': {e}", self.cmd.program))
            })?;

        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| NarratorFault::Failed("failed to open narrator stderr".to_string()))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut bytes = Vec::new();
            let _ = stderr.read_to_end(&mut bytes);
            bytes
        });

        let deadline = Instant::now() + Duration::from_secs(self.cmd.timeout_secs.max(1));
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if Instant::now() >= deadline => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(NarratorFault::Failed(format!(
                        "'{}' timed out after {}s",
                        self.cmd.name, self.cmd.timeout_secs
                    )));
                }
                Ok(None) => std::thread::sleep(Duration::from_millis(25)),
                Err(e) => {
                    return Err(NarratorFault::Failed(format!(
                        "failed to wait for '{}': {e}",
                        self.cmd.name
                    )));
                }
            }
        };
        let stderr_text = stderr_drain
            .join()
            .map(|b| String::from_utf8_lossy(&b).trim().to_string())
            .unwrap_or_default();

        if !status.success() {
            return Err(classify_failure(status.code(), &stderr_text));
        }

        let audio_ok = std::fs::metadata(audio_out)
            .map(|m| m.is_file() && m.len() > 0)
            .unwrap_or(false);
        if !audio_ok {
            return Err(NarratorFault::Failed(format!(
                "'{}' exited successfully but wrote no audio to '{}'",
                self.cmd.name,
                audio_out.display()
            )));
        }

        let timings_path = timings_out.is_file().then(|| timings_out.to_path_buf());
        Ok(NarratorOutput {
            audio_path: audio_out.to_path_buf(),
            timings_path,
        })
    }
}

/// Map a failed exit to a fault; quota signals advance the provider chain.
pub fn classify_failure(code: Option<i32>, stderr: &str) -> NarratorFault {
    let lower = stderr.to_lowercase();
    let msg = if stderr.is_empty() {
        format!("exit status {}", code.map_or("signal".to_string(), |c| c.to_string()))
    } else {
        stderr.to_string()
    };
    if code == Some(EXIT_TEMPFAIL) || RATE_LIMIT_MARKERS.iter().any(|m| lower.contains(m)) {
        NarratorFault::RateLimited(msg)
    } else {
        NarratorFault::Failed(msg)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/narration/narrator.rs"]
mod tests;
