use std::path::Path;

use crate::foundation::error::{ReelError, ReelResult};

/// One spoken word and the span of audio it occupies.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct WordTiming {
    pub text: String,
    pub start_secs: f64,
    pub duration_secs: f64,
}

impl WordTiming {
    /// Exclusive end of the word.
    pub fn end_secs(&self) -> f64 {
        self.start_secs + self.duration_secs
    }

    /// `true` when `t` falls inside `[start, start + duration)`.
    pub fn is_active_at(&self, t: f64) -> bool {
        self.start_secs <= t && t < self.end_secs()
    }
}

// 100ns ticks, as emitted by neural TTS word-boundary events.
const TICKS_PER_SEC: f64 = 10_000_000.0;

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum SidecarEntry {
    Seconds {
        text: String,
        start: f64,
        duration: f64,
    },
    Ticks {
        text: String,
        offset: u64,
        duration: u64,
    },
}

impl From<SidecarEntry> for WordTiming {
    fn from(e: SidecarEntry) -> Self {
        match e {
            SidecarEntry::Seconds {
                text,
                start,
                duration,
            } => Self {
                text,
                start_secs: start,
                duration_secs: duration,
            },
            SidecarEntry::Ticks {
                text,
                offset,
                duration,
            } => Self {
                text,
                start_secs: offset as f64 / TICKS_PER_SEC,
                duration_secs: duration as f64 / TICKS_PER_SEC,
            },
        }
    }
}

/// Parse a timing sidecar: a JSON array of `{text, start, duration}` in seconds, or
/// `{text, offset, duration}` in 100ns ticks. The result is normalized.
pub fn parse_sidecar(json: &str) -> ReelResult<Vec<WordTiming>> {
    let entries: Vec<SidecarEntry> = serde_json::from_str(json)
        .map_err(|e| ReelError::serde(format!("timing sidecar parse failed: {e}")))?;
    Ok(normalize(entries.into_iter().map(WordTiming::from).collect()))
}

/// Read a timing sidecar. A missing file yields an empty list (static captions).
pub fn load_sidecar(path: &Path) -> ReelResult<Vec<WordTiming>> {
    match std::fs::read_to_string(path) {
        Ok(raw) if raw.trim().is_empty() => Ok(Vec::new()),
        Ok(raw) => parse_sidecar(&raw),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(ReelError::Other(anyhow::Error::new(e).context(format!(
            "read timing sidecar '{}'",
            path.display()
        )))),
    }
}

/// Enforce the ordering invariant: drop blank, non-finite, negative or zero-length words,
/// sort by start and clamp each word to end no later than the next one starts.
///
/// Offsets of well-formed input are returned unchanged.
pub fn normalize(mut words: Vec<WordTiming>) -> Vec<WordTiming> {
    words.retain(|w| {
        !w.text.trim().is_empty()
            && w.start_secs.is_finite()
            && w.duration_secs.is_finite()
            && w.start_secs >= 0.0
            && w.duration_secs > 0.0
    });
    words.sort_by(|a, b| a.start_secs.total_cmp(&b.start_secs));

    let mut clamped = 0usize;
    for i in 1..words.len() {
        let next_start = words[i].start_secs;
        let prev = &mut words[i - 1];
        if prev.end_secs() > next_start {
            prev.duration_secs = next_start - prev.start_secs;
            clamped += 1;
        }
    }
    if clamped > 0 {
        tracing::warn!(clamped, "word timings overlapped; clamped to next start");
        words.retain(|w| w.duration_secs > 0.0);
    }
    words
}

/// `true` when words are sorted and `start[i] + duration[i] <= start[i + 1]`.
pub fn is_well_formed(words: &[WordTiming]) -> bool {
    words
        .windows(2)
        .all(|w| w[0].start_secs <= w[1].start_secs && w[0].end_secs() <= w[1].start_secs)
}

/// Index of the word whose window contains `t`, if any. Requires well-formed input.
pub fn active_word_index(words: &[WordTiming], t: f64) -> Option<usize> {
    let idx = words.partition_point(|w| w.start_secs <= t);
    if idx == 0 {
        return None;
    }
    let candidate = idx - 1;
    words[candidate].is_active_at(t).then_some(candidate)
}

/// End of the last word, or `0.0` when there are none.
pub fn span_end_secs(words: &[WordTiming]) -> f64 {
    words.last().map(WordTiming::end_secs).unwrap_or(0.0)
}

#[cfg(test)]
#[path = "../../tests/unit/narration/timing.rs"]
mod tests;
