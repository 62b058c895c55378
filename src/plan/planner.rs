use crate::{
    foundation::error::{ReelError, ReelResult},
    plan::section::{Script, Section, SectionKey},
    plan::spoken::SpokenNormalizer,
};

/// Anything with a section key and a measured duration can be trimmed.
pub trait Timed {
    /// Section the item belongs to.
    fn key(&self) -> &SectionKey;
    /// Measured duration in seconds.
    fn duration_secs(&self) -> f64;
}

/// Selection and trimming rules.
#[derive(Clone, Debug, PartialEq)]
pub struct PlannerPolicy {
    /// Narration order of known keys.
    pub priority: Vec<SectionKey>,
    /// Keys never removed under duration pressure.
    pub protected: Vec<SectionKey>,
    /// Removal order under duration pressure.
    pub droppable: Vec<SectionKey>,
    /// Minimum trimmed length of a section text, in characters.
    pub min_chars: usize,
    /// Duration ceiling in seconds for the sum of section durations.
    pub ceiling_secs: f64,
}

impl Default for PlannerPolicy {
    fn default() -> Self {
        Self {
            priority: SectionKey::ORDERED.to_vec(),
            protected: SectionKey::PROTECTED.to_vec(),
            droppable: SectionKey::DROPPABLE.to_vec(),
            min_chars: 5,
            ceiling_secs: 58.0,
        }
    }
}

impl PlannerPolicy {
    /// Reject policies that could drop a protected section or never trim.
    pub fn validate(&self) -> ReelResult<()> {
        if let Some(k) = self.droppable.iter().find(|k| self.protected.contains(k)) {
            return Err(ReelError::validation(format!(
                "section '{k}' cannot be both protected and droppable"
            )));
        }
        if !self.ceiling_secs.is_finite() || self.ceiling_secs <= 0.0 {
            return Err(ReelError::validation("duration ceiling must be > 0"));
        }
        Ok(())
    }

    /// Same policy with a different ceiling.
    pub fn with_ceiling(mut self, ceiling_secs: f64) -> Self {
        self.ceiling_secs = ceiling_secs;
        self
    }
}

/// Section rejected before narration.
#[derive(Debug)]
pub struct Rejected {
    pub key: SectionKey,
    pub reason: ReelError,
}

/// Outcome of [`SectionPlanner::prefilter`].
#[derive(Debug, Default)]
pub struct Prefiltered {
    /// Sections to narrate, in narration order.
    pub sections: Vec<Section>,
    /// Known sections that were absent or too short.
    pub rejected: Vec<Rejected>,
}

/// Outcome of [`SectionPlanner::trim`].
#[derive(Debug)]
pub struct Trimmed<T> {
    /// Surviving items in their original order.
    pub kept: Vec<T>,
    /// Removed items in removal order.
    pub dropped: Vec<T>,
    pub total_before_secs: f64,
    pub total_after_secs: f64,
}

impl<T> Trimmed<T> {
    /// `false` when the droppable list ran out before the ceiling was met.
    pub fn within(&self, ceiling_secs: f64) -> bool {
        self.total_after_secs <= ceiling_secs
    }
}

/// Decides which sections are narrated and which survive duration pressure.
#[derive(Clone, Debug, Default)]
pub struct SectionPlanner {
    policy: PlannerPolicy,
}

impl SectionPlanner {
    /// Planner over a validated policy.
    pub fn new(policy: PlannerPolicy) -> ReelResult<Self> {
        policy.validate()?;
        Ok(Self { policy })
    }

    /// The active policy.
    pub fn policy(&self) -> &PlannerPolicy {
        &self.policy
    }

    /// Order known sections by priority, then append unknown keys in encounter order.
    /// Missing, empty and too-short texts are rejected.
    #[tracing::instrument(skip_all, fields(entries = script.entries().count()))]
    pub fn prefilter(&self, script: &Script, normalizer: &SpokenNormalizer) -> Prefiltered {
        let mut out = Prefiltered::default();

        for key in &self.policy.priority {
            match script.get(key.as_str()) {
                Some(text) => self.accept(key.clone(), text, normalizer, &mut out),
                None => out.rejected.push(Rejected {
                    key: key.clone(),
                    reason: ReelError::content_missing("section absent from script"),
                }),
            }
        }

        for (raw_key, text) in script.entries() {
            let key = SectionKey::parse(raw_key);
            if self.policy.priority.contains(&key) {
                continue;
            }
            if out.sections.iter().any(|s| s.key == key) {
                continue;
            }
            self.accept(key, text, normalizer, &mut out);
        }

        tracing::info!(
            kept = out.sections.len(),
            rejected = out.rejected.len(),
            "section prefilter complete"
        );
        out
    }

    fn accept(
        &self,
        key: SectionKey,
        text: &str,
        normalizer: &SpokenNormalizer,
        out: &mut Prefiltered,
    ) {
        let display = text.trim();
        let len = display.chars().count();
        if len < self.policy.min_chars {
            tracing::debug!(section = %key, len, "section too short");
            out.rejected.push(Rejected {
                key,
                reason: ReelError::content_missing(format!(
                    "text has {len} chars, minimum is {}",
                    self.policy.min_chars
                )),
            });
            return;
        }
        let spoken = normalizer.normalize(display);
        if spoken.is_empty() {
            out.rejected.push(Rejected {
                key,
                reason: ReelError::content_missing("nothing left to narrate after normalization"),
            });
            return;
        }
        out.sections.push(Section {
            key,
            spoken_text: spoken,
            display_text: display.to_string(),
        });
    }

    /// Greedy duration trim.
    ///
    /// While the total exceeds the ceiling, remove the next droppable section present, in
    /// the policy's fixed order. Protected sections are never removed; if the droppable list
    /// is exhausted the remainder is returned over budget.
    pub fn trim<T: Timed>(&self, items: Vec<T>) -> Trimmed<T> {
        let ceiling = self.policy.ceiling_secs;
        let mut kept = items;
        let mut dropped = Vec::new();
        let total_before = total_secs(&kept);
        let mut total = total_before;

        for key in &self.policy.droppable {
            if total <= ceiling {
                break;
            }
            if self.policy.protected.contains(key) {
                continue;
            }
            if let Some(pos) = kept.iter().position(|t| t.key() == key) {
                let removed = kept.remove(pos);
                tracing::info!(
                    section = %key,
                    secs = removed.duration_secs(),
                    "dropping section for duration budget"
                );
                dropped.push(removed);
                total = total_secs(&kept);
            }
        }

        if total > ceiling {
            tracing::warn!(
                total_secs = total,
                ceiling_secs = ceiling,
                "droppable sections exhausted; continuing over budget"
            );
        }

        Trimmed {
            kept,
            dropped,
            total_before_secs: total_before,
            total_after_secs: total,
        }
    }
}

fn total_secs<T: Timed>(items: &[T]) -> f64 {
    items.iter().map(Timed::duration_secs).sum()
}

#[cfg(test)]
#[path = "../../tests/unit/plan/planner.rs"]
mod tests;
