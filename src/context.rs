use std::path::{Path, PathBuf};

use anyhow::Context as _;
use rand::{SeedableRng, rngs::StdRng};

use crate::{
    config::RunConfig,
    foundation::{error::ReelResult, math::Fnv1a64},
    narration::{
        adapter::NarratorChain,
        narrator::{CommandNarrator, Narrator},
        provider::ProviderChain,
    },
};

/// Per-run scratch directory, removed on drop unless kept.
#[derive(Debug)]
pub struct ScratchDir {
    path: PathBuf,
    keep: bool,
}

impl ScratchDir {
    pub fn create(path: PathBuf, keep: bool) -> ReelResult<Self> {
        std::fs::create_dir_all(&path)
            .with_context(|| format!("create scratch dir '{}'", path.display()))?;
        Ok(Self { path, keep })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Subdirectory of the scratch area, created on demand.
    pub fn subdir(&self, name: &str) -> ReelResult<PathBuf> {
        let dir = self.path.join(name);
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("create scratch subdir '{}'", dir.display()))?;
        Ok(dir)
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if self.keep {
            tracing::info!(path = %self.path.display(), "keeping scratch dir");
            return;
        }
        if let Err(e) = std::fs::remove_dir_all(&self.path) {
            tracing::debug!(path = %self.path.display(), error = %e, "scratch cleanup failed");
        }
    }
}

/// State owned by one pipeline run: identity, scratch space, narrator chain, randomness.
///
/// Nothing here is shared between runs, so two runs in one process never observe
/// each other's provider switches or scratch files.
pub struct RunContext {
    run_id: String,
    scratch: ScratchDir,
    pub chain: NarratorChain,
    pub rng: StdRng,
}

impl RunContext {
    /// Context whose narrators are the configured commands.
    pub fn from_config(config: &RunConfig, category: &str) -> ReelResult<Self> {
        let narrators = config
            .narrators
            .iter()
            .cloned()
            .map(|cmd| Box::new(CommandNarrator::new(cmd)) as Box<dyn Narrator>)
            .collect();
        Self::with_narrators(config, category, narrators)
    }

    /// Context with injected narrators, tried in order.
    pub fn with_narrators(
        config: &RunConfig,
        category: &str,
        narrators: Vec<Box<dyn Narrator>>,
    ) -> ReelResult<Self> {
        let run_id = new_run_id(category);
        let root = config
            .scratch_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
            .join(format!("reelwright_{run_id}"));
        let scratch = ScratchDir::create(root, config.keep_scratch)?;
        let seed = config.seed.unwrap_or_else(|| seed_from_run_id(&run_id));
        tracing::debug!(run_id = %run_id, seed, scratch = %scratch.path().display(), "run context");
        Ok(Self {
            run_id,
            scratch,
            chain: ProviderChain::new(narrators),
            rng: StdRng::seed_from_u64(seed),
        })
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn scratch(&self) -> &ScratchDir {
        &self.scratch
    }
}

fn new_run_id(category: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let mut h = Fnv1a64::new_default();
    h.write_u64(u64::from(std::process::id()));
    h.write_bytes(&nanos.to_le_bytes());
    h.write_str(category);
    format!("{:016x}", h.finish())
}

fn seed_from_run_id(run_id: &str) -> u64 {
    u64::from_str_radix(run_id, 16).unwrap_or(Fnv1a64::OFFSET_BASIS)
}

#[cfg(test)]
#[path = "../tests/unit/context.rs"]
mod tests;
