//! Plugin hooks (spec.md §9): the one truly open extension point. A closed
//! enum doesn't fit here, unlike onset methods or selection strategies, so
//! plugins are a `dyn` trait object the orchestrator borrows for a parse.

use crate::error::Result;
use crate::types::BeatCandidate;

/// A pipeline plugin. Both capabilities default to a no-op passthrough, so
/// a plugin implements only the hook(s) it needs.
pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;

    fn version(&self) -> &str {
        "0.1.0"
    }

    /// Initialize once, before the first parse. Failure fails the whole
    /// instance (spec.md §9: "do not support partial initialization").
    fn initialize(&mut self) -> Result<()> {
        Ok(())
    }

    /// Transform the raw sample stream before onset/tempo analysis.
    fn transform_audio(&self, samples: Vec<f32>) -> Result<Vec<f32>> {
        Ok(samples)
    }

    /// Transform the merged candidate list before selection.
    fn transform_candidates(&self, candidates: Vec<BeatCandidate>) -> Result<Vec<BeatCandidate>> {
        Ok(candidates)
    }

    /// Run once at instance teardown.
    fn finalize(&mut self) -> Result<()> {
        Ok(())
    }
}
