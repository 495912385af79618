//! Processor trait definition.

use super::ProcessorContext;
use crate::domain::{Fragment, RewriteError};

/// A rewrite stage of the pipeline.
pub trait Processor: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Read-only analysis of the original fragment, run before any processing.
    ///
    /// May record bookkeeping in the context but must not rewrite the tree.
    fn prepare(&self, _fragment: &Fragment, _ctx: &mut ProcessorContext) -> Result<(), RewriteError> {
        Ok(())
    }

    /// Rewrite the fragment, returning the input mutated in place or a new fragment.
    fn process(
        &self,
        fragment: Fragment,
        ctx: &mut ProcessorContext,
    ) -> Result<Fragment, RewriteError>;
}
