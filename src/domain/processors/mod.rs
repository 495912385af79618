//! Processor system for fragment rewriting.

mod allow_list;
mod context;
mod detect_exceptions;
mod labels;
mod pipeline;
mod processor_trait;
mod share;
mod thisns;
pub mod walker;

pub use allow_list::TypeAllowListProcessor;
pub use context::ProcessorContext;
pub use detect_exceptions::DetectExceptionsProcessor;
pub use labels::{ExpandLabelsProcessor, MACRO_LABELS};
pub use pipeline::Pipeline;
pub use processor_trait::Processor;
pub use share::{ShareProcessor, MACRO_FROM};
pub use thisns::ExpandThisnsProcessor;

/// Unique-tag macro, expanded downstream; `$thisns` leaves it alone.
pub const MACRO_UNIQUE_TAG: &str = "$tag";
