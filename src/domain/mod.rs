//! Domain layer containing core rewriting logic.
//!
//! This module contains:
//! - Directive tree model and its text parser
//! - Tag hashing helpers
//! - Processor trait, pipeline, and the macro/rewrite processors
//! - Logger with rotation

mod directive;
mod error;
pub mod logger;
pub mod naming;
pub mod parser;
pub mod processors;

pub use directive::{Directive, Fragment};
pub use error::RewriteError;
pub use parser::ConfigParser;
pub use processors::{Pipeline, ProcessorContext};
