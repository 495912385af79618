//! Plugin type allow-list.

use std::collections::BTreeSet;

use tracing::warn;

use super::{Processor, ProcessorContext};
use crate::domain::processors::walker::visit_recursively;
use crate::domain::{Fragment, RewriteError};

/// Rejects user-written directives whose `@type` is not explicitly allowed.
///
/// An empty list allows every type.
pub struct TypeAllowListProcessor {
    allowed: BTreeSet<String>,
}

impl TypeAllowListProcessor {
    pub fn new(allowed: impl IntoIterator<Item = String>) -> Self {
        Self {
            allowed: allowed.into_iter().filter(|t| !t.is_empty()).collect(),
        }
    }

    pub fn is_allowed(&self, kind: &str) -> bool {
        self.allowed.is_empty() || self.allowed.contains(kind)
    }
}

impl Processor for TypeAllowListProcessor {
    fn name(&self) -> &'static str {
        "allow-list"
    }

    fn prepare(&self, fragment: &Fragment, _ctx: &mut ProcessorContext) -> Result<(), RewriteError> {
        visit_recursively(fragment, &mut (), &mut |d, _: &mut ()| {
            let kind = d.directive_type();
            if !kind.is_empty() && !self.is_allowed(kind) {
                warn!(directive = %d.name, kind = %kind, "Plugin type not allowed");
                return Err(RewriteError::TypeNotAllowed {
                    name: d.name.clone(),
                    kind: kind.to_string(),
                });
            }
            Ok(())
        })
    }

    fn process(
        &self,
        fragment: Fragment,
        _ctx: &mut ProcessorContext,
    ) -> Result<Fragment, RewriteError> {
        Ok(fragment)
    }
}
