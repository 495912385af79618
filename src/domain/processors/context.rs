//! Per-run processor state.

use std::collections::BTreeSet;

use tracing::debug;

use crate::domain::Directive;

/// State shared by every processor during one pipeline run.
#[derive(Debug, Clone, Default)]
pub struct GenerationContext {
    /// Bridge tag patterns referenced by this namespace, sorted for stable output
    referenced_bridges: BTreeSet<String>,
}

impl GenerationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a bridge pattern. Returns false if it was already referenced.
    pub fn reference_bridge(&mut self, bridge: impl Into<String>) -> bool {
        self.referenced_bridges.insert(bridge.into())
    }

    pub fn referenced_bridges(&self) -> impl Iterator<Item = &str> {
        self.referenced_bridges.iter().map(String::as_str)
    }

    /// Append every referenced bridge to a `<match>` tag so the directive also
    /// receives shared traffic. Bridges already in the tag are not repeated.
    pub fn augment_tag(&self, directive: &mut Directive) {
        if directive.name != "match" || self.referenced_bridges.is_empty() {
            return;
        }

        let missing: Vec<&str> = self
            .referenced_bridges
            .iter()
            .map(String::as_str)
            .filter(|bridge| !directive.tags().any(|t| t == *bridge))
            .collect();
        if missing.is_empty() {
            return;
        }

        debug!(tag = %directive.tag, bridges = ?missing, "Augmenting tag with bridges");
        for bridge in missing {
            directive.tag.push(' ');
            directive.tag.push_str(bridge);
        }
    }
}

/// Context handed to every processor for one fragment of one namespace.
#[derive(Debug, Clone)]
pub struct ProcessorContext {
    /// Namespace whose fragment is being rewritten
    pub namespace: String,

    /// Only allow `match` and `filter` at top level
    pub strict: bool,

    pub generation: GenerationContext,
}

impl ProcessorContext {
    pub fn new(namespace: impl Into<String>, strict: bool) -> Self {
        Self {
            namespace: namespace.into(),
            strict,
            generation: GenerationContext::new(),
        }
    }

    /// The `kube.<namespace>` prefix, without trailing dot.
    pub fn namespace_prefix(&self) -> String {
        format!("kube.{}", self.namespace)
    }
}
