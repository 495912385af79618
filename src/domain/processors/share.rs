//! `$from(<namespace>)` macro: consume logs shared by another namespace.
//!
//! Shared records reach this namespace on a bridge tag derived from the producer
//! and consumer namespaces. Prepare records every bridge so that `$thisns`
//! expansion can widen catch-all matches to include them.

use regex::Regex;
use tracing::debug;

use super::{Processor, ProcessorContext};
use crate::domain::naming::hash;
use crate::domain::processors::walker::{apply_recursively_in_place, visit_recursively};
use crate::domain::{Directive, Fragment, RewriteError};

/// Share macro token.
pub const MACRO_FROM: &str = "$from";

/// Hash owner for bridge names.
const KEY_SHARE: &str = "share";

/// RFC 1123 label, the syntax of a namespace name.
const NAMESPACE_PATTERN: &str = r"^[a-z0-9]([-a-z0-9]{0,61}[a-z0-9])?$";

/// Resolves `$from(...)` tags to bridge patterns.
pub struct ShareProcessor {
    namespace_re: Regex,
}

/// Tag pattern on which `producer` delivers records shared with `consumer`.
pub fn bridge_pattern(producer: &str, consumer: &str) -> String {
    format!("bridge.{}.**", hash(KEY_SHARE, &format!("{}/{}", producer, consumer)))
}

impl ShareProcessor {
    /// Create a new ShareProcessor.
    pub fn new() -> Result<Self, RewriteError> {
        Ok(Self {
            namespace_re: Regex::new(NAMESPACE_PATTERN)?,
        })
    }

    /// Extract the producer namespace from `$from(<ns>)`.
    fn parse_producer(&self, tag: &str, consumer: &str) -> Result<String, RewriteError> {
        let bad = |reason: String| RewriteError::BadMacro {
            tag: tag.to_string(),
            reason,
        };

        let producer = tag
            .strip_prefix(MACRO_FROM)
            .and_then(|s| s.strip_prefix('('))
            .and_then(|s| s.strip_suffix(')'))
            .map(str::trim)
            .ok_or_else(|| bad("expected $from(namespace)".to_string()))?;

        if !self.namespace_re.is_match(producer) {
            return Err(bad(format!("'{}' is not a valid namespace name", producer)));
        }
        if producer == consumer {
            return Err(bad("a namespace cannot share with itself".to_string()));
        }

        Ok(producer.to_string())
    }
}

fn uses_share(directive: &Directive) -> bool {
    directive.is_routing() && directive.tag.starts_with(MACRO_FROM)
}

impl Processor for ShareProcessor {
    fn name(&self) -> &'static str {
        "share"
    }

    fn prepare(&self, fragment: &Fragment, ctx: &mut ProcessorContext) -> Result<(), RewriteError> {
        visit_recursively(fragment, ctx, &mut |d, ctx: &mut ProcessorContext| {
            if uses_share(d) {
                let producer = self.parse_producer(&d.tag, &ctx.namespace)?;
                let bridge = bridge_pattern(&producer, &ctx.namespace);
                if ctx.generation.reference_bridge(bridge.clone()) {
                    debug!(producer = %producer, bridge = %bridge, "Referenced bridge");
                }
            }
            Ok::<(), RewriteError>(())
        })
    }

    fn process(
        &self,
        mut fragment: Fragment,
        ctx: &mut ProcessorContext,
    ) -> Result<Fragment, RewriteError> {
        apply_recursively_in_place(&mut fragment, ctx, &mut |d, ctx: &mut ProcessorContext| {
            if uses_share(d) {
                let producer = self.parse_producer(&d.tag, &ctx.namespace)?;
                d.tag = bridge_pattern(&producer, &ctx.namespace);
            }
            Ok::<(), RewriteError>(())
        })?;
        Ok(fragment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::parser::ConfigParser;
    use crate::domain::processors::pipeline::{run_prepare, run_process};
    use crate::domain::processors::ExpandThisnsProcessor;

    const SOURCE: &str = "\
<filter $from(payments)>
  @type grep
</filter>
<match **>
  @type elasticsearch
</match>
";

    #[test]
    fn test_bridge_is_stable_and_directional() {
        assert_eq!(bridge_pattern("a", "b"), bridge_pattern("a", "b"));
        assert_ne!(bridge_pattern("a", "b"), bridge_pattern("b", "a"));
        assert!(bridge_pattern("a", "b").starts_with("bridge."));
        assert!(bridge_pattern("a", "b").ends_with(".**"));
    }

    #[test]
    fn test_prepare_records_bridges_without_rewriting() {
        let fragment = ConfigParser::new().unwrap().parse(SOURCE).unwrap();
        let mut ctx = ProcessorContext::new("shop", false);

        ShareProcessor::new().unwrap().prepare(&fragment, &mut ctx).unwrap();

        assert_eq!(fragment[0].tag, "$from(payments)");
        let bridges: Vec<&str> = ctx.generation.referenced_bridges().collect();
        assert_eq!(bridges, vec![bridge_pattern("payments", "shop").as_str()]);
    }

    #[test]
    fn test_share_with_thisns() {
        let fragment = ConfigParser::new().unwrap().parse(SOURCE).unwrap();
        let mut ctx = ProcessorContext::new("shop", false);
        let processors: Vec<Box<dyn Processor>> =
            vec![Box::new(ExpandThisnsProcessor), Box::new(ShareProcessor::new().unwrap())];

        run_prepare(&fragment, &mut ctx, &processors).unwrap();
        let out = run_process(fragment, &mut ctx, &processors).unwrap();

        let bridge = bridge_pattern("payments", "shop");
        assert_eq!(out[0].tag, bridge);
        assert_eq!(out[1].tag, format!("kube.shop.** {}", bridge));
    }

    #[test]
    fn test_invalid_producer() {
        let share = ShareProcessor::new().unwrap();
        let mut ctx = ProcessorContext::new("shop", false);
        for source in [
            "<match $from(Bad_Name)>\n</match>",
            "<match $from(shop)>\n</match>",
            "<match $from()>\n</match>",
            "<match $from>\n</match>",
        ] {
            let fragment = ConfigParser::new().unwrap().parse(source).unwrap();
            let err = share.prepare(&fragment, &mut ctx).unwrap_err();
            assert!(matches!(err, RewriteError::BadMacro { .. }), "{}: {}", source, err);
        }
    }

    #[test]
    fn test_one_instance_resolves_many_producers() {
        let share = ShareProcessor::new().unwrap();
        let fragment = ConfigParser::new()
            .unwrap()
            .parse("<match $from(payments)>\n</match>\n<match $from(billing)>\n</match>\n")
            .unwrap();
        let mut ctx = ProcessorContext::new("shop", false);

        share.prepare(&fragment, &mut ctx).unwrap();
        let out = share.process(fragment, &mut ctx).unwrap();

        assert_eq!(out[0].tag, bridge_pattern("payments", "shop"));
        assert_eq!(out[1].tag, bridge_pattern("billing", "shop"));
    }
}
