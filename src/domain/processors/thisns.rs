//! `$thisns` macro expansion.
//!
//! Qualifies every `<match>`/`<filter>` tag with the `kube.<namespace>.` prefix.

use tracing::debug;

use super::{Processor, ProcessorContext, MACRO_FROM, MACRO_LABELS, MACRO_UNIQUE_TAG};
use crate::domain::processors::walker::apply_recursively_in_place;
use crate::domain::{Directive, Fragment, RewriteError};

/// Self-namespace macro token.
pub const MACRO_THISNS: &str = "$thisns";

/// Top-level directive names permitted in strict mode.
const STRICT_ALLOWED: &[&str] = &["match", "filter"];

/// Expands `$thisns` and `**` into the fully-qualified namespace prefix.
pub struct ExpandThisnsProcessor;

impl ExpandThisnsProcessor {
    fn expand(directive: &mut Directive, ctx: &mut ProcessorContext) -> Result<(), RewriteError> {
        if !directive.is_routing() {
            return Ok(());
        }

        let good_prefix = ctx.namespace_prefix();

        if directive.tag == "**" || directive.tag == MACRO_THISNS {
            directive.tag = format!("{}.**", good_prefix);
            ctx.generation.augment_tag(directive);
            return Ok(());
        }

        if [MACRO_LABELS, MACRO_UNIQUE_TAG, MACRO_FROM]
            .iter()
            .any(|m| directive.tag.starts_with(m))
        {
            return Ok(());
        }

        // tags rooted at the macro also receive bridges
        let rooted = directive.tag.starts_with(&format!("{}.", MACRO_THISNS));

        let expanded = directive.tag.replace(MACRO_THISNS, &good_prefix);
        let qualified = format!("{}.", good_prefix);
        let in_namespace = !expanded.trim().is_empty()
            && expanded.split_whitespace().all(|t| t.starts_with(&qualified));
        if !in_namespace {
            return Err(RewriteError::BadTag {
                name: directive.name.clone(),
                tag: directive.tag.clone(),
                namespace: ctx.namespace.clone(),
            });
        }

        if expanded != directive.tag {
            debug!(from = %directive.tag, to = %expanded, "Substituted $thisns");
        }
        directive.tag = expanded;
        if rooted {
            ctx.generation.augment_tag(directive);
        }
        Ok(())
    }
}

impl Processor for ExpandThisnsProcessor {
    fn name(&self) -> &'static str {
        "expand-thisns"
    }

    fn process(
        &self,
        mut fragment: Fragment,
        ctx: &mut ProcessorContext,
    ) -> Result<Fragment, RewriteError> {
        // top level is checked here since the walker cannot tell depth
        if ctx.strict {
            if let Some(d) = fragment
                .iter()
                .find(|d| !STRICT_ALLOWED.contains(&d.name.as_str()))
            {
                return Err(RewriteError::StrictMode {
                    name: d.name.clone(),
                });
            }
        }

        apply_recursively_in_place(&mut fragment, ctx, &mut Self::expand)?;
        Ok(fragment)
    }
}
