//! Detect-exceptions filter rewrite.
//!
//! `detect_exceptions` is an output plugin in fluentd, but users write it as a
//! `<filter>`. Each such filter becomes a pair of matches:
//!
//! ```text
//! <match SEL>                        @type rewrite_tag_filter
//!   every record -> PREFIX.detexc.${tag}
//! <match PREFIX.detexc.SEL>          @type detect_exceptions
//!   remove_tag_prefix PREFIX         -> detexc.${tag}
//! ```
//!
//! and every namespace match is widened with a `detexc.` twin of its tag so that
//! records coming out of the detector continue down the original route.

use tracing::{debug, info};

use super::{Processor, ProcessorContext};
use crate::domain::naming::hash;
use crate::domain::processors::walker::{apply_recursively_in_place, transform, Rewrite};
use crate::domain::{Directive, Fragment, RewriteError};

/// Purpose key: hash owner and tag infix for this rewrite.
const KEY_DETEXC: &str = "detexc";

const DETECT_EXCEPTIONS_TYPE: &str = "detect_exceptions";
const REWRITE_TAG_FILTER_TYPE: &str = "rewrite_tag_filter";

/// Tuning parameters copied from the user's filter when set.
const COPIED_PARAMS: &[&str] = &[
    "languages",
    "multiline_flush_interval",
    "max_lines",
    "max_bytes",
    "message",
];

/// Replaces `<filter>` directives of type `detect_exceptions`.
pub struct DetectExceptionsProcessor;

/// Hash-derived prefix unique to a filter's full tag.
pub fn make_tag_prefix(tag: &str) -> String {
    hash(KEY_DETEXC, tag)
}

fn is_target(directive: &Directive) -> bool {
    directive.name == "filter" && directive.directive_type() == DETECT_EXCEPTIONS_TYPE
}

fn copy_param(name: &str, src: &Directive, dest: &mut Directive) {
    if let Some(value) = src.param(name).filter(|v| !v.is_empty()) {
        dest.set_param(name, value);
    }
}

/// The re-tag and detect directives replacing one filter.
fn expand(filter: &Directive) -> Vec<Directive> {
    let tag_prefix = make_tag_prefix(&filter.tag);

    let mut rule = Directive::new("rule", "");
    rule.set_param("key", "_dummy");
    rule.set_param("pattern", "/ZZ/");
    rule.set_param("invert", "true");
    rule.set_param("tag", format!("{}.{}.${{tag}}", tag_prefix, KEY_DETEXC));

    let mut rewrite_tag = Directive::typed("match", filter.tag.as_str(), REWRITE_TAG_FILTER_TYPE);
    rewrite_tag.nested.push(rule);

    let detect_tag = if filter.tags().next().is_none() {
        format!("{}.{}.", tag_prefix, KEY_DETEXC)
    } else {
        filter
            .tags()
            .map(|t| format!("{}.{}.{}", tag_prefix, KEY_DETEXC, t))
            .collect::<Vec<_>>()
            .join(" ")
    };
    let mut detect = Directive::typed("match", detect_tag, DETECT_EXCEPTIONS_TYPE);
    detect.set_param("stream", "container_info");
    detect.set_param("remove_tag_prefix", tag_prefix.as_str());

    for name in COPIED_PARAMS {
        copy_param(name, filter, &mut detect);
    }

    debug!(selector = %filter.tag, prefix = %tag_prefix, "Expanded detect_exceptions filter");
    vec![rewrite_tag, detect]
}

/// Append a `detexc.` twin of every pattern to namespace routing directives.
fn augment_tag(directive: &mut Directive, ctx: &mut ProcessorContext) -> Result<(), RewriteError> {
    let prefix = format!("{}.", ctx.namespace_prefix());
    if !directive.tag.starts_with(&prefix) || directive.directive_type() == REWRITE_TAG_FILTER_TYPE {
        return Ok(());
    }

    let twins: Vec<String> = directive
        .tags()
        .map(|t| format!("{}.{}", KEY_DETEXC, t))
        .collect();
    for twin in twins {
        directive.tag.push(' ');
        directive.tag.push_str(&twin);
    }
    Ok(())
}

impl Processor for DetectExceptionsProcessor {
    fn name(&self) -> &'static str {
        "detect-exceptions"
    }

    fn process(
        &self,
        fragment: Fragment,
        ctx: &mut ProcessorContext,
    ) -> Result<Fragment, RewriteError> {
        let mut rewrites = 0usize;
        let mut result = transform(&fragment, &mut |d| {
            if is_target(d) {
                rewrites += 1;
                Rewrite::Replace(expand(d))
            } else {
                Rewrite::Keep
            }
        });

        if rewrites > 0 {
            info!(namespace = %ctx.namespace, count = rewrites, "Rewrote detect_exceptions filters");
            apply_recursively_in_place(&mut result, ctx, &mut augment_tag)?;
        }

        Ok(result)
    }
}
