//! `$labels(name=value, ...)` macro expansion.
//!
//! Pods are selected by label rather than by name. Records are re-tagged once per
//! namespace with the values of every label referenced in the fragment, so a
//! selector becomes an ordinary tag pattern:
//!
//! ```text
//! $labels(app=web)  ->  kube.<ns>.*.*._labels.web.*      (labels: app, tier)
//! ```

use std::collections::{BTreeMap, BTreeSet};

use regex::Regex;
use tracing::debug;

use super::{Processor, ProcessorContext};
use crate::domain::naming::make_safe_name;
use crate::domain::processors::walker::{apply_recursively_in_place, visit_recursively};
use crate::domain::{Directive, Fragment, RewriteError};

/// Label selector macro token.
pub const MACRO_LABELS: &str = "$labels";

/// Record field carrying the computed label values between generated directives.
const LABELS_FIELD: &str = "_labels";

/// Kubernetes label key syntax (optional DNS prefix).
const LABEL_NAME_PATTERN: &str = r"^([A-Za-z0-9][-A-Za-z0-9.]*/)?[A-Za-z0-9]([-A-Za-z0-9_.]*[A-Za-z0-9])?$";

/// Kubernetes label value syntax.
const LABEL_VALUE_PATTERN: &str = r"^[A-Za-z0-9]([-A-Za-z0-9_.]*[A-Za-z0-9])?$";

/// Expands `$labels(...)` selectors and prepends the re-tagging directives.
pub struct ExpandLabelsProcessor {
    name_re: Regex,
    value_re: Regex,
}

impl ExpandLabelsProcessor {
    /// Create a new ExpandLabelsProcessor.
    pub fn new() -> Result<Self, RewriteError> {
        Ok(Self {
            name_re: Regex::new(LABEL_NAME_PATTERN)?,
            value_re: Regex::new(LABEL_VALUE_PATTERN)?,
        })
    }

    /// Parse `$labels(a=b, c=d)` into a sorted name → value map.
    pub fn parse_selector(&self, tag: &str) -> Result<BTreeMap<String, String>, RewriteError> {
        let bad = |reason: String| RewriteError::BadMacro {
            tag: tag.to_string(),
            reason,
        };

        let inner = tag
            .strip_prefix(MACRO_LABELS)
            .map(str::trim_start)
            .and_then(|s| s.strip_prefix('('))
            .and_then(|s| s.trim_end().strip_suffix(')'))
            .ok_or_else(|| bad("expected $labels(name=value, ...)".to_string()))?;

        if inner.trim().is_empty() {
            return Err(bad("no labels given".to_string()));
        }

        let mut labels = BTreeMap::new();
        for entry in inner.split(',') {
            let (name, value) = entry
                .split_once('=')
                .map(|(n, v)| (n.trim(), v.trim()))
                .ok_or_else(|| bad(format!("'{}' is not name=value", entry.trim())))?;

            if !self.name_re.is_match(name) {
                return Err(bad(format!("invalid label name '{}'", name)));
            }
            if !self.value_re.is_match(value) {
                return Err(bad(format!("invalid value '{}' for label '{}'", value, name)));
            }
            if labels.insert(name.to_string(), value.to_string()).is_some() {
                return Err(bad(format!("label '{}' given more than once", name)));
            }
        }

        Ok(labels)
    }
}

/// Tag matching records whose labels satisfy `selector`.
///
/// `names` is the sorted list of every label referenced in the fragment; labels the
/// selector does not mention match anything.
fn make_tag(ns_prefix: &str, names: &BTreeSet<String>, selector: &BTreeMap<String, String>) -> String {
    let parts: Vec<String> = names
        .iter()
        .map(|name| match selector.get(name) {
            Some(value) => make_safe_name(value),
            None => "*".to_string(),
        })
        .collect();

    format!("{}.*.*.{}.{}", ns_prefix, LABELS_FIELD, parts.join("."))
}

/// The three directives that compute, route on, and then drop the label field.
fn retag_directives(ns_prefix: &str, names: &BTreeSet<String>) -> Vec<Directive> {
    let container_tag = format!("{}.*.*", ns_prefix);

    let value_expr = names
        .iter()
        .map(|name| {
            format!(
                "${{(record.dig('kubernetes', 'labels', '{}') || '_').to_s.gsub(/[^-_a-zA-Z0-9]/, '-')}}",
                name
            )
        })
        .collect::<Vec<_>>()
        .join(".");

    let mut record = Directive::new("record", "");
    record.set_param(LABELS_FIELD, value_expr);

    let mut compute = Directive::typed("filter", container_tag.as_str(), "record_transformer");
    compute.set_param("enable_ruby", "true");
    compute.nested.push(record);

    let mut rule = Directive::new("rule", "");
    rule.set_param("key", LABELS_FIELD);
    rule.set_param("pattern", "/^(.+)$/");
    rule.set_param("tag", format!("${{tag}}.{}.$1", LABELS_FIELD));

    let mut retag = Directive::typed("match", container_tag.as_str(), "rewrite_tag_filter");
    retag.nested.push(rule);

    let mut cleanup = Directive::typed(
        "filter",
        format!("{}.{}.**", container_tag, LABELS_FIELD),
        "record_transformer",
    );
    cleanup.set_param("remove_keys", LABELS_FIELD);

    vec![compute, retag, cleanup]
}

fn uses_labels(directive: &Directive) -> bool {
    directive.is_routing() && directive.tag.starts_with(MACRO_LABELS)
}

impl Processor for ExpandLabelsProcessor {
    fn name(&self) -> &'static str {
        "expand-labels"
    }

    fn process(
        &self,
        mut fragment: Fragment,
        ctx: &mut ProcessorContext,
    ) -> Result<Fragment, RewriteError> {
        let mut names = BTreeSet::new();
        visit_recursively(&fragment, &mut names, &mut |d, names: &mut BTreeSet<String>| {
            if uses_labels(d) {
                names.extend(self.parse_selector(&d.tag)?.into_keys());
            }
            Ok::<(), RewriteError>(())
        })?;

        if names.is_empty() {
            return Ok(fragment);
        }

        let ns_prefix = ctx.namespace_prefix();
        debug!(namespace = %ctx.namespace, labels = ?names, "Expanding $labels selectors");

        apply_recursively_in_place(&mut fragment, &mut (), &mut |d, _: &mut ()| {
            if uses_labels(d) {
                let selector = self.parse_selector(&d.tag)?;
                d.tag = make_tag(&ns_prefix, &names, &selector);
            }
            Ok::<(), RewriteError>(())
        })?;

        let mut output: Fragment = retag_directives(&ns_prefix, &names).into();
        output.extend(fragment);
        Ok(output)
    }
}
