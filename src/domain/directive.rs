//! Directive tree model.
//!
//! A configuration fragment is an ordered forest of [`Directive`] nodes. Each node
//! carries a block name, an optional routing tag, ordered parameters and nested
//! children. All data is owned, so `clone()` is a deep copy.

use std::fmt;
use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

/// Reserved parameter holding the plugin type.
pub const PARAM_TYPE: &str = "@type";

/// Indentation used per nesting level when rendering.
const INDENT: &str = "  ";

/// A single `key value` parameter line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub value: String,
}

/// Ordered parameter map.
///
/// New keys keep their insertion order; setting an existing key overwrites it in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params(Vec<Param>);

impl Params {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Build params from key/value pairs, in order.
    pub fn from_kv(pairs: &[(&str, &str)]) -> Self {
        let mut params = Self::new();
        for (name, value) in pairs {
            params.set(*name, *value);
        }
        params
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|p| p.name == name) {
            Some(existing) => existing.value = value,
            None => self.0.push(Param { name, value }),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Param> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One configuration block, e.g. `<match kube.ns.**> ... </match>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directive {
    /// Block keyword: "match", "filter", "buffer", ...
    pub name: String,

    /// Routing label, possibly several space-separated patterns
    #[serde(default)]
    pub tag: String,

    #[serde(default)]
    pub params: Params,

    #[serde(default)]
    pub nested: Fragment,
}

impl Directive {
    /// Create a directive with the given name and tag and no content.
    pub fn new(name: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tag: tag.into(),
            ..Default::default()
        }
    }

    /// Create a directive with a plugin type.
    pub fn typed(name: impl Into<String>, tag: impl Into<String>, kind: &str) -> Self {
        Self {
            params: Params::from_kv(&[(PARAM_TYPE, kind)]),
            ..Self::new(name, tag)
        }
    }

    /// Value of the `@type` parameter, or "" if absent.
    pub fn directive_type(&self) -> &str {
        self.param(PARAM_TYPE).unwrap_or("")
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    pub fn set_param(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.params.set(name, value);
    }

    /// Iterate over the space-separated patterns of the tag.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.tag.split_whitespace()
    }

    /// Whether this is a `<match>` or `<filter>` block.
    pub fn is_routing(&self) -> bool {
        self.name == "match" || self.name == "filter"
    }

    /// Copy of this directive's header and params with the given children.
    pub fn with_nested(&self, nested: Fragment) -> Self {
        Self {
            name: self.name.clone(),
            tag: self.tag.clone(),
            params: self.params.clone(),
            nested,
        }
    }

    fn write_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let pad = INDENT.repeat(depth);
        if self.tag.is_empty() {
            writeln!(f, "{}<{}>", pad, self.name)?;
        } else {
            writeln!(f, "{}<{} {}>", pad, self.name, self.tag)?;
        }

        for param in self.params.iter() {
            if param.value.is_empty() {
                writeln!(f, "{}{}{}", pad, INDENT, param.name)?;
            } else {
                writeln!(f, "{}{}{} {}", pad, INDENT, param.name, param.value)?;
            }
        }

        for child in self.nested.iter() {
            child.write_indented(f, depth + 1)?;
        }

        writeln!(f, "{}</{}>", pad, self.name)
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_indented(f, 0)
    }
}

/// Ordered sequence of directives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fragment(Vec<Directive>);

impl Fragment {
    pub fn new() -> Self {
        Self(Vec::new())
    }
}

impl Deref for Fragment {
    type Target = Vec<Directive>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Fragment {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<Vec<Directive>> for Fragment {
    fn from(directives: Vec<Directive>) -> Self {
        Self(directives)
    }
}

impl FromIterator<Directive> for Fragment {
    fn from_iter<I: IntoIterator<Item = Directive>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Fragment {
    type Item = Directive;
    type IntoIter = std::vec::IntoIter<Directive>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Fragment {
    type Item = &'a Directive;
    type IntoIter = std::slice::Iter<'a, Directive>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for directive in &self.0 {
            directive.write_indented(f, 0)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Directive {
        let mut buffer = Directive::typed("buffer", "", "file");
        buffer.set_param("path", "/var/log/buf");

        let mut d = Directive::typed("match", "kube.ns.**", "logzio");
        d.set_param("endpoint_url", "https://example.com");
        d.nested.push(buffer);
        d
    }

    #[test]
    fn test_type_derived_from_params() {
        let d = sample();
        assert_eq!(d.directive_type(), "logzio");
        assert_eq!(Directive::new("match", "**").directive_type(), "");
    }

    #[test]
    fn test_set_param_keeps_order_and_overwrites() {
        let mut d = Directive::new("filter", "a.b");
        d.set_param("first", "1");
        d.set_param("second", "2");
        d.set_param("first", "one");

        let names: Vec<&str> = d.params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second"]);
        assert_eq!(d.params.len(), 2);
        assert!(!d.params.is_empty());
        assert!(Params::new().is_empty());
        assert_eq!(d.param("first"), Some("one"));
        assert_eq!(d.param("missing"), None);
    }

    #[test]
    fn test_clone_is_independent() {
        let original = sample();
        let mut copy = original.clone();
        copy.tag = "changed".to_string();
        copy.nested[0].set_param("path", "/tmp/other");

        assert_eq!(original.tag, "kube.ns.**");
        assert_eq!(original.nested[0].param("path"), Some("/var/log/buf"));
    }

    #[test]
    fn test_render() {
        let rendered = sample().to_string();
        let expected = "\
<match kube.ns.**>
  @type logzio
  endpoint_url https://example.com
  <buffer>
    @type file
    path /var/log/buf
  </buffer>
</match>
";
        assert_eq!(rendered, expected);
    }

    #[test]
    fn test_render_empty_value_and_no_tag() {
        let mut d = Directive::new("system", "");
        d.set_param("suppress_config_dump", "");
        assert_eq!(d.to_string(), "<system>\n  suppress_config_dump\n</system>\n");
    }

    #[test]
    fn test_tags_split_on_whitespace() {
        let d = Directive::new("match", "a.** b.**  c");
        assert_eq!(d.tags().collect::<Vec<_>>(), vec!["a.**", "b.**", "c"]);
    }

    #[test]
    fn test_json_shape() {
        let fragment: Fragment = vec![Directive::typed("match", "**", "null")].into();
        let json = serde_json::to_value(&fragment).unwrap();
        assert_eq!(json[0]["name"], "match");
        assert_eq!(json[0]["params"][0]["name"], "@type");

        let back: Fragment = serde_json::from_value(json).unwrap();
        assert_eq!(back, fragment);
    }
}
