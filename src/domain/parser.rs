//! Directive language parser.
//!
//! Line-oriented reader for the subset of the fluentd configuration syntax the
//! operator produces: `<name tag>` blocks, `</name>` terminators, `key value`
//! parameters, and `#` comments.

use regex::Regex;

use super::directive::{Directive, Fragment};
use super::error::RewriteError;

/// Parser for directive source text.
pub struct ConfigParser {
    open: Regex,
    close: Regex,
    param: Regex,
}

impl ConfigParser {
    /// Create a new ConfigParser.
    pub fn new() -> Result<Self, RewriteError> {
        Ok(Self {
            open: Regex::new(r"^<([A-Za-z_@][\w.-]*)(?:\s+(.*?))?\s*>$")?,
            close: Regex::new(r"^</([A-Za-z_@][\w.-]*)\s*>$")?,
            param: Regex::new(r"^(\S+)(?:\s+(.*))?$")?,
        })
    }

    /// Parse a complete fragment from source text.
    pub fn parse(&self, source: &str) -> Result<Fragment, RewriteError> {
        let mut root = Fragment::new();
        // Open blocks, innermost last, with the line they were opened on
        let mut stack: Vec<(Directive, usize)> = Vec::new();

        for (index, raw) in source.lines().enumerate() {
            let line_no = index + 1;
            let line = trim_trailing_comment(raw);
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if line.starts_with("</") {
                let caps = self.close.captures(line).ok_or_else(|| RewriteError::Parse {
                    line: line_no,
                    message: format!("malformed closing tag: {}", line),
                })?;
                let name = &caps[1];

                let (directive, _) = stack.pop().ok_or_else(|| RewriteError::Parse {
                    line: line_no,
                    message: format!("unexpected </{}> with no open block", name),
                })?;
                if directive.name != name {
                    return Err(RewriteError::Parse {
                        line: line_no,
                        message: format!("expected </{}> but found </{}>", directive.name, name),
                    });
                }

                match stack.last_mut() {
                    Some((parent, _)) => parent.nested.push(directive),
                    None => root.push(directive),
                }
                continue;
            }

            if line.starts_with('<') {
                let caps = self.open.captures(line).ok_or_else(|| RewriteError::Parse {
                    line: line_no,
                    message: format!("malformed block: {}", line),
                })?;
                let tag = caps.get(2).map(|m| m.as_str().trim()).unwrap_or("");
                stack.push((Directive::new(&caps[1], tag), line_no));
                continue;
            }

            let Some((current, _)) = stack.last_mut() else {
                return Err(RewriteError::Parse {
                    line: line_no,
                    message: format!("parameter outside of a block: {}", line),
                });
            };
            // A trimmed non-empty line always matches `^(\S+)`
            if let Some(caps) = self.param.captures(line) {
                let value = caps.get(2).map(|m| m.as_str().trim()).unwrap_or("");
                current.set_param(&caps[1], value);
            }
        }

        if let Some((directive, opened_at)) = stack.pop() {
            return Err(RewriteError::Parse {
                line: opened_at,
                message: format!("<{}> is never closed", directive.name),
            });
        }

        Ok(root)
    }
}

/// Strip a trailing ` # comment` and surrounding whitespace.
///
/// `#{` is kept since it starts a Ruby interpolation inside a value.
fn trim_trailing_comment(line: &str) -> &str {
    let bytes = line.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if b == b'#'
            && i > 0
            && bytes[i - 1].is_ascii_whitespace()
            && bytes.get(i + 1) != Some(&b'{')
        {
            return line[..i].trim();
        }
    }
    line.trim()
}
