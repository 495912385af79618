//! Fragment rewriting service.

use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, error, info};

use crate::cli::Format;
use crate::config::{self, Config};
use crate::domain::{Fragment, Pipeline, ProcessorContext};
use crate::service::adapter::FormatAdapter;

/// Service for rewriting one namespace fragment.
pub struct RewriteService {
    config: Config,
    pipeline: Pipeline,
    input: FormatAdapter,
    output: FormatAdapter,
}

impl RewriteService {
    /// Create a new RewriteService with the specified formats.
    pub fn new(config: Config, input_format: Format, output_format: Format) -> Result<Self> {
        let pipeline = Pipeline::new(&config).context("Failed to build rewrite pipeline")?;
        Ok(Self {
            config,
            pipeline,
            input: FormatAdapter::new(input_format),
            output: FormatAdapter::new(output_format),
        })
    }

    /// Read the fragment from `input` (stdin when `None`), rewrite it and
    /// print the result to stdout.
    pub fn run(&self, namespace: &str, strict: bool, input: Option<&Path>) -> Result<()> {
        let source = match input {
            Some(path) => fs::read_to_string(path)
                .with_context(|| format!("Failed to read fragment: {}", path.display()))?,
            None => {
                let mut buf = String::new();
                io::stdin()
                    .lock()
                    .read_to_string(&mut buf)
                    .context("Failed to read fragment from stdin")?;
                buf
            }
        };

        let fragment = self.rewrite(namespace, strict, &source)?;

        let rendered = self.output.format_output(&fragment)?;
        let mut stdout = io::stdout().lock();
        write!(stdout, "{}", rendered)?;
        if !rendered.is_empty() && !rendered.ends_with('\n') {
            writeln!(stdout)?;
        }

        Ok(())
    }

    /// Parse `source` and run the pipeline on it for `namespace`.
    pub fn rewrite(&self, namespace: &str, strict: bool, source: &str) -> Result<Fragment> {
        config::validate_namespace(namespace)?;

        let fragment = self.input.parse_input(source)?;
        let strict = strict || self.config.strict;
        debug!(
            namespace,
            strict,
            processors = ?self.pipeline.names(),
            directives = fragment.len(),
            "Rewriting fragment"
        );

        let mut ctx = ProcessorContext::new(namespace, strict);
        let result = self
            .pipeline
            .run(fragment, &mut ctx)
            .map_err(|e| {
                error!(namespace, error = %e, "Rewrite failed");
                e
            })
            .with_context(|| format!("Failed to rewrite fragment of namespace '{}'", namespace))?;

        info!(
            namespace,
            directives = result.len(),
            bridges = ctx.generation.referenced_bridges().count(),
            "Fragment rewritten"
        );
        Ok(result)
    }
}
