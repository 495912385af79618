//! Processor pipeline implementation.

use tracing::debug;

use crate::config::Config;
use crate::domain::{Fragment, RewriteError};

use super::{
    DetectExceptionsProcessor, ExpandLabelsProcessor, ExpandThisnsProcessor, Processor,
    ProcessorContext, ShareProcessor, TypeAllowListProcessor,
};

/// Run the prepare phase of every processor, in order, on the original fragment.
pub fn run_prepare(
    fragment: &Fragment,
    ctx: &mut ProcessorContext,
    processors: &[Box<dyn Processor>],
) -> Result<(), RewriteError> {
    for processor in processors {
        debug!(processor = processor.name(), namespace = %ctx.namespace, "Prepare");
        processor.prepare(fragment, ctx)?;
    }
    Ok(())
}

/// Run the process phase of every processor, feeding each output to the next.
pub fn run_process(
    fragment: Fragment,
    ctx: &mut ProcessorContext,
    processors: &[Box<dyn Processor>],
) -> Result<Fragment, RewriteError> {
    let mut current = fragment;
    for processor in processors {
        debug!(
            processor = processor.name(),
            namespace = %ctx.namespace,
            directives = current.len(),
            "Process"
        );
        current = processor.process(current, ctx)?;
    }
    Ok(current)
}

/// Ordered list of processors applied to every fragment.
pub struct Pipeline {
    processors: Vec<Box<dyn Processor>>,
}

impl Pipeline {
    /// Create a new Pipeline from configuration.
    ///
    /// Order matters: the allow-list checks user-written types before anything is
    /// generated, and `$thisns` runs before rewrites that need qualified tags.
    pub fn new(config: &Config) -> Result<Self, RewriteError> {
        let mut processors: Vec<Box<dyn Processor>> = Vec::new();

        if !config.allowed_types.is_empty() {
            processors.push(Box::new(TypeAllowListProcessor::new(
                config.allowed_types.iter().cloned(),
            )));
        }

        processors.push(Box::new(ExpandThisnsProcessor));

        if config.share_macros {
            processors.push(Box::new(ShareProcessor::new()?));
        }
        if config.label_macros {
            processors.push(Box::new(ExpandLabelsProcessor::new()?));
        }
        if config.detect_exceptions {
            processors.push(Box::new(DetectExceptionsProcessor));
        }

        Ok(Self { processors })
    }

    /// Create a Pipeline from an explicit processor list.
    #[cfg(test)]
    pub fn with_processors(processors: Vec<Box<dyn Processor>>) -> Self {
        Self { processors }
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.processors.iter().map(|p| p.name()).collect()
    }

    pub fn prepare(&self, fragment: &Fragment, ctx: &mut ProcessorContext) -> Result<(), RewriteError> {
        run_prepare(fragment, ctx, &self.processors)
    }

    pub fn process(
        &self,
        fragment: Fragment,
        ctx: &mut ProcessorContext,
    ) -> Result<Fragment, RewriteError> {
        run_process(fragment, ctx, &self.processors)
    }

    /// Prepare, then process.
    pub fn run(&self, fragment: Fragment, ctx: &mut ProcessorContext) -> Result<Fragment, RewriteError> {
        self.prepare(&fragment, ctx)?;
        self.process(fragment, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Directive;
    use std::sync::{Arc, Mutex};

    /// Records every call into a shared log.
    struct Recorder {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
        fail_prepare: bool,
        fail_process: bool,
    }

    impl Processor for Recorder {
        fn name(&self) -> &'static str {
            self.name
        }

        fn prepare(&self, fragment: &Fragment, _ctx: &mut ProcessorContext) -> Result<(), RewriteError> {
            self.log
                .lock()
                .unwrap()
                .push(format!("prepare {} {}", self.name, fragment.len()));
            if self.fail_prepare {
                return Err(RewriteError::StrictMode {
                    name: self.name.to_string(),
                });
            }
            Ok(())
        }

        fn process(
            &self,
            mut fragment: Fragment,
            _ctx: &mut ProcessorContext,
        ) -> Result<Fragment, RewriteError> {
            self.log
                .lock()
                .unwrap()
                .push(format!("process {} {}", self.name, fragment.len()));
            if self.fail_process {
                return Err(RewriteError::StrictMode {
                    name: self.name.to_string(),
                });
            }
            fragment.push(Directive::new("match", self.name));
            Ok(fragment)
        }
    }

    fn recorder(name: &'static str, log: &Arc<Mutex<Vec<String>>>, fail_prepare: bool) -> Box<dyn Processor> {
        Box::new(Recorder {
            name,
            log: Arc::clone(log),
            fail_prepare,
            fail_process: false,
        })
    }

    fn failing_process(name: &'static str, log: &Arc<Mutex<Vec<String>>>) -> Box<dyn Processor> {
        Box::new(Recorder {
            name,
            log: Arc::clone(log),
            fail_prepare: false,
            fail_process: true,
        })
    }

    #[test]
    fn test_prepare_and_process_run_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let pipeline = Pipeline::with_processors(vec![recorder("a", &log, false), recorder("b", &log, false)]);
        let mut ctx = ProcessorContext::new("ns", false);

        let out = pipeline.run(Fragment::new(), &mut ctx).unwrap();

        assert_eq!(out.len(), 2);
        assert_eq!(
            *log.lock().unwrap(),
            vec!["prepare a 0", "prepare b 0", "process a 0", "process b 1"]
        );
    }

    #[test]
    fn test_prepare_short_circuits() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let processors = vec![recorder("a", &log, true), recorder("b", &log, false)];
        let mut ctx = ProcessorContext::new("ns", false);

        let err = run_prepare(&Fragment::new(), &mut ctx, &processors).unwrap_err();

        assert!(matches!(err, RewriteError::StrictMode { .. }));
        assert_eq!(*log.lock().unwrap(), vec!["prepare a 0"]);
    }

    #[test]
    fn test_process_short_circuits() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let processors = vec![
            recorder("a", &log, false),
            failing_process("b", &log),
            recorder("c", &log, false),
        ];
        let mut ctx = ProcessorContext::new("ns", false);

        let err = run_process(Fragment::new(), &mut ctx, &processors).unwrap_err();

        assert!(matches!(err, RewriteError::StrictMode { ref name } if name == "b"));
        assert_eq!(*log.lock().unwrap(), vec!["process a 0", "process b 1"]);
    }

    #[test]
    fn test_default_pipeline_order() {
        let config = Config::default();
        assert_eq!(
            Pipeline::new(&config).unwrap().names(),
            vec!["expand-thisns", "share", "expand-labels", "detect-exceptions"]
        );

        let config = Config {
            allowed_types: vec!["null".to_string()],
            detect_exceptions: false,
            ..Config::default()
        };
        assert_eq!(
            Pipeline::new(&config).unwrap().names(),
            vec!["allow-list", "expand-thisns", "share", "expand-labels"]
        );
    }
}
