//! Registration of the tensor summary with the host's type-display registry.
//!
//! The registry is owned by the host debugger; this crate only calls into it
//! once at plugin load. [`SummaryRegistry`] is an in-process implementation
//! of the same contract for embedders that dispatch summaries themselves.

use crate::error::Error;
use crate::handle::ValueHandle;
use crate::options::RenderOptions;
use crate::render::{SummaryProvider, TensorSummary};
use regex::Regex;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Type-name pattern the tensor summary is registered under.
pub const TENSOR_TYPE_PATTERN: &str = "Tensor";

/// How a registered pattern matches type names.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypePattern {
    /// The type name must equal the pattern.
    Exact(String),
    /// The pattern is a regular expression searched for in the type name.
    Regex(String),
}

impl TypePattern {
    pub fn as_str(&self) -> &str {
        match self {
            TypePattern::Exact(s) | TypePattern::Regex(s) => s,
        }
    }

    pub fn compile(&self) -> Result<TypeMatcher, Error> {
        match self {
            TypePattern::Exact(name) => Ok(TypeMatcher::Exact(name.clone())),
            TypePattern::Regex(pattern) => Regex::new(pattern)
                .map(TypeMatcher::Regex)
                .map_err(|e| Error::InvalidPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                }),
        }
    }
}

impl fmt::Display for TypePattern {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TypePattern::Exact(s) => write!(f, "{}", s),
            TypePattern::Regex(s) => write!(f, "/{}/", s),
        }
    }
}

/// A compiled [`TypePattern`].
#[derive(Debug, Clone)]
pub enum TypeMatcher {
    Exact(String),
    Regex(Regex),
}

impl TypeMatcher {
    pub fn is_match(&self, type_name: &str) -> bool {
        match self {
            TypeMatcher::Exact(name) => name == type_name,
            TypeMatcher::Regex(re) => re.is_match(type_name),
        }
    }
}

/// The host debugger's process-wide type-display registry.
pub trait TypeSummaryHost {
    /// Binds `handler` to `pattern`, replacing any handler already bound to
    /// the same pattern.
    fn register_type_summary(
        &mut self,
        pattern: TypePattern,
        handler: Arc<dyn SummaryProvider>,
    ) -> Result<(), Error>;

    /// Prints a notice on the host's console.
    fn console_notice(&mut self, message: &str);
}

/// Registers the tensor summary with `host`.
pub fn register_summaries(host: &mut dyn TypeSummaryHost) -> Result<(), Error> {
    host.register_type_summary(
        TypePattern::Regex(TENSOR_TYPE_PATTERN.to_string()),
        Arc::new(TensorSummary),
    )
}

/// Plugin load entry point. Failures are reported on the host console and
/// never abort the debugging session.
pub fn init_plugin(host: &mut dyn TypeSummaryHost) {
    match register_summaries(host) {
        Ok(()) => {
            debug_println!("registered tensor summary for /{}/", TENSOR_TYPE_PATTERN);
        }
        Err(e) => host.console_notice(&format!("tensor_summary: {}", e)),
    }
}

struct Entry {
    pattern: TypePattern,
    matcher: TypeMatcher,
    handler: Arc<dyn SummaryProvider>,
}

/// In-process type-display registry.
#[derive(Default)]
pub struct SummaryRegistry {
    entries: Vec<Entry>,
    notices: Vec<String>,
}

impl SummaryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn patterns(&self) -> Vec<&TypePattern> {
        self.entries.iter().map(|e| &e.pattern).collect()
    }

    /// Console notices received so far.
    pub fn notices(&self) -> &[String] {
        &self.notices
    }

    /// First handler, in registration order, whose pattern matches
    /// `type_name`.
    pub fn lookup(&self, type_name: &str) -> Option<Arc<dyn SummaryProvider>> {
        self.entries
            .iter()
            .find(|e| e.matcher.is_match(type_name))
            .map(|e| Arc::clone(&e.handler))
    }

    /// Summarises `handle` with the handler registered for `type_name`, or
    /// `None` when no pattern matches.
    pub fn summarize(
        &self,
        type_name: &str,
        handle: Option<&dyn ValueHandle>,
        context: &dyn Any,
        options: &RenderOptions,
    ) -> Option<String> {
        self.lookup(type_name)
            .map(|handler| handler.summarize(handle, context, options))
    }
}

impl TypeSummaryHost for SummaryRegistry {
    fn register_type_summary(
        &mut self,
        pattern: TypePattern,
        handler: Arc<dyn SummaryProvider>,
    ) -> Result<(), Error> {
        let matcher = pattern.compile()?;
        match self.entries.iter_mut().find(|e| e.pattern == pattern) {
            Some(existing) => {
                existing.matcher = matcher;
                existing.handler = handler;
            }
            None => self.entries.push(Entry {
                pattern,
                matcher,
                handler,
            }),
        }
        Ok(())
    }

    fn console_notice(&mut self, message: &str) {
        self.notices.push(message.to_string());
    }
}

impl fmt::Debug for SummaryRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SummaryRegistry")
            .field("patterns", &self.patterns())
            .field("handlers", &"<summary providers>")
            .field("notices", &self.notices)
            .finish()
    }
}
