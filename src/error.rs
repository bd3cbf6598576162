use crate::lexer::Region;
use crate::utils::span_of;
use miette::{Diagnostic, NamedSource, SourceSpan};
use std::fmt::Display;
use std::ops::ControlFlow;
use thiserror::Error;

/// Which phase produced a [`LionError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed literal found while scanning characters.
    Lex,
    /// Token mismatch or premature end of input while parsing.
    Syntax,
    /// A document that does not satisfy its schema.
    Schema,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Lex => write!(f, "lex error"),
            ErrorKind::Syntax => write!(f, "syntax error"),
            ErrorKind::Schema => write!(f, "schema error"),
        }
    }
}

/// A single diagnostic tied to a region of the source text.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
#[error("{message} at {}", position(.region))]
pub struct LionError {
    pub kind: ErrorKind,
    pub message: String,
    pub region: Region,
    #[help]
    pub description: Option<String>,
    #[label("{kind} here")]
    pub span: Option<SourceSpan>,
}

fn position(region: &Region) -> String {
    format!("{}:{}", region.start_line, region.start_col)
}

impl LionError {
    pub fn new(kind: ErrorKind, message: impl Into<String>, region: Region) -> Self {
        Self {
            kind,
            message: message.into(),
            region,
            description: None,
            span: None,
        }
    }

    pub fn lex(message: impl Into<String>, region: Region) -> Self {
        Self::new(ErrorKind::Lex, message, region)
    }

    pub fn syntax(message: impl Into<String>, region: Region) -> Self {
        Self::new(ErrorKind::Syntax, message, region)
    }

    pub fn schema(message: impl Into<String>, region: Region) -> Self {
        Self::new(ErrorKind::Schema, message, region)
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// The aggregated failure returned by the fail-fast entry points.
#[derive(Error, Debug, Diagnostic)]
#[error("{}", render(.errors))]
#[diagnostic(
    code(lion::invalid_input),
    help("Every problem found in this pass is listed below.")
)]
pub struct LionErrors {
    #[related]
    pub errors: Vec<LionError>,
    #[source_code]
    pub src: NamedSource<String>,
}

fn render(errors: &[LionError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

impl LionErrors {
    pub fn new(errors: Vec<LionError>) -> Self {
        Self {
            errors,
            src: NamedSource::new("source.lion", String::new()),
        }
    }

    /// Attaches the source text so that reports can point into it.
    #[must_use]
    pub fn with_source(mut self, name: &str, text: &str) -> Self {
        for error in &mut self.errors {
            if error.region != Region::default() {
                error.span = Some(span_of(text, &error.region));
            }
        }
        self.src = NamedSource::new(name, text.to_string());
        self
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Ordered accumulator of diagnostics for a single parse call.
///
/// With `process_when_added` set, [`ErrorList::add`] answers `Break` so that
/// the caller stops at the first problem.
#[derive(Debug, Default, Clone)]
pub struct ErrorList {
    pub errors: Vec<LionError>,
    pub process_when_added: bool,
}

impl ErrorList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_fast() -> Self {
        Self {
            errors: Vec::new(),
            process_when_added: true,
        }
    }

    pub fn add(&mut self, error: LionError) -> ControlFlow<()> {
        self.errors.push(error);
        if self.process_when_added {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn clear(&mut self) {
        self.errors.clear();
    }

    /// Drains the accumulated errors, leaving the list empty.
    pub fn take(&mut self) -> Vec<LionError> {
        std::mem::take(&mut self.errors)
    }

    /// Turns accumulated errors into a failure. The list is drained either way.
    pub fn process(&mut self) -> Result<(), LionErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(LionErrors::new(self.take()))
        }
    }
}

impl Display for ErrorList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", render(&self.errors))
    }
}
