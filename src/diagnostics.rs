//! Fatal-first diagnostics: a range-aware, caret-underlining error printer.
//!
//! Filename and source text are carried explicitly in a [`DiagnosticSink`]
//! value, constructed once per compilation and passed to the lexer, parser
//! and codegen, rather than reached for through process-global statics.

use std::fmt;

use crate::lexer::token::Span;

/// The taxonomy from the error handling design: every fatal error belongs to
/// exactly one of these categories, which only affects how `message` reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Lexical,
    Syntactic,
    Reference,
    Arity,
    Type,
    Driver,
}

/// A single fatal diagnostic. `span` is absent for errors that have no
/// source location (file-not-found, link failure).
#[derive(Debug, Clone)]
pub struct CompileError {
    pub kind: ErrorKind,
    pub span: Option<Span>,
    pub message: String,
}

impl CompileError {
    pub fn new(kind: ErrorKind, span: Option<Span>, message: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            message: message.into(),
        }
    }

    pub fn lexical(span: Span, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Lexical, Some(span), message)
    }

    pub fn syntactic(span: Span, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Syntactic, Some(span), message)
    }

    pub fn reference(span: Span, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Reference, Some(span), message)
    }

    pub fn arity(span: Span, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Arity, Some(span), message)
    }

    pub fn type_error(span: Span, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Type, Some(span), message)
    }

    pub fn driver(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Driver, None, message)
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CompileError {}

/// Carries the filename and full source text a compilation is working
/// over, and knows how to render a [`CompileError`] against them.
pub struct DiagnosticSink {
    filename: String,
    source: String,
}

impl DiagnosticSink {
    pub fn new(filename: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            source: source.into(),
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Render `err` to stderr in the canonical `<file>:<line>:<col>: error:
    /// <message>` form, with a source excerpt and caret underline when the
    /// error carries a span.
    pub fn render(&self, err: &CompileError) {
        use colored::Colorize;

        match err.span {
            Some(span) => {
                eprintln!(
                    "{}:{}:{}: {} {}",
                    self.filename,
                    span.line,
                    span.column,
                    "error:".red().bold(),
                    err.message
                );

                if let Some(line_text) = self.source.lines().nth(span.line - 1) {
                    eprintln!("{:>5} | {}", span.line, line_text);

                    let mut underline = String::new();
                    for i in 1..span.column {
                        underline.push(if line_text.as_bytes().get(i - 1) == Some(&b'\t') {
                            '\t'
                        } else {
                            ' '
                        });
                    }
                    underline.push('^');
                    for _ in span.column..span.end_column.saturating_sub(1) {
                        underline.push('~');
                    }
                    eprintln!("      | {}", underline.green());
                }
            }
            None => {
                eprintln!("{}: {} {}", self.filename, "error:".red().bold(), err.message);
            }
        }
    }

    /// Render `err` and terminate the process with exit status 1. The first
    /// error detected aborts compilation; there is no error recovery.
    pub fn fatal(&self, err: &CompileError) -> ! {
        self.render(err);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_message() {
        let err = CompileError::reference(Span::new(1, 1, 2), "unbound variable: x");
        assert_eq!(err.to_string(), "unbound variable: x");
    }
}
