//! Error reporting and diagnostics for Spargel.
//!
//! Diagnostics are values: the lexer and parser never unwind on bad input,
//! they build [`Diagnostic`]s and hand them to a [`DiagnosticEngine`], which
//! dispatches each one to a pluggable [`DiagnosticConsumer`]. The default
//! consumer renders a caret-annotated source excerpt (see [`render`]).

mod engine;
pub mod render;

use std::fmt;

use spargel_source::{SourceLocation, SourceSpan};

pub use engine::{DiagnosticConsumer, DiagnosticEngine, FnConsumer, StreamConsumer};
pub use render::{render_diagnostic, render_message};

/// Substituted for a `{}` placeholder that has no matching argument.
pub const ABSENT_ARGUMENT: &str = "<?>";

// ---------------------------------------------------------------------------
// Levels and message ids
// ---------------------------------------------------------------------------

/// How severe a message is. Ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Level {
    Note,
    Warning,
    Error,
}

impl Level {
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Note => "note",
            Level::Warning => "warning",
            Level::Error => "error",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The catalogue of message templates.
///
/// Each template uses `{}` placeholders that are filled positionally from the
/// message arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticId {
    /// A byte the lexer could not classify.
    InvalidCharacter,
    /// A required token is absent: expected, found.
    ExpectedToken,
    /// A top-level token that cannot start an item.
    ExpectedItem,
    /// A token that cannot start a block item.
    UnexpectedToken,
    /// An expression is required but the token cannot start one.
    ExpectedExpression,
    /// Points back at the opener of a delimiter that was never closed.
    UnclosedDelimiter,
    /// Attributes with no declaration after them.
    DanglingAttribute,
}

impl DiagnosticId {
    pub const ALL: [DiagnosticId; 7] = [
        DiagnosticId::InvalidCharacter,
        DiagnosticId::ExpectedToken,
        DiagnosticId::ExpectedItem,
        DiagnosticId::UnexpectedToken,
        DiagnosticId::ExpectedExpression,
        DiagnosticId::UnclosedDelimiter,
        DiagnosticId::DanglingAttribute,
    ];

    /// Stable snake_case name for tooling and logs.
    pub fn name(self) -> &'static str {
        match self {
            DiagnosticId::InvalidCharacter => "invalid_character",
            DiagnosticId::ExpectedToken => "expected_token",
            DiagnosticId::ExpectedItem => "expected_item",
            DiagnosticId::UnexpectedToken => "unexpected_token",
            DiagnosticId::ExpectedExpression => "expected_expression",
            DiagnosticId::UnclosedDelimiter => "unclosed_delimiter",
            DiagnosticId::DanglingAttribute => "dangling_attribute",
        }
    }

    pub fn template(self) -> &'static str {
        match self {
            DiagnosticId::InvalidCharacter => "invalid character `{}`",
            DiagnosticId::ExpectedToken => "expected {}, found {}",
            DiagnosticId::ExpectedItem => "expected `func` or `open`, found {}",
            DiagnosticId::UnexpectedToken => "unexpected {}",
            DiagnosticId::ExpectedExpression => "expected expression, found {}",
            DiagnosticId::UnclosedDelimiter => "unclosed {} opened here",
            DiagnosticId::DanglingAttribute => "attribute `{}` does not annotate a declaration",
        }
    }

    /// Number of `{}` placeholders in the template.
    pub fn arity(self) -> usize {
        self.template().matches("{}").count()
    }
}

// ---------------------------------------------------------------------------
// Messages and diagnostics
// ---------------------------------------------------------------------------

/// One leveled, located message inside a [`Diagnostic`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticMessage {
    pub level: Level,
    pub location: SourceLocation,
    /// The bytes the caret line underlines.
    pub span: SourceSpan,
    pub id: DiagnosticId,
    pub args: Vec<String>,
}

impl DiagnosticMessage {
    pub fn new(
        level: Level,
        location: SourceLocation,
        span: SourceSpan,
        id: DiagnosticId,
        args: Vec<String>,
    ) -> Self {
        Self {
            level,
            location,
            span,
            id,
            args,
        }
    }

    /// Substitute each `{}` in the template, left to right, with the next
    /// argument. Missing arguments render as [`ABSENT_ARGUMENT`]; surplus
    /// arguments are dropped. Either mismatch is logged.
    pub fn format(&self) -> String {
        let template = self.id.template();
        let mut out = String::with_capacity(template.len() + 16);
        let mut args = self.args.iter();
        let mut pieces = template.split("{}");
        if let Some(head) = pieces.next() {
            out.push_str(head);
        }
        let mut placeholders = 0;
        for piece in pieces {
            placeholders += 1;
            out.push_str(args.next().map_or(ABSENT_ARGUMENT, String::as_str));
            out.push_str(piece);
        }
        if placeholders != self.args.len() {
            tracing::warn!(
                id = self.id.name(),
                expected = placeholders,
                given = self.args.len(),
                "diagnostic argument count does not match its template"
            );
        }
        out
    }
}

impl fmt::Display for DiagnosticMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.level, self.format())
    }
}

/// A primary message followed by any number of notes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: Level,
    pub messages: Vec<DiagnosticMessage>,
}

impl Diagnostic {
    fn with_primary(
        level: Level,
        id: DiagnosticId,
        location: SourceLocation,
        span: SourceSpan,
        args: Vec<String>,
    ) -> Self {
        Self {
            level,
            messages: vec![DiagnosticMessage::new(level, location, span, id, args)],
        }
    }

    pub fn error(
        id: DiagnosticId,
        location: SourceLocation,
        span: SourceSpan,
        args: Vec<String>,
    ) -> Self {
        Self::with_primary(Level::Error, id, location, span, args)
    }

    pub fn warning(
        id: DiagnosticId,
        location: SourceLocation,
        span: SourceSpan,
        args: Vec<String>,
    ) -> Self {
        Self::with_primary(Level::Warning, id, location, span, args)
    }

    /// Append a secondary message at [`Level::Note`].
    pub fn note(
        mut self,
        id: DiagnosticId,
        location: SourceLocation,
        span: SourceSpan,
        args: Vec<String>,
    ) -> Self {
        self.messages
            .push(DiagnosticMessage::new(Level::Note, location, span, id, args));
        self
    }

    /// The first message. Every constructor creates one.
    pub fn primary(&self) -> &DiagnosticMessage {
        &self.messages[0]
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn is_error(&self) -> bool {
        self.level == Level::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for message in &self.messages {
            if !first {
                f.write_str("\n")?;
            }
            first = false;
            write!(f, "{message}")?;
        }
        Ok(())
    }
}
