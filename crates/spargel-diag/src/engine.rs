use std::io::{self, Write};

use spargel_source::SourceMap;

use crate::{Diagnostic, Level, render_diagnostic};

/// Receives every diagnostic the engine emits.
pub trait DiagnosticConsumer {
    fn handle(&mut self, diagnostic: &Diagnostic);
}

/// Collects diagnostics in emission order.
impl DiagnosticConsumer for Vec<Diagnostic> {
    fn handle(&mut self, diagnostic: &Diagnostic) {
        self.push(diagnostic.clone());
    }
}

impl<C: DiagnosticConsumer + ?Sized> DiagnosticConsumer for &mut C {
    fn handle(&mut self, diagnostic: &Diagnostic) {
        (**self).handle(diagnostic);
    }
}

/// Adapts a closure into a consumer.
pub struct FnConsumer<F>(pub F);

impl<F: FnMut(&Diagnostic)> DiagnosticConsumer for FnConsumer<F> {
    fn handle(&mut self, diagnostic: &Diagnostic) {
        (self.0)(diagnostic);
    }
}

/// Renders diagnostics as text into a writer.
#[derive(Debug)]
pub struct StreamConsumer<W> {
    sources: SourceMap,
    out: W,
}

impl StreamConsumer<io::Stderr> {
    /// The console consumer.
    pub fn stderr(sources: SourceMap) -> Self {
        Self::new(sources, io::stderr())
    }
}

impl<W: Write> StreamConsumer<W> {
    pub fn new(sources: SourceMap, out: W) -> Self {
        Self { sources, out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> DiagnosticConsumer for StreamConsumer<W> {
    fn handle(&mut self, diagnostic: &Diagnostic) {
        let rendered = render_diagnostic(diagnostic, &self.sources);
        if let Err(err) = self.out.write_all(rendered.as_bytes()) {
            tracing::error!(%err, "failed to write diagnostic");
        }
    }
}

/// Dispatches diagnostics to a consumer and keeps per-level counts.
///
/// The engine never stores the diagnostics it is given.
#[derive(Debug)]
pub struct DiagnosticEngine<C = StreamConsumer<io::Stderr>> {
    consumer: C,
    errors: usize,
    warnings: usize,
}

impl DiagnosticEngine {
    /// An engine that renders to stderr.
    pub fn console(sources: SourceMap) -> Self {
        Self::new(StreamConsumer::stderr(sources))
    }
}

impl<C: DiagnosticConsumer> DiagnosticEngine<C> {
    pub fn new(consumer: C) -> Self {
        Self {
            consumer,
            errors: 0,
            warnings: 0,
        }
    }

    pub fn emit(&mut self, diagnostic: &Diagnostic) {
        match diagnostic.level {
            Level::Error => self.errors += 1,
            Level::Warning => self.warnings += 1,
            Level::Note => {}
        }
        tracing::debug!(
            level = %diagnostic.level,
            id = diagnostic.messages.first().map_or("<empty>", |msg| msg.id.name()),
            "emitting diagnostic"
        );
        self.consumer.handle(diagnostic);
    }

    pub fn emit_all<'a>(&mut self, diagnostics: impl IntoIterator<Item = &'a Diagnostic>) {
        for diagnostic in diagnostics {
            self.emit(diagnostic);
        }
    }

    pub fn error_count(&self) -> usize {
        self.errors
    }

    pub fn warning_count(&self) -> usize {
        self.warnings
    }

    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }

    pub fn consumer(&self) -> &C {
        &self.consumer
    }

    pub fn into_consumer(self) -> C {
        self.consumer
    }
}

#[cfg(test)]
mod tests {
    use spargel_source::{SourceLocation, SourceSpan};

    use super::*;
    use crate::DiagnosticId;

    fn sample(level: Level) -> Diagnostic {
        let mut sources = SourceMap::new();
        let buffer = sources.add_str("t.sp", "x");
        let location = buffer.location(0);
        let span = SourceSpan::new(0, 1);
        let args = vec!["identifier `x`".to_string()];
        match level {
            Level::Warning => Diagnostic::warning(DiagnosticId::ExpectedItem, location, span, args),
            _ => Diagnostic::error(DiagnosticId::ExpectedItem, location, span, args),
        }
    }

    #[test]
    fn collecting_consumer_sees_messages_in_order() {
        let mut seen: Vec<Diagnostic> = Vec::new();
        let mut engine = DiagnosticEngine::new(&mut seen);
        let diag = sample(Level::Error).note(
            DiagnosticId::UnclosedDelimiter,
            SourceLocation::start_of(spargel_source::FileId(0)),
            SourceSpan::new(0, 1),
            vec!["`(`".into()],
        );
        engine.emit(&diag);
        engine.emit(&sample(Level::Warning));
        assert_eq!(engine.error_count(), 1);
        assert_eq!(engine.warning_count(), 1);
        assert!(engine.has_errors());
        drop(engine);

        let summaries: Vec<String> = seen
            .iter()
            .flat_map(|diag| diag.messages.iter().map(|msg| msg.to_string()))
            .collect();
        assert_eq!(
            summaries,
            [
                "error: expected `func` or `open`, found identifier `x`",
                "note: unclosed `(` opened here",
                "warning: expected `func` or `open`, found identifier `x`",
            ]
        );
    }

    #[test]
    fn closure_consumer_sees_each_diagnostic() {
        let mut ids = Vec::new();
        let mut engine = DiagnosticEngine::new(FnConsumer(|diag: &Diagnostic| {
            ids.push(diag.primary().id);
        }));
        engine.emit(&sample(Level::Error));
        engine.emit(&sample(Level::Warning));
        drop(engine);
        assert_eq!(ids, vec![DiagnosticId::ExpectedItem, DiagnosticId::ExpectedItem]);
    }

    #[test]
    fn stream_consumer_renders_into_writer() {
        let mut sources = SourceMap::new();
        let buffer = sources.add_str("t.sp", "x");
        let diag = Diagnostic::error(
            DiagnosticId::ExpectedItem,
            buffer.location(0),
            SourceSpan::new(0, 1),
            vec!["identifier `x`".into()],
        );
        let mut engine = DiagnosticEngine::new(StreamConsumer::new(sources, Vec::new()));
        engine.emit(&diag);
        let text = String::from_utf8(engine.into_consumer().into_inner()).expect("utf-8 output");
        assert_eq!(
            text,
            "error: expected `func` or `open`, found identifier `x`\n  --> t.sp:1:\n   |\n 1 |x\n   |^\n"
        );
    }
}
