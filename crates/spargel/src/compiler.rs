use std::path::Path;

use spargel_diag::{DiagnosticConsumer, DiagnosticEngine};
use spargel_source::{SourceBuffer, SourceError, SourceMap};
use spargel_syntax::{SourceFile, dump_tree, parse_source};

/// Driver settings, normally filled from the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileOptions {
    /// Render the syntax tree into [`CompileOutput::dump`].
    pub dump_ast: bool,
}

#[derive(Debug)]
pub struct CompileOutput {
    pub source_file: SourceFile,
    pub dump: Option<String>,
    /// Error-level diagnostics emitted for this buffer.
    pub error_count: usize,
}

impl CompileOutput {
    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error(transparent)]
    Read(#[from] SourceError),
}

/// Lex and parse one buffer, sending every syntax diagnostic to `engine`.
pub fn compile_source<C: DiagnosticConsumer>(
    buffer: &SourceBuffer,
    options: &CompileOptions,
    engine: &mut DiagnosticEngine<C>,
) -> CompileOutput {
    tracing::info!(file = buffer.name(), bytes = buffer.len(), "compiling");

    let parse = parse_source(buffer);
    let errors_before = engine.error_count();
    engine.emit_all(&parse.diagnostics);
    let error_count = engine.error_count() - errors_before;

    let dump = options.dump_ast.then(|| dump_tree(&parse.source_file));
    tracing::info!(
        file = buffer.name(),
        errors = error_count,
        warnings = engine.warning_count(),
        "finished"
    );

    CompileOutput {
        source_file: parse.source_file,
        dump,
        error_count,
    }
}

/// Read `path` and compile it, rendering diagnostics to stderr.
pub fn compile_file(path: &Path, options: &CompileOptions) -> Result<CompileOutput, CompileError> {
    let mut sources = SourceMap::new();
    let buffer = sources.load(path)?;
    let mut engine = DiagnosticEngine::console(sources);
    Ok(compile_source(&buffer, options, &mut engine))
}

#[cfg(test)]
mod tests {
    use spargel_diag::{Diagnostic, Level};

    use super::*;

    #[test]
    fn clean_source_has_no_errors() {
        let buffer = SourceBuffer::from_text("main.sp", "open std\nfunc main() {}\n");
        let mut engine = DiagnosticEngine::new(Vec::<Diagnostic>::new());
        let output = compile_source(&buffer, &CompileOptions::default(), &mut engine);

        assert!(!output.has_errors());
        assert!(output.dump.is_none());
        assert_eq!(output.source_file.items.len(), 2);
        assert!(engine.consumer().is_empty());
    }

    #[test]
    fn diagnostics_reach_the_consumer() {
        let buffer = SourceBuffer::from_text("main.sp", "func main( {}\n@inline\n");
        let mut engine = DiagnosticEngine::new(Vec::<Diagnostic>::new());
        let output = compile_source(&buffer, &CompileOptions::default(), &mut engine);

        assert_eq!(output.error_count, 1);
        assert_eq!(engine.warning_count(), 1);
        let levels: Vec<Level> = engine
            .consumer()
            .iter()
            .map(|diagnostic| diagnostic.level)
            .collect();
        assert_eq!(levels, vec![Level::Error, Level::Warning]);
    }

    #[test]
    fn dump_is_rendered_on_request() {
        let buffer = SourceBuffer::from_text("main.sp", "func main() {}");
        let mut engine = DiagnosticEngine::new(Vec::<Diagnostic>::new());
        let options = CompileOptions { dump_ast: true };
        let output = compile_source(&buffer, &options, &mut engine);
        assert_eq!(
            output.dump.as_deref(),
            Some("|-SourceFile:\n| |-FuncDecl: main\n| | |-Block:\n")
        );
    }

    #[test]
    fn error_count_is_per_buffer() {
        let mut engine = DiagnosticEngine::new(Vec::<Diagnostic>::new());
        let bad = SourceBuffer::from_text("bad.sp", ";");
        let good = SourceBuffer::from_text("good.sp", "func f() {}");
        assert_eq!(compile_source(&bad, &CompileOptions::default(), &mut engine).error_count, 1);
        assert_eq!(compile_source(&good, &CompileOptions::default(), &mut engine).error_count, 0);
        assert_eq!(engine.error_count(), 1);
    }

    #[test]
    fn unreadable_file_is_a_read_error() {
        let err = compile_file(
            Path::new("/definitely/not/here.sp"),
            &CompileOptions::default(),
        )
        .expect_err("missing file should fail");
        assert!(matches!(err, CompileError::Read(SourceError::Read { .. })));
        assert!(err.to_string().contains("/definitely/not/here.sp"));
    }
}
