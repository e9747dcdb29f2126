//! Plain-text rendering of diagnostics with source excerpts.
//!
//! Every message renders as a summary line, a location line and a three-line
//! framed excerpt:
//!
//! ```text
//! error: expected `)`, found `{`
//!   --> main.sp:1:
//!    |
//!  1 |func main( {}
//!    |          ^
//! ```
//!
//! The excerpt is the exact source line containing the span. Carets start at
//! the span's column and cover the span clipped to that line; zero-width spans
//! still get one caret.

use std::fmt::Write;

use spargel_source::SourceMap;

use crate::{Diagnostic, DiagnosticMessage};

/// Render every message of `diagnostic`, primary first.
pub fn render_diagnostic(diagnostic: &Diagnostic, sources: &SourceMap) -> String {
    let mut out = String::new();
    for message in &diagnostic.messages {
        render_message(&mut out, message, sources);
    }
    out
}

/// Append the rendering of one message to `out`.
pub fn render_message(out: &mut String, message: &DiagnosticMessage, sources: &SourceMap) {
    let location = message.location;
    let _ = writeln!(out, "{}: {}", message.level, message.format());

    let Some(buffer) = sources.get(location.file_id) else {
        let _ = writeln!(out, "  --> <unknown>:{}:", location.line);
        return;
    };
    let _ = writeln!(out, "  --> {}:{}:", buffer.name(), location.line);

    let line_number = location.line.to_string();
    let gutter = " ".repeat(line_number.len() + 2);
    let line_text = buffer.line_text(location.line).unwrap_or_default();
    let (offset, width) = caret_columns(message, line_text);

    let _ = writeln!(out, "{gutter}|");
    let _ = writeln!(
        out,
        " {line_number} |{}",
        String::from_utf8_lossy(line_text)
    );
    let _ = writeln!(out, "{gutter}|{}{}", " ".repeat(offset), "^".repeat(width));
}

/// Caret indent and width in characters, so multi-byte text before or under
/// the span does not shift the carets.
fn caret_columns(message: &DiagnosticMessage, line_text: &[u8]) -> (usize, usize) {
    let location = message.location;
    let column_bytes = location.column.saturating_sub(1) as usize;
    let line_start = (location.byte_position as usize).saturating_sub(column_bytes);

    let offset = column_bytes.min(line_text.len());
    let start = (message.span.start as usize)
        .saturating_sub(line_start)
        .min(line_text.len());
    let end = (message.span.end as usize)
        .saturating_sub(line_start)
        .clamp(start, line_text.len());

    let indent = String::from_utf8_lossy(&line_text[..offset]).chars().count();
    let width = String::from_utf8_lossy(&line_text[start..end])
        .chars()
        .count()
        .max(1);
    (indent, width)
}
