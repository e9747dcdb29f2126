//! Source buffers, spans and locations for Spargel.
//!
//! A [`SourceBuffer`] is the unit of compilation: an immutable byte buffer plus
//! a name. Every token produced by the lexer points back into its buffer with a
//! [`SourceSpan`] and a [`SourceLocation`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Identifies a source buffer in a [`SourceMap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct FileId(pub u32);

/// A half-open `[start, end)` byte range within a source buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct SourceSpan {
    pub start: u32,
    pub end: u32,
}

impl SourceSpan {
    pub fn new(start: u32, end: u32) -> Self {
        debug_assert!(start <= end, "span start {start} is past its end {end}");
        Self { start, end }
    }

    /// A zero-width span at `at`.
    pub fn empty(at: u32) -> Self {
        Self { start: at, end: at }
    }

    pub fn len(self) -> u32 {
        self.end - self.start
    }

    pub fn is_empty(self) -> bool {
        self.start == self.end
    }

    /// Create a span that covers both `self` and `other`.
    pub fn merge(self, other: SourceSpan) -> SourceSpan {
        SourceSpan {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// A human-facing position in a source buffer.
///
/// `line` and `column` are 1-based; `column` counts bytes from the start of
/// the line. `byte_position` is the 0-based absolute offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceLocation {
    pub line: u32,
    pub column: u32,
    pub byte_position: u32,
    pub file_id: FileId,
}

impl SourceLocation {
    /// The location of the first byte of a buffer.
    pub fn start_of(file_id: FileId) -> Self {
        Self {
            line: 1,
            column: 1,
            byte_position: 0,
            file_id,
        }
    }
}

/// Failure to load a source buffer.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("failed to read `{}`: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("source `{name}` is {len} bytes, larger than the 4 GiB limit")]
    TooLarge { name: String, len: usize },
}

/// An immutable, named byte buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceBuffer {
    id: FileId,
    name: String,
    content: Box<[u8]>,
    /// Byte offset of the first byte of every line.
    line_starts: Vec<u32>,
}

impl SourceBuffer {
    /// Build a buffer from raw bytes.
    ///
    /// Offsets are stored as `u32`; buffers of 4 GiB or more are rejected.
    pub fn from_bytes(
        id: FileId,
        name: impl Into<String>,
        content: impl Into<Box<[u8]>>,
    ) -> Result<Self, SourceError> {
        let name = name.into();
        let content = content.into();
        if u32::try_from(content.len()).is_err() {
            return Err(SourceError::TooLarge {
                name,
                len: content.len(),
            });
        }
        let line_starts = scan_line_starts(&content);
        Ok(Self {
            id,
            name,
            content,
            line_starts,
        })
    }

    /// Build a buffer from text. Panics only for text of 4 GiB or more.
    pub fn from_text(name: impl Into<String>, text: &str) -> Self {
        Self::from_bytes(FileId(0), name, text.as_bytes())
            .expect("in-memory source text fits in a u32 offset")
    }

    /// Read a file from disk into a buffer named after its path.
    pub fn read(id: FileId, path: &Path) -> Result<Self, SourceError> {
        let content = std::fs::read(path).map_err(|source| SourceError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(id, path.display().to_string(), content)
    }

    pub fn id(&self) -> FileId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.content
    }

    pub fn len(&self) -> u32 {
        self.content.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// The bytes covered by `span`, clamped to the buffer.
    pub fn slice(&self, span: SourceSpan) -> &[u8] {
        let end = (span.end as usize).min(self.content.len());
        let start = (span.start as usize).min(end);
        &self.content[start..end]
    }

    /// Number of lines; a trailing newline opens one final empty line.
    pub fn line_count(&self) -> u32 {
        self.line_starts.len() as u32
    }

    /// The text of a 1-based line, without its terminating `\n`.
    pub fn line_text(&self, line: u32) -> Option<&[u8]> {
        let index = (line as usize).checked_sub(1)?;
        let start = *self.line_starts.get(index)? as usize;
        let end = match self.line_starts.get(index + 1) {
            Some(next) => *next as usize - 1,
            None => self.content.len(),
        };
        Some(&self.content[start..end])
    }

    /// Translate an absolute byte offset into a line/column location.
    ///
    /// Offsets past the end are clamped to the end of the buffer.
    pub fn location(&self, byte_position: u32) -> SourceLocation {
        let byte_position = byte_position.min(self.len());
        let line_index = match self.line_starts.binary_search(&byte_position) {
            Ok(exact) => exact,
            Err(insert_at) => insert_at - 1,
        };
        SourceLocation {
            line: line_index as u32 + 1,
            column: byte_position - self.line_starts[line_index] + 1,
            byte_position,
            file_id: self.id,
        }
    }
}

fn scan_line_starts(content: &[u8]) -> Vec<u32> {
    let mut starts = vec![0];
    starts.extend(
        content
            .iter()
            .enumerate()
            .filter(|(_, byte)| **byte == b'\n')
            .map(|(idx, _)| idx as u32 + 1),
    );
    starts
}

/// The set of buffers in a compilation session.
#[derive(Debug, Clone, Default)]
pub struct SourceMap {
    files: Vec<Arc<SourceBuffer>>,
}

impl SourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// The id the next added buffer will receive.
    pub fn next_id(&self) -> FileId {
        FileId(self.files.len() as u32)
    }

    /// Register text under `name`, returning the shared buffer.
    pub fn add_str(&mut self, name: impl Into<String>, text: &str) -> Arc<SourceBuffer> {
        let buffer = SourceBuffer::from_bytes(self.next_id(), name, text.as_bytes())
            .expect("in-memory source text fits in a u32 offset");
        self.insert(buffer)
    }

    /// Read `path` from disk and register it.
    pub fn load(&mut self, path: &Path) -> Result<Arc<SourceBuffer>, SourceError> {
        let buffer = SourceBuffer::read(self.next_id(), path)?;
        Ok(self.insert(buffer))
    }

    fn insert(&mut self, buffer: SourceBuffer) -> Arc<SourceBuffer> {
        debug_assert_eq!(buffer.id(), self.next_id());
        let buffer = Arc::new(buffer);
        self.files.push(Arc::clone(&buffer));
        buffer
    }

    pub fn get(&self, id: FileId) -> Option<&Arc<SourceBuffer>> {
        self.files.get(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
