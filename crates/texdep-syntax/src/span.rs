use std::fmt::{self, Debug, Formatter};
use std::ops::Range;

use crate::FileId;

/// Defines a range in a file.
///
/// This is used to track which source section a command or environment stems
/// from and where a diagnostic applies to.
///
/// Unlike node numbers, byte ranges shift as text is inserted. Spans are thus
/// only valid for the [`Document`](crate::Document) snapshot that produced
/// them; after an edit, the document must be scanned again.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct Span {
    id: Option<FileId>,
    start: usize,
    end: usize,
}

impl Span {
    /// Create a span that does not point into any file.
    pub const fn detached() -> Self {
        Self { id: None, start: 0, end: 0 }
    }

    /// Create a new span from a file id and a byte range.
    pub fn new(id: FileId, range: Range<usize>) -> Self {
        debug_assert!(range.start <= range.end);
        Self { id: Some(id), start: range.start, end: range.end }
    }

    /// Whether the span is detached.
    pub const fn is_detached(self) -> bool {
        self.id.is_none()
    }

    /// The id of the file the span points into.
    ///
    /// Returns `None` if the span is detached.
    pub const fn id(self) -> Option<FileId> {
        self.id
    }

    /// The byte range of the span.
    pub fn range(self) -> Range<usize> {
        self.start..self.end
    }

    /// The byte offset at which the span starts.
    pub const fn start(self) -> usize {
        self.start
    }

    /// The byte offset at which the span ends.
    pub const fn end(self) -> usize {
        self.end
    }

    /// The length of the span in bytes.
    pub const fn len(self) -> usize {
        self.end - self.start
    }

    /// Whether the span covers no text.
    pub const fn is_empty(self) -> bool {
        self.start == self.end
    }

    /// Select a part of this span, given a range relative to its start.
    ///
    /// The result is clamped to this span.
    pub fn slice(self, relative: Range<usize>) -> Self {
        let start = (self.start + relative.start).min(self.end);
        let end = (self.start + relative.end).clamp(start, self.end);
        Self { id: self.id, start, end }
    }
}

impl Debug for Span {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self.id {
            Some(id) => write!(f, "{id:?}@{}..{}", self.start, self.end),
            None => f.pad("Span(detached)"),
        }
    }
}
