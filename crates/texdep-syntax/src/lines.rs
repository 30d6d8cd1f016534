use std::ops::Range;
use std::sync::Arc;

use crate::is_newline;

/// A text buffer and the byte offsets at which its lines start.
#[derive(Clone)]
pub struct Lines<S>(Arc<Repr<S>>);

#[derive(Clone)]
struct Repr<S> {
    starts: Vec<usize>,
    str: S,
}

impl<S: AsRef<str>> Lines<S> {
    /// Index the lines of a text.
    pub fn new(str: S) -> Self {
        let starts = starts(str.as_ref());
        Lines(Arc::new(Repr { starts, str }))
    }

    /// The full text.
    pub fn text(&self) -> &str {
        self.0.str.as_ref()
    }

    /// Get the length of the text in UTF-8 encoded bytes.
    pub fn len_bytes(&self) -> usize {
        self.text().len()
    }

    /// Get the length of the text in lines.
    pub fn len_lines(&self) -> usize {
        self.0.starts.len()
    }

    /// Return the index of the line that contains the given byte index.
    pub fn byte_to_line(&self, byte_idx: usize) -> Option<usize> {
        (byte_idx <= self.text().len()).then(|| {
            match self.0.starts.binary_search(&byte_idx) {
                Ok(i) => i,
                Err(i) => i - 1,
            }
        })
    }

    /// Return the index of the column at the byte index.
    ///
    /// The column is defined as the number of characters in the line before
    /// the byte index.
    pub fn byte_to_column(&self, byte_idx: usize) -> Option<usize> {
        let line = self.byte_to_line(byte_idx)?;
        let start = self.line_to_byte(line)?;
        let head = self.text().get(start..byte_idx)?;
        Some(head.chars().count())
    }

    /// Return the byte position at which the given line starts.
    pub fn line_to_byte(&self, line_idx: usize) -> Option<usize> {
        self.0.starts.get(line_idx).copied()
    }

    /// Return the range which encloses the given line.
    pub fn line_to_range(&self, line_idx: usize) -> Option<Range<usize>> {
        let start = self.line_to_byte(line_idx)?;
        let end = self.line_to_byte(line_idx + 1).unwrap_or(self.text().len());
        Some(start..end)
    }
}

impl Lines<String> {
    /// Insert text at a byte offset, updating the line starts behind it.
    ///
    /// The method panics if `offset` is out of bounds or not at a char
    /// boundary; callers validate it first.
    #[track_caller]
    pub(crate) fn insert(&mut self, offset: usize, with: &str) {
        let line = self.byte_to_line(offset).unwrap();
        let inner = Arc::make_mut(&mut self.0);
        inner.str.insert_str(offset, with);

        // Line starts before the insertion stay valid.
        inner.starts.truncate(line + 1);

        // Handle adjoining of \r and \n.
        if inner.str[..offset].ends_with('\r') && with.starts_with('\n') {
            inner.starts.pop();
        }

        let rest = starts_from(offset, &inner.str[offset..]);
        inner.starts.extend(rest);
    }
}

impl<S: AsRef<str>> AsRef<str> for Lines<S> {
    fn as_ref(&self) -> &str {
        self.0.str.as_ref()
    }
}

/// Create the line start vector.
fn starts(text: &str) -> Vec<usize> {
    std::iter::once(0).chain(starts_from(0, text)).collect()
}

/// Compute the starts of all lines after the first in `text`, shifted by
/// `offset`.
fn starts_from(offset: usize, text: &str) -> impl Iterator<Item = usize> + '_ {
    let mut s = unscanny::Scanner::new(text);
    std::iter::from_fn(move || {
        s.eat_until(is_newline);
        if s.done() {
            return None;
        }

        if s.eat() == Some('\r') {
            s.eat_if('\n');
        }

        Some(offset + s.cursor())
    })
}
