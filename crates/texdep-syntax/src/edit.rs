use std::fmt::{self, Display, Formatter};

use ecow::{EcoString, eco_format};

/// A result type for document edits.
pub type EditResult<T> = Result<T, EditError>;

/// An edit that could not be applied to a document.
///
/// Edits are planned against a snapshot. If the document changed in the
/// meantime, the planned offset may no longer be valid.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum EditError {
    /// The offset lies behind the end of the text.
    OutOfBounds { offset: usize, len: usize },
    /// The offset lies inside of a multi-byte character.
    NotCharBoundary { offset: usize },
}

impl std::error::Error for EditError {}

impl Display for EditError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::OutOfBounds { offset, len } => {
                write!(f, "edit offset {offset} is out of bounds (text has {len} bytes)")
            }
            Self::NotCharBoundary { offset } => {
                write!(f, "edit offset {offset} is not at a character boundary")
            }
        }
    }
}

impl From<EditError> for EcoString {
    fn from(err: EditError) -> Self {
        eco_format!("{err}")
    }
}
