//! File identification.

use std::collections::HashMap;
use std::fmt::{self, Debug, Formatter};
use std::path::Path;
use std::sync::RwLock;

use ecow::EcoString;
use once_cell::sync::Lazy;

/// The global path interner.
static INTERNER: Lazy<RwLock<Interner>> =
    Lazy::new(|| RwLock::new(Interner { to_id: HashMap::new(), from_id: Vec::new() }));

/// A path interner.
struct Interner {
    to_id: HashMap<EcoString, FileId>,
    from_id: Vec<EcoString>,
}

/// The extension LaTeX assumes for included files that don't name one.
const TEX_EXTENSION: &str = "tex";

/// Identifies a file in a project.
///
/// The path is relative to the project root, uses `/` as separator and is
/// normalized (no `.` or `..` segments). This type is globally interned and
/// thus cheap to copy, compare, and hash.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FileId(u16);

impl FileId {
    /// Create a new interned file id for a root-relative path.
    ///
    /// Leading slashes are ignored and `..` segments cannot escape the root.
    #[track_caller]
    pub fn new(path: impl AsRef<Path>) -> Self {
        let normalized = normalize(&path.as_ref().to_string_lossy());
        let mut interner = INTERNER.write().unwrap();
        if let Some(&id) = interner.to_id.get(&normalized) {
            return id;
        }

        let num = interner.from_id.len().try_into().expect("out of file ids");
        let id = FileId(num);
        interner.to_id.insert(normalized.clone(), id);
        interner.from_id.push(normalized);
        id
    }

    /// The normalized, root-relative path of the file.
    pub fn path(&self) -> EcoString {
        INTERNER.read().unwrap().from_id[usize::from(self.0)].clone()
    }

    /// The directory the file resides in, relative to the root. Empty for
    /// files directly in the root.
    pub fn dir(&self) -> EcoString {
        let path = self.path();
        match path.rsplit_once('/') {
            Some((dir, _)) => dir.into(),
            None => EcoString::new(),
        }
    }

    /// Resolve an include target relative to this file.
    ///
    /// The target is interpreted relative to the directory of this file. A
    /// target without an extension gets the `.tex` extension, like `\input`
    /// does.
    pub fn join(self, target: &str) -> Self {
        let target = target.trim();
        let mut joined = if target.starts_with('/') {
            EcoString::from(target)
        } else {
            let dir = self.dir();
            if dir.is_empty() {
                target.into()
            } else {
                ecow::eco_format!("{dir}/{target}")
            }
        };

        let name = joined.rsplit('/').next().unwrap_or_default();
        if !name.is_empty() && !name.contains('.') {
            joined.push('.');
            joined.push_str(TEX_EXTENSION);
        }

        Self::new(joined.as_str())
    }

    /// Construct from a raw number.
    ///
    /// Should only be used with numbers retrieved via
    /// [`into_raw`](Self::into_raw).
    pub const fn from_raw(v: u16) -> Self {
        Self(v)
    }

    /// Extract the raw underlying number.
    pub const fn into_raw(self) -> u16 {
        self.0
    }
}

impl Debug for FileId {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{:?}", self.path())
    }
}

/// Normalize a root-relative path.
fn normalize(path: &str) -> EcoString {
    let mut segments: Vec<&str> = vec![];
    for segment in path.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    let mut normalized = EcoString::new();
    for (i, segment) in segments.iter().enumerate() {
        if i > 0 {
            normalized.push('/');
        }
        normalized.push_str(segment);
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_id_interning() {
        assert_eq!(FileId::new("main.tex"), FileId::new("/main.tex"));
        assert_eq!(FileId::new("a/./b/../c.tex"), FileId::new("a/c.tex"));
        assert_ne!(FileId::new("a.tex"), FileId::new("b.tex"));
        assert_eq!(FileId::new("../../x.tex").path(), "x.tex");
    }

    #[test]
    fn test_file_id_join() {
        let main = FileId::new("thesis/main.tex");
        assert_eq!(main.join("chapters/intro").path(), "thesis/chapters/intro.tex");
        assert_eq!(main.join("../shared/macros.sty").path(), "shared/macros.sty");
        assert_eq!(main.join("/preamble").path(), "preamble.tex");
        assert_eq!(FileId::new("root.tex").join("a").path(), "a.tex");
    }
}
