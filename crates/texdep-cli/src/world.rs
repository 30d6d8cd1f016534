use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};

use codespan_reporting::files::{Error as CodespanError, Files};
use ecow::eco_format;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use texdep_ide::World;
use texdep_ide::diag::{FileError, FileResult, StrResult};
use texdep_syntax::{Document, FileId, Lines};

use crate::args::SharedArgs;

type CodespanResult<T> = Result<T, CodespanError>;

/// A world that provides access to the operating system.
pub struct SystemWorld {
    /// The working directory.
    workdir: Option<PathBuf>,
    /// The root relative to which file ids are resolved.
    root: PathBuf,
    /// The input document.
    main: FileId,
    /// Maps file ids to loaded documents.
    slots: Mutex<FxHashMap<FileId, FileResult<Document>>>,
}

impl SystemWorld {
    /// Create a new system world.
    pub fn new(args: &SharedArgs) -> StrResult<Self> {
        Self::with_root(&args.input, args.root.as_deref())
    }

    /// Create a world for an input file below a root. Without a root, the
    /// input's directory is used.
    pub fn with_root(input: &Path, root: Option<&Path>) -> StrResult<Self> {
        // Resolve the system-global input path.
        let system_input = input.canonicalize().map_err(|_| {
            eco_format!("input file not found (searched at {})", input.display())
        })?;

        // Resolve the system-global root directory.
        let root = {
            let path = root.or_else(|| system_input.parent()).unwrap_or(Path::new("."));
            path.canonicalize().map_err(|_| {
                eco_format!("root directory not found (searched at {})", path.display())
            })?
        };

        // Resolve the input path within the project.
        let project_input = system_input
            .strip_prefix(&root)
            .map_err(|_| "input file must be contained in project root")?;

        Ok(Self {
            workdir: std::env::current_dir().ok(),
            main: FileId::new(project_input),
            root,
            slots: Mutex::default(),
        })
    }

    /// The root relative to which file ids are resolved.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The current working directory.
    pub fn workdir(&self) -> &Path {
        self.workdir.as_deref().unwrap_or(Path::new("."))
    }

    /// The path of a file on the system.
    pub fn path(&self, id: FileId) -> PathBuf {
        self.root.join(id.path().as_str())
    }

    /// Use an edited document from now on, without writing it to disk.
    pub fn update(&self, document: Document) {
        self.slots.lock().insert(document.id(), Ok(document));
    }

    /// Write a document to its file and use it from now on.
    #[tracing::instrument(skip_all)]
    pub fn write(&self, document: &Document) -> StrResult<()> {
        let path = self.path(document.id());
        tracing::info!("writing {}", path.display());
        fs::write(&path, document.text()).map_err(|err| FileError::from_io(err, &path))?;
        self.update(document.clone());
        Ok(())
    }

    /// The line index of a document, for diagnostics.
    fn lines(&self, id: FileId) -> CodespanResult<Lines<String>> {
        self.document(id)
            .map(|document| document.lines())
            .map_err(|_| CodespanError::FileMissing)
    }
}

impl World for SystemWorld {
    fn main(&self) -> FileId {
        self.main
    }

    #[tracing::instrument(skip_all)]
    fn document(&self, id: FileId) -> FileResult<Document> {
        let mut slots = self.slots.lock();
        slots
            .entry(id)
            .or_insert_with(|| {
                let path = self.path(id);
                tracing::debug!("loading {}", path.display());
                let buf = read(&path)?;
                let text = decode_utf8(buf)?;
                Ok(Document::new(id, text))
            })
            .clone()
    }
}

impl<'a> Files<'a> for SystemWorld {
    type FileId = FileId;
    type Name = String;
    type Source = Lines<String>;

    fn name(&'a self, id: FileId) -> CodespanResult<Self::Name> {
        // Try to express the path relative to the working directory.
        let path = self.path(id);
        Ok(pathdiff::diff_paths(&path, self.workdir())
            .as_deref()
            .unwrap_or(path.as_path())
            .to_string_lossy()
            .into())
    }

    fn source(&'a self, id: FileId) -> CodespanResult<Self::Source> {
        self.lines(id)
    }

    fn line_index(&'a self, id: FileId, given: usize) -> CodespanResult<usize> {
        let lines = self.lines(id)?;
        lines
            .byte_to_line(given)
            .ok_or_else(|| CodespanError::IndexTooLarge { given, max: lines.len_bytes() })
    }

    fn line_range(&'a self, id: FileId, given: usize) -> CodespanResult<Range<usize>> {
        let lines = self.lines(id)?;
        lines
            .line_to_range(given)
            .ok_or_else(|| CodespanError::LineTooLarge { given, max: lines.len_lines() })
    }

    fn column_number(
        &'a self,
        id: FileId,
        _: usize,
        given: usize,
    ) -> CodespanResult<usize> {
        let lines = self.lines(id)?;
        lines.byte_to_column(given).ok_or_else(|| {
            let max = lines.len_bytes();
            if given <= max {
                CodespanError::InvalidCharBoundary { given }
            } else {
                CodespanError::IndexTooLarge { given, max }
            }
        })
    }
}

/// Read a file.
#[tracing::instrument(skip_all)]
fn read(path: &Path) -> FileResult<Vec<u8>> {
    let f = |e| FileError::from_io(e, path);
    if fs::metadata(path).map_err(f)?.is_dir() {
        Err(FileError::IsDirectory)
    } else {
        fs::read(path).map_err(f)
    }
}

/// Decode UTF-8 with an optional BOM.
fn decode_utf8(buf: Vec<u8>) -> FileResult<String> {
    Ok(if buf.starts_with(b"\xef\xbb\xbf") {
        // Remove UTF-8 BOM.
        std::str::from_utf8(&buf[3..])?.into()
    } else {
        // Assume UTF-8.
        String::from_utf8(buf)?
    })
}
