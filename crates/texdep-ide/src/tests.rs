use std::sync::Arc;

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;
use texdep_syntax::{Document, FileId};

use crate::World;
use crate::diag::{FileError, FileResult};

/// A world for analysis testing.
#[derive(Clone)]
pub struct TestWorld {
    pub main: Document,
    files: Arc<FxHashMap<FileId, Document>>,
}

impl TestWorld {
    /// Create a new world for a single test.
    pub fn new(text: &str) -> Self {
        Self {
            main: Document::new(Self::main_id(), text.into()),
            files: Arc::default(),
        }
    }

    /// Add an additional document to the test world.
    pub fn with_source(mut self, path: &str, text: &str) -> Self {
        let id = FileId::new(path);
        let document = Document::new(id, text.into());
        if id == Self::main_id() {
            self.main = document;
        } else {
            Arc::make_mut(&mut self.files).insert(id, document);
        }
        self
    }

    /// Replace a document with an edited version.
    pub fn update(&mut self, document: Document) {
        if document.id() == Self::main_id() {
            self.main = document;
        } else {
            Arc::make_mut(&mut self.files).insert(document.id(), document);
        }
    }

    /// The ID of the main file in a `TestWorld`.
    pub fn main_id() -> FileId {
        static ID: Lazy<FileId> = Lazy::new(|| FileId::new("main.tex"));
        *ID
    }
}

impl World for TestWorld {
    fn main(&self) -> FileId {
        self.main.id()
    }

    fn document(&self, id: FileId) -> FileResult<Document> {
        if id == self.main.id() {
            Ok(self.main.clone())
        } else if let Some(document) = self.files.get(&id) {
            Ok(document.clone())
        } else {
            Err(FileError::NotFound(id.path().as_str().into()))
        }
    }
}
