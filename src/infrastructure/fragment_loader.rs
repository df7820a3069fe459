// Fragment loaders.
//
// Fragment identifiers are dotted module names; how they map to source
// text is the loader's concern alone. The filesystem loader mirrors the
// conventional layout (`name` or `a.b` under a source directory); the
// in-memory loader backs tests and embedding.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;

use crate::domain::error::{Result, TangleError};
use crate::ports::FragmentLoader;

/// Loads fragment `a.b` from `<src_dir>/a/b.<extension>`.
pub struct FsFragmentLoader {
    src_dir: PathBuf,
    extension: String,
}

impl FsFragmentLoader {
    pub fn new(src_dir: impl Into<PathBuf>) -> Self {
        Self {
            src_dir: src_dir.into(),
            extension: "py".to_string(),
        }
    }

    pub fn with_extension(mut self, extension: &str) -> Self {
        self.extension = extension.to_string();
        self
    }

    pub fn fragment_path(&self, fragment: &str) -> PathBuf {
        let mut path = self.src_dir.clone();
        for part in fragment.split('.') {
            path.push(part);
        }
        path.set_extension(&self.extension);
        path
    }
}

impl FragmentLoader for FsFragmentLoader {
    fn load(&self, fragment: &str) -> Result<String> {
        let path = self.fragment_path(fragment);
        fs::read_to_string(&path).map_err(|source| TangleError::Load {
            fragment: format!("{} ({})", fragment, path.display()),
            source,
        })
    }
}

/// In-memory fragment table for tests and embedding.
#[derive(Default)]
pub struct MemoryFragmentLoader {
    fragments: HashMap<String, String>,
}

impl MemoryFragmentLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, fragment: &str, text: &str) {
        self.fragments.insert(fragment.to_string(), text.to_string());
    }
}

impl FragmentLoader for MemoryFragmentLoader {
    fn load(&self, fragment: &str) -> Result<String> {
        self.fragments
            .get(fragment)
            .cloned()
            .ok_or_else(|| TangleError::Load {
                fragment: fragment.to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, "no such fragment"),
            })
    }
}

/// Counts loads per fragment; wraps another loader so tests can assert
/// that the fragment cache memoizes.
pub struct CountingLoader<'a> {
    inner: &'a dyn FragmentLoader,
    counts: std::cell::RefCell<HashMap<String, u32>>,
}

impl<'a> CountingLoader<'a> {
    pub fn new(inner: &'a dyn FragmentLoader) -> Self {
        Self {
            inner,
            counts: std::cell::RefCell::new(HashMap::new()),
        }
    }

    pub fn count(&self, fragment: &str) -> u32 {
        self.counts.borrow().get(fragment).copied().unwrap_or(0)
    }
}

impl FragmentLoader for CountingLoader<'_> {
    fn load(&self, fragment: &str) -> Result<String> {
        *self.counts.borrow_mut().entry(fragment.to_string()).or_insert(0) += 1;
        self.inner.load(fragment)
    }
}
