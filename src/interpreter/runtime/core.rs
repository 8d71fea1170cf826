use std::{
    collections::{HashMap, HashSet},
    io::{self, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

use parking_lot::Mutex;

use crate::interpreter::{runtime::task::TaskGroup, value::core::Value};

/// Where `print` and `println` write.
#[derive(Debug, Clone, Default)]
pub enum Output {
    /// The process's standard output.
    #[default]
    Stdout,
    /// An in-memory buffer, used to capture what a script prints.
    Buffer(Arc<Mutex<String>>),
}

impl Output {
    /// Creates an empty capture buffer.
    #[must_use]
    pub fn buffer() -> Self {
        Self::Buffer(Arc::new(Mutex::new(String::new())))
    }

    /// Writes `text` followed by a newline as one unit, so lines printed by
    /// concurrent tasks never interleave.
    pub fn write_line(&self, text: &str) {
        match self {
            Self::Stdout => {
                let mut stdout = io::stdout().lock();
                // A closed stdout is not a script error.
                let _ = writeln!(stdout, "{text}");
            },
            Self::Buffer(buffer) => {
                let mut buffer = buffer.lock();
                buffer.push_str(text);
                buffer.push('\n');
            },
        }
    }

    /// Everything captured so far. Always empty for [`Output::Stdout`].
    #[must_use]
    pub fn contents(&self) -> String {
        match self {
            Self::Stdout => String::new(),
            Self::Buffer(buffer) => buffer.lock().clone(),
        }
    }
}

/// What the import registry knows about a file when it is imported.
#[derive(Debug)]
pub enum ImportState {
    /// The file ran before; these are its exported bindings.
    Loaded(Vec<(String, Value)>),
    /// The file is still being loaded further up the import chain.
    Cycle,
    /// First import; the caller must load it and then call
    /// [`ImportRegistry::finish`] or [`ImportRegistry::abort`].
    Started,
}

/// Tracks loaded modules so that each file runs at most once.
#[derive(Debug, Default)]
pub struct ImportRegistry {
    loaded:  HashMap<PathBuf, Vec<(String, Value)>>,
    loading: HashSet<PathBuf>,
}

impl ImportRegistry {
    /// Classifies `path` and marks it as loading when it is new.
    pub fn begin(&mut self, path: &Path) -> ImportState {
        if let Some(exports) = self.loaded.get(path) {
            return ImportState::Loaded(exports.clone());
        }
        if !self.loading.insert(path.to_path_buf()) {
            return ImportState::Cycle;
        }
        ImportState::Started
    }

    /// Records the exports of a module that finished loading.
    pub fn finish(&mut self, path: &Path, exports: Vec<(String, Value)>) {
        self.loading.remove(path);
        self.loaded.insert(path.to_path_buf(), exports);
    }

    /// Forgets a module whose load failed, so a later import retries it.
    pub fn abort(&mut self, path: &Path) {
        self.loading.remove(path);
    }
}

/// State shared by everything a program runs: the main script, the modules
/// it imports and every task it starts.
#[derive(Debug, Default)]
pub struct Runtime {
    pub tasks:   Arc<TaskGroup>,
    pub output:  Output,
    pub imports: Mutex<ImportRegistry>,
}

impl Runtime {
    /// A runtime that prints to standard output.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A runtime that prints to `output`.
    #[must_use]
    pub fn with_output(output: Output) -> Self {
        Self { output,
               ..Self::default() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_detects_cycles_and_caches_exports() {
        let mut registry = ImportRegistry::default();
        let path = Path::new("/lib/a.r2");

        assert!(matches!(registry.begin(path), ImportState::Started));
        assert!(matches!(registry.begin(path), ImportState::Cycle));

        registry.finish(path, vec![("x".to_string(), Value::from(1.0))]);
        match registry.begin(path) {
            ImportState::Loaded(exports) => assert_eq!(exports[0].0, "x"),
            other => panic!("unexpected state: {other:?}"),
        }
    }

    #[test]
    fn aborted_import_can_be_retried() {
        let mut registry = ImportRegistry::default();
        let path = Path::new("/lib/b.r2");

        registry.begin(path);
        registry.abort(path);
        assert!(matches!(registry.begin(path), ImportState::Started));
    }

    #[test]
    fn buffer_collects_lines() {
        let output = Output::buffer();
        output.write_line("a");
        output.clone().write_line("b");
        assert_eq!(output.contents(), "a\nb\n");
    }
}
