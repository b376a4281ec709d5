//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::Path;

use tempfile::TempDir;
use zenv::Engine;

/// Transpiles with the default engine, panicking on error.
pub fn transpile(source: &str) -> String {
    Engine::new()
        .transpile(source)
        .unwrap_or_else(|e| panic!("transpile failed: {e}\n{source}"))
}

/// Creates a temporary directory holding `files` (relative path, content).
pub fn source_tree(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().expect("create temp dir");
    for (path, content) in files {
        write_file(&dir.path().join(path), content);
    }
    dir
}

pub fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dirs");
    }
    fs::write(path, content).expect("write file");
}
