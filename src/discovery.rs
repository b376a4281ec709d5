use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::{config::Config, errors::ZenvError};

/// Finds dialect source files under a directory.
#[derive(Debug)]
pub struct SourceDiscoverer<'a> {
    config: &'a Config,
}

impl<'a> SourceDiscoverer<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    // =====================
    // Public API - File Discovery
    // =====================

    /// Scans `root` for dialect files, descending into subdirectories only
    /// when `recursive` is set.
    ///
    /// The returned list is sorted so batches run in a deterministic order.
    pub fn discover<P: AsRef<Path>>(
        &self,
        root: P,
        recursive: bool,
    ) -> Result<Vec<PathBuf>, ZenvError> {
        let root = root.as_ref();
        let mut walker = WalkDir::new(root);
        if !recursive {
            walker = walker.max_depth(1);
        }

        let mut files = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(root).to_path_buf();
                ZenvError::io(&path, e.into())
            })?;

            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            if !self.config.is_dialect_file(path) {
                continue;
            }

            files.push(path.to_path_buf());
        }
        files.sort();
        Ok(files)
    }

    /// Where the target file for `file` lands inside `output_dir`, keeping
    /// its path relative to `root`.
    pub fn output_path(&self, root: &Path, file: &Path, output_dir: &Path) -> PathBuf {
        let relative = file.strip_prefix(root).unwrap_or(file);
        output_dir
            .join(relative)
            .with_extension(&self.config.output_extension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_discovers_sorted_dialect_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.zv"), "").unwrap();
        fs::write(dir.path().join("a.zenv"), "").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested/c.zv"), "").unwrap();

        let config = Config::default();
        let discoverer = SourceDiscoverer::new(&config);

        let flat = discoverer.discover(dir.path(), false).unwrap();
        assert_eq!(
            flat,
            vec![dir.path().join("a.zenv"), dir.path().join("b.zv")]
        );

        let deep = discoverer.discover(dir.path(), true).unwrap();
        assert_eq!(deep.len(), 3);
        assert!(deep.contains(&dir.path().join("nested/c.zv")));
    }

    #[test]
    fn test_output_path_mirrors_tree() {
        let config = Config::default();
        let discoverer = SourceDiscoverer::new(&config);
        assert_eq!(
            discoverer.output_path(
                Path::new("src"),
                Path::new("src/pkg/mod.zv"),
                Path::new("out")
            ),
            PathBuf::from("out/pkg/mod.py")
        );
    }
}
