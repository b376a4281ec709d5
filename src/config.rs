//! Engine configuration, read from `zenv.yaml`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::ZenvError;

/// File the CLI looks for in the working directory.
pub const CONFIG_FILE: &str = "zenv.yaml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Dialect file extensions picked up by directory batches.
    pub extensions: Vec<String>,
    /// Extension given to produced files.
    pub output_extension: String,
    /// Batch output directory, relative to the input directory.
    pub output_dir: PathBuf,
    /// Worker threads for directory batches; `None` uses rayon's default.
    pub jobs: Option<usize>,
    /// Parse every produced file with the target parser.
    pub validate: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            extensions: vec!["zv".to_string(), "zenv".to_string()],
            output_extension: "py".to_string(),
            output_dir: PathBuf::from("transpiled"),
            jobs: None,
            validate: false,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ZenvError> {
        if !path.exists() {
            return Err(ZenvError::file_not_found(path));
        }
        let text = fs::read_to_string(path).map_err(|e| ZenvError::io(path, e))?;
        Self::from_yaml(&text, path)
    }

    pub fn from_yaml(text: &str, path: &Path) -> Result<Self, ZenvError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).map_err(|e| {
            ZenvError::io(
                path,
                std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()),
            )
        })
    }

    /// `zenv.yaml` from the working directory when present, defaults otherwise.
    pub fn discover() -> Result<Self, ZenvError> {
        let path = Path::new(CONFIG_FILE);
        if path.is_file() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// True when `path` carries one of the configured dialect extensions.
    pub fn is_dialect_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e == ext))
    }
}
