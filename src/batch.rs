//! # Batch Driver
//!
//! File and directory entry points on top of the [`Engine`]. A single file
//! fails fast; a directory batch records each file's failure and carries on.

use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    discovery::SourceDiscoverer,
    engine::Engine,
    errors::{SourceContext, ZenvError},
    validation,
};

/// Aggregate outcome of a directory batch.
#[derive(Debug, Default, Serialize)]
pub struct BatchResult {
    pub total: usize,
    pub transpiled: usize,
    pub errors: usize,
    pub failures: Vec<FileFailure>,
}

#[derive(Debug, Serialize)]
pub struct FileFailure {
    pub path: PathBuf,
    pub line: Option<usize>,
    pub message: String,
    #[serde(skip)]
    pub error: ZenvError,
}

impl BatchResult {
    pub fn is_success(&self) -> bool {
        self.errors == 0
    }

    fn record(&mut self, path: PathBuf, outcome: Result<String, ZenvError>) {
        self.total += 1;
        match outcome {
            Ok(_) => self.transpiled += 1,
            Err(error) => {
                warn!(path = %path.display(), "{}", error);
                self.errors += 1;
                self.failures.push(FileFailure {
                    line: error.line(),
                    message: error.to_string(),
                    path,
                    error,
                });
            }
        }
    }
}

impl Engine {
    /// Transpiles one file, writing the result to `output` when given.
    pub fn transpile_file(&self, input: &Path, output: Option<&Path>) -> Result<String, ZenvError> {
        if !input.exists() {
            return Err(ZenvError::file_not_found(input));
        }
        let source = fs::read_to_string(input).map_err(|e| ZenvError::io(input, e))?;
        let name = input.display().to_string();
        let target = self.transpile_named(&source, &name)?;

        if self.config().validate {
            validation::check_target(&target, &SourceContext::from_file(name.as_str(), source))?;
        }
        if let Some(output) = output {
            write_output(output, &target)?;
            debug!(input = %input.display(), output = %output.display(), "wrote target");
        }
        Ok(target)
    }

    /// Transpiles every dialect file in `input_dir`. Target files go under
    /// `output_dir`, mirroring the input tree; nothing is written without it.
    pub fn transpile_directory(
        &self,
        input_dir: &Path,
        output_dir: Option<&Path>,
        recursive: bool,
    ) -> Result<BatchResult, ZenvError> {
        if !input_dir.is_dir() {
            return Err(ZenvError::not_a_directory(input_dir));
        }
        let discoverer = SourceDiscoverer::new(self.config());
        let jobs: Vec<(PathBuf, Option<PathBuf>)> = discoverer
            .discover(input_dir, recursive)?
            .into_iter()
            .map(|file| {
                let output = output_dir.map(|dir| discoverer.output_path(input_dir, &file, dir));
                (file, output)
            })
            .collect();

        let mut result = BatchResult::default();
        for (path, outcome) in self.run_jobs(jobs) {
            result.record(path, outcome);
        }
        info!(
            dir = %input_dir.display(),
            total = result.total,
            transpiled = result.transpiled,
            errors = result.errors,
            "batch finished"
        );
        Ok(result)
    }

    /// Transpiles the jobs, in parallel unless `jobs` is 1. Results come back
    /// in job order.
    fn run_jobs(
        &self,
        jobs: Vec<(PathBuf, Option<PathBuf>)>,
    ) -> Vec<(PathBuf, Result<String, ZenvError>)> {
        let run = |(input, output): (PathBuf, Option<PathBuf>)| {
            let outcome = self.transpile_file(&input, output.as_deref());
            (input, outcome)
        };
        match self.config().jobs {
            Some(1) => jobs.into_iter().map(run).collect(),
            Some(threads) => match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
                Ok(pool) => pool.install(|| jobs.into_par_iter().map(run).collect()),
                Err(e) => {
                    warn!("falling back to the global thread pool: {}", e);
                    jobs.into_par_iter().map(run).collect()
                }
            },
            None => jobs.into_par_iter().map(run).collect(),
        }
    }
}

fn write_output(path: &Path, target: &str) -> Result<(), ZenvError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| ZenvError::io(parent, e))?;
    }
    fs::write(path, target).map_err(|e| ZenvError::io(path, e))
}
