//! Destinations for generated files.

use crate::error::EmitError;
use protogen_codegen::GeneratedFile;
use std::path::{Path, PathBuf};

/// Takes a generated file and reports where it went.
pub trait Sink: Send + Sync {
    fn emit(&self, file: &GeneratedFile) -> Result<PathBuf, EmitError>;
}

/// Writes files under an output directory, creating parents and
/// overwriting whatever is already there.
#[derive(Debug, Clone)]
pub struct FsSink {
    root: PathBuf,
}

impl FsSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Sink for FsSink {
    fn emit(&self, file: &GeneratedFile) -> Result<PathBuf, EmitError> {
        let path = self.root.join(&file.path);
        let io_error = |source| EmitError::Io {
            path: path.clone(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }
        std::fs::write(&path, &file.contents).map_err(io_error)?;
        tracing::debug!(path = %path.display(), "wrote");
        Ok(path)
    }
}

/// Reports the path a file would be written to, and nothing else.
#[derive(Debug, Clone)]
pub struct DryRunSink {
    root: PathBuf,
}

impl DryRunSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Sink for DryRunSink {
    fn emit(&self, file: &GeneratedFile) -> Result<PathBuf, EmitError> {
        Ok(self.root.join(&file.path))
    }
}
