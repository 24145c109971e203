use crate::config::ConfigError;
use protogen_codegen::{GenerateError, ProfileError};
use protogen_schema::LoadError;
use std::path::PathBuf;

/// Failure to produce one work item's file.
#[derive(Debug, thiserror::Error)]
pub enum EmitError {
    #[error("failed to generate {type_name}: {source}")]
    Generate {
        type_name: String,
        #[source]
        source: GenerateError,
    },
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Why a compile failed.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Profile(#[from] ProfileError),
    #[error(transparent)]
    Generate(#[from] GenerateError),
    #[error(transparent)]
    Emit(#[from] EmitError),
    #[error("interrupted before all files were emitted")]
    Interrupted,
    #[error("failed to start worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
    #[error("failed to serialize report: {0}")]
    Report(#[from] serde_json::Error),
}
