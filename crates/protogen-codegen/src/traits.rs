//! The generator capability shared by every backend.

use protogen_schema::TypeDef;
use std::path::PathBuf;

/// One rendered source file, relative to the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub path: PathBuf,
    pub contents: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerateError {
    #[error("{referrer} refers to {reference}, which is not in the schema")]
    UnknownType { referrer: String, reference: String },
    #[error("type {0} is not part of the schema this generator was built for")]
    Undeclared(String),
    #[error("the {0} backend was not compiled into this build")]
    Unavailable(&'static str),
}

/// Renders one type definition into source text.
///
/// Generators are built once per run from the pruned schema and profile, then
/// shared across workers. `generate` never touches the filesystem and returns
/// the same output for the same input.
pub trait Generator: Send + Sync {
    /// Backend identifier (e.g. "java", "kotlin").
    fn name(&self) -> &'static str;

    /// File extension of generated files, without the dot.
    fn extension(&self) -> &'static str;

    /// Render `ty` and everything nested inside it.
    fn generate(&self, ty: &TypeDef) -> Result<GeneratedFile, GenerateError>;
}
