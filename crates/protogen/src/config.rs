//! Compiler configuration.
//!
//! [`CompilerConfig`] is the validated, typed input to a compile. It can be
//! seeded from an optional `protogen.toml`:
//!
//! ```toml
//! [compile]
//! concurrency = 4
//! quiet = true
//! named_files_only = false
//! always_emit = ["google/protobuf/descriptor.proto"]
//! proto_path = ["protos", "third_party"]
//!
//! [java]
//! android = false
//! android_annotations = true
//! compact = false
//! ```
//!
//! Command-line flags override anything set in the file.

use protogen_codegen::{BackendKind, GeneratorOptions};
use protogen_schema::{IdentifierError, IdentifierSet};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Number of emission workers unless configured otherwise.
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Emitted even when `named_files_only` would skip it, so that types
/// depending on it still compile.
pub const DESCRIPTOR_PROTO: &str = "google/protobuf/descriptor.proto";

/// Name of the project config file looked up in the working directory.
pub const CONFIG_FILE: &str = "protogen.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("One of --java_out or --kotlin_out must be specified")]
    MissingOutput,
    #[error("Only one of --java_out or --kotlin_out flag must be specified")]
    ConflictingOutputs,
    #[error("the {0} backend is not available in this build")]
    BackendUnavailable(BackendKind),
    #[error("concurrency must be at least 1")]
    InvalidConcurrency,
    #[error(transparent)]
    Identifier(#[from] IdentifierError),
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Where generated files go, and which backend writes them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTarget {
    pub backend: BackendKind,
    pub directory: PathBuf,
}

impl OutputTarget {
    pub fn new(backend: BackendKind, directory: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            directory: directory.into(),
        }
    }
}

/// Everything one compile needs.
#[derive(Debug, Clone)]
pub struct CompilerConfig {
    /// Roots searched for `.proto` files and profiles, in order.
    pub proto_paths: Vec<PathBuf>,
    /// Explicitly named source files. Empty means every file under the roots.
    pub source_files: Vec<String>,
    pub identifiers: IdentifierSet,
    pub target: OutputTarget,
    pub options: GeneratorOptions,
    pub concurrency: usize,
    /// Files emitted regardless of `named_files_only`.
    pub always_emit: Vec<String>,
    pub quiet: bool,
    pub dry_run: bool,
    pub named_files_only: bool,
}

impl CompilerConfig {
    pub fn new(target: OutputTarget) -> Self {
        Self {
            proto_paths: Vec::new(),
            source_files: Vec::new(),
            identifiers: IdentifierSet::default(),
            target,
            options: GeneratorOptions::default(),
            concurrency: DEFAULT_CONCURRENCY,
            always_emit: vec![DESCRIPTOR_PROTO.to_string()],
            quiet: false,
            dry_run: false,
            named_files_only: false,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::InvalidConcurrency);
        }
        if !self.target.backend.is_available() {
            return Err(ConfigError::BackendUnavailable(self.target.backend));
        }
        Ok(())
    }
}

/// Contents of `protogen.toml`. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub compile: CompileSection,
    pub java: JavaSection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CompileSection {
    pub concurrency: Option<usize>,
    pub quiet: Option<bool>,
    pub named_files_only: Option<bool>,
    pub always_emit: Option<Vec<String>>,
    pub proto_path: Option<Vec<PathBuf>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct JavaSection {
    pub android: Option<bool>,
    pub android_annotations: Option<bool>,
    pub compact: Option<bool>,
}

impl FileConfig {
    /// Load config from a file path.
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// `protogen.toml` in `dir`, if there is one.
    pub fn discover(dir: &Path) -> Result<Option<Self>, ConfigError> {
        let path = dir.join(CONFIG_FILE);
        if path.is_file() {
            Self::load_file(&path).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Copy every value set in the file onto `config`.
    pub fn apply(&self, config: &mut CompilerConfig) {
        let compile = &self.compile;
        if let Some(concurrency) = compile.concurrency {
            config.concurrency = concurrency;
        }
        if let Some(quiet) = compile.quiet {
            config.quiet = quiet;
        }
        if let Some(named_files_only) = compile.named_files_only {
            config.named_files_only = named_files_only;
        }
        if let Some(always_emit) = &compile.always_emit {
            config.always_emit = always_emit.clone();
        }
        if let Some(proto_path) = &compile.proto_path {
            config.proto_paths = proto_path.clone();
        }

        let java = &self.java;
        if let Some(android) = java.android {
            config.options.android = android;
        }
        if let Some(android_annotations) = java.android_annotations {
            config.options.android_annotations = android_annotations;
        }
        if let Some(compact) = java.compact {
            config.options.compact = compact;
        }
    }
}
