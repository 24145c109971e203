//! Command-line surface.
//!
//! Flag names follow the Wire compiler (`--proto_path`, `--java_out`, ...).

use crate::config::{CompilerConfig, ConfigError, FileConfig, OutputTarget};
use clap::Parser;
use protogen_codegen::BackendKind;
use protogen_schema::IdentifierSet;
use std::path::{Path, PathBuf};

/// Generate Java or Kotlin sources from .proto schemas.
#[derive(Debug, Default, Parser)]
#[command(name = "protogen", version)]
pub struct Cli {
    /// Directory to search for .proto files (repeatable)
    #[arg(long = "proto_path", value_name = "DIR")]
    pub proto_path: Vec<PathBuf>,

    /// Emit Java sources into DIR
    #[arg(long = "java_out", value_name = "DIR")]
    pub java_out: Option<PathBuf>,

    /// Emit Kotlin sources into DIR
    #[arg(long = "kotlin_out", value_name = "DIR")]
    pub kotlin_out: Option<PathBuf>,

    /// File listing .proto files to compile, one per line
    #[arg(long, value_name = "FILE")]
    pub files: Option<PathBuf>,

    /// Root types to keep, comma-separated (`pkg.Type` or `pkg.*`)
    #[arg(long, value_delimiter = ',', value_name = "RULES")]
    pub includes: Vec<String>,

    /// Types to drop, comma-separated; wins over --includes
    #[arg(long, value_delimiter = ',', value_name = "RULES")]
    pub excludes: Vec<String>,

    /// Suppress informational messages
    #[arg(long)]
    pub quiet: bool,

    /// Print the paths that would be written without writing them
    #[arg(long = "dry_run")]
    pub dry_run: bool,

    /// Only emit types from explicitly named files
    #[arg(long = "named_files_only")]
    pub named_files_only: bool,

    /// Generate Android-specific code (implies --android-annotations)
    #[arg(long)]
    pub android: bool,

    /// Annotate optional fields with @Nullable
    #[arg(long = "android-annotations")]
    pub android_annotations: bool,

    /// Omit equals, hashCode and toString
    #[arg(long)]
    pub compact: bool,

    /// Number of emission workers
    #[arg(long, value_name = "N")]
    pub concurrency: Option<usize>,

    /// Config file (default: ./protogen.toml if present)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print the compile report as JSON
    #[arg(long)]
    pub json: bool,

    /// Additional .proto files to compile
    #[arg(value_name = "FILES")]
    pub protos: Vec<String>,
}

impl Cli {
    /// The single output target. Zero or two backend flags is an error.
    pub fn target(&self) -> Result<OutputTarget, ConfigError> {
        match (&self.java_out, &self.kotlin_out) {
            (Some(dir), None) => Ok(OutputTarget::new(BackendKind::Java, dir)),
            (None, Some(dir)) => Ok(OutputTarget::new(BackendKind::Kotlin, dir)),
            (Some(_), Some(_)) => Err(ConfigError::ConflictingOutputs),
            (None, None) => Err(ConfigError::MissingOutput),
        }
    }

    /// Build the compiler configuration, reading config files relative to
    /// `cwd`.
    pub fn to_config(&self, cwd: &Path) -> Result<CompilerConfig, ConfigError> {
        let mut config = CompilerConfig::new(self.target()?);

        let file = match &self.config {
            Some(path) => Some(FileConfig::load_file(&cwd.join(path))?),
            None => FileConfig::discover(cwd)?,
        };
        if let Some(file) = &file {
            file.apply(&mut config);
        }

        if !self.proto_path.is_empty() {
            config.proto_paths = self.proto_path.clone();
        }
        if let Some(files) = &self.files {
            config.source_files = read_file_list(files)?;
        }
        config.source_files.extend(self.protos.iter().cloned());

        let mut identifiers = IdentifierSet::builder();
        for rule in self.includes.iter().filter(|r| !r.trim().is_empty()) {
            identifiers.include(rule.as_str());
        }
        for rule in self.excludes.iter().filter(|r| !r.trim().is_empty()) {
            identifiers.exclude(rule.as_str());
        }
        config.identifiers = identifiers.build()?;

        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }
        config.quiet |= self.quiet;
        config.dry_run |= self.dry_run;
        config.named_files_only |= self.named_files_only;
        config.options.android |= self.android;
        config.options.android_annotations |= self.android_annotations;
        config.options.compact |= self.compact;

        config.validate()?;
        Ok(config)
    }
}

/// Newline-separated file names; blank lines are skipped.
fn read_file_list(path: &Path) -> Result<Vec<String>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}
