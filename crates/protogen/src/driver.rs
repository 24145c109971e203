//! The compile pipeline: load, prune, populate, generate, emit.

use crate::config::CompilerConfig;
use crate::error::CompileError;
use crate::pool::{EmissionPool, ShutdownSignal};
use crate::queue::WorkQueue;
use crate::sink::{DryRunSink, FsSink, Sink};
use protogen_codegen::{Backend, BackendKind, ProfileLoader};
use protogen_schema::{ProtoLoader, SchemaLoader};
use serde::Serialize;
use std::path::PathBuf;

/// What a compile produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompileReport {
    pub backend: BackendKind,
    pub dry_run: bool,
    /// Emitted (or, in a dry run, would-be) paths, sorted.
    pub files: Vec<PathBuf>,
    /// Types in the schema before pruning, nested types included.
    pub types_loaded: usize,
    /// Top-level types handed to the emission pool.
    pub types_emitted: usize,
    pub unused_includes: Vec<String>,
    pub unused_excludes: Vec<String>,
}

/// Runs one compile from a validated [`CompilerConfig`].
pub struct Compiler<L = ProtoLoader> {
    config: CompilerConfig,
    loader: L,
    shutdown: ShutdownSignal,
}

impl Compiler<ProtoLoader> {
    /// A compiler loading `.proto` files from the configured roots.
    pub fn new(config: CompilerConfig) -> Self {
        let mut loader = ProtoLoader::new();
        for root in &config.proto_paths {
            loader.add_source(root);
        }
        for file in &config.source_files {
            loader.add_proto(file);
        }
        Self::with_loader(config, loader)
    }
}

impl<L: SchemaLoader> Compiler<L> {
    pub fn with_loader(config: CompilerConfig, loader: L) -> Self {
        Self {
            config,
            loader,
            shutdown: ShutdownSignal::new(),
        }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Handle that stops the emission pool when raised.
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    pub fn compile(&self) -> Result<CompileReport, CompileError> {
        let config = &self.config;
        config.validate()?;

        let schema = self.loader.load()?;
        let types_loaded = schema.type_count();

        let (schema, unused_includes, unused_excludes) = if config.identifiers.is_empty() {
            (schema, Vec::new(), Vec::new())
        } else {
            if !config.quiet {
                tracing::info!("Analyzing dependencies of root types.");
            }
            let pruned = schema.prune(&config.identifiers);
            if !config.quiet {
                for rule in &pruned.unused_includes {
                    tracing::info!("Unused include: {rule}");
                }
                for rule in &pruned.unused_excludes {
                    tracing::info!("Unused exclude: {rule}");
                }
            }
            (
                pruned.schema,
                pruned.unused_includes,
                pruned.unused_excludes,
            )
        };

        let kind = config.target.backend;
        let profile = ProfileLoader::new(kind.profile_name(&config.options))
            .roots(&config.proto_paths)
            .schema(&schema)
            .load()?;
        let backend = Backend::new(kind, &schema, &profile, config.options)?;

        let queue = WorkQueue::populate(
            &schema,
            &config.source_files,
            config.named_files_only,
            &config.always_emit,
        );
        let types_emitted = queue.len();
        tracing::debug!(
            backend = %kind,
            types = types_emitted,
            workers = config.concurrency,
            "emitting"
        );

        let directory = &config.target.directory;
        let sink: Box<dyn Sink> = if config.dry_run {
            Box::new(DryRunSink::new(directory))
        } else {
            Box::new(FsSink::new(directory))
        };
        let files = EmissionPool::new(config.concurrency)
            .with_shutdown(self.shutdown.clone())
            .run(&queue, &backend, sink.as_ref())?;

        Ok(CompileReport {
            backend: kind,
            dry_run: config.dry_run,
            files,
            types_loaded,
            types_emitted,
            unused_includes,
            unused_excludes,
        })
    }
}
