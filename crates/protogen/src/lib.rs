//! protogen: a protocol buffer compiler for Java and Kotlin.
//!
//! A compile loads a schema, optionally prunes it to a set of root types,
//! queues every surviving top-level type and lets a fixed pool of workers
//! render and write one file per type.
//!
//! ```text
//! ProtoLoader ─> Schema ─> prune(IdentifierSet) ─> WorkQueue ─> EmissionPool ─> Sink
//!                                                      ^             |
//!                                                  Backend ──────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use protogen::{Compiler, CompilerConfig, OutputTarget};
//! use protogen_codegen::BackendKind;
//!
//! let mut config = CompilerConfig::new(OutputTarget::new(BackendKind::Java, "gen"));
//! config.proto_paths.push("protos".into());
//! let report = Compiler::new(config).compile()?;
//! println!("wrote {} files", report.files.len());
//! # Ok::<(), protogen::CompileError>(())
//! ```

pub mod cli;
pub mod config;
pub mod driver;
pub mod error;
pub mod pool;
pub mod queue;
pub mod sink;

pub use config::{
    CompilerConfig, ConfigError, DEFAULT_CONCURRENCY, DESCRIPTOR_PROTO, FileConfig, OutputTarget,
};
pub use driver::{CompileReport, Compiler};
pub use error::{CompileError, EmitError};
pub use pool::{EmissionPool, ShutdownSignal};
pub use queue::WorkQueue;
pub use sink::{DryRunSink, FsSink, Sink};
