//! Code generators for protogen.
//!
//! A [`Generator`] renders one top-level type definition, with everything
//! nested inside it, into a single source file. Generators never write to
//! disk; the caller decides what to do with each [`GeneratedFile`].
//!
//! # Feature Flags
//!
//! - `backend-java` (default): Java classes, enums and interfaces
//! - `backend-kotlin` (default): Kotlin data classes, enum classes and interfaces
//!
//! # Profiles
//!
//! A [`Profile`] maps proto types to existing target-language types. It is
//! read by [`ProfileLoader`] from `<name>.profile.toml` in the source roots.

pub mod backend;
pub mod names;
pub mod profile;
pub mod traits;

#[cfg(feature = "backend-java")]
pub mod java;

#[cfg(feature = "backend-kotlin")]
pub mod kotlin;

pub use backend::{Backend, BackendKind, GeneratorOptions};
pub use names::{MARKER, NameTable};
pub use profile::{Profile, ProfileError, ProfileLoader, TypeConfig};
pub use traits::{GenerateError, GeneratedFile, Generator};

#[cfg(feature = "backend-java")]
pub use java::JavaGenerator;

#[cfg(feature = "backend-kotlin")]
pub use kotlin::KotlinGenerator;
