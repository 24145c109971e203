//! Backend selection.
//!
//! Exactly one backend is active per run. It is chosen once from
//! configuration and handed to the emission pool as a [`Backend`] value.

use crate::profile::Profile;
use crate::traits::{GenerateError, GeneratedFile, Generator};
use protogen_schema::{Schema, TypeDef};

#[cfg(not(any(feature = "backend-java", feature = "backend-kotlin")))]
compile_error!("protogen-codegen needs at least one of `backend-java` or `backend-kotlin`");

/// The target language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Java,
    Kotlin,
}

impl BackendKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Java => "java",
            Self::Kotlin => "kotlin",
        }
    }

    /// Which profile this backend reads.
    pub fn profile_name(self, options: &GeneratorOptions) -> &'static str {
        match self {
            Self::Java if options.android => "android",
            Self::Java => "java",
            Self::Kotlin => "kotlin",
        }
    }

    /// Whether this build carries the backend.
    pub fn is_available(self) -> bool {
        match self {
            Self::Java => cfg!(feature = "backend-java"),
            Self::Kotlin => cfg!(feature = "backend-kotlin"),
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Backend-specific switches, passed through untouched by the driver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GeneratorOptions {
    /// Emit Android-specific code (Parcelable). Implies `android_annotations`.
    pub android: bool,
    pub android_annotations: bool,
    /// Skip `equals`/`hashCode`/`toString` (Java).
    pub compact: bool,
}

impl GeneratorOptions {
    pub fn annotations(&self) -> bool {
        self.android || self.android_annotations
    }
}

/// The active generator.
pub enum Backend {
    #[cfg(feature = "backend-java")]
    Java(crate::java::JavaGenerator),
    #[cfg(feature = "backend-kotlin")]
    Kotlin(crate::kotlin::KotlinGenerator),
}

impl Backend {
    /// Build the generator for `kind` over the pruned `schema`.
    pub fn new(
        kind: BackendKind,
        schema: &Schema,
        profile: &Profile,
        options: GeneratorOptions,
    ) -> Result<Self, GenerateError> {
        match kind {
            #[cfg(feature = "backend-java")]
            BackendKind::Java => Ok(Self::Java(crate::java::JavaGenerator::new(
                schema, profile, options,
            ))),
            #[cfg(feature = "backend-kotlin")]
            BackendKind::Kotlin => Ok(Self::Kotlin(crate::kotlin::KotlinGenerator::new(
                schema, profile, options,
            ))),
            #[allow(unreachable_patterns)]
            other => Err(GenerateError::Unavailable(other.name())),
        }
    }

    fn generator(&self) -> &dyn Generator {
        match self {
            #[cfg(feature = "backend-java")]
            Self::Java(generator) => generator,
            #[cfg(feature = "backend-kotlin")]
            Self::Kotlin(generator) => generator,
        }
    }
}

impl Generator for Backend {
    fn name(&self) -> &'static str {
        self.generator().name()
    }

    fn extension(&self) -> &'static str {
        self.generator().extension()
    }

    fn generate(&self, ty: &TypeDef) -> Result<GeneratedFile, GenerateError> {
        self.generator().generate(ty)
    }
}
