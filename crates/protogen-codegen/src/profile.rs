//! Backend profiles: per-type overrides loaded from `<name>.profile.toml`.
//!
//! ```toml
//! [types."squareup.geology.Period"]
//! target = "java.time.Period"
//! adapter = "com.example.PeriodAdapter"
//! ```

use protogen_schema::Schema;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
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
    #[error("{}: unknown type {name}", path.display())]
    UnknownType { path: PathBuf, name: String },
}

/// Type overrides for one backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub types: BTreeMap<String, TypeConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TypeConfig {
    /// Target-language type that replaces the generated one in references.
    pub target: String,
    pub adapter: Option<String>,
}

impl Profile {
    pub fn get(&self, name: &str) -> Option<&TypeConfig> {
        self.types.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Entries in `other` replace entries of the same name here.
    pub fn merge(&mut self, other: Profile) {
        self.types.extend(other.types);
    }

    pub fn from_toml(path: &Path, contents: &str) -> Result<Self, ProfileError> {
        toml::from_str(contents).map_err(|source| ProfileError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Reads the profile called `name` from a list of roots.
pub struct ProfileLoader<'a> {
    name: String,
    roots: Vec<PathBuf>,
    schema: Option<&'a Schema>,
}

impl<'a> ProfileLoader<'a> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            roots: Vec::new(),
            schema: None,
        }
    }

    pub fn roots(mut self, roots: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        self.roots.extend(roots.into_iter().map(Into::into));
        self
    }

    /// Check every entry against `schema` while loading.
    pub fn schema(mut self, schema: &'a Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    fn file_name(&self) -> String {
        format!("{}.profile.toml", self.name)
    }

    /// Load and merge every matching file; later roots override earlier ones.
    /// No file at all yields an empty profile.
    pub fn load(self) -> Result<Profile, ProfileError> {
        let mut profile = Profile::default();
        for root in &self.roots {
            let path = root.join(self.file_name());
            if !path.is_file() {
                continue;
            }
            let contents = std::fs::read_to_string(&path).map_err(|source| ProfileError::Io {
                path: path.clone(),
                source,
            })?;
            let loaded = Profile::from_toml(&path, &contents)?;
            if let Some(schema) = self.schema
                && let Some(name) = loaded.types.keys().find(|n| schema.get(n).is_none())
            {
                return Err(ProfileError::UnknownType {
                    path,
                    name: name.clone(),
                });
            }
            tracing::debug!(path = %path.display(), types = loaded.types.len(), "loaded profile");
            profile.merge(loaded);
        }
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protogen_schema::{ProtoFile, TypeDef};
    use tempfile::TempDir;

    fn schema() -> Schema {
        let mut schema = Schema::new();
        schema.add(
            ProtoFile::new("geo.proto")
                .with_package("geo")
                .with_type(TypeDef::message("geo.Period", vec![])),
        );
        schema
    }

    #[test]
    fn test_missing_profile_is_empty() {
        let dir = TempDir::new().unwrap();
        let profile = ProfileLoader::new("java")
            .roots([dir.path()])
            .load()
            .unwrap();
        assert!(profile.is_empty());
    }

    #[test]
    fn test_load_and_override() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        std::fs::write(
            first.path().join("java.profile.toml"),
            "[types.\"geo.Period\"]\ntarget = \"java.time.Period\"\nadapter = \"a.A\"\n",
        )
        .unwrap();
        std::fs::write(
            second.path().join("java.profile.toml"),
            "[types.\"geo.Period\"]\ntarget = \"org.threeten.Period\"\n",
        )
        .unwrap();

        let schema = schema();
        let profile = ProfileLoader::new("java")
            .roots([first.path(), second.path()])
            .schema(&schema)
            .load()
            .unwrap();
        let period = profile.get("geo.Period").unwrap();
        assert_eq!(period.target, "org.threeten.Period");
        assert_eq!(period.adapter, None);
    }

    #[test]
    fn test_only_named_profile_is_read() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("android.profile.toml"),
            "[types.\"geo.Period\"]\ntarget = \"x.Y\"\n",
        )
        .unwrap();
        let profile = ProfileLoader::new("java")
            .roots([dir.path()])
            .load()
            .unwrap();
        assert!(profile.is_empty());
    }

    #[test]
    fn test_unknown_type() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("kotlin.profile.toml"),
            "[types.\"geo.Missing\"]\ntarget = \"x.Y\"\n",
        )
        .unwrap();
        let schema = schema();
        let err = ProfileLoader::new("kotlin")
            .roots([dir.path()])
            .schema(&schema)
            .load()
            .unwrap_err();
        assert!(matches!(err, ProfileError::UnknownType { ref name, .. } if name == "geo.Missing"));
    }

    #[test]
    fn test_malformed_profile() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("java.profile.toml"), "[types.\"a\"]\n").unwrap();
        let err = ProfileLoader::new("java")
            .roots([dir.path()])
            .load()
            .unwrap_err();
        assert!(matches!(err, ProfileError::Parse { .. }));
    }
}
