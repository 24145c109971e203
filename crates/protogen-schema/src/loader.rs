//! Loading and linking `.proto` files into a [`Schema`].

use crate::ir::{FieldType, ProtoFile, Schema, TypeDef, TypeDefKind};
use crate::parse::{ParseError, parse_proto};
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to walk {}: {source}", root.display())]
    Walk {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error("file not found: {path} (searched {})", display_roots(roots))]
    NotFound { path: String, roots: Vec<PathBuf> },
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("{file}: unable to resolve '{reference}' referenced by {referrer}")]
    UnresolvedType {
        file: String,
        referrer: String,
        reference: String,
    },
    #[error("type {name} is defined in both {first} and {second}")]
    DuplicateType {
        name: String,
        first: String,
        second: String,
    },
}

fn display_roots(roots: &[PathBuf]) -> String {
    roots
        .iter()
        .map(|r| r.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Something that produces a linked schema.
pub trait SchemaLoader {
    fn load(&self) -> Result<Schema, LoadError>;
}

/// Loads `.proto` files from a list of source roots.
///
/// Named files are loaded along with everything they import. With no named
/// files, every `.proto` under every root is loaded.
#[derive(Debug, Clone, Default)]
pub struct ProtoLoader {
    roots: Vec<PathBuf>,
    protos: Vec<String>,
}

impl ProtoLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_source(&mut self, root: impl Into<PathBuf>) -> &mut Self {
        self.roots.push(root.into());
        self
    }

    pub fn add_proto(&mut self, path: impl Into<String>) -> &mut Self {
        self.protos.push(path.into());
        self
    }

    /// Find `path` under the first root that has it.
    fn resolve(&self, path: &str) -> Result<PathBuf, LoadError> {
        self.roots
            .iter()
            .map(|root| root.join(path))
            .find(|candidate| candidate.is_file())
            .ok_or_else(|| LoadError::NotFound {
                path: path.to_string(),
                roots: self.roots.clone(),
            })
    }

    /// Every `.proto` file under every root, relative to its root.
    ///
    /// Any entry that can't be walked fails discovery.
    fn discover(&self) -> Result<Vec<String>, LoadError> {
        let mut found = Vec::new();
        for root in &self.roots {
            let mut paths = Vec::new();
            for entry in WalkDir::new(root) {
                let entry = entry.map_err(|source| LoadError::Walk {
                    root: root.clone(),
                    source,
                })?;
                if entry.file_type().is_file()
                    && entry.path().extension().is_some_and(|ext| ext == "proto")
                    && let Some(path) = relative_path(root, entry.path())
                {
                    paths.push(path);
                }
            }
            paths.sort();
            found.extend(paths);
        }
        Ok(found)
    }

    fn read(&self, path: &str) -> Result<ProtoFile, LoadError> {
        let resolved = self.resolve(path)?;
        let source = std::fs::read_to_string(&resolved).map_err(|source| LoadError::Io {
            path: resolved.clone(),
            source,
        })?;
        tracing::debug!(path, resolved = %resolved.display(), "loaded proto");
        Ok(parse_proto(path, &source)?)
    }
}

impl SchemaLoader for ProtoLoader {
    fn load(&self) -> Result<Schema, LoadError> {
        let mut pending: VecDeque<String> = if self.protos.is_empty() {
            self.discover()?.into()
        } else {
            self.protos.iter().cloned().collect()
        };

        let mut seen: HashSet<String> = HashSet::new();
        let mut files = Vec::new();
        while let Some(path) = pending.pop_front() {
            if !seen.insert(path.clone()) {
                continue;
            }
            let file = self.read(&path)?;
            pending.extend(file.imports.iter().cloned());
            files.push(file);
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));
        link(Schema { files })
    }
}

/// Turn a path under `root` into a `/`-separated relative path.
fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<&str> = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<_>>()?;
    Some(parts.join("/"))
}

/// Resolve every type reference to a fully-qualified name.
pub fn link(mut schema: Schema) -> Result<Schema, LoadError> {
    let mut defined: HashMap<String, String> = HashMap::new();
    for file in &schema.files {
        for ty in file.all_types() {
            if let Some(first) = defined.insert(ty.name.clone(), file.path.clone()) {
                return Err(LoadError::DuplicateType {
                    name: ty.name.clone(),
                    first,
                    second: file.path.clone(),
                });
            }
        }
    }
    let names: HashSet<&str> = defined.keys().map(String::as_str).collect();

    for file in &mut schema.files {
        for ty in &mut file.types {
            link_type(&file.path, ty, &names)?;
        }
    }
    Ok(schema)
}

fn link_type(file: &str, ty: &mut TypeDef, names: &HashSet<&str>) -> Result<(), LoadError> {
    let scope = ty.name.clone();
    let resolve = |reference: &str| {
        resolve_reference(&scope, reference, names).ok_or_else(|| LoadError::UnresolvedType {
            file: file.to_string(),
            referrer: scope.clone(),
            reference: reference.to_string(),
        })
    };

    match &mut ty.kind {
        TypeDefKind::Message(message) => {
            for field in &mut message.fields {
                if let FieldType::Named(reference) = &field.ty {
                    field.ty = FieldType::Named(resolve(reference)?);
                }
            }
        }
        TypeDefKind::Service(service) => {
            for rpc in &mut service.rpcs {
                rpc.request = resolve(&rpc.request)?;
                rpc.response = resolve(&rpc.response)?;
            }
        }
        TypeDefKind::Enum(_) | TypeDefKind::Enclosing => {}
    }

    for nested in &mut ty.nested {
        link_type(file, nested, names)?;
    }
    Ok(())
}

/// Protobuf scoping: try `reference` in the innermost scope first, then each
/// enclosing scope outward. A leading `.` makes the reference absolute.
fn resolve_reference(scope: &str, reference: &str, names: &HashSet<&str>) -> Option<String> {
    if let Some(absolute) = reference.strip_prefix('.') {
        return names.contains(absolute).then(|| absolute.to_string());
    }

    let mut scope = scope;
    loop {
        let candidate = if scope.is_empty() {
            reference.to_string()
        } else {
            format!("{scope}.{reference}")
        };
        if names.contains(candidate.as_str()) {
            return Some(candidate);
        }
        if scope.is_empty() {
            return None;
        }
        scope = scope.rsplit_once('.').map(|(outer, _)| outer).unwrap_or("");
    }
}
