//! Dependency pruning.
//!
//! Marks every root type selected by an [`IdentifierSet`], follows dependency
//! edges from the roots, then sweeps everything unmarked. Excluded types are
//! never marked, even when a retained type depends on them; the dependent keeps
//! a reference to a type no longer in the schema.

use crate::identifier::IdentifierSet;
use crate::ir::{Schema, TypeDef, TypeDefKind};
use std::collections::{HashMap, HashSet, VecDeque};

/// The pruned schema plus rules that matched nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pruned {
    pub schema: Schema,
    pub unused_includes: Vec<String>,
    pub unused_excludes: Vec<String>,
}

impl Schema {
    /// Keep only types reachable from the roots `identifiers` selects.
    ///
    /// An empty identifier set returns the schema unchanged.
    pub fn prune(self, identifiers: &IdentifierSet) -> Pruned {
        if identifiers.is_empty() {
            return Pruned {
                schema: self,
                unused_includes: Vec::new(),
                unused_excludes: Vec::new(),
            };
        }

        let mut tracker = identifiers.tracker();
        let marked = {
            let index: HashMap<&str, &TypeDef> =
                self.types().map(|t| (t.name.as_str(), t)).collect();
            let mut marked: HashSet<String> = HashSet::new();
            let mut queue: VecDeque<&str> = VecDeque::new();

            for ty in self.types() {
                // Both sides are checked so every matching rule counts as used.
                let included = tracker.is_included(&ty.name);
                let excluded = tracker.is_excluded(&ty.name);
                if included && !excluded {
                    marked.insert(ty.name.clone());
                    queue.push_back(&ty.name);
                }
            }

            while let Some(name) = queue.pop_front() {
                let Some(ty) = index.get(name) else {
                    continue;
                };
                for dependency in ty.dependencies() {
                    if marked.contains(dependency) {
                        continue;
                    }
                    if !index.contains_key(dependency) {
                        tracing::debug!(from = name, to = dependency, "dangling reference");
                        continue;
                    }
                    if tracker.is_excluded(dependency) {
                        tracing::debug!(from = name, to = dependency, "excluded dependency");
                        continue;
                    }
                    marked.insert(dependency.to_string());
                    queue.push_back(dependency);
                }
            }
            marked
        };

        let unused_includes = tracker.unused_includes();
        let unused_excludes = tracker.unused_excludes();

        let files = self
            .files
            .into_iter()
            .filter_map(|mut file| {
                file.types = file
                    .types
                    .into_iter()
                    .filter_map(|ty| sweep(ty, &marked))
                    .collect();
                (!file.types.is_empty()).then_some(file)
            })
            .collect();

        Pruned {
            schema: Schema { files },
            unused_includes,
            unused_excludes,
        }
    }
}

/// Drop `ty` unless it or one of its nested types is marked. A type kept only
/// for its nested types becomes an enclosing shell.
fn sweep(ty: TypeDef, marked: &HashSet<String>) -> Option<TypeDef> {
    let nested: Vec<TypeDef> = ty
        .nested
        .into_iter()
        .filter_map(|n| sweep(n, marked))
        .collect();

    if marked.contains(&ty.name) {
        Some(TypeDef { nested, ..ty })
    } else if !nested.is_empty() {
        Some(TypeDef {
            kind: TypeDefKind::Enclosing,
            nested,
            ..ty
        })
    } else {
        None
    }
}
