//! The shared work queue drained by the emission pool.

use protogen_schema::{Schema, TypeDef};
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

/// Top-level types awaiting emission.
///
/// Filled once before the pool starts. Each [`pop`](Self::pop) hands an item
/// to exactly one caller.
#[derive(Debug, Default)]
pub struct WorkQueue {
    items: Mutex<VecDeque<TypeDef>>,
}

impl WorkQueue {
    pub fn new(items: impl IntoIterator<Item = TypeDef>) -> Self {
        Self {
            items: Mutex::new(items.into_iter().collect()),
        }
    }

    /// Enqueue every top-level type of every file that survives the filter.
    ///
    /// With a non-empty `named` list and `named_files_only` set, files not
    /// named are skipped unless listed in `always_emit`. Without
    /// `named_files_only`, every file is emitted.
    pub fn populate(
        schema: &Schema,
        named: &[String],
        named_files_only: bool,
        always_emit: &[String],
    ) -> Self {
        let mut items = VecDeque::new();
        for file in &schema.files {
            let listed = named.is_empty() || named.contains(&file.path);
            if !listed && named_files_only && !always_emit.contains(&file.path) {
                tracing::debug!(path = %file.path, "skipping unnamed file");
                continue;
            }
            items.extend(file.types.iter().cloned());
        }
        Self {
            items: Mutex::new(items),
        }
    }

    /// Take the next item, or `None` once the queue is exhausted.
    pub fn pop(&self) -> Option<TypeDef> {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }

    pub fn len(&self) -> usize {
        self.items.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
