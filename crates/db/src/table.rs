use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};

use parking_lot::RwLock;

/// A row that can live in a [`Table`].
///
/// Identifiers are assigned by the table on first save and never reused.
pub trait Record: Clone + Send + Sync + 'static {
    fn id(&self) -> Option<i64>;

    /// Called by the table when it assigns a fresh identifier.
    fn assign_id(&mut self, id: i64);
}

/// In-process table keyed by a sequence-generated identifier.
pub struct Table<R: Record> {
    name: &'static str,
    rows: RwLock<BTreeMap<i64, R>>,
    sequence: AtomicI64,
}

impl<R: Record> Table<R> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            rows: RwLock::new(BTreeMap::new()),
            sequence: AtomicI64::new(1),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Insert-or-update.
    ///
    /// A record whose id is already stored replaces that row. Any other
    /// record (no id, or an id the table never issued) is inserted under a
    /// freshly generated id.
    pub fn save(&self, mut record: R) -> R {
        let mut rows = self.rows.write();

        let id = match record.id() {
            Some(id) if rows.contains_key(&id) => id,
            _ => {
                let id = self.sequence.fetch_add(1, Ordering::SeqCst);
                record.assign_id(id);
                id
            }
        };

        rows.insert(id, record.clone());
        tracing::debug!(table = self.name, id, "row saved");
        record
    }

    pub fn get(&self, id: i64) -> Option<R> {
        self.rows.read().get(&id).cloned()
    }

    pub fn exists(&self, id: i64) -> bool {
        self.rows.read().contains_key(&id)
    }

    /// Remove a row, returning it when it existed.
    pub fn delete(&self, id: i64) -> Option<R> {
        let removed = self.rows.write().remove(&id);
        if removed.is_some() {
            tracing::debug!(table = self.name, id, "row deleted");
        }
        removed
    }

    /// First row (in id order) matching the predicate.
    pub fn find<F>(&self, predicate: F) -> Option<R>
    where
        F: Fn(&R) -> bool,
    {
        self.rows.read().values().find(|row| predicate(row)).cloned()
    }

    /// All rows (in id order) matching the predicate.
    pub fn filter<F>(&self, predicate: F) -> Vec<R>
    where
        F: Fn(&R) -> bool,
    {
        self.rows
            .read()
            .values()
            .filter(|row| predicate(row))
            .cloned()
            .collect()
    }

    pub fn all(&self) -> Vec<R> {
        self.rows.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }
}
