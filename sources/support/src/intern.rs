use std::{collections::HashMap, hash::Hash, sync::Arc};

use parking_lot::Mutex;

/// Append-only value interner. Entries are never removed, so every handle we
/// give out stays valid (and pointer-stable) for the whole run.
pub struct Interner<T> {
    entries: Mutex<HashMap<T, Arc<T>>>,
}

impl<T> Interner<T>
where
    T: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn intern(&self, value: T) -> Arc<T> {
        let mut entries = self.entries.lock();

        if let Some(existing) = entries.get(&value) {
            return Arc::clone(existing);
        }

        let interned = Arc::new(value.clone());
        entries.insert(value, Arc::clone(&interned));

        interned
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl<T> Default for Interner<T>
where
    T: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
