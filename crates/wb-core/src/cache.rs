//! Single-slot view cache keyed by table identity

use crate::dataset::TableKey;

/// Holds at most one value, built for one [`TableKey`].
///
/// Asking for a different key drops the held value and builds a new one.
/// A failed build leaves the cache empty.
#[derive(Debug)]
pub struct ViewCache<T> {
    slot: Option<(TableKey, T)>,
}

impl<T> Default for ViewCache<T> {
    fn default() -> Self {
        Self { slot: None }
    }
}

impl<T> ViewCache<T> {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached value for `key`, building it first if the slot is empty or
    /// holds another key.
    pub fn get_or_try_insert_with<E>(
        &mut self,
        key: &TableKey,
        build: impl FnOnce() -> Result<T, E>,
    ) -> Result<&mut T, E> {
        let entry = match self.slot.take() {
            Some((k, v)) if &k == key => (k, v),
            _ => (key.clone(), build()?),
        };
        let (_, value) = self.slot.insert(entry);
        Ok(value)
    }

    /// The cached value, if it was built for `key`
    pub fn get(&self, key: &TableKey) -> Option<&T> {
        self.slot
            .as_ref()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn key(&self) -> Option<&TableKey> {
        self.slot.as_ref().map(|(k, _)| k)
    }

    pub fn clear(&mut self) {
        self.slot = None;
    }

    pub fn is_empty(&self) -> bool {
        self.slot.is_none()
    }
}
