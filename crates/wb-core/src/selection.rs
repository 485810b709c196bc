//! Active table selection

use tracing::{debug, warn};

/// The table list seen by the current cycle and the table the views operate on.
///
/// When `active` is set it always names an entry of `tables`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    tables: Vec<String>,
    active: Option<String>,
}

impl Selection {
    /// Create an empty selection
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tables(&self) -> &[String] {
        &self.tables
    }

    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Recompute the selection against a fresh table list.
    ///
    /// A requested name wins when it exists, then the previous selection,
    /// then the first table. Returns true when the active table changed.
    pub fn reconcile(&mut self, tables: Vec<String>, requested: Option<&str>) -> bool {
        let contains = |name: &str| tables.iter().any(|t| t == name);
        if let Some(name) = requested.filter(|name| !contains(name)) {
            warn!("Requested table {} is not registered", name);
        }

        let next = match (requested, self.active.as_deref()) {
            _ if tables.is_empty() => None,
            (Some(name), _) if contains(name) => Some(name.to_string()),
            (_, Some(prev)) if contains(prev) => Some(prev.to_string()),
            _ => tables.first().cloned(),
        };

        let changed = next != self.active;
        if changed {
            debug!("Active table {:?} -> {:?}", self.active, next);
        }
        self.tables = tables;
        self.active = next;
        changed
    }
}
