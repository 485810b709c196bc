//! Core functionality for the data workbench
//!
//! This crate provides the session-independent building blocks shared by the
//! data layer, the views and the application shell: settings, the event bus,
//! user-facing notices, the active-table selection and view caching.

pub mod cache;
pub mod dataset;
pub mod events;
pub mod notice;
pub mod selection;
pub mod state;

// Re-export commonly used types
pub use cache::ViewCache;
pub use dataset::{Dataset, TableKey};
pub use events::{EventBus, Event, EventHandler, handler_from_fn};
pub use notice::{Notice, NoticeLevel};
pub use selection::Selection;
pub use state::{WorkbenchSettings, StoreSettings, ThemeSettings};

/// Quote a table or column name for use in SQL text.
///
/// Embedded double quotes are doubled, so any file name is a valid identifier.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_plain_identifier() {
        assert_eq!(quote_identifier("sales.csv"), "\"sales.csv\"");
    }

    #[test]
    fn test_quote_identifier_with_quotes() {
        assert_eq!(quote_identifier("my \"best\" data"), "\"my \"\"best\"\" data\"");
    }
}
