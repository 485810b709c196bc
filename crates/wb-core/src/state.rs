//! Workbench settings

use std::time::Duration;
use serde::{Serialize, Deserialize};

use crate::quote_identifier;

/// Workbench-wide settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkbenchSettings {
    /// Table store settings
    pub store: StoreSettings,

    /// Upper bound for a remote fetch, connect to last byte
    pub fetch_timeout: Duration,

    /// Row limit of the preview query seeded into the SQL editor
    pub preview_limit: usize,

    /// Maximum rows rendered by a result grid
    pub max_grid_rows: usize,

    /// How long a notice stays on screen
    pub notice_ttl: Duration,

    /// Theme settings
    pub theme: ThemeSettings,
}

/// Settings for the embedded database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSettings {
    /// Install and load the spatial extension when the connection opens
    pub load_spatial: bool,
}

/// Theme settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeSettings {
    /// UI scale factor
    pub scale_factor: f32,

    /// Whether to use dark mode
    pub dark_mode: bool,
}

impl Default for WorkbenchSettings {
    fn default() -> Self {
        Self {
            store: StoreSettings::default(),
            fetch_timeout: Duration::from_secs(30),
            preview_limit: 10,
            max_grid_rows: 1000,
            notice_ttl: Duration::from_secs(6),
            theme: ThemeSettings {
                scale_factor: 1.0,
                dark_mode: true,
            },
        }
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            load_spatial: true,
        }
    }
}

impl WorkbenchSettings {
    /// Settings for sessions without network access (tests, batch use)
    pub fn offline() -> Self {
        Self {
            store: StoreSettings { load_spatial: false },
            ..Self::default()
        }
    }

    /// The preview query seeded into the editor for `table`
    pub fn preview_query(&self, table: &str) -> String {
        format!("select * from {} limit {};", quote_identifier(table), self.preview_limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_fetch_timeout() {
        let settings = WorkbenchSettings::default();
        assert_eq!(settings.fetch_timeout, Duration::from_secs(30));
        assert!(settings.store.load_spatial);
    }

    #[test]
    fn test_offline_disables_spatial() {
        let settings = WorkbenchSettings::offline();
        assert!(!settings.store.load_spatial);
        assert_eq!(settings.preview_limit, 10);
    }

    #[test]
    fn test_preview_query() {
        let settings = WorkbenchSettings::default();
        assert_eq!(
            settings.preview_query("sales.csv"),
            "select * from \"sales.csv\" limit 10;"
        );
    }

    #[test]
    fn test_settings_serde() {
        let settings = WorkbenchSettings::default();
        let json = serde_json::to_string(&settings).unwrap();
        let back: WorkbenchSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back.preview_limit, settings.preview_limit);
        assert_eq!(back.fetch_timeout, settings.fetch_timeout);
    }
}
