//! Space view abstraction - base trait for the dockable tabs

use egui::Ui;

use crate::ViewerContext;

/// Identifies one of the central tabs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpaceViewId {
    Exploration,
    Workbench,
    Profiling,
}

impl SpaceViewId {
    /// Tabs in display order
    pub const ALL: [SpaceViewId; 3] = [SpaceViewId::Exploration, SpaceViewId::Workbench, SpaceViewId::Profiling];

    pub fn title(self) -> &'static str {
        match self {
            SpaceViewId::Exploration => "Visual Exploration",
            SpaceViewId::Workbench => "SQL Workbench",
            SpaceViewId::Profiling => "Data Profiling",
        }
    }
}

/// Base trait for all space views
pub trait SpaceView {
    /// Get the unique ID of this view
    fn id(&self) -> SpaceViewId;

    /// Get the title of this view
    fn title(&self) -> &str {
        self.id().title()
    }

    /// Draw the UI
    fn ui(&mut self, ctx: &mut ViewerContext<'_>, ui: &mut Ui);

    /// Called once per interaction cycle, before the next draw
    fn on_cycle(&mut self, _ctx: &mut ViewerContext<'_>) {}
}
