//! Viewport - hosts the central tabs in a dock area

use egui::Ui;
use egui_dock::{DockArea, DockState, TabViewer};

use crate::{ExplorerView, ProfilingView, SpaceView, SpaceViewId, ViewerContext, WorkbenchView};

/// The three views, one per tab
#[derive(Debug, Default)]
pub struct Views {
    pub explorer: ExplorerView,
    pub workbench: WorkbenchView,
    pub profiling: ProfilingView,
}

impl Views {
    pub fn get_mut(&mut self, id: SpaceViewId) -> &mut dyn SpaceView {
        match id {
            SpaceViewId::Exploration => &mut self.explorer,
            SpaceViewId::Workbench => &mut self.workbench,
            SpaceViewId::Profiling => &mut self.profiling,
        }
    }
}

/// The central dock area
pub struct Viewport {
    dock_state: DockState<SpaceViewId>,
    views: Views,
    /// Cycle the views were last brought up to date with
    last_cycle: Option<u64>,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new()
    }
}

impl Viewport {
    /// Create a new viewport with every tab open, exploration first
    pub fn new() -> Self {
        Self {
            dock_state: DockState::new(SpaceViewId::ALL.to_vec()),
            views: Views::default(),
            last_cycle: None,
        }
    }

    pub fn views(&self) -> &Views {
        &self.views
    }

    /// Let every view react to a new cycle, once per cycle
    pub fn on_cycle(&mut self, ctx: &mut ViewerContext<'_>) {
        if self.last_cycle == Some(ctx.frame.cycle) {
            return;
        }
        for id in SpaceViewId::ALL {
            self.views.get_mut(id).on_cycle(ctx);
        }
        self.last_cycle = Some(ctx.frame.cycle);
    }

    /// Draw the viewport
    pub fn ui(&mut self, ui: &mut Ui, ctx: &mut ViewerContext<'_>) {
        self.on_cycle(ctx);

        let Self { dock_state, views, .. } = self;
        DockArea::new(dock_state)
            .show_close_buttons(false)
            .draggable_tabs(true)
            .show_inside(ui, &mut ViewportTabViewer { views, ctx });
    }
}

/// Tab viewer for egui_dock
struct ViewportTabViewer<'a, 'c> {
    views: &'a mut Views,
    ctx: &'a mut ViewerContext<'c>,
}

impl TabViewer for ViewportTabViewer<'_, '_> {
    type Tab = SpaceViewId;

    fn title(&mut self, tab: &mut Self::Tab) -> egui::WidgetText {
        tab.title().into()
    }

    fn ui(&mut self, ui: &mut Ui, tab: &mut Self::Tab) {
        self.views.get_mut(*tab).ui(self.ctx, ui);
    }
}
