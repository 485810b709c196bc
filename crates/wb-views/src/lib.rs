//! Views of the data workbench
//!
//! Each central tab is a [`SpaceView`]. Views read the session through a
//! [`ViewerContext`] and never change durable state themselves: anything
//! that should start a new interaction cycle is queued with
//! [`ViewerContext::request`] and applied by the application shell.

mod space_view;
mod tables;
mod viewport;
pub mod values;
pub mod explorer;
pub mod workbench;
pub mod profiling;

pub use space_view::{SpaceView, SpaceViewId};
pub use tables::{ResultGrid, GridConfig};
pub use viewport::{Viewport, Views};
pub use explorer::{ExplorerView, ExplorerState, Pane};
pub use explorer::chart::{build_chart, Aggregate, ChartData, ChartError, ChartKind, ChartSpec};
pub use workbench::{QueryOutcome, WorkbenchView};
pub use profiling::ProfilingView;
pub use profiling::report::{ProfileError, ProfileReport};

use wb_data::{Frame, Interaction, Session};

/// Context passed to views during rendering
pub struct ViewerContext<'a> {
    /// The session being shown
    pub session: &'a mut Session,

    /// Derived state of the current cycle
    pub frame: &'a Frame,

    /// Interactions requested while drawing this frame
    pending: &'a mut Vec<Interaction>,
}

impl<'a> ViewerContext<'a> {
    /// Create a new context for one frame
    pub fn new(session: &'a mut Session, frame: &'a Frame, pending: &'a mut Vec<Interaction>) -> Self {
        Self { session, frame, pending }
    }

    /// Queue an interaction to be handled after this frame
    pub fn request(&mut self, interaction: Interaction) {
        self.pending.push(interaction);
    }

    /// Maximum rows a result grid draws
    pub fn max_grid_rows(&self) -> usize {
        self.session.settings().max_grid_rows
    }
}
