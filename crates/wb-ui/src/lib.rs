//! User interface components for the data workbench
//!
//! This crate provides the egui-based shell around the views: the theme,
//! the sidebar that gets data in, notice toasts and the central panel.

pub mod theme;
pub mod shell;
pub mod sidebar;
pub mod toasts;

pub use shell::central_panel;
pub use sidebar::{Sidebar, SidebarOutput};
pub use theme::apply_theme;
pub use toasts::{Toast, Toasts};
