use egui::{CentralPanel, Context, RichText};
use wb_data::{Frame, Interaction, Session};
use wb_views::{ViewerContext, Viewport};

/// Render the central panel: the tab area, or a hint while there is no table
pub fn central_panel(
    ctx: &Context,
    session: &mut Session,
    frame: &Frame,
    viewport: &mut Viewport,
    pending: &mut Vec<Interaction>,
) {
    CentralPanel::default().show(ctx, |ui| {
        let mut viewer = ViewerContext::new(session, frame, pending);
        if frame.tables.is_empty() {
            // keep the workbench in step even while its tab is hidden
            viewport.on_cycle(&mut viewer);
            show_upload_hint(ui);
        } else {
            viewport.ui(ui, &mut viewer);
        }
    });
}

/// Shown instead of the tabs until the first table is loaded
fn show_upload_hint(ui: &mut egui::Ui) {
    ui.vertical_centered(|ui| {
        ui.add_space(100.0);
        ui.heading("Upload a file");
        ui.add_space(12.0);
        ui.label("Choose a CSV, Excel, Parquet or SQLite file in the sidebar,");
        ui.label("drop one onto the window, or fetch one from a URL.");
        ui.add_space(8.0);
        ui.label(RichText::new("Each file becomes a table you can explore, query and profile.").weak());
    });
}
