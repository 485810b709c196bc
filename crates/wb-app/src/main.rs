//! Main application entry point

use std::time::Instant;
use anyhow::Result;
use eframe::egui;
use tokio::runtime::Runtime;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use wb_core::WorkbenchSettings;
use wb_data::{Frame, Interaction, Session};
use wb_ui::{apply_theme, central_panel, Sidebar, Toasts};
use wb_views::Viewport;

/// Main application state
struct WorkbenchApp {
    /// Drives remote fetches; every interaction is awaited to completion
    runtime: Runtime,

    session: Session,

    /// Derived state of the latest cycle
    frame: Frame,

    sidebar: Sidebar,
    viewport: Viewport,
    toasts: Toasts,

    /// Interactions requested while drawing the current frame
    pending: Vec<Interaction>,
}

impl WorkbenchApp {
    fn new(cc: &eframe::CreationContext<'_>, runtime: Runtime, settings: WorkbenchSettings) -> Self {
        apply_theme(&cc.egui_ctx, &settings.theme);

        let toasts = Toasts::new(settings.notice_ttl);
        let mut session = Session::new(settings);
        let frame = runtime.block_on(session.handle(Interaction::Refresh));

        Self {
            runtime,
            session,
            frame,
            sidebar: Sidebar::new(),
            viewport: Viewport::new(),
            toasts,
            pending: Vec::new(),
        }
    }

    /// Run one interaction cycle and keep its frame
    fn apply(&mut self, interaction: Interaction) {
        debug!("Handling {} interaction", interaction_kind(&interaction));
        let frame = self.runtime.block_on(self.session.handle(interaction));
        self.toasts.push_all(frame.notices.iter().cloned(), Instant::now());
        self.frame = frame;
    }
}

fn interaction_kind(interaction: &Interaction) -> &'static str {
    match interaction {
        Interaction::Upload(_) => "upload",
        Interaction::FetchUrl(_) => "fetch",
        Interaction::SelectTable(_) => "select",
        Interaction::EditQuery(_) => "query",
        Interaction::Refresh => "refresh",
    }
}

impl eframe::App for WorkbenchApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let sidebar = self.sidebar.show(ctx, &self.frame);
        self.toasts.push_all(sidebar.notices, Instant::now());
        self.pending.extend(sidebar.interactions);

        central_panel(ctx, &mut self.session, &self.frame, &mut self.viewport, &mut self.pending);
        self.toasts.show(ctx);

        let pending = std::mem::take(&mut self.pending);
        if !pending.is_empty() {
            for interaction in pending {
                self.apply(interaction);
            }
            ctx.request_repaint();
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting data workbench");

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let settings = WorkbenchSettings::default();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 820.0])
            .with_min_inner_size([800.0, 600.0])
            .with_drag_and_drop(true),
        default_theme: if settings.theme.dark_mode { eframe::Theme::Dark } else { eframe::Theme::Light },
        persist_window: false,
        ..Default::default()
    };

    eframe::run_native(
        "Data Workbench",
        options,
        Box::new(move |cc| Box::new(WorkbenchApp::new(cc, runtime, settings))),
    )
    .map_err(|e| anyhow::anyhow!("Failed to run app: {}", e))?;

    Ok(())
}
