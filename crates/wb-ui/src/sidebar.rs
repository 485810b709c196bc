//! Sidebar: getting data in and choosing the active table

use std::path::PathBuf;
use egui::{Context, DroppedFile, RichText, Ui};
use tracing::{info, warn};
use wb_core::Notice;
use wb_data::{Frame, Interaction, UploadedFile};

/// Extensions offered by the upload dialog
pub const UPLOAD_EXTENSIONS: &[&str] = &["csv", "tsv", "txt", "xlsx", "parquet", "db", "sqlite", "sqlite3"];

const ABOUT: &str = "Upload CSV, Excel, Parquet or SQLite files, or fetch one from a URL. \
Each file becomes a table: explore it visually, query every table with SQL, \
or read its statistical profile. Tables live only as long as the session.";

/// What the sidebar produced this frame
#[derive(Debug, Default)]
pub struct SidebarOutput {
    pub interactions: Vec<Interaction>,
    /// Problems reading local files before they reach the session
    pub notices: Vec<Notice>,
}

impl SidebarOutput {
    fn upload(&mut self, (files, notices): (Vec<UploadedFile>, Vec<Notice>)) {
        if !files.is_empty() {
            self.interactions.push(Interaction::Upload(files));
        }
        self.notices.extend(notices);
    }
}

/// Sidebar state that persists across frames
#[derive(Debug, Default)]
pub struct Sidebar {
    url: String,
}

impl Sidebar {
    /// Create a new sidebar
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&mut self, ctx: &Context, frame: &Frame) -> SidebarOutput {
        let mut output = SidebarOutput::default();

        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        if !dropped.is_empty() {
            output.upload(dropped_uploads(&dropped));
        }

        egui::SidePanel::left("sidebar")
            .resizable(true)
            .default_width(260.0)
            .show(ctx, |ui| {
                ui.add_space(6.0);
                ui.heading("Data Workbench");
                ui.separator();

                self.upload_section(ui, &mut output);
                ui.add_space(8.0);
                self.url_section(ui, &mut output);
                ui.add_space(8.0);
                table_selector(ui, frame, &mut output);

                ui.add_space(12.0);
                egui::CollapsingHeader::new("About")
                    .default_open(false)
                    .show(ui, |ui| ui.label(RichText::new(ABOUT).weak()));
            });

        output
    }

    fn upload_section(&mut self, ui: &mut Ui, output: &mut SidebarOutput) {
        ui.label(RichText::new("Upload").strong());
        if ui.button("📁 Choose files…").clicked() {
            if let Some(paths) = rfd::FileDialog::new()
                .add_filter("Data files", UPLOAD_EXTENSIONS)
                .pick_files()
            {
                output.upload(read_files(&paths));
            }
        }
        ui.label(RichText::new("or drop files onto the window").weak().small());
    }

    fn url_section(&mut self, ui: &mut Ui, output: &mut SidebarOutput) {
        ui.label(RichText::new("Fetch from URL").strong());
        let edit = ui.add(
            egui::TextEdit::singleline(&mut self.url)
                .hint_text("https://example.com/data.csv")
                .desired_width(f32::INFINITY),
        );
        let submitted = edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
        if ui.button("Fetch").clicked() || submitted {
            if let Some(request) = fetch_request(&self.url) {
                output.interactions.push(request);
            }
        }
    }
}

fn table_selector(ui: &mut Ui, frame: &Frame, output: &mut SidebarOutput) {
    ui.label(RichText::new("Table").strong());
    if frame.tables.is_empty() {
        ui.label(RichText::new("No tables yet").weak());
        return;
    }

    let mut chosen = frame.active.clone();
    egui::ComboBox::from_id_source("table_selector")
        .width(ui.available_width())
        .selected_text(chosen.as_deref().unwrap_or("—"))
        .show_ui(ui, |ui| {
            for table in &frame.tables {
                ui.selectable_value(&mut chosen, Some(table.clone()), table);
            }
        });
    if let Some(request) = selection_request(frame, chosen) {
        output.interactions.push(request);
    }
}

/// Read picked files from disk; unreadable ones become notices
pub fn read_files(paths: &[PathBuf]) -> (Vec<UploadedFile>, Vec<Notice>) {
    let mut files = Vec::new();
    let mut notices = Vec::new();
    for path in paths {
        match UploadedFile::from_path(path) {
            Ok(file) => {
                info!("Read {} ({} bytes)", file.name, file.bytes.len());
                files.push(file);
            }
            Err(e) => {
                warn!("Could not read {}: {}", path.display(), e);
                notices.push(Notice::error("Could not read file", format!("{}: {}", path.display(), e)));
            }
        }
    }
    (files, notices)
}

/// Files dropped onto the window, from memory when the platform provides
/// the bytes and from disk otherwise
pub fn dropped_uploads(dropped: &[DroppedFile]) -> (Vec<UploadedFile>, Vec<Notice>) {
    let mut files = Vec::new();
    let mut paths = Vec::new();
    for file in dropped {
        match (&file.bytes, &file.path) {
            (Some(bytes), _) => files.push(UploadedFile::named(file.name.clone(), bytes.to_vec())),
            (None, Some(path)) => paths.push(path.clone()),
            (None, None) => warn!("Dropped file {} has neither contents nor a path", file.name),
        }
    }
    let (from_disk, notices) = read_files(&paths);
    files.extend(from_disk);
    (files, notices)
}

/// A fetch for the typed URL, unless it is blank
pub fn fetch_request(url: &str) -> Option<Interaction> {
    let url = url.trim();
    (!url.is_empty()).then(|| Interaction::FetchUrl(url.to_string()))
}

/// A selection change, when the chosen table differs from the active one
pub fn selection_request(frame: &Frame, chosen: Option<String>) -> Option<Interaction> {
    match chosen {
        Some(table) if frame.active.as_deref() != Some(table.as_str()) => Some(Interaction::SelectTable(table)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_read_files_reports_missing() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("a.csv");
        std::fs::write(&present, "x\n1\n").unwrap();
        let missing = dir.path().join("gone.csv");

        let (files, notices) = read_files(&[present, missing]);
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "a.csv");
        assert_eq!(files[0].mime, "text/csv");
        assert_eq!(notices.len(), 1);
        assert!(notices[0].message.contains("gone.csv"));
    }

    #[test]
    fn test_dropped_files_prefer_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let on_disk = dir.path().join("b.csv");
        std::fs::write(&on_disk, "y\n2\n").unwrap();

        let dropped = vec![
            DroppedFile {
                name: "a.csv".to_string(),
                bytes: Some(Arc::from(&b"x\n1\n"[..])),
                ..Default::default()
            },
            DroppedFile {
                name: "b.csv".to_string(),
                path: Some(on_disk),
                ..Default::default()
            },
        ];
        let (files, notices) = dropped_uploads(&dropped);
        assert!(notices.is_empty());
        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a.csv", "b.csv"]);
    }

    #[test]
    fn test_fetch_request_ignores_blank_urls() {
        assert!(fetch_request("   ").is_none());
        assert!(matches!(
            fetch_request(" https://example.com/a.csv "),
            Some(Interaction::FetchUrl(url)) if url == "https://example.com/a.csv"
        ));
    }

    #[test]
    fn test_selection_request_only_on_change() {
        let frame = Frame {
            tables: vec!["a.csv".to_string(), "b.csv".to_string()],
            active: Some("a.csv".to_string()),
            ..Frame::default()
        };
        assert!(selection_request(&frame, Some("a.csv".to_string())).is_none());
        assert!(selection_request(&frame, None).is_none());
        assert!(matches!(
            selection_request(&frame, Some("b.csv".to_string())),
            Some(Interaction::SelectTable(t)) if t == "b.csv"
        ));
    }
}
