//! Scrollable grid of a dataset

use std::hash::Hash;
use egui::{RichText, Ui};
use egui_extras::{Column, TableBuilder};
use wb_core::Dataset;

use crate::values::cell_text;

const NULL_TEXT: &str = "null";
const MAX_CELL_CHARS: usize = 50;

/// Configuration for result grids
#[derive(Debug, Clone)]
pub struct GridConfig {
    pub show_row_numbers: bool,
    pub striped_rows: bool,
    pub resizable_columns: bool,
    pub max_rows_displayed: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            show_row_numbers: true,
            striped_rows: true,
            resizable_columns: true,
            max_rows_displayed: 1000,
        }
    }
}

/// Grid over the rows of a dataset, capped at `max_rows_displayed`
#[derive(Debug, Clone, Default)]
pub struct ResultGrid {
    pub config: GridConfig,
}

impl ResultGrid {
    /// Create a new grid drawing at most `max_rows` rows
    pub fn new(max_rows: usize) -> Self {
        Self {
            config: GridConfig {
                max_rows_displayed: max_rows,
                ..GridConfig::default()
            },
        }
    }

    /// Rows that will actually be drawn for a dataset of `total` rows
    pub fn visible_rows(&self, total: usize) -> usize {
        total.min(self.config.max_rows_displayed)
    }

    /// "N rows × M columns" with a note when rows are cut off
    pub fn summary(&self, dataset: &Dataset) -> String {
        let total = dataset.num_rows();
        let shown = self.visible_rows(total);
        let mut text = format!("{} rows × {} columns", total, dataset.num_columns());
        if shown < total {
            text.push_str(&format!(" (showing first {})", shown));
        }
        text
    }

    pub fn show(&self, ui: &mut Ui, id_source: impl Hash, dataset: &Dataset) {
        ui.label(RichText::new(self.summary(dataset)).weak());
        ui.add_space(4.0);

        if dataset.num_columns() == 0 {
            return;
        }

        ui.push_id(id_source, |ui| {
            egui::ScrollArea::horizontal().show(ui, |ui| self.render_table(ui, dataset));
        });
    }

    fn render_table(&self, ui: &mut Ui, dataset: &Dataset) {
        let text_height = egui::TextStyle::Body.resolve(ui.style()).size * 1.5;
        let num_rows = self.visible_rows(dataset.num_rows());
        let batch = dataset.batch();
        let schema = batch.schema();

        let mut builder = TableBuilder::new(ui)
            .striped(self.config.striped_rows)
            .resizable(self.config.resizable_columns)
            .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
            .min_scrolled_height(0.0)
            .vscroll(true);

        if self.config.show_row_numbers {
            builder = builder.column(Column::initial(50.0).at_least(40.0));
        }
        for _ in 0..batch.num_columns() {
            builder = builder.column(
                Column::initial(150.0)
                    .at_least(80.0)
                    .at_most(400.0)
                    .clip(true)
                    .resizable(self.config.resizable_columns),
            );
        }

        builder
            .header(20.0, |mut header| {
                if self.config.show_row_numbers {
                    header.col(|ui| {
                        ui.strong("#");
                    });
                }
                for field in schema.fields() {
                    header.col(|ui| {
                        ui.strong(field.name())
                            .on_hover_text(format!("{}", field.data_type()));
                    });
                }
            })
            .body(|mut body| {
                for row_index in 0..num_rows {
                    body.row(text_height, |mut row| {
                        if self.config.show_row_numbers {
                            row.col(|ui| {
                                ui.label(RichText::new(row_index.to_string()).weak());
                            });
                        }
                        for column in batch.columns() {
                            row.col(|ui| {
                                let value = cell_text(column, row_index);
                                let response = match &value {
                                    Some(text) => ui.label(truncate(text)),
                                    None => ui.label(RichText::new(NULL_TEXT).weak().italics()),
                                };
                                response.context_menu(|ui| {
                                    if ui.button("📋 Copy Value").clicked() {
                                        let copied = value.clone().unwrap_or_default();
                                        ui.output_mut(|o| o.copied_text = copied);
                                        ui.close_menu();
                                    }
                                });
                            });
                        }
                    });
                }
            });
    }
}

/// Shorten long cell text for display
fn truncate(text: &str) -> String {
    if text.chars().count() > MAX_CELL_CHARS {
        let head: String = text.chars().take(MAX_CELL_CHARS).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}
