//! Data profiling tab

pub mod report;

use egui::{Color32, RichText, Ui};
use egui_extras::{Column, TableBuilder};
use egui_plot::{Bar, BarChart, Plot};
use tracing::{debug, error};
use wb_core::{Dataset, ViewCache};

use crate::{SpaceView, SpaceViewId, ViewerContext};
use report::{ColumnProfile, ColumnSummary, CorrelationMatrix, ProfileError, ProfileReport};

/// The "Data Profiling" tab
#[derive(Debug, Default)]
pub struct ProfilingView {
    cache: ViewCache<ProfileReport>,
    /// Last failure and the cycle it belongs to
    failure: Option<(u64, String)>,
}

impl ProfilingView {
    /// Create a new profiling view
    pub fn new() -> Self {
        Self::default()
    }

    /// The report for `dataset` registered as `table`, generated on first
    /// request and reused while the table's identity is unchanged
    pub fn report_for(&mut self, table: &str, dataset: &Dataset) -> Result<&ProfileReport, ProfileError> {
        let key = dataset.key(table);
        let report = self.cache.get_or_try_insert_with(&key, || {
            debug!("Profiling {}", table);
            ProfileReport::generate(dataset)
        })?;
        Ok(report)
    }

    pub fn is_cached(&self) -> bool {
        !self.cache.is_empty()
    }
}

impl SpaceView for ProfilingView {
    fn id(&self) -> SpaceViewId {
        SpaceViewId::Profiling
    }

    fn ui(&mut self, ctx: &mut ViewerContext<'_>, ui: &mut Ui) {
        let Some(table) = ctx.frame.active.clone() else {
            ui.centered_and_justified(|ui| ui.label("Select a table to profile"));
            return;
        };

        let cycle = ctx.frame.cycle;
        if let Some((failed_in, message)) = &self.failure {
            if *failed_in == cycle {
                ui.colored_label(ui.visuals().error_fg_color, message);
                return;
            }
        }

        let dataset = match ctx.session.active_dataset() {
            Ok(Some(dataset)) => dataset,
            Ok(None) => return,
            Err(e) => {
                let message = format!("Could not read {}: {}", table, e);
                ui.colored_label(ui.visuals().error_fg_color, &message);
                self.failure = Some((cycle, message));
                return;
            }
        };

        self.failure = None;
        match self.report_for(&table, &dataset) {
            Ok(report) => {
                egui::ScrollArea::vertical()
                    .auto_shrink([false, false])
                    .show(ui, |ui| show_report(ui, report));
            }
            Err(e) => {
                error!("Profiling {} failed: {}", table, e);
                let message = format!("Could not profile {}: {}", table, e);
                ui.colored_label(ui.visuals().error_fg_color, &message);
                self.failure = Some((cycle, message));
            }
        }
    }
}

fn show_report(ui: &mut Ui, report: &ProfileReport) {
    let o = &report.overview;
    ui.heading("Overview");
    egui::Grid::new("profile_overview").num_columns(2).striped(true).show(ui, |ui| {
        ui.label("Rows");
        ui.label(o.rows.to_string());
        ui.end_row();
        ui.label("Columns");
        ui.label(o.columns.to_string());
        ui.end_row();
        ui.label("Missing cells");
        ui.label(format!("{} ({:.1}%)", o.missing_cells, o.missing_pct));
        ui.end_row();
        ui.label("Duplicate rows");
        ui.label(format!("{} ({:.1}%)", o.duplicate_rows, o.duplicate_pct));
        ui.end_row();
        for (kind, count) in &o.kinds {
            ui.label(kind.to_string());
            ui.label(count.to_string());
            ui.end_row();
        }
    });

    if !report.alerts.is_empty() {
        ui.add_space(8.0);
        ui.heading(format!("Alerts ({})", report.alerts.len()));
        for alert in &report.alerts {
            ui.label(RichText::new(format!("⚠ {}", alert)).color(ui.visuals().warn_fg_color));
        }
    }

    ui.add_space(8.0);
    ui.heading("Variables");
    for column in &report.columns {
        egui::CollapsingHeader::new(format!("{}  ·  {}", column.name, column.kind))
            .id_source(("profile_column", &column.name))
            .default_open(false)
            .show(ui, |ui| show_column(ui, column));
    }

    if report.correlations.columns.len() > 1 {
        ui.add_space(8.0);
        ui.heading("Correlations");
        show_correlations(ui, &report.correlations);
    }
}

fn show_column(ui: &mut Ui, column: &ColumnProfile) {
    egui::Grid::new(("profile_stats", &column.name)).num_columns(2).show(ui, |ui| {
        let mut stat = |label: &str, value: String| {
            ui.label(label);
            ui.label(value);
            ui.end_row();
        };
        stat("Present", column.count.to_string());
        stat("Missing", format!("{} ({:.1}%)", column.missing, column.missing_pct));
        stat("Distinct", format!("{} ({:.1}%)", column.distinct, column.distinct_pct));

        match &column.summary {
            Some(ColumnSummary::Numeric(s)) => {
                stat("Min", format!("{:.4}", s.min));
                stat("Max", format!("{:.4}", s.max));
                stat("Mean", format!("{:.4}", s.mean));
                stat("Std dev", format!("{:.4}", s.std_dev));
                stat("Q1 / median / Q3", format!("{:.4} / {:.4} / {:.4}", s.q1, s.median, s.q3));
                stat("Zeros", s.zeros.to_string());
            }
            Some(ColumnSummary::Categorical(s)) => {
                stat("Length", format!("{} to {} (mean {:.1})", s.min_length, s.max_length, s.mean_length));
            }
            Some(ColumnSummary::Boolean { true_count, false_count }) => {
                stat("True", true_count.to_string());
                stat("False", false_count.to_string());
            }
            Some(ColumnSummary::Temporal { earliest, latest }) => {
                stat("Earliest", earliest.to_string());
                stat("Latest", latest.to_string());
            }
            None => {}
        }
    });

    match &column.summary {
        Some(ColumnSummary::Numeric(s)) if !s.histogram.is_empty() => {
            let bars = s
                .histogram
                .iter()
                .map(|bin| Bar::new((bin.start + bin.end) / 2.0, bin.count as f64).width(bin.end - bin.start))
                .collect();
            Plot::new(("profile_histogram", &column.name))
                .height(120.0)
                .allow_drag(false)
                .allow_zoom(false)
                .allow_scroll(false)
                .show(ui, |plot_ui| plot_ui.bar_chart(BarChart::new(bars)));
        }
        Some(ColumnSummary::Categorical(s)) => {
            for (value, count) in &s.top_values {
                ui.horizontal(|ui| {
                    ui.label(RichText::new(count.to_string()).monospace());
                    ui.label(value);
                });
            }
        }
        _ => {}
    }
}

/// Fill color for a correlation coefficient: blue for negative, red for positive
fn correlation_color(r: f64) -> Color32 {
    let strength = (r.abs().min(1.0) * 200.0) as u8;
    if r >= 0.0 {
        Color32::from_rgba_unmultiplied(220, 60, 60, strength)
    } else {
        Color32::from_rgba_unmultiplied(60, 90, 220, strength)
    }
}

fn show_correlations(ui: &mut Ui, matrix: &CorrelationMatrix) {
    ui.push_id("profile_correlations", |ui| {
        let mut builder = TableBuilder::new(ui).column(Column::auto().at_least(80.0));
        for _ in &matrix.columns {
            builder = builder.column(Column::initial(70.0).at_least(50.0));
        }
        builder
            .header(20.0, |mut header| {
                header.col(|_| {});
                for name in &matrix.columns {
                    header.col(|ui| {
                        ui.strong(name);
                    });
                }
            })
            .body(|mut body| {
                for (name, row_values) in matrix.columns.iter().zip(&matrix.values) {
                    body.row(20.0, |mut row| {
                        row.col(|ui| {
                            ui.strong(name);
                        });
                        for value in row_values {
                            row.col(|ui| match value {
                                Some(r) => {
                                    ui.painter().rect_filled(ui.max_rect(), 0.0, correlation_color(*r));
                                    ui.label(format!("{:.2}", r));
                                }
                                None => {
                                    ui.label(RichText::new("–").weak());
                                }
                            });
                        }
                    });
                }
            });
    });
}
