//! Visual exploration of the active table: a data grid and a chart builder

pub mod chart;

use std::convert::Infallible;
use egui::{Color32, RichText, Ui};
use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotPoints, Points};
use tracing::debug;
use wb_core::{Dataset, ViewCache};

use crate::{ResultGrid, SpaceView, SpaceViewId, ViewerContext};
use chart::{build_chart, Aggregate, ChartData, ChartError, ChartKind, ChartSpec};

const CHART_COLOR: Color32 = Color32::from_rgb(92, 140, 97);

/// Which half of the explorer is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pane {
    #[default]
    Data,
    Visualize,
}

/// Renderer state for one table: the data, the chart choices and the chart
#[derive(Debug)]
pub struct ExplorerState {
    dataset: Dataset,
    spec: ChartSpec,
    chart: Result<ChartData, ChartError>,
}

impl ExplorerState {
    /// Create a new state with a suggested chart
    pub fn new(dataset: Dataset) -> Self {
        let spec = ChartSpec::suggest(&dataset);
        let chart = build_chart(&dataset, &spec);
        Self { dataset, spec, chart }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn spec(&self) -> &ChartSpec {
        &self.spec
    }

    pub fn chart(&self) -> Result<&ChartData, &ChartError> {
        self.chart.as_ref()
    }

    /// Replace the chart choices, rebuilding the chart when they differ.
    /// Returns whether anything changed.
    pub fn set_spec(&mut self, spec: ChartSpec) -> bool {
        if spec == self.spec {
            return false;
        }
        self.chart = build_chart(&self.dataset, &spec);
        self.spec = spec;
        true
    }
}

/// The "Visual Exploration" tab
#[derive(Debug, Default)]
pub struct ExplorerView {
    pane: Pane,
    cache: ViewCache<ExplorerState>,
    /// Failure to read the active table, with the cycle it happened in
    failure: Option<(u64, String)>,
}

impl ExplorerView {
    /// Create a new explorer showing the data pane
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pane(&self) -> Pane {
        self.pane
    }

    pub fn set_pane(&mut self, pane: Pane) {
        self.pane = pane;
    }

    /// State for `dataset` registered as `table`, reused while the table's
    /// identity is unchanged
    pub fn state_for(&mut self, table: &str, dataset: Dataset) -> &mut ExplorerState {
        let key = dataset.key(table);
        let built = self.cache.get_or_try_insert_with(&key, || {
            debug!("Building explorer state for {}", table);
            Ok::<_, Infallible>(ExplorerState::new(dataset))
        });
        match built {
            Ok(state) => state,
            Err(never) => match never {},
        }
    }

    /// The cached state, if any
    pub fn cached(&self) -> Option<&ExplorerState> {
        self.cache.key().and_then(|key| self.cache.get(key))
    }
}

impl SpaceView for ExplorerView {
    fn id(&self) -> SpaceViewId {
        SpaceViewId::Exploration
    }

    fn ui(&mut self, ctx: &mut ViewerContext<'_>, ui: &mut Ui) {
        let Some(table) = ctx.frame.active.clone() else {
            ui.centered_and_justified(|ui| ui.label("Select a table to explore"));
            return;
        };

        let cycle = ctx.frame.cycle;
        if let Some((failed_in, message)) = &self.failure {
            if *failed_in == cycle {
                show_failure(ui, message);
                return;
            }
        }

        let dataset = match ctx.session.active_dataset() {
            Ok(Some(dataset)) => dataset,
            Ok(None) => return,
            Err(e) => {
                show_failure(ui, &e.message);
                self.failure = Some((cycle, e.message));
                return;
            }
        };
        self.failure = None;

        ui.horizontal(|ui| {
            ui.selectable_value(&mut self.pane, Pane::Data, "Data");
            ui.selectable_value(&mut self.pane, Pane::Visualize, "Visualize");
        });
        ui.separator();

        let pane = self.pane;
        let grid = ResultGrid::new(ctx.max_grid_rows());
        let state = self.state_for(&table, dataset);
        match pane {
            Pane::Data => grid.show(ui, ("explorer_grid", &table), state.dataset()),
            Pane::Visualize => {
                let mut spec = state.spec().clone();
                chart_controls(ui, state.dataset(), &mut spec);
                state.set_spec(spec);
                ui.separator();
                match state.chart() {
                    Ok(data) => draw_chart(ui, state.spec(), data),
                    Err(e) => {
                        ui.colored_label(ui.visuals().warn_fg_color, e.to_string());
                    }
                }
            }
        }
    }
}

fn show_failure(ui: &mut Ui, message: &str) {
    ui.colored_label(ui.visuals().error_fg_color, format!("Could not display this table: {}", message));
}

fn column_combo(ui: &mut Ui, label: &str, columns: &[String], selected: &mut Option<String>) {
    egui::ComboBox::from_label(label)
        .selected_text(selected.as_deref().unwrap_or("—"))
        .show_ui(ui, |ui| {
            for name in columns {
                ui.selectable_value(selected, Some(name.clone()), name);
            }
        });
}

fn chart_controls(ui: &mut Ui, dataset: &Dataset, spec: &mut ChartSpec) {
    let columns = dataset.column_names();
    ui.horizontal_wrapped(|ui| {
        egui::ComboBox::from_label("Chart")
            .selected_text(spec.kind.label())
            .show_ui(ui, |ui| {
                for kind in ChartKind::ALL {
                    ui.selectable_value(&mut spec.kind, kind, kind.label());
                }
            });

        column_combo(ui, "X", &columns, &mut spec.x);

        if spec.kind != ChartKind::Histogram && spec.kind != ChartKind::Scatter {
            egui::ComboBox::from_label("Aggregate")
                .selected_text(spec.aggregate.label())
                .show_ui(ui, |ui| {
                    for aggregate in Aggregate::ALL {
                        ui.selectable_value(&mut spec.aggregate, aggregate, aggregate.label());
                    }
                });
        }

        if spec.kind.uses_y(spec.aggregate) {
            column_combo(ui, "Y", &columns, &mut spec.y);
        }

        if spec.kind == ChartKind::Histogram {
            ui.add(egui::DragValue::new(&mut spec.bins).clamp_range(1..=200).prefix("bins: "));
        }
    });
}

fn draw_chart(ui: &mut Ui, spec: &ChartSpec, data: &ChartData) {
    let y_label = match spec.kind {
        ChartKind::Scatter => spec.y.clone().unwrap_or_default(),
        ChartKind::Histogram => "Count".to_string(),
        _ if spec.aggregate == Aggregate::Count => "Count".to_string(),
        _ => format!("{} of {}", spec.aggregate.label(), spec.y.as_deref().unwrap_or_default()),
    };

    let plot = Plot::new("explorer_chart")
        .legend(Legend::default())
        .x_axis_label(spec.x.clone().unwrap_or_default())
        .y_axis_label(y_label)
        .allow_zoom(true)
        .allow_drag(true)
        .allow_boxed_zoom(true);

    plot.show(ui, |plot_ui| match data {
        ChartData::Bars { categories, values } => {
            let bars = categories
                .iter()
                .zip(values)
                .enumerate()
                .map(|(i, (category, value))| Bar::new(i as f64, *value).width(0.7).name(category))
                .collect();
            plot_ui.bar_chart(BarChart::new(bars).color(CHART_COLOR));
        }
        ChartData::Line { points } => {
            plot_ui.line(Line::new(PlotPoints::new(points.clone())).color(CHART_COLOR));
        }
        ChartData::Scatter { points } => {
            plot_ui.points(Points::new(PlotPoints::new(points.clone())).color(CHART_COLOR).radius(2.5));
        }
        ChartData::Histogram { bins } => {
            let bars = bins
                .iter()
                .map(|bin| {
                    Bar::new((bin.start + bin.end) / 2.0, bin.count as f64)
                        .width(bin.end - bin.start)
                        .name(format!("{:.3} – {:.3}", bin.start, bin.end))
                })
                .collect();
            plot_ui.bar_chart(BarChart::new(bars).color(CHART_COLOR));
        }
    });

    ui.label(RichText::new("Scroll to zoom, drag to pan, double-click to reset").weak().small());
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use arrow::array::{Int64Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};
    use arrow::record_batch::RecordBatch;

    fn people(rows: usize) -> Dataset {
        let schema = Arc::new(Schema::new(vec![
            Field::new("name", DataType::Utf8, false),
            Field::new("age", DataType::Int64, false),
        ]));
        let names: Vec<String> = (0..rows).map(|i| format!("p{}", i % 3)).collect();
        let batch = RecordBatch::try_new(schema, vec![
            Arc::new(StringArray::from(names)),
            Arc::new(Int64Array::from_iter_values((0..rows as i64).map(|i| 20 + i))),
        ]).unwrap();
        Dataset::new(batch)
    }

    #[test]
    fn test_state_persists_for_same_table() {
        let mut view = ExplorerView::new();
        let state = view.state_for("people.csv", people(6));
        let mut spec = state.spec().clone();
        spec.kind = ChartKind::Histogram;
        spec.x = Some("age".to_string());
        assert!(state.set_spec(spec.clone()));

        let again = view.state_for("people.csv", people(6));
        assert_eq!(again.spec(), &spec);
        assert!(matches!(again.chart(), Ok(ChartData::Histogram { .. })));
    }

    #[test]
    fn test_other_table_evicts_state() {
        let mut view = ExplorerView::new();
        let state = view.state_for("people.csv", people(6));
        let mut spec = state.spec().clone();
        spec.kind = ChartKind::Scatter;
        state.set_spec(spec);

        view.state_for("other.csv", people(6));
        assert_eq!(view.cached().map(|s| s.spec().kind), Some(ChartKind::Bar));

        // same name but new rows is a different table snapshot
        let fresh = view.state_for("other.csv", people(9));
        assert_eq!(fresh.dataset().num_rows(), 9);
    }

    #[test]
    fn test_suggested_chart_counts_first_column() {
        let state = ExplorerState::new(people(6));
        assert_eq!(
            state.chart(),
            Ok(&ChartData::Bars {
                categories: vec!["p0".to_string(), "p1".to_string(), "p2".to_string()],
                values: vec![2.0, 2.0, 2.0],
            })
        );
    }

    #[test]
    fn test_invalid_spec_keeps_error_in_state() {
        let mut state = ExplorerState::new(people(3));
        let mut spec = state.spec().clone();
        spec.kind = ChartKind::Line;
        spec.x = Some("name".to_string());
        assert!(state.set_spec(spec.clone()));
        assert_eq!(state.chart(), Err(&ChartError::NotNumeric("name".to_string())));
        assert!(!state.set_spec(spec));
    }
}
