//! Chart specifications and the data they produce

use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};
use thiserror::Error;
use wb_core::Dataset;

use crate::values::{equal_width_bins, numeric_values, text_values, HistogramBin};

/// Chart type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChartKind {
    Bar,
    Line,
    Scatter,
    Histogram,
}

impl ChartKind {
    pub const ALL: [ChartKind; 4] = [ChartKind::Bar, ChartKind::Line, ChartKind::Scatter, ChartKind::Histogram];

    pub fn label(self) -> &'static str {
        match self {
            ChartKind::Bar => "Bar",
            ChartKind::Line => "Line",
            ChartKind::Scatter => "Scatter",
            ChartKind::Histogram => "Histogram",
        }
    }

    /// Whether the chart reads a Y column for this aggregate
    pub fn uses_y(self, aggregate: Aggregate) -> bool {
        match self {
            ChartKind::Bar | ChartKind::Line => aggregate != Aggregate::Count,
            ChartKind::Scatter => true,
            ChartKind::Histogram => false,
        }
    }
}

/// How grouped Y values are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Aggregate {
    Count,
    Sum,
    Mean,
    Min,
    Max,
}

impl Aggregate {
    pub const ALL: [Aggregate; 5] = [Aggregate::Count, Aggregate::Sum, Aggregate::Mean, Aggregate::Min, Aggregate::Max];

    pub fn label(self) -> &'static str {
        match self {
            Aggregate::Count => "Count",
            Aggregate::Sum => "Sum",
            Aggregate::Mean => "Mean",
            Aggregate::Min => "Min",
            Aggregate::Max => "Max",
        }
    }
}

/// What the user asked the chart builder for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub x: Option<String>,
    pub y: Option<String>,
    pub aggregate: Aggregate,
    /// Histogram bin count
    pub bins: usize,
}

impl Default for ChartSpec {
    fn default() -> Self {
        Self {
            kind: ChartKind::Bar,
            x: None,
            y: None,
            aggregate: Aggregate::Count,
            bins: 20,
        }
    }
}

impl ChartSpec {
    /// A starting chart for a dataset: a count of rows per value of the
    /// first column, with the first other numeric column preselected as Y
    pub fn suggest(dataset: &Dataset) -> Self {
        let names = dataset.column_names();
        let x = names.first().cloned();
        let y = names
            .iter()
            .filter(|name| Some(*name) != x.as_ref())
            .find(|name| {
                dataset
                    .column(name)
                    .map_or(false, |c| c.data_type().is_numeric())
            })
            .cloned();
        Self { x, y, ..Self::default() }
    }
}

/// Computed chart contents
#[derive(Debug, Clone, PartialEq)]
pub enum ChartData {
    /// One bar per category, categories in name order
    Bars { categories: Vec<String>, values: Vec<f64> },
    /// Points ordered by X
    Line { points: Vec<[f64; 2]> },
    Scatter { points: Vec<[f64; 2]> },
    Histogram { bins: Vec<HistogramBin> },
}

/// A chart configuration that cannot be drawn for this dataset
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChartError {
    #[error("choose a column for the {0} axis")]
    MissingColumn(&'static str),

    #[error("column '{0}' does not exist")]
    UnknownColumn(String),

    #[error("column '{0}' is not numeric")]
    NotNumeric(String),

    #[error("histogram needs at least one bin")]
    InvalidBins,

    #[error("nothing to plot: no rows with values for the chosen columns")]
    NoData,
}

/// Running aggregate of one group
#[derive(Debug, Clone, Copy)]
struct Accumulator {
    rows: usize,
    values: usize,
    sum: f64,
    min: f64,
    max: f64,
}

impl Default for Accumulator {
    fn default() -> Self {
        Self {
            rows: 0,
            values: 0,
            sum: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }
}

impl Accumulator {
    fn push(&mut self, value: Option<f64>) {
        self.rows += 1;
        if let Some(v) = value {
            self.values += 1;
            self.sum += v;
            self.min = self.min.min(v);
            self.max = self.max.max(v);
        }
    }

    fn finish(&self, aggregate: Aggregate) -> Option<f64> {
        if aggregate == Aggregate::Count {
            return Some(self.rows as f64);
        }
        if self.values == 0 {
            return None;
        }
        Some(match aggregate {
            Aggregate::Count => self.rows as f64,
            Aggregate::Sum => self.sum,
            Aggregate::Mean => self.sum / self.values as f64,
            Aggregate::Min => self.min,
            Aggregate::Max => self.max,
        })
    }
}

fn column_numbers(dataset: &Dataset, name: &str) -> Result<Vec<Option<f64>>, ChartError> {
    let column = dataset
        .column(name)
        .ok_or_else(|| ChartError::UnknownColumn(name.to_string()))?;
    numeric_values(column).ok_or_else(|| ChartError::NotNumeric(name.to_string()))
}

/// Compute the chart described by `spec`
pub fn build_chart(dataset: &Dataset, spec: &ChartSpec) -> Result<ChartData, ChartError> {
    let x_name = spec.x.as_deref().ok_or(ChartError::MissingColumn("X"))?;
    let y_values = if spec.kind.uses_y(spec.aggregate) {
        let y_name = spec.y.as_deref().ok_or(ChartError::MissingColumn("Y"))?;
        Some(column_numbers(dataset, y_name)?)
    } else {
        None
    };
    let y_at = |row: usize| y_values.as_ref().and_then(|ys| ys[row]);

    let data = match spec.kind {
        ChartKind::Bar => {
            let column = dataset
                .column(x_name)
                .ok_or_else(|| ChartError::UnknownColumn(x_name.to_string()))?;
            let mut groups: BTreeMap<String, Accumulator> = BTreeMap::new();
            for (row, key) in text_values(column).into_iter().enumerate() {
                if let Some(key) = key {
                    groups.entry(key).or_default().push(y_at(row));
                }
            }
            let (categories, values) = groups
                .into_iter()
                .filter_map(|(key, acc)| Some((key, acc.finish(spec.aggregate)?)))
                .unzip::<_, _, Vec<_>, Vec<_>>();
            ChartData::Bars { categories, values }
        }
        ChartKind::Line => {
            let xs = column_numbers(dataset, x_name)?;
            let mut rows: Vec<(f64, usize)> = xs
                .iter()
                .enumerate()
                .filter_map(|(row, x)| Some(((*x)?, row)))
                .collect();
            rows.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut groups: Vec<(f64, Accumulator)> = Vec::new();
            for (x, row) in rows {
                match groups.last_mut() {
                    Some((last, acc)) if *last == x => acc.push(y_at(row)),
                    _ => {
                        let mut acc = Accumulator::default();
                        acc.push(y_at(row));
                        groups.push((x, acc));
                    }
                }
            }
            let points = groups
                .into_iter()
                .filter_map(|(x, acc)| Some([x, acc.finish(spec.aggregate)?]))
                .collect();
            ChartData::Line { points }
        }
        ChartKind::Scatter => {
            let xs = column_numbers(dataset, x_name)?;
            let points = xs
                .iter()
                .enumerate()
                .filter_map(|(row, x)| Some([(*x)?, y_at(row)?]))
                .collect();
            ChartData::Scatter { points }
        }
        ChartKind::Histogram => {
            if spec.bins == 0 {
                return Err(ChartError::InvalidBins);
            }
            let values: Vec<f64> = column_numbers(dataset, x_name)?.into_iter().flatten().collect();
            ChartData::Histogram { bins: equal_width_bins(&values, spec.bins) }
        }
    };

    if data.is_empty() {
        return Err(ChartError::NoData);
    }
    Ok(data)
}

impl ChartData {
    pub fn is_empty(&self) -> bool {
        match self {
            ChartData::Bars { categories, .. } => categories.is_empty(),
            ChartData::Line { points } | ChartData::Scatter { points } => points.is_empty(),
            ChartData::Histogram { bins } => bins.is_empty(),
        }
    }
}
