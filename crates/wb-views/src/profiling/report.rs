//! Statistical profile of a dataset

use std::fmt;
use ahash::{AHashMap, AHashSet};
use arrow::datatypes::DataType;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use thiserror::Error;
use wb_core::Dataset;

use crate::values::{equal_width_bins, numeric_values, pearson, quartiles, text_values, HistogramBin};

/// Bins in each numeric column's histogram
pub const HISTOGRAM_BINS: usize = 20;
/// Most frequent values listed for a categorical column
pub const TOP_VALUES: usize = 10;
/// Share of missing cells above which a column is flagged
pub const MISSING_ALERT_PCT: f64 = 50.0;
/// Absolute correlation at which a pair of columns is flagged
pub const CORRELATION_ALERT: f64 = 0.9;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProfileError {
    #[error("the table has no columns")]
    NoColumns,

    #[error("could not read column '{column}' as {expected}")]
    Column { column: String, expected: &'static str },
}

/// Inferred role of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    Numeric,
    Categorical,
    Boolean,
    Temporal,
}

impl ColumnKind {
    pub const ALL: [ColumnKind; 4] = [
        ColumnKind::Numeric,
        ColumnKind::Categorical,
        ColumnKind::Boolean,
        ColumnKind::Temporal,
    ];
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnKind::Numeric => "Numeric",
            ColumnKind::Categorical => "Categorical",
            ColumnKind::Boolean => "Boolean",
            ColumnKind::Temporal => "Temporal",
        };
        f.write_str(name)
    }
}

/// Whole-table figures
#[derive(Debug, Clone, PartialEq)]
pub struct Overview {
    pub rows: usize,
    pub columns: usize,
    pub missing_cells: usize,
    pub missing_pct: f64,
    pub duplicate_rows: usize,
    pub duplicate_pct: f64,
    /// Number of columns of each kind, in [`ColumnKind::ALL`] order
    pub kinds: Vec<(ColumnKind, usize)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NumericSummary {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Sample standard deviation; zero for a single value
    pub std_dev: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub zeros: usize,
    pub histogram: Vec<HistogramBin>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoricalSummary {
    /// Most frequent values, most frequent first
    pub top_values: Vec<(String, usize)>,
    pub min_length: usize,
    pub mean_length: f64,
    pub max_length: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnSummary {
    Numeric(NumericSummary),
    Categorical(CategoricalSummary),
    Boolean { true_count: usize, false_count: usize },
    Temporal { earliest: NaiveDateTime, latest: NaiveDateTime },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnProfile {
    pub name: String,
    pub kind: ColumnKind,
    /// Present (non-missing) values
    pub count: usize,
    pub missing: usize,
    pub missing_pct: f64,
    pub distinct: usize,
    /// Distinct values as a share of present values
    pub distinct_pct: f64,
    /// `None` when the column has no values
    pub summary: Option<ColumnSummary>,
}

/// Pearson correlations between the numeric columns
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    /// `values[i][j]`; `None` where a column is constant or rows are too few
    pub values: Vec<Vec<Option<f64>>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AlertKind {
    HighMissing { pct: f64 },
    Constant,
    AllUnique,
    HighCorrelation { other: String, r: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub column: String,
    pub kind: AlertKind,
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            AlertKind::HighMissing { pct } => write!(f, "{} has {:.1}% missing values", self.column, pct),
            AlertKind::Constant => write!(f, "{} has a constant value", self.column),
            AlertKind::AllUnique => write!(f, "{} has all unique values", self.column),
            AlertKind::HighCorrelation { other, r } => {
                write!(f, "{} is highly correlated with {} (r = {:.2})", self.column, other, r)
            }
        }
    }
}

/// Generated profile of one dataset
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileReport {
    pub overview: Overview,
    pub columns: Vec<ColumnProfile>,
    pub correlations: CorrelationMatrix,
    pub alerts: Vec<Alert>,
}

fn pct(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 * 100.0 / whole as f64
    }
}

/// Parse the date and date-time spellings treated as temporal text
pub fn parse_temporal(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt);
        }
    }
    for format in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    None
}

fn infer_kind(data_type: &DataType, texts: &[Option<String>]) -> ColumnKind {
    match data_type {
        DataType::Boolean => ColumnKind::Boolean,
        DataType::Date32 | DataType::Date64 | DataType::Timestamp(_, _) => ColumnKind::Temporal,
        t if t.is_numeric() => ColumnKind::Numeric,
        DataType::Utf8 | DataType::LargeUtf8 => {
            let mut present = texts.iter().flatten().peekable();
            if present.peek().is_some() && present.all(|v| parse_temporal(v).is_some()) {
                ColumnKind::Temporal
            } else {
                ColumnKind::Categorical
            }
        }
        _ => ColumnKind::Categorical,
    }
}

fn numeric_summary(values: &[f64]) -> Option<NumericSummary> {
    let (q1, median, q3) = quartiles(values)?;
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let std_dev = if values.len() > 1 {
        (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt()
    } else {
        0.0
    };
    Some(NumericSummary {
        min: values.iter().copied().fold(f64::INFINITY, f64::min),
        max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        mean,
        std_dev,
        q1,
        median,
        q3,
        zeros: values.iter().filter(|v| **v == 0.0).count(),
        histogram: equal_width_bins(values, HISTOGRAM_BINS),
    })
}

fn categorical_summary(texts: &[Option<String>]) -> Option<CategoricalSummary> {
    let present: Vec<&String> = texts.iter().flatten().collect();
    if present.is_empty() {
        return None;
    }

    let mut frequencies: AHashMap<&str, usize> = AHashMap::new();
    for value in &present {
        *frequencies.entry(value.as_str()).or_insert(0) += 1;
    }
    let mut top_values: Vec<(String, usize)> = frequencies
        .into_iter()
        .map(|(value, count)| (value.to_string(), count))
        .collect();
    top_values.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    top_values.truncate(TOP_VALUES);

    let lengths: Vec<usize> = present.iter().map(|v| v.chars().count()).collect();
    Some(CategoricalSummary {
        top_values,
        min_length: lengths.iter().copied().min().unwrap_or(0),
        mean_length: lengths.iter().sum::<usize>() as f64 / lengths.len() as f64,
        max_length: lengths.iter().copied().max().unwrap_or(0),
    })
}

fn temporal_summary(texts: &[Option<String>]) -> Option<ColumnSummary> {
    let parsed: Vec<NaiveDateTime> = texts.iter().flatten().filter_map(|v| parse_temporal(v)).collect();
    Some(ColumnSummary::Temporal {
        earliest: parsed.iter().min().copied()?,
        latest: parsed.iter().max().copied()?,
    })
}

impl ProfileReport {
    /// Profile every column of `dataset`
    pub fn generate(dataset: &Dataset) -> Result<Self, ProfileError> {
        if dataset.num_columns() == 0 {
            return Err(ProfileError::NoColumns);
        }
        let rows = dataset.num_rows();
        let batch = dataset.batch();
        let schema = batch.schema();

        let mut texts_by_column = Vec::with_capacity(batch.num_columns());
        let mut columns = Vec::with_capacity(batch.num_columns());
        let mut numeric: Vec<(String, Vec<Option<f64>>)> = Vec::new();

        for (field, array) in schema.fields().iter().zip(batch.columns()) {
            let name = field.name().clone();
            let texts = text_values(array);
            let kind = infer_kind(field.data_type(), &texts);

            let count = texts.iter().flatten().count();
            let distinct = texts.iter().flatten().collect::<AHashSet<_>>().len();

            let summary = match kind {
                ColumnKind::Numeric => {
                    let values = numeric_values(array).ok_or_else(|| ProfileError::Column {
                        column: name.clone(),
                        expected: "numbers",
                    })?;
                    let present: Vec<f64> = values.iter().flatten().copied().collect();
                    numeric.push((name.clone(), values));
                    numeric_summary(&present).map(ColumnSummary::Numeric)
                }
                ColumnKind::Boolean => {
                    let true_count = texts.iter().flatten().filter(|v| v.as_str() == "true").count();
                    (count > 0).then(|| ColumnSummary::Boolean {
                        true_count,
                        false_count: count - true_count,
                    })
                }
                ColumnKind::Temporal => temporal_summary(&texts),
                ColumnKind::Categorical => categorical_summary(&texts).map(ColumnSummary::Categorical),
            };

            columns.push(ColumnProfile {
                name,
                kind,
                count,
                missing: rows - count,
                missing_pct: pct(rows - count, rows),
                distinct,
                distinct_pct: pct(distinct, count),
                summary,
            });
            texts_by_column.push(texts);
        }

        let mut seen = AHashSet::with_capacity(rows);
        let duplicate_rows = (0..rows)
            .filter(|&row| {
                let key: Vec<Option<&str>> = texts_by_column.iter().map(|t| t[row].as_deref()).collect();
                !seen.insert(key)
            })
            .count();

        let missing_cells = columns.iter().map(|c| c.missing).sum();
        let overview = Overview {
            rows,
            columns: columns.len(),
            missing_cells,
            missing_pct: pct(missing_cells, rows * columns.len()),
            duplicate_rows,
            duplicate_pct: pct(duplicate_rows, rows),
            kinds: ColumnKind::ALL
                .iter()
                .map(|kind| (*kind, columns.iter().filter(|c| c.kind == *kind).count()))
                .collect(),
        };

        let correlations = CorrelationMatrix {
            columns: numeric.iter().map(|(name, _)| name.clone()).collect(),
            values: numeric
                .iter()
                .map(|(_, xs)| numeric.iter().map(|(_, ys)| pearson(xs, ys)).collect())
                .collect(),
        };

        let alerts = alerts(&columns, &correlations);

        Ok(Self {
            overview,
            columns,
            correlations,
            alerts,
        })
    }

    pub fn column(&self, name: &str) -> Option<&ColumnProfile> {
        self.columns.iter().find(|c| c.name == name)
    }
}

fn alerts(columns: &[ColumnProfile], correlations: &CorrelationMatrix) -> Vec<Alert> {
    let mut alerts = Vec::new();
    for column in columns {
        let mut raise = |kind| {
            alerts.push(Alert {
                column: column.name.clone(),
                kind,
            })
        };
        if column.missing_pct > MISSING_ALERT_PCT {
            raise(AlertKind::HighMissing { pct: column.missing_pct });
        }
        if column.distinct == 1 {
            raise(AlertKind::Constant);
        } else if column.count > 1 && column.distinct == column.count {
            raise(AlertKind::AllUnique);
        }
    }

    for (i, row) in correlations.values.iter().enumerate() {
        for (j, r) in row.iter().enumerate().skip(i + 1) {
            if let Some(r) = r.filter(|r| r.abs() >= CORRELATION_ALERT) {
                alerts.push(Alert {
                    column: correlations.columns[i].clone(),
                    kind: AlertKind::HighCorrelation {
                        other: correlations.columns[j].clone(),
                        r,
                    },
                });
            }
        }
    }
    alerts
}
