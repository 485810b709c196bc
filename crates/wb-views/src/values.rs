//! Column value extraction shared by the views

use arrow::array::{Array, ArrayRef, Float64Array};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use arrow::util::display::array_value_to_string;

/// Values of a numeric column as `f64`; `None` when the column is not numeric
pub fn numeric_values(array: &ArrayRef) -> Option<Vec<Option<f64>>> {
    if !array.data_type().is_numeric() {
        return None;
    }
    let converted = cast(array, &DataType::Float64).ok()?;
    let floats = converted.as_any().downcast_ref::<Float64Array>()?;
    Some(floats.iter().map(|v| v.filter(|f| f.is_finite())).collect())
}

/// Display text of one cell; `None` for nulls
pub fn cell_text(array: &ArrayRef, row: usize) -> Option<String> {
    if array.is_null(row) {
        return None;
    }
    array_value_to_string(array, row).ok()
}

/// Display text of every cell of a column
pub fn text_values(array: &ArrayRef) -> Vec<Option<String>> {
    (0..array.len()).map(|row| cell_text(array, row)).collect()
}

/// One equal-width histogram bin
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Split `values` into `bins` equal-width bins spanning their range.
///
/// A range of zero width is widened to one unit around the value.
pub fn equal_width_bins(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }

    let (mut lo, mut hi) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }
    let width = (hi - lo) / bins as f64;

    let mut counts = vec![0usize; bins];
    for &v in values {
        let idx = (((v - lo) / width).floor() as usize).min(bins - 1);
        counts[idx] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            start: lo + width * i as f64,
            end: lo + width * (i + 1) as f64,
            count,
        })
        .collect()
}

/// Quartiles by linear interpolation between closest ranks
pub fn quartiles(values: &[f64]) -> Option<(f64, f64, f64)> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let at = |q: f64| {
        let idx = (sorted.len() - 1) as f64 * q;
        let lower = idx.floor() as usize;
        let upper = idx.ceil() as usize;
        let fraction = idx - lower as f64;
        sorted[lower] * (1.0 - fraction) + sorted[upper] * fraction
    };
    Some((at(0.25), at(0.5), at(0.75)))
}

/// Pearson correlation over rows where both values are present
pub fn pearson(xs: &[Option<f64>], ys: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = xs
        .iter()
        .zip(ys)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect();
    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        cov += (x - mean_x) * (y - mean_y);
        var_x += (x - mean_x).powi(2);
        var_y += (y - mean_y).powi(2);
    }
    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some(cov / (var_x.sqrt() * var_y.sqrt()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use arrow::array::{BooleanArray, Int32Array, StringArray};

    #[test]
    fn test_numeric_values() {
        let ints: ArrayRef = Arc::new(Int32Array::from(vec![Some(1), None, Some(3)]));
        assert_eq!(numeric_values(&ints), Some(vec![Some(1.0), None, Some(3.0)]));

        let text: ArrayRef = Arc::new(StringArray::from(vec!["1"]));
        assert_eq!(numeric_values(&text), None);
        let flags: ArrayRef = Arc::new(BooleanArray::from(vec![true]));
        assert_eq!(numeric_values(&flags), None);
    }

    #[test]
    fn test_cell_text() {
        let text: ArrayRef = Arc::new(StringArray::from(vec![Some("a"), None]));
        assert_eq!(text_values(&text), vec![Some("a".to_string()), None]);
    }

    #[test]
    fn test_quartiles_interpolate() {
        assert_eq!(quartiles(&[4.0, 1.0, 3.0, 2.0]), Some((1.75, 2.5, 3.25)));
        assert_eq!(quartiles(&[7.0]), Some((7.0, 7.0, 7.0)));
        assert_eq!(quartiles(&[]), None);
    }

    #[test]
    fn test_equal_width_bins() {
        let bins = equal_width_bins(&[0.0, 1.0, 2.0, 3.0, 4.0], 2);
        assert_eq!(bins.len(), 2);
        assert_eq!((bins[0].start, bins[0].end, bins[0].count), (0.0, 2.0, 2));
        assert_eq!((bins[1].start, bins[1].end, bins[1].count), (2.0, 4.0, 3));

        let flat = equal_width_bins(&[5.0, 5.0], 4);
        assert_eq!(flat.iter().map(|b| b.count).sum::<usize>(), 2);
        assert!(equal_width_bins(&[], 3).is_empty());
    }

    #[test]
    fn test_pearson() {
        let xs = vec![Some(1.0), Some(2.0), Some(3.0), None];
        let ys = vec![Some(2.0), Some(4.0), Some(6.0), Some(100.0)];
        let r = pearson(&xs, &ys).unwrap();
        assert!((r - 1.0).abs() < 1e-12);

        let inverse = vec![Some(3.0), Some(2.0), Some(1.0), None];
        assert!((pearson(&xs, &inverse).unwrap() + 1.0).abs() < 1e-12);

        let constant = vec![Some(1.0), Some(1.0), Some(1.0), Some(1.0)];
        assert_eq!(pearson(&xs, &constant), None);
    }
}
