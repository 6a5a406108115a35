use std::collections::HashMap;

use serde::Serialize;

use super::filter::FilteredView;
use super::model::Value;
use crate::error::{DashboardError, Result};

// ---------------------------------------------------------------------------
// Aggregate outputs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupTotal {
    pub group: Value,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Proportion {
    pub value: Value,
    pub fraction: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueCount {
    pub value: Value,
    pub count: usize,
}

/// One point of a scatter chart. `color` groups points into series, `size`
/// scales the marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub x: f64,
    pub y: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
}

/// Half-open bin `[lo, hi)`; the last bin of a histogram is closed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lo: f64,
    pub hi: f64,
    pub count: usize,
}

// ---------------------------------------------------------------------------
// Column access helpers
// ---------------------------------------------------------------------------

fn require_column(view: &FilteredView, column: &str) -> Result<()> {
    if view.has_column(column) {
        Ok(())
    } else {
        Err(DashboardError::missing_column(column))
    }
}

/// Non-null numeric values of `column`; any text or bool cell is an error.
fn numeric_values(view: &FilteredView, column: &str) -> Result<Vec<f64>> {
    require_column(view, column)?;
    view.rows()
        .iter()
        .map(|r| r.get(column))
        .filter(|v| !v.is_null())
        .map(|v| v.as_f64().ok_or_else(|| DashboardError::not_numeric(column)))
        .collect()
}

/// Row counts per distinct value, in first-appearance order.
fn tally(view: &FilteredView, column: &str) -> Vec<(Value, usize)> {
    let mut slots: HashMap<&Value, usize> = HashMap::new();
    let mut counts: Vec<(Value, usize)> = Vec::new();
    for row in view.rows() {
        let val = row.get(column);
        match slots.get(val) {
            Some(&i) => counts[i].1 += 1,
            None => {
                slots.insert(val, counts.len());
                counts.push((val.clone(), 1));
            }
        }
    }
    counts
}

// ---------------------------------------------------------------------------
// Aggregations
// ---------------------------------------------------------------------------

/// Group by `group_column`, sum `value_column`, keep the `n` largest totals.
///
/// Totals are sorted descending; equal totals keep the order in which their
/// groups first appear in the view. Null values contribute nothing; rows
/// with a null group key belong to no group.
pub fn top_n_grouped_sum(
    view: &FilteredView,
    group_column: &str,
    value_column: &str,
    n: usize,
) -> Result<Vec<GroupTotal>> {
    if n == 0 {
        return Err(DashboardError::InvalidArgument(
            "top-n size must be positive".to_string(),
        ));
    }
    require_column(view, group_column)?;
    require_column(view, value_column)?;

    let mut slots: HashMap<&Value, usize> = HashMap::new();
    let mut totals: Vec<GroupTotal> = Vec::new();
    for row in view.rows() {
        let amount = match row.get(value_column) {
            Value::Null => 0.0,
            v => v
                .as_f64()
                .ok_or_else(|| DashboardError::not_numeric(value_column))?,
        };
        let group = row.get(group_column);
        if group.is_null() {
            continue;
        }
        match slots.get(group) {
            Some(&i) => totals[i].total += amount,
            None => {
                slots.insert(group, totals.len());
                totals.push(GroupTotal {
                    group: group.clone(),
                    total: amount,
                });
            }
        }
    }

    // sort_by is stable: ties stay in first-appearance order.
    totals.sort_by(|a, b| b.total.total_cmp(&a.total));
    totals.truncate(n);
    Ok(totals)
}

/// Sum of the non-null values of a numeric column. Empty views sum to 0.
pub fn sum(view: &FilteredView, column: &str) -> Result<f64> {
    Ok(numeric_values(view, column)?.iter().sum())
}

/// Arithmetic mean of the non-null values of a numeric column.
pub fn mean(view: &FilteredView, column: &str) -> Result<f64> {
    let values = numeric_values(view, column)?;
    if values.is_empty() {
        return Err(DashboardError::EmptyAggregation {
            column: column.to_string(),
        });
    }
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn count(view: &FilteredView) -> usize {
    view.len()
}

/// Share of rows holding each distinct value of `column` (nulls included).
pub fn proportions(view: &FilteredView, column: &str) -> Result<Vec<Proportion>> {
    require_column(view, column)?;
    if view.is_empty() {
        return Err(DashboardError::EmptyAggregation {
            column: column.to_string(),
        });
    }
    let total = view.len() as f64;
    Ok(tally(view, column)
        .into_iter()
        .map(|(value, n)| Proportion {
            value,
            fraction: n as f64 / total,
        })
        .collect())
}

/// Row count per distinct value of `column`, in first-appearance order.
pub fn value_counts(view: &FilteredView, column: &str) -> Result<Vec<ValueCount>> {
    require_column(view, column)?;
    Ok(tally(view, column)
        .into_iter()
        .map(|(value, count)| ValueCount { value, count })
        .collect())
}

/// Equal-width histogram of a numeric column over the view's own range.
///
/// A single distinct value yields one zero-width bin holding every value.
pub fn histogram(view: &FilteredView, column: &str, bins: usize) -> Result<Vec<HistogramBin>> {
    if bins == 0 {
        return Err(DashboardError::InvalidArgument(
            "histogram needs at least one bin".to_string(),
        ));
    }
    let values = numeric_values(view, column)?;
    if values.is_empty() {
        return Err(DashboardError::EmptyAggregation {
            column: column.to_string(),
        });
    }

    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if min == max {
        return Ok(vec![HistogramBin {
            lo: min,
            hi: max,
            count: values.len(),
        }]);
    }

    let width = (max - min) / bins as f64;
    let mut out: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            lo: min + width * i as f64,
            hi: if i + 1 == bins { max } else { min + width * (i + 1) as f64 },
            count: 0,
        })
        .collect();

    for v in values {
        let idx = (((v - min) / width) as usize).min(bins - 1);
        out[idx].count += 1;
    }
    Ok(out)
}

/// One point per row with numeric `x` and `y`, in view order.
///
/// Rows missing `x`, `y` or the size value are left out. `color` is taken as
/// is, nulls included.
pub fn scatter_points(
    view: &FilteredView,
    x: &str,
    y: &str,
    color: Option<&str>,
    size: Option<&str>,
) -> Result<Vec<ScatterPoint>> {
    for col in [Some(x), Some(y), color, size].into_iter().flatten() {
        require_column(view, col)?;
    }

    let numeric = |value: &Value, column: &str| -> Result<Option<f64>> {
        match value {
            Value::Null => Ok(None),
            v => v
                .as_f64()
                .map(Some)
                .ok_or_else(|| DashboardError::not_numeric(column)),
        }
    };

    let mut points = Vec::new();
    for row in view.rows() {
        let px = numeric(row.get(x), x)?;
        let py = numeric(row.get(y), y)?;
        let psize = match size {
            Some(col) => match numeric(row.get(col), col)? {
                Some(s) => Some(s),
                None => continue,
            },
            None => None,
        };
        if let (Some(px), Some(py)) = (px, py) {
            points.push(ScatterPoint {
                x: px,
                y: py,
                color: color.map(|col| row.get(col).clone()),
                size: psize,
            });
        }
    }
    Ok(points)
}
