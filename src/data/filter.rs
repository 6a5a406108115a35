use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::model::{Record, Table, Value};
use crate::error::{DashboardError, Result};

// ---------------------------------------------------------------------------
// Filter predicates
// ---------------------------------------------------------------------------

/// Constraint on one column.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Row value must be one of the selected values. Empty set → no row passes.
    OneOf(BTreeSet<Value>),
    /// Row value must be numeric and inside the closed interval `[lo, hi]`.
    Between { lo: f64, hi: f64 },
}

impl Predicate {
    pub fn one_of<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Predicate::OneOf(values.into_iter().map(Into::into).collect())
    }

    pub fn between(lo: f64, hi: f64) -> Self {
        Predicate::Between { lo, hi }
    }

    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Predicate::OneOf(selected) => selected.contains(value),
            Predicate::Between { lo, hi } => value
                .as_f64()
                .is_some_and(|v| *lo <= v && v <= *hi),
        }
    }
}

/// Per-column predicates, combined with AND. Columns without an entry are
/// unconstrained.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSpec {
    predicates: BTreeMap<String, Predicate>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, column: impl Into<String>, predicate: Predicate) -> Self {
        self.set(column, predicate);
        self
    }

    pub fn set(&mut self, column: impl Into<String>, predicate: Predicate) {
        self.predicates.insert(column.into(), predicate);
    }

    pub fn remove(&mut self, column: &str) -> Option<Predicate> {
        self.predicates.remove(column)
    }

    pub fn get(&self, column: &str) -> Option<&Predicate> {
        self.predicates.get(column)
    }

    pub fn get_mut(&mut self, column: &str) -> Option<&mut Predicate> {
        self.predicates.get_mut(column)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Predicate)> {
        self.predicates.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Initialise a spec with everything selected: every distinct value for
    /// each set column, the full bounds for each range column.
    pub fn select_everything(
        table: &Table,
        set_columns: &[String],
        range_columns: &[String],
    ) -> Result<Self> {
        let mut spec = FilterSpec::new();
        for col in set_columns {
            let values = table.distinct_values(col)?;
            spec.set(col.clone(), Predicate::OneOf(values.iter().cloned().collect()));
        }
        for col in range_columns {
            let (lo, hi) = table.range_bounds(col)?;
            spec.set(col.clone(), Predicate::between(lo, hi));
        }
        Ok(spec)
    }
}

// ---------------------------------------------------------------------------
// FilteredView
// ---------------------------------------------------------------------------

/// The rows of a table that satisfy a [`FilterSpec`], in table order.
///
/// Owns its rows; nothing done to a view can reach back into the table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilteredView {
    columns: Vec<String>,
    rows: Vec<Record>,
}

impl FilteredView {
    pub fn new(columns: Vec<String>, rows: Vec<Record>) -> Self {
        FilteredView { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Pass the view through when it has rows, `EmptyResult` otherwise.
    /// Aggregates should only be computed after this check.
    pub fn require_rows(&self) -> Result<&Self> {
        if self.is_empty() {
            log::warn!("selection matched no rows");
            return Err(DashboardError::EmptyResult);
        }
        Ok(self)
    }

    /// Copy of the view restricted to `columns` (the raw-data table).
    pub fn project(&self, columns: &[String]) -> Result<FilteredView> {
        if let Some(missing) = columns.iter().find(|c| !self.has_column(c)) {
            return Err(DashboardError::missing_column(missing));
        }
        Ok(FilteredView {
            columns: columns.to_vec(),
            rows: self.rows.iter().map(|r| r.project(columns)).collect(),
        })
    }
}

// ---------------------------------------------------------------------------
// apply
// ---------------------------------------------------------------------------

/// Return the rows of `table` that pass every predicate in `spec`.
///
/// A row passes a column predicate when:
/// * The column has no predicate → passes (no constraint)
/// * Set predicate → the row's value is in the selected set; an empty set
///   hides everything
/// * Range predicate → the row's value is numeric and within `[lo, hi]`;
///   `Null` and text fail
pub fn apply(table: &Table, spec: &FilterSpec) -> FilteredView {
    // Sets that select every distinct value cannot reject a row.
    let active: Vec<(&String, &Predicate)> = spec
        .iter()
        .filter(|(col, pred)| match pred {
            Predicate::OneOf(selected) => match table.distinct_values(col) {
                Ok(all_vals) => !all_vals.iter().all(|v| selected.contains(v)),
                Err(_) => true,
            },
            Predicate::Between { .. } => true,
        })
        .collect();

    let rows: Vec<Record> = table
        .records()
        .iter()
        .filter(|rec| active.iter().all(|(col, pred)| pred.matches(rec.get(col))))
        .cloned()
        .collect();

    log::debug!(
        "filtered '{}': {} of {} rows pass {} active predicates",
        table.name(),
        rows.len(),
        table.len(),
        active.len()
    );

    FilteredView::new(table.columns().to_vec(), rows)
}
