use std::collections::BTreeSet;
use std::sync::Arc;

use crate::data::filter::{apply, FilterSpec, FilteredView, Predicate};
use crate::data::model::{Table, Value};
use crate::error::{DashboardError, Result};
use crate::views::{ViewPreset, ViewReport};

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

/// The filter state of one dashboard section, independent of rendering.
///
/// Every mutator ends in [`DashboardSession::refilter`]: a control change is
/// an explicit "filter changed" event followed by a full recomputation.
pub struct DashboardSession {
    table: Arc<Table>,
    preset: ViewPreset,
    /// Per-column predicates built from the controls.
    filters: FilterSpec,
    /// Selected top-n size, if the view has a top-n menu.
    top_n: Option<usize>,
    /// Rows passing the current filters (cached).
    view: FilteredView,
}

impl DashboardSession {
    /// Ingest a loaded table, select everything, compute the first view.
    pub fn new(table: Arc<Table>, preset: ViewPreset) -> Result<Self> {
        preset.validate(&table)?;
        let filters =
            FilterSpec::select_everything(&table, &preset.set_filters, &preset.range_filters)?;
        let view = apply(&table, &filters);
        let top_n = preset.default_top_n();

        Ok(DashboardSession {
            table,
            preset,
            filters,
            top_n,
            view,
        })
    }

    pub fn preset(&self) -> &ViewPreset {
        &self.preset
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn filters(&self) -> &FilterSpec {
        &self.filters
    }

    pub fn view(&self) -> &FilteredView {
        &self.view
    }

    pub fn top_n(&self) -> Option<usize> {
        self.top_n
    }

    /// Values offered by a multi-select control.
    pub fn options(&self, column: &str) -> Result<&[Value]> {
        self.require_set_column(column)?;
        self.table.distinct_values(column)
    }

    /// Extent of a slider control.
    pub fn range_extent(&self, column: &str) -> Result<(f64, f64)> {
        self.require_range_column(column)?;
        self.table.range_bounds(column)
    }

    /// Recompute the view after a filter change.
    pub fn refilter(&mut self) {
        self.view = apply(&self.table, &self.filters);
        log::debug!(
            "view '{}' refiltered: {} of {} rows",
            self.preset.id,
            self.view.len(),
            self.table.len()
        );
    }

    /// Toggle a single value in a column's multi-select.
    pub fn toggle_value(&mut self, column: &str, value: &Value) -> Result<()> {
        let selected = self.selected_mut(column)?;
        if !selected.remove(value) {
            selected.insert(value.clone());
        }
        self.refilter();
        Ok(())
    }

    /// Select all values in a column.
    pub fn select_all(&mut self, column: &str) -> Result<()> {
        let all_vals: BTreeSet<Value> = self.options(column)?.iter().cloned().collect();
        self.filters.set(column, Predicate::OneOf(all_vals));
        self.refilter();
        Ok(())
    }

    /// Deselect all values in a column.
    pub fn select_none(&mut self, column: &str) -> Result<()> {
        self.require_set_column(column)?;
        self.filters.set(column, Predicate::OneOf(BTreeSet::new()));
        self.refilter();
        Ok(())
    }

    /// Move a slider. Bounds outside the column's extent are allowed.
    pub fn set_range(&mut self, column: &str, lo: f64, hi: f64) -> Result<()> {
        self.require_range_column(column)?;
        if lo.is_nan() || hi.is_nan() || lo > hi {
            return Err(DashboardError::InvalidArgument(format!(
                "invalid range [{lo}, {hi}] for '{column}'"
            )));
        }
        self.filters.set(column, Predicate::between(lo, hi));
        self.refilter();
        Ok(())
    }

    /// Pick a top-n size from the view's menu.
    pub fn set_top_n(&mut self, n: usize) -> Result<()> {
        if !self.preset.top_n_choices.contains(&n) {
            return Err(DashboardError::InvalidArgument(format!(
                "top-n size {n} is not one of {:?}",
                self.preset.top_n_choices
            )));
        }
        self.top_n = Some(n);
        Ok(())
    }

    /// Aggregates for the current selection, or `EmptyResult`.
    pub fn report(&self) -> Result<ViewReport> {
        self.preset.report(&self.view, self.top_n)
    }

    /// The current selection restricted to the raw-data columns.
    pub fn raw_rows(&self) -> Result<FilteredView> {
        self.view.project(&self.preset.raw_columns)
    }

    fn require_set_column(&self, column: &str) -> Result<()> {
        if self.preset.set_filters.iter().any(|c| c == column) {
            Ok(())
        } else {
            Err(DashboardError::InvalidArgument(format!(
                "'{column}' is not a multi-select filter of view '{}'",
                self.preset.id
            )))
        }
    }

    fn require_range_column(&self, column: &str) -> Result<()> {
        if self.preset.range_filters.iter().any(|c| c == column) {
            Ok(())
        } else {
            Err(DashboardError::InvalidArgument(format!(
                "'{column}' is not a range filter of view '{}'",
                self.preset.id
            )))
        }
    }

    fn selected_mut(&mut self, column: &str) -> Result<&mut BTreeSet<Value>> {
        self.require_set_column(column)?;
        if !matches!(self.filters.get(column), Some(Predicate::OneOf(_))) {
            self.filters.set(column, Predicate::OneOf(BTreeSet::new()));
        }
        match self.filters.get_mut(column) {
            Some(Predicate::OneOf(selected)) => Ok(selected),
            _ => Err(DashboardError::missing_column(column)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Record;

    fn profile_table() -> Arc<Table> {
        let rows = [
            (1, "Ana", 23, "F", "Low", "Smoker", 2500.0),
            (2, "Bruno", 35, "M", "Medium", "Non-smoker", 6400.0),
            (3, "Carla", 52, "F", "High", "Non-smoker", 15000.0),
            (4, "Davi", 41, "M", "Medium", "Smoker", 7100.0),
        ];
        let records = rows
            .iter()
            .map(|(id, name, age, gender, income, smoker, household)| {
                let mut rec = Record::new();
                rec.insert("UserID", Value::Integer(*id));
                rec.insert("Name", *name);
                rec.insert("Age", Value::Integer(*age));
                rec.insert("Gender", *gender);
                rec.insert("IncomeBracket", *income);
                rec.insert("SmokerLabel", *smoker);
                rec.insert("HouseholdIncome", *household);
                rec
            })
            .collect();
        Arc::new(Table::from_records("user_profile", Vec::new(), records))
    }

    #[test]
    fn test_new_session_selects_everything() {
        let session = DashboardSession::new(profile_table(), ViewPreset::segmentation()).unwrap();

        assert_eq!(session.view().len(), 4);
        assert_eq!(session.range_extent("Age").unwrap(), (23.0, 52.0));
        assert_eq!(session.options("Gender").unwrap().len(), 2);
        assert_eq!(session.top_n(), None);
    }

    #[test]
    fn test_toggle_and_select_all() {
        let mut session =
            DashboardSession::new(profile_table(), ViewPreset::segmentation()).unwrap();

        session.toggle_value("Gender", &Value::from("M")).unwrap();
        assert_eq!(session.view().len(), 2);

        session.toggle_value("Gender", &Value::from("M")).unwrap();
        assert_eq!(session.view().len(), 4);

        session.select_none("SmokerLabel").unwrap();
        assert!(session.view().is_empty());
        assert_eq!(session.report(), Err(DashboardError::EmptyResult));

        session.select_all("SmokerLabel").unwrap();
        assert_eq!(session.view().len(), 4);
    }

    #[test]
    fn test_set_range_recomputes_report() {
        let mut session =
            DashboardSession::new(profile_table(), ViewPreset::segmentation()).unwrap();

        session.set_range("Age", 30.0, 45.0).unwrap();
        let report = session.report().unwrap();

        assert_eq!(report.rows, 2);
        assert_eq!(report.statistic("Filtered Users"), Some(2.0));
        assert_eq!(report.statistic("Average Age"), Some(38.0));
        assert!(session.set_range("Age", 50.0, 10.0).is_err());
        assert!(session.set_range("Gender", 0.0, 1.0).is_err());
    }

    #[test]
    fn test_raw_rows_projection() {
        let session = DashboardSession::new(profile_table(), ViewPreset::segmentation()).unwrap();
        let raw = session.raw_rows().unwrap();
        assert_eq!(raw.columns(), ViewPreset::segmentation().raw_columns.as_slice());
        assert!(!raw.rows()[0].contains("HouseholdIncome"));
    }

    #[test]
    fn test_top_n_must_come_from_menu() {
        let table = {
            let mut rec = Record::new();
            for col in ViewPreset::popularity().raw_columns {
                rec.insert(col, Value::Integer(1));
            }
            rec.insert("BrandName", "Bic");
            rec.insert("CategoryName", "Disposable");
            Arc::new(Table::from_records("sales_items", Vec::new(), vec![rec]))
        };
        let mut session = DashboardSession::new(table, ViewPreset::popularity()).unwrap();

        assert_eq!(session.top_n(), Some(5));
        session.set_top_n(15).unwrap();
        assert_eq!(session.report().unwrap().top_n, Some(15));
        assert!(session.set_top_n(7).is_err());
    }
}
