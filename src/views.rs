use serde::Serialize;

use crate::data::aggregate::{
    self, GroupTotal, HistogramBin, Proportion, ScatterPoint, ValueCount,
};
use crate::data::filter::FilteredView;
use crate::data::model::{ColumnKind, Table};
use crate::error::{DashboardError, Result};

pub const SALES_SOURCE: &str = "sales";
pub const PROFILE_SOURCE: &str = "profile";

// ---------------------------------------------------------------------------
// View configuration
// ---------------------------------------------------------------------------

/// One chart or summary figure of a view.
#[derive(Debug, Clone, PartialEq)]
pub enum Panel {
    /// Largest `group` totals of `value`; size picked from the top-n menu.
    TopN { subject: String, group: String, value: String },
    Histogram { title: String, column: String, bins: usize },
    /// `y` against `x`, one series per `color` value, markers sized by `size`.
    Scatter {
        title: String,
        x: String,
        y: String,
        color: Option<String>,
        size: Option<String>,
    },
    Proportions { title: String, column: String },
    ValueCounts { title: String, column: String },
    Total { label: String, column: String },
    Mean { label: String, column: String },
    Count { label: String },
}

/// Everything that distinguishes one dashboard section from another.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewPreset {
    pub id: String,
    pub title: String,
    pub source_id: String,
    /// Columns filtered by multi-select (set predicates).
    pub set_filters: Vec<String>,
    /// Columns filtered by slider (range predicates).
    pub range_filters: Vec<String>,
    /// Top-n menu; the first entry is the default.
    pub top_n_choices: Vec<usize>,
    pub panels: Vec<Panel>,
    /// Columns shown in the raw-data table.
    pub raw_columns: Vec<String>,
    /// Column identifying a record.
    pub id_column: String,
}

fn strings(cols: &[&str]) -> Vec<String> {
    cols.iter().map(|c| c.to_string()).collect()
}

impl ViewPreset {
    /// Brand, model and category popularity over sales items.
    pub fn popularity() -> Self {
        ViewPreset {
            id: "popularity".to_string(),
            title: "Lighter Popularity and Performance".to_string(),
            source_id: SALES_SOURCE.to_string(),
            set_filters: strings(&["BrandName", "CategoryName"]),
            range_filters: strings(&["UnitPrice"]),
            top_n_choices: vec![5, 10, 15],
            panels: vec![
                Panel::TopN {
                    subject: "Most Popular Brands".to_string(),
                    group: "BrandName".to_string(),
                    value: "Quantity".to_string(),
                },
                Panel::TopN {
                    subject: "Most Popular Categories".to_string(),
                    group: "CategoryName".to_string(),
                    value: "Quantity".to_string(),
                },
                Panel::Histogram {
                    title: "Unit Price Distribution".to_string(),
                    column: "UnitPrice".to_string(),
                    bins: 20,
                },
                Panel::Scatter {
                    title: "Discount vs Quantity Sold".to_string(),
                    x: "Discount".to_string(),
                    y: "Quantity".to_string(),
                    color: Some("CategoryName".to_string()),
                    size: Some("UnitPrice".to_string()),
                },
                Panel::Total {
                    label: "Total Items Sold".to_string(),
                    column: "Quantity".to_string(),
                },
                Panel::Mean {
                    label: "Average Unit Price".to_string(),
                    column: "UnitPrice".to_string(),
                },
                Panel::Mean {
                    label: "Average Discount".to_string(),
                    column: "Discount".to_string(),
                },
                Panel::Mean {
                    label: "Average Subtotal per Item".to_string(),
                    column: "SubTotal".to_string(),
                },
            ],
            raw_columns: strings(&[
                "ItemID",
                "BrandName",
                "CategoryName",
                "ModelName",
                "Quantity",
                "UnitPrice",
                "Discount",
                "SubTotal",
            ]),
            id_column: "ItemID".to_string(),
        }
    }

    /// Demographic breakdown of the user profile table.
    pub fn segmentation() -> Self {
        ViewPreset {
            id: "segmentation".to_string(),
            title: "User Segmentation".to_string(),
            source_id: PROFILE_SOURCE.to_string(),
            set_filters: strings(&["Gender", "IncomeBracket", "SmokerLabel"]),
            range_filters: strings(&["Age"]),
            top_n_choices: Vec::new(),
            panels: vec![
                Panel::Histogram {
                    title: "Age Distribution".to_string(),
                    column: "Age".to_string(),
                    bins: 20,
                },
                Panel::ValueCounts {
                    title: "Gender Distribution".to_string(),
                    column: "Gender".to_string(),
                },
                Panel::Proportions {
                    title: "Smoker Share".to_string(),
                    column: "SmokerLabel".to_string(),
                },
                Panel::ValueCounts {
                    title: "Income Bracket Distribution".to_string(),
                    column: "IncomeBracket".to_string(),
                },
                Panel::Count {
                    label: "Filtered Users".to_string(),
                },
                Panel::Mean {
                    label: "Average Age".to_string(),
                    column: "Age".to_string(),
                },
                Panel::Mean {
                    label: "Average Household Income".to_string(),
                    column: "HouseholdIncome".to_string(),
                },
            ],
            raw_columns: strings(&[
                "UserID",
                "Name",
                "Age",
                "Gender",
                "IncomeBracket",
                "SmokerLabel",
            ]),
            id_column: "UserID".to_string(),
        }
    }

    pub fn all() -> Vec<ViewPreset> {
        vec![Self::popularity(), Self::segmentation()]
    }

    pub fn default_top_n(&self) -> Option<usize> {
        self.top_n_choices.first().copied()
    }

    /// Check that `table` has every column this view filters on, and that
    /// range columns are numeric.
    pub fn validate(&self, table: &Table) -> Result<()> {
        for col in self.set_filters.iter().chain(&self.raw_columns) {
            if !table.has_column(col) {
                return Err(DashboardError::missing_column(col));
            }
        }
        for col in &self.range_filters {
            match table.kind(col) {
                Some(ColumnKind::Numeric) => {}
                Some(ColumnKind::Categorical) => return Err(DashboardError::not_numeric(col)),
                None => return Err(DashboardError::missing_column(col)),
            }
        }
        Ok(())
    }

    /// Evaluate every panel over `view`.
    ///
    /// Fails with `EmptyResult` when the selection has no rows, before any
    /// aggregate is attempted.
    pub fn report(&self, view: &FilteredView, top_n: Option<usize>) -> Result<ViewReport> {
        let view = view.require_rows()?;

        let panels = self
            .panels
            .iter()
            .map(|panel| self.evaluate(panel, view, top_n))
            .collect::<Result<Vec<_>>>()?;

        Ok(ViewReport {
            view_id: self.id.clone(),
            title: self.title.clone(),
            rows: view.len(),
            top_n,
            panels,
        })
    }

    fn evaluate(&self, panel: &Panel, view: &FilteredView, top_n: Option<usize>) -> Result<PanelOutput> {
        let out = match panel {
            Panel::TopN { subject, group, value } => {
                let n = top_n
                    .or_else(|| self.default_top_n())
                    .ok_or_else(|| {
                        DashboardError::InvalidArgument(format!(
                            "view '{}' has no top-n size",
                            self.id
                        ))
                    })?;
                PanelOutput::Ranking {
                    title: format!("Top {n} {subject}"),
                    entries: aggregate::top_n_grouped_sum(view, group, value, n)?,
                }
            }
            Panel::Histogram { title, column, bins } => PanelOutput::Histogram {
                title: title.clone(),
                bins: aggregate::histogram(view, column, *bins)?,
            },
            Panel::Scatter { title, x, y, color, size } => PanelOutput::Scatter {
                title: title.clone(),
                points: aggregate::scatter_points(
                    view,
                    x,
                    y,
                    color.as_deref(),
                    size.as_deref(),
                )?,
            },
            Panel::Proportions { title, column } => PanelOutput::Proportions {
                title: title.clone(),
                shares: aggregate::proportions(view, column)?,
            },
            Panel::ValueCounts { title, column } => PanelOutput::Counts {
                title: title.clone(),
                counts: aggregate::value_counts(view, column)?,
            },
            Panel::Total { label, column } => PanelOutput::Statistic {
                label: label.clone(),
                value: aggregate::sum(view, column)?,
            },
            Panel::Mean { label, column } => PanelOutput::Statistic {
                label: label.clone(),
                value: aggregate::mean(view, column)?,
            },
            Panel::Count { label } => PanelOutput::Statistic {
                label: label.clone(),
                value: aggregate::count(view) as f64,
            },
        };
        Ok(out)
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Evaluated panel, ready for a chart or a summary line.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PanelOutput {
    Ranking { title: String, entries: Vec<GroupTotal> },
    Histogram { title: String, bins: Vec<HistogramBin> },
    Scatter { title: String, points: Vec<ScatterPoint> },
    Proportions { title: String, shares: Vec<Proportion> },
    Counts { title: String, counts: Vec<ValueCount> },
    Statistic { label: String, value: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewReport {
    pub view_id: String,
    pub title: String,
    pub rows: usize,
    pub top_n: Option<usize>,
    pub panels: Vec<PanelOutput>,
}

impl ViewReport {
    pub fn statistic(&self, label: &str) -> Option<f64> {
        self.panels.iter().find_map(|p| match p {
            PanelOutput::Statistic { label: l, value } if l == label => Some(*value),
            _ => None,
        })
    }
}
