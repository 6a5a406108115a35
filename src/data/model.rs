use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::Serialize;

use crate::error::{DashboardError, Result};

// ---------------------------------------------------------------------------
// Value – a single cell of a table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring the dtypes a CSV column can carry.
/// Used as a `BTreeSet` / `HashMap` key downstream, so `Value` must be `Ord`
/// and `Hash`. Floats compare with `total_cmp`.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Value {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

// -- Manual Eq/Ord so we can put Value in BTreeSet --

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        use Value::*;
        fn discriminant(v: &Value) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                Text(_) => 4,
            }
        }
        match (self, other) {
            (Null, Null) => Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (Text(a), Text(b)) => a.cmp(b),
            _ => discriminant(self).cmp(&discriminant(other)),
        }
    }
}

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Text(s) => s.hash(state),
            Value::Integer(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Bool(b) => b.hash(state),
            Value::Null => {}
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => write!(f, "{s}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v:.2}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Null => write!(f, "<null>"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl Value {
    /// Numeric view of the value, used by range predicates and aggregates.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

static NULL: Value = Value::Null;

// ---------------------------------------------------------------------------
// Record – one row of a table
// ---------------------------------------------------------------------------

/// A single row: column_name → value. Absent columns read as `Null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Record {
    fields: BTreeMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(column.into(), value.into());
    }

    pub fn get(&self, column: &str) -> &Value {
        self.fields.get(column).unwrap_or(&NULL)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.fields.contains_key(column)
    }

    /// Copy of this record restricted to `columns`.
    pub fn project(&self, columns: &[String]) -> Record {
        columns
            .iter()
            .map(|c| (c.clone(), self.get(c).clone()))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Record {
            fields: iter.into_iter().collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Table – the complete loaded dataset
// ---------------------------------------------------------------------------

/// How a column can be used by filter controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ColumnKind {
    /// Every non-null cell is numeric: range predicates, sums, means.
    Numeric,
    /// Anything else: set predicates, grouping, proportions.
    Categorical,
}

/// An immutable dataset with a pre-computed column index.
///
/// Built once by the loader and shared behind an `Arc` for the lifetime of
/// the process. Every record carries every column.
#[derive(Debug)]
pub struct Table {
    name: String,
    /// Column names in header order.
    columns: Vec<String>,
    records: Vec<Record>,
    /// Distinct values per column in first-appearance order.
    distinct: BTreeMap<String, Vec<Value>>,
    kinds: BTreeMap<String, ColumnKind>,
    /// Inclusive numeric bounds per numeric column.
    bounds: BTreeMap<String, (f64, f64)>,
}

impl Table {
    /// Build the column index from the loaded records.
    ///
    /// Columns found in records but missing from `columns` are appended in
    /// first-appearance order; cells missing from a record become `Null`, as
    /// do NaN floats. Integers in a column that also holds floats become
    /// floats.
    pub fn from_records(name: impl Into<String>, columns: Vec<String>, records: Vec<Record>) -> Self {
        let mut columns = columns;
        let mut known: HashSet<String> = columns.iter().cloned().collect();
        for rec in &records {
            for (col, _) in rec.iter() {
                if known.insert(col.clone()) {
                    columns.push(col.clone());
                }
            }
        }

        // A column holding any float is a float column: integers are widened
        // so 30 and 30.0 are the same option, group and category.
        let float_columns: HashSet<&String> = columns
            .iter()
            .filter(|col| {
                records
                    .iter()
                    .any(|rec| matches!(rec.get(col), Value::Float(f) if !f.is_nan()))
            })
            .collect();

        let records: Vec<Record> = records
            .into_iter()
            .map(|mut rec| {
                for col in &columns {
                    let normalized = match rec.get(col) {
                        Value::Float(f) if f.is_nan() => Some(Value::Null),
                        Value::Integer(i) if float_columns.contains(col) => {
                            Some(Value::Float(*i as f64))
                        }
                        _ if !rec.contains(col) => Some(Value::Null),
                        _ => None,
                    };
                    if let Some(value) = normalized {
                        rec.insert(col.clone(), value);
                    }
                }
                rec
            })
            .collect();

        let mut distinct = BTreeMap::new();
        let mut kinds = BTreeMap::new();
        let mut bounds = BTreeMap::new();

        for col in &columns {
            let mut seen: HashSet<&Value> = HashSet::new();
            let mut values = Vec::new();
            let mut numeric = true;
            let mut any_value = false;
            let mut lo = f64::INFINITY;
            let mut hi = f64::NEG_INFINITY;

            for rec in &records {
                let val = rec.get(col);
                if seen.insert(val) {
                    values.push(val.clone());
                }
                if val.is_null() {
                    continue;
                }
                any_value = true;
                match val.as_f64() {
                    Some(v) => {
                        lo = lo.min(v);
                        hi = hi.max(v);
                    }
                    None => numeric = false,
                }
            }

            let kind = if numeric && any_value {
                bounds.insert(col.clone(), (lo, hi));
                ColumnKind::Numeric
            } else {
                ColumnKind::Categorical
            };
            kinds.insert(col.clone(), kind);
            distinct.insert(col.clone(), values);
        }

        Table {
            name: name.into(),
            columns,
            records,
            distinct,
            kinds,
            bounds,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.kinds.contains_key(column)
    }

    pub fn kind(&self, column: &str) -> Option<ColumnKind> {
        self.kinds.get(column).copied()
    }

    /// Distinct values of a column in first-appearance order; the options of
    /// a set-predicate control.
    pub fn distinct_values(&self, column: &str) -> Result<&[Value]> {
        self.distinct
            .get(column)
            .map(Vec::as_slice)
            .ok_or_else(|| DashboardError::missing_column(column))
    }

    /// Inclusive `(min, max)` of a numeric column over the unfiltered table;
    /// the extent of a range-predicate control.
    pub fn range_bounds(&self, column: &str) -> Result<(f64, f64)> {
        match self.kinds.get(column) {
            None => Err(DashboardError::missing_column(column)),
            Some(ColumnKind::Categorical) => Err(DashboardError::not_numeric(column)),
            Some(ColumnKind::Numeric) => self
                .bounds
                .get(column)
                .copied()
                .ok_or_else(|| DashboardError::not_numeric(column)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, Value)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_range_bounds_ignore_row_order() {
        let records = [3, 7, 1, 9]
            .iter()
            .map(|v| record(&[("Age", Value::Integer(*v))]))
            .collect();
        let table = Table::from_records("profile", vec!["Age".to_string()], records);

        assert_eq!(table.range_bounds("Age").unwrap(), (1.0, 9.0));
        assert_eq!(table.kind("Age"), Some(ColumnKind::Numeric));
    }

    #[test]
    fn test_range_bounds_rejects_text_and_unknown_columns() {
        let table = Table::from_records(
            "sales",
            vec!["BrandName".to_string()],
            vec![record(&[("BrandName", "Zippo".into())])],
        );

        assert!(matches!(
            table.range_bounds("BrandName"),
            Err(DashboardError::InvalidArgument(_))
        ));
        assert!(matches!(
            table.range_bounds("Nope"),
            Err(DashboardError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_distinct_values_keep_first_appearance_order() {
        let records = ["Bic", "Zippo", "Bic", "Clipper"]
            .iter()
            .map(|b| record(&[("BrandName", (*b).into())]))
            .collect();
        let table = Table::from_records("sales", vec!["BrandName".to_string()], records);

        let values: Vec<String> = table
            .distinct_values("BrandName")
            .unwrap()
            .iter()
            .map(|v| v.to_string())
            .collect();
        assert_eq!(values, vec!["Bic", "Zippo", "Clipper"]);
        assert_eq!(table.kind("BrandName"), Some(ColumnKind::Categorical));
    }

    #[test]
    fn test_missing_cells_become_null() {
        let records = vec![
            record(&[("Age", Value::Integer(30)), ("Gender", "F".into())]),
            record(&[("Age", Value::Integer(41))]),
        ];
        let table = Table::from_records("profile", vec!["Age".to_string()], records);

        assert_eq!(table.columns(), &["Age".to_string(), "Gender".to_string()]);
        assert_eq!(table.records()[1].get("Gender"), &Value::Null);
        assert_eq!(table.distinct_values("Gender").unwrap().len(), 2);
    }

    #[test]
    fn test_mixed_integer_and_float_column_is_numeric() {
        let records = vec![
            record(&[("UnitPrice", Value::Integer(10))]),
            record(&[("UnitPrice", Value::Float(12.5))]),
            record(&[("UnitPrice", Value::Null)]),
        ];
        let table = Table::from_records("sales", vec!["UnitPrice".to_string()], records);

        assert_eq!(table.kind("UnitPrice"), Some(ColumnKind::Numeric));
        assert_eq!(table.range_bounds("UnitPrice").unwrap(), (10.0, 12.5));
    }

    #[test]
    fn test_integers_widen_in_float_columns() {
        let records = vec![
            record(&[("Age", Value::Integer(30)), ("Quantity", Value::Integer(1))]),
            record(&[("Age", Value::Float(30.0)), ("Quantity", Value::Integer(2))]),
        ];
        let table = Table::from_records("profile", Vec::new(), records);

        assert_eq!(table.distinct_values("Age").unwrap(), &[Value::Float(30.0)]);
        assert_eq!(table.records()[0].get("Age"), &Value::Float(30.0));
        assert_eq!(table.records()[1].get("Quantity"), &Value::Integer(2));
    }

    #[test]
    fn test_nan_floats_become_null() {
        let records = vec![
            record(&[("UnitPrice", Value::Float(f64::NAN))]),
            record(&[("UnitPrice", Value::Float(4.5))]),
        ];
        let table = Table::from_records("sales", Vec::new(), records);

        assert_eq!(table.records()[0].get("UnitPrice"), &Value::Null);
        assert_eq!(table.range_bounds("UnitPrice").unwrap(), (4.5, 4.5));
    }

    #[test]
    fn test_value_ordering_is_total() {
        let mut values = vec![
            Value::Text("b".into()),
            Value::Float(f64::NAN),
            Value::Null,
            Value::Integer(3),
            Value::Float(1.5),
        ];
        values.sort();
        assert_eq!(values[0], Value::Null);
        assert_eq!(values[1], Value::Integer(3));
        assert_eq!(values[4], Value::Text("b".into()));
        assert_eq!(Value::Float(f64::NAN), Value::Float(f64::NAN));
    }
}
