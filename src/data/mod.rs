/// Data layer: core types, loading, filtering, and aggregation.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌────────────┐
///   │   loader    │  parse file → Table
///   └────────────┘
///        │
///        ▼
///   ┌────────────┐
///   │ repository  │  load once per source id, share Arc<Table>
///   └────────────┘
///        │
///        ▼
///   ┌────────────┐
///   │   filter    │  FilterSpec predicates → FilteredView
///   └────────────┘
///        │
///        ▼
///   ┌────────────┐
///   │  aggregate  │  top-n sums, means, proportions, histograms
///   └────────────┘
/// ```

pub mod aggregate;
pub mod filter;
pub mod loader;
pub mod model;
pub mod repository;
