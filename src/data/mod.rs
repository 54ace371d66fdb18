/// Data layer: core types, loading, classification and filtering.
///
/// Architecture:
/// ```text
///  .xlsx / .csv / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → raw rows → Table (header promoted)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ columns   │  classify cutoff columns → Schema (once per load)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  rank window + code sets → ResultTable (per query)
///   └──────────┘
/// ```

pub mod columns;
pub mod filter;
pub mod loader;
pub mod model;
