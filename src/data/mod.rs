//! Data layer: source adapter, column resolution, queries and drill-down.
//!
//! Architecture:
//! ```text
//!  .db / .parquet / .json / .csv
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  open SQLite file, or import flat file → in-memory table
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────────┐
//!   │  DataSource   │  SQL text + bound params → ResultSet
//!   └──────────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  schema   │  logical field → actual column (case-insensitive)
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────────────┐
//!   │ queries / filter  │  aggregates, record set, drill-down
//!   └──────────────────┘
//! ```

pub mod filter;
pub mod loader;
pub mod model;
pub mod queries;
pub mod schema;
pub mod source;
