//! Data layer: core types, loading, filtering, aggregation, search, export.
//!
//! ```text
//!   collisions.csv (path or upload)
//!          │
//!          ▼
//!     ┌────────┐
//!     │ loader │  parse + derive calendar fields → CollisionDataset
//!     └────────┘
//!          │
//!          ▼
//!     ┌────────┐
//!     │ filter │  FilterSpec predicates → DatasetView (index subset)
//!     └────────┘
//!          │
//!          ├──────────────┬────────────┐
//!          ▼              ▼            ▼
//!     ┌───────────┐  ┌────────┐  ┌────────┐
//!     │ aggregate │  │ search │  │ export │
//!     └───────────┘  └────────┘  └────────┘
//! ```

pub mod aggregate;
pub mod export;
pub mod filter;
pub mod loader;
pub mod model;
pub mod search;
