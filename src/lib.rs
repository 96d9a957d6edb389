/// hydref_service: read-only HTTP service over hydrologic reference data.
///
/// # Module structure
///
/// ```text
/// hydref_service
/// ├── model       — shared domain types (Basin, Stream, LocationLevel, StoreError, …)
/// ├── config      — service configuration loader (service.toml)
/// ├── db          — PostgreSQL connection + schema validation
/// ├── store       — record store gateway over the hydro_ref stored procedures
/// │   └── fixtures (test only) — in-memory store with a representative dataset
/// ├── basins      — basin assembly: builder + single/bulk retrieval
/// ├── streams     — stream resolution
/// ├── paging      — opaque page cursor encoding/decoding
/// ├── timeseries  — paged time-series retrieval
/// ├── levels      — location-level retrieval
/// ├── parameters  — parameter catalog retrieval
/// └── endpoint    — HTTP API (tiny_http, one store connection per request)
/// ```

/// Public modules
pub mod basins;
pub mod config;
pub mod db;
pub mod endpoint;
pub mod levels;
pub mod model;
pub mod paging;
pub mod parameters;
pub mod store;
pub mod streams;
pub mod timeseries;
