/// Core domain types for the hydrologic reference data service.
///
/// This module defines the shared value types imported by all other
/// modules. It contains no I/O — only types, their accessors, and the
/// error taxonomy the store-facing modules share.
///
/// All values here are per-request: they are built from store rows,
/// serialized into a response, and dropped. Nothing is cached.

use chrono::{DateTime, Utc};
use serde::Serialize;

// ---------------------------------------------------------------------------
// Basin
// ---------------------------------------------------------------------------

/// A drainage basin owned by an office, with optional drainage areas in km²
/// and an optional fully resolved primary stream.
///
/// `parent_basin_id` is a weak reference — the parent's name only, never an
/// owning pointer — so basin values never form an in-memory graph. Resolving
/// a parent is a fresh lookup by id.
///
/// Construction goes through `basins::BasinBuilder` exclusively; the fields
/// are crate-private so a half-populated basin is never observable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Basin {
    pub(crate) basin_id: String,
    pub(crate) office_id: String,
    pub(crate) parent_basin_id: Option<String>,
    pub(crate) sort_order: Option<f64>,
    pub(crate) total_drainage_area: Option<f64>,
    pub(crate) contributing_drainage_area: Option<f64>,
    pub(crate) primary_stream: Option<Stream>,
}

impl Basin {
    pub fn basin_id(&self) -> &str {
        &self.basin_id
    }

    pub fn office_id(&self) -> &str {
        &self.office_id
    }

    pub fn parent_basin_id(&self) -> Option<&str> {
        self.parent_basin_id.as_deref()
    }

    pub fn sort_order(&self) -> Option<f64> {
        self.sort_order
    }

    /// Total drainage area in km².
    pub fn total_drainage_area(&self) -> Option<f64> {
        self.total_drainage_area
    }

    /// Contributing drainage area in km². At most the total area when both
    /// are present — an invariant of the store's area computation, trusted
    /// rather than re-checked here.
    pub fn contributing_drainage_area(&self) -> Option<f64> {
        self.contributing_drainage_area
    }

    pub fn primary_stream(&self) -> Option<&Stream> {
        self.primary_stream.as_ref()
    }
}

// ---------------------------------------------------------------------------
// Stream
// ---------------------------------------------------------------------------

/// A drainage stream and its connectivity metadata.
///
/// The store owns the full stream topology; once resolved, a stream is
/// treated as an opaque leaf value — callers use the identity fields and
/// serialize the rest untouched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stream {
    pub stream_id: String,
    pub office_id: String,
    /// Receiving stream, if this stream is a tributary.
    pub flows_into_stream_id: Option<String>,
    /// Station (river mile) on the receiving stream at the confluence.
    pub flows_into_station: Option<f64>,
    /// Stream length in km.
    pub stream_length: Option<f64>,
}

// ---------------------------------------------------------------------------
// Location levels and parameters
// ---------------------------------------------------------------------------

/// A location level: a named reference elevation/flow for a location,
/// e.g. "Kans-Gage.Stage.Top of Flood" = 230.5 m.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationLevel {
    pub level_id: String,
    pub office_id: String,
    pub parameter_id: String,
    pub level_value: Option<f64>,
    pub level_unit: String,
    pub level_date: DateTime<Utc>,
}

/// An entry from the parameter catalog, e.g. Stage, Flow, Elev.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    pub parameter_id: String,
    pub long_name: String,
    pub base_unit: String,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can arise while resolving reference data from the store.
///
/// Nothing below the endpoint layer catches these — a failure propagates
/// up carrying the id/office being resolved so the endpoint can produce a
/// user-facing message without losing the cause.
#[derive(Debug, PartialEq)]
pub enum StoreError {
    /// The id had no matching row. Distinct from a transient store failure.
    NotFound {
        entity: &'static str,
        id: String,
        office_id: String,
    },
    /// Connection or query failure against the store.
    Unavailable(String),
    /// Malformed input: empty id, bad cursor token, unparseable timestamp.
    InvalidInput(String),
    /// A basin's primary stream could not be resolved. The basin is not
    /// returned partially — the whole operation fails with this wrapper
    /// so both the basin context and the underlying failure survive.
    UnresolvedStream {
        basin_id: String,
        stream_id: String,
        office_id: String,
        cause: Box<StoreError>,
    },
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::NotFound { entity, id, office_id } => {
                write!(f, "no such {}: {} (office {})", entity, id, office_id)
            }
            StoreError::Unavailable(detail) => {
                write!(f, "record store unavailable: {}", detail)
            }
            StoreError::InvalidInput(detail) => {
                write!(f, "invalid request: {}", detail)
            }
            StoreError::UnresolvedStream { basin_id, stream_id, office_id, cause } => {
                write!(
                    f,
                    "primary stream {} of basin {} (office {}) could not be resolved: {}",
                    stream_id, basin_id, office_id, cause
                )
            }
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::UnresolvedStream { cause, .. } => Some(cause.as_ref()),
            _ => None,
        }
    }
}
