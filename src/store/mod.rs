/// Record store gateway.
///
/// The hydrology business rules (drainage area computation, unit
/// conversion, basin/stream topology) live in stored procedures in the
/// `hydro_ref` schema — this layer only names the queries the service
/// consumes and maps raw rows into plain structs. It never interprets
/// the data it carries.
///
/// `RecordStore` is the seam the assembly modules are written against;
/// `PgRecordStore` is the production implementation, and
/// `fixtures::MemoryStore` backs the tests.

pub mod fixtures;

use chrono::{DateTime, Utc};
use postgres::Client;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::db;
use crate::model::StoreError;

/// Area unit requested from every basin procedure call. The store converts
/// on its side; this service never does unit math.
pub const AREA_UNIT: &str = "km2";

// ---------------------------------------------------------------------------
// Row shapes
// ---------------------------------------------------------------------------

/// One row of the basin catalog / single-basin retrieval.
/// Areas are in `AREA_UNIT`.
#[derive(Debug, Clone, PartialEq)]
pub struct BasinRow {
    pub office_id: String,
    pub basin_id: String,
    pub parent_basin_id: Option<String>,
    pub sort_order: Option<f64>,
    pub primary_stream_id: Option<String>,
    pub total_drainage_area: Option<f64>,
    pub contributing_drainage_area: Option<f64>,
}

/// One stream row, identity plus connectivity.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamRow {
    pub stream_id: String,
    pub office_id: String,
    pub flows_into_stream_id: Option<String>,
    pub flows_into_station: Option<f64>,
    pub stream_length: Option<f64>,
}

/// One time-series sample. `value` is nullable: a timestamp can exist with
/// a missing measurement and a quality code explaining why.
#[derive(Debug, Clone, PartialEq)]
pub struct TsSample {
    pub date_time: DateTime<Utc>,
    pub value: Option<f64>,
    pub quality_code: i32,
}

/// An ordered time-series query result: the unit the store served the
/// values in, and the samples in ascending timestamp order (the store's
/// ordering — never re-sorted here).
#[derive(Debug, Clone, PartialEq)]
pub struct TsQuery {
    pub units: String,
    pub samples: Vec<TsSample>,
}

/// One location-level row.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelRow {
    pub office_id: String,
    pub level_id: String,
    pub parameter_id: String,
    pub level_value: Option<f64>,
    pub level_unit: String,
    pub level_date: DateTime<Utc>,
}

/// One parameter catalog row.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterRow {
    pub parameter_id: String,
    pub long_name: String,
    pub base_unit: String,
}

// ---------------------------------------------------------------------------
// Gateway trait
// ---------------------------------------------------------------------------

/// The queries the service consumes. Every call is synchronous and may
/// block on network I/O; every call may fail with `Unavailable`. Single-row
/// lookups fail with `NotFound` when the id has no matching row.
pub trait RecordStore {
    /// Basin catalog for an office, in the store's default ordering.
    fn query_basins(&mut self, office_id: &str) -> Result<Vec<BasinRow>, StoreError>;

    /// Single basin lookup.
    fn query_basin(&mut self, basin_id: &str, office_id: &str) -> Result<BasinRow, StoreError>;

    /// Single stream lookup.
    fn query_stream(&mut self, stream_id: &str, office_id: &str) -> Result<StreamRow, StoreError>;

    /// Ordered samples for a named time series over `[begin, end]`.
    fn query_timeseries(
        &mut self,
        name: &str,
        office_id: &str,
        begin: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<TsQuery, StoreError>;

    /// Location-level catalog for an office.
    fn query_location_levels(&mut self, office_id: &str) -> Result<Vec<LevelRow>, StoreError>;

    /// Single location-level lookup.
    fn query_location_level(
        &mut self,
        level_id: &str,
        office_id: &str,
    ) -> Result<LevelRow, StoreError>;

    /// Full parameter catalog.
    fn query_parameters(&mut self) -> Result<Vec<ParameterRow>, StoreError>;
}

// ---------------------------------------------------------------------------
// PostgreSQL implementation
// ---------------------------------------------------------------------------

/// Production gateway over the `hydro_ref` stored-procedure schema.
///
/// One `PgRecordStore` wraps one connection. The endpoint layer opens one
/// per request and drops it when the request completes, so release is
/// guaranteed on every exit path.
pub struct PgRecordStore {
    client: Client,
}

impl PgRecordStore {
    /// Opens a fresh connection from `DATABASE_URL`.
    pub fn connect() -> Result<Self, StoreError> {
        let client = db::connect_simple()
            .map_err(|e| StoreError::Unavailable(format!("acquiring connection: {}", e)))?;
        Ok(PgRecordStore { client })
    }

    pub fn new(client: Client) -> Self {
        PgRecordStore { client }
    }

    fn basin_row(row: &postgres::Row) -> BasinRow {
        BasinRow {
            office_id: row.get(0),
            basin_id: row.get(1),
            parent_basin_id: row.get(2),
            sort_order: row.get(3),
            primary_stream_id: row.get(4),
            total_drainage_area: decimal_to_f64(row.get(5)),
            contributing_drainage_area: decimal_to_f64(row.get(6)),
        }
    }
}

/// NUMERIC columns arrive as `Decimal`; the wire format wants plain f64.
fn decimal_to_f64(value: Option<Decimal>) -> Option<f64> {
    value.and_then(|d| d.to_f64())
}

impl RecordStore for PgRecordStore {
    fn query_basins(&mut self, office_id: &str) -> Result<Vec<BasinRow>, StoreError> {
        let rows = self
            .client
            .query(
                "SELECT office_id, basin_id, parent_basin_id, sort_order, \
                        primary_stream_id, total_drainage_area, contributing_drainage_area \
                 FROM hydro_ref.cat_basins($1, $2)",
                &[&office_id, &AREA_UNIT],
            )
            .map_err(|e| {
                StoreError::Unavailable(format!("cat_basins for office {}: {}", office_id, e))
            })?;

        Ok(rows.iter().map(Self::basin_row).collect())
    }

    fn query_basin(&mut self, basin_id: &str, office_id: &str) -> Result<BasinRow, StoreError> {
        let rows = self
            .client
            .query(
                "SELECT office_id, basin_id, parent_basin_id, sort_order, \
                        primary_stream_id, total_drainage_area, contributing_drainage_area \
                 FROM hydro_ref.retrieve_basin($1, $2, $3)",
                &[&basin_id, &office_id, &AREA_UNIT],
            )
            .map_err(|e| {
                StoreError::Unavailable(format!(
                    "retrieve_basin {} (office {}): {}",
                    basin_id, office_id, e
                ))
            })?;

        match rows.first() {
            Some(row) => Ok(Self::basin_row(row)),
            None => Err(StoreError::NotFound {
                entity: "basin",
                id: basin_id.to_string(),
                office_id: office_id.to_string(),
            }),
        }
    }

    fn query_stream(&mut self, stream_id: &str, office_id: &str) -> Result<StreamRow, StoreError> {
        let rows = self
            .client
            .query(
                "SELECT stream_id, office_id, flows_into_stream_id, \
                        flows_into_station, stream_length \
                 FROM hydro_ref.retrieve_stream($1, $2)",
                &[&stream_id, &office_id],
            )
            .map_err(|e| {
                StoreError::Unavailable(format!(
                    "retrieve_stream {} (office {}): {}",
                    stream_id, office_id, e
                ))
            })?;

        match rows.first() {
            Some(row) => Ok(StreamRow {
                stream_id: row.get(0),
                office_id: row.get(1),
                flows_into_stream_id: row.get(2),
                flows_into_station: row.get(3),
                stream_length: row.get(4),
            }),
            None => Err(StoreError::NotFound {
                entity: "stream",
                id: stream_id.to_string(),
                office_id: office_id.to_string(),
            }),
        }
    }

    fn query_timeseries(
        &mut self,
        name: &str,
        office_id: &str,
        begin: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<TsQuery, StoreError> {
        // Unit lookup doubles as the existence check for the series name.
        let unit_rows = self
            .client
            .query(
                "SELECT unit_id FROM hydro_ref.retrieve_ts_unit($1, $2)",
                &[&name, &office_id],
            )
            .map_err(|e| {
                StoreError::Unavailable(format!(
                    "retrieve_ts_unit {} (office {}): {}",
                    name, office_id, e
                ))
            })?;
        let units: String = match unit_rows.first() {
            Some(row) => row.get(0),
            None => {
                return Err(StoreError::NotFound {
                    entity: "timeseries",
                    id: name.to_string(),
                    office_id: office_id.to_string(),
                })
            }
        };

        let rows = self
            .client
            .query(
                "SELECT date_time, value, quality_code \
                 FROM hydro_ref.retrieve_ts($1, $2, $3, $4)",
                &[&name, &office_id, &begin, &end],
            )
            .map_err(|e| {
                StoreError::Unavailable(format!(
                    "retrieve_ts {} (office {}): {}",
                    name, office_id, e
                ))
            })?;

        let samples = rows
            .iter()
            .map(|row| TsSample {
                date_time: row.get(0),
                value: decimal_to_f64(row.get(1)),
                quality_code: row.get(2),
            })
            .collect();

        Ok(TsQuery { units, samples })
    }

    fn query_location_levels(&mut self, office_id: &str) -> Result<Vec<LevelRow>, StoreError> {
        let rows = self
            .client
            .query(
                "SELECT office_id, level_id, parameter_id, level_value, \
                        level_unit, level_date \
                 FROM hydro_ref.cat_location_levels($1)",
                &[&office_id],
            )
            .map_err(|e| {
                StoreError::Unavailable(format!(
                    "cat_location_levels for office {}: {}",
                    office_id, e
                ))
            })?;

        Ok(rows.iter().map(level_row).collect())
    }

    fn query_location_level(
        &mut self,
        level_id: &str,
        office_id: &str,
    ) -> Result<LevelRow, StoreError> {
        let rows = self
            .client
            .query(
                "SELECT office_id, level_id, parameter_id, level_value, \
                        level_unit, level_date \
                 FROM hydro_ref.retrieve_location_level($1, $2)",
                &[&level_id, &office_id],
            )
            .map_err(|e| {
                StoreError::Unavailable(format!(
                    "retrieve_location_level {} (office {}): {}",
                    level_id, office_id, e
                ))
            })?;

        match rows.first() {
            Some(row) => Ok(level_row(row)),
            None => Err(StoreError::NotFound {
                entity: "location level",
                id: level_id.to_string(),
                office_id: office_id.to_string(),
            }),
        }
    }

    fn query_parameters(&mut self) -> Result<Vec<ParameterRow>, StoreError> {
        let rows = self
            .client
            .query(
                "SELECT parameter_id, long_name, base_unit FROM hydro_ref.cat_parameters()",
                &[],
            )
            .map_err(|e| StoreError::Unavailable(format!("cat_parameters: {}", e)))?;

        Ok(rows
            .iter()
            .map(|row| ParameterRow {
                parameter_id: row.get(0),
                long_name: row.get(1),
                base_unit: row.get(2),
            })
            .collect())
    }
}

fn level_row(row: &postgres::Row) -> LevelRow {
    LevelRow {
        office_id: row.get(0),
        level_id: row.get(1),
        parameter_id: row.get(2),
        level_value: decimal_to_f64(row.get(3)),
        level_unit: row.get(4),
        level_date: row.get(5),
    }
}
