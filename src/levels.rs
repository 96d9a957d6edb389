/// Location-level retrieval.
///
/// Levels are named reference values (flood stages, minimum releases)
/// maintained in the store; this module only maps rows to values. The
/// level math — interpolation, seasonal variation — happens in the
/// store's procedures.

use crate::model::{LocationLevel, StoreError};
use crate::store::{LevelRow, RecordStore};

pub fn get_location_level(
    store: &mut dyn RecordStore,
    level_id: &str,
    office_id: &str,
) -> Result<LocationLevel, StoreError> {
    if level_id.trim().is_empty() {
        return Err(StoreError::InvalidInput(
            "location level id must not be empty".to_string(),
        ));
    }

    let row = store.query_location_level(level_id, office_id)?;
    Ok(from_row(row))
}

/// Every level of an office, in the store's row order. Level catalogs are
/// small; no pagination.
pub fn get_location_levels(
    store: &mut dyn RecordStore,
    office_id: &str,
) -> Result<Vec<LocationLevel>, StoreError> {
    let rows = store.query_location_levels(office_id)?;
    Ok(rows.into_iter().map(from_row).collect())
}

fn from_row(row: LevelRow) -> LocationLevel {
    LocationLevel {
        level_id: row.level_id,
        office_id: row.office_id,
        parameter_id: row.parameter_id,
        level_value: row.level_value,
        level_unit: row.level_unit,
        level_date: row.level_date,
    }
}
