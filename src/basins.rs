/// Basin assembly.
///
/// Rebuilds immutable `Basin` values from the flat rows the store serves:
/// scalar fields come straight from the row, and a non-null primary stream
/// id is handed to `streams::get_stream` so the returned basin carries a
/// fully resolved stream or the whole call fails. No partial basin is ever
/// returned.

use crate::model::{Basin, StoreError, Stream};
use crate::store::{BasinRow, RecordStore};
use crate::streams;

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Accumulating builder for `Basin`.
///
/// Staging starts from a base identity (`new`) or a copy of an existing
/// value (`From<&Basin>`), collects optional fields through the `with_*`
/// setters, and `build` freezes the result. Attaching a resolved stream to
/// an already-built basin is a copy-then-build, never a mutation.
#[derive(Debug, Clone)]
pub struct BasinBuilder {
    basin_id: String,
    office_id: String,
    parent_basin_id: Option<String>,
    sort_order: Option<f64>,
    total_drainage_area: Option<f64>,
    contributing_drainage_area: Option<f64>,
    primary_stream: Option<Stream>,
}

impl BasinBuilder {
    pub fn new(basin_id: &str, office_id: &str) -> Self {
        BasinBuilder {
            basin_id: basin_id.to_string(),
            office_id: office_id.to_string(),
            parent_basin_id: None,
            sort_order: None,
            total_drainage_area: None,
            contributing_drainage_area: None,
            primary_stream: None,
        }
    }

    pub fn with_parent_basin_id(mut self, parent_basin_id: Option<String>) -> Self {
        self.parent_basin_id = parent_basin_id;
        self
    }

    pub fn with_sort_order(mut self, sort_order: Option<f64>) -> Self {
        self.sort_order = sort_order;
        self
    }

    pub fn with_total_drainage_area(mut self, area: Option<f64>) -> Self {
        self.total_drainage_area = area;
        self
    }

    pub fn with_contributing_drainage_area(mut self, area: Option<f64>) -> Self {
        self.contributing_drainage_area = area;
        self
    }

    pub fn with_primary_stream(mut self, stream: Option<Stream>) -> Self {
        self.primary_stream = stream;
        self
    }

    pub fn build(self) -> Basin {
        Basin {
            basin_id: self.basin_id,
            office_id: self.office_id,
            parent_basin_id: self.parent_basin_id,
            sort_order: self.sort_order,
            total_drainage_area: self.total_drainage_area,
            contributing_drainage_area: self.contributing_drainage_area,
            primary_stream: self.primary_stream,
        }
    }
}

impl From<&Basin> for BasinBuilder {
    /// Pre-populates the staging structure with an existing basin's fields.
    fn from(basin: &Basin) -> Self {
        BasinBuilder {
            basin_id: basin.basin_id.clone(),
            office_id: basin.office_id.clone(),
            parent_basin_id: basin.parent_basin_id.clone(),
            sort_order: basin.sort_order,
            total_drainage_area: basin.total_drainage_area,
            contributing_drainage_area: basin.contributing_drainage_area,
            primary_stream: basin.primary_stream.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Retrieval
// ---------------------------------------------------------------------------

/// Retrieves one basin with its primary stream resolved.
pub fn get_basin(
    store: &mut dyn RecordStore,
    basin_id: &str,
    office_id: &str,
) -> Result<Basin, StoreError> {
    if basin_id.trim().is_empty() {
        return Err(StoreError::InvalidInput(
            "basin id must not be empty".to_string(),
        ));
    }

    let row = store.query_basin(basin_id, office_id)?;
    assemble_basin(store, row)
}

/// Retrieves every basin of an office, in the store's row order.
///
/// Each row's primary stream is resolved with its own store call — an N+1
/// pattern kept deliberately: stream lookups are cheap and offices hold
/// few basins, so one batched topology query is not worth its complexity.
pub fn get_all_basins(
    store: &mut dyn RecordStore,
    office_id: &str,
) -> Result<Vec<Basin>, StoreError> {
    let rows = store.query_basins(office_id)?;

    let mut basins = Vec::with_capacity(rows.len());
    for row in rows {
        basins.push(assemble_basin(store, row)?);
    }
    Ok(basins)
}

/// Builds the basin value, then resolves and attaches the primary stream
/// if the row names one. Stream failures wrap as `UnresolvedStream` so
/// the basin context is not lost on the way up.
fn assemble_basin(store: &mut dyn RecordStore, row: BasinRow) -> Result<Basin, StoreError> {
    let mut basin = BasinBuilder::new(&row.basin_id, &row.office_id)
        .with_total_drainage_area(row.total_drainage_area)
        .with_contributing_drainage_area(row.contributing_drainage_area)
        .with_parent_basin_id(row.parent_basin_id)
        .with_sort_order(row.sort_order)
        .build();

    if let Some(stream_id) = row.primary_stream_id {
        let stream = streams::get_stream(store, &stream_id, &row.office_id).map_err(|cause| {
            StoreError::UnresolvedStream {
                basin_id: row.basin_id.clone(),
                stream_id: stream_id.clone(),
                office_id: row.office_id.clone(),
                cause: Box::new(cause),
            }
        })?;
        basin = BasinBuilder::from(&basin)
            .with_primary_stream(Some(stream))
            .build();
    }

    Ok(basin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::fixtures::MemoryStore;
    use crate::store::BasinRow;

    // --- Builder -------------------------------------------------------------

    #[test]
    fn test_builder_freezes_all_fields() {
        let basin = BasinBuilder::new("KANS", "SWT")
            .with_parent_basin_id(Some("MISS".to_string()))
            .with_sort_order(Some(1.0))
            .with_total_drainage_area(Some(15000.0))
            .with_contributing_drainage_area(Some(14200.0))
            .build();

        assert_eq!(basin.basin_id(), "KANS");
        assert_eq!(basin.office_id(), "SWT");
        assert_eq!(basin.parent_basin_id(), Some("MISS"));
        assert_eq!(basin.sort_order(), Some(1.0));
        assert_eq!(basin.total_drainage_area(), Some(15000.0));
        assert_eq!(basin.contributing_drainage_area(), Some(14200.0));
        assert!(basin.primary_stream().is_none());
    }

    #[test]
    fn test_builder_copy_preserves_fields_and_applies_overrides() {
        let original = BasinBuilder::new("KANS", "SWT")
            .with_sort_order(Some(1.0))
            .with_total_drainage_area(Some(15000.0))
            .build();

        let stream = Stream {
            stream_id: "KANSR".to_string(),
            office_id: "SWT".to_string(),
            flows_into_stream_id: None,
            flows_into_station: None,
            stream_length: None,
        };
        let copy = BasinBuilder::from(&original)
            .with_primary_stream(Some(stream))
            .build();

        // Untouched fields carried over, the override applied, and the
        // original value left as it was.
        assert_eq!(copy.total_drainage_area(), Some(15000.0));
        assert_eq!(copy.sort_order(), Some(1.0));
        assert_eq!(copy.primary_stream().unwrap().stream_id, "KANSR");
        assert!(original.primary_stream().is_none());
    }

    // --- Single retrieval ----------------------------------------------------

    #[test]
    fn test_get_basin_resolves_primary_stream() {
        let mut store = MemoryStore::southwestern_division();
        let basin = get_basin(&mut store, "KANS", "SWT").expect("KANS should resolve");

        assert_eq!(basin.basin_id(), "KANS");
        assert_eq!(basin.total_drainage_area(), Some(15000.0));
        assert_eq!(basin.contributing_drainage_area(), Some(15000.0));
        let stream = basin.primary_stream().expect("primary stream must be attached");
        assert_eq!(stream.stream_id, "KANSR");
    }

    #[test]
    fn test_get_basin_without_primary_stream() {
        let mut store = MemoryStore::southwestern_division();
        let basin = get_basin(&mut store, "VERD", "SWT").expect("VERD should resolve");

        assert!(basin.primary_stream().is_none());
        assert_eq!(basin.parent_basin_id(), Some("NEOS"));
        assert_eq!(basin.contributing_drainage_area(), None);
    }

    #[test]
    fn test_get_basin_unknown_id_is_not_found() {
        let mut store = MemoryStore::southwestern_division();
        let err = get_basin(&mut store, "NOSUCH", "SWT").unwrap_err();
        assert!(matches!(err, StoreError::NotFound { entity: "basin", .. }));
    }

    #[test]
    fn test_get_basin_empty_id_rejected() {
        let mut store = MemoryStore::southwestern_division();
        let err = get_basin(&mut store, "", "SWT").unwrap_err();
        assert!(matches!(err, StoreError::InvalidInput(_)));
    }

    #[test]
    fn test_unresolvable_stream_fails_whole_basin() {
        let mut store = MemoryStore::southwestern_division();
        store.push_basin(BasinRow {
            office_id: "SWT".to_string(),
            basin_id: "WALN".to_string(),
            parent_basin_id: None,
            sort_order: Some(4.0),
            primary_stream_id: Some("GHOST".to_string()),
            total_drainage_area: Some(5000.0),
            contributing_drainage_area: Some(5000.0),
        });

        let err = get_basin(&mut store, "WALN", "SWT").unwrap_err();
        match err {
            StoreError::UnresolvedStream { basin_id, stream_id, cause, .. } => {
                assert_eq!(basin_id, "WALN");
                assert_eq!(stream_id, "GHOST");
                assert!(matches!(*cause, StoreError::NotFound { entity: "stream", .. }));
            }
            other => panic!("expected UnresolvedStream, got {:?}", other),
        }
    }

    // --- Bulk retrieval ------------------------------------------------------

    #[test]
    fn test_get_all_basins_preserves_row_order() {
        let mut store = MemoryStore::southwestern_division();
        let basins = get_all_basins(&mut store, "SWT").expect("catalog should resolve");

        let ids: Vec<&str> = basins.iter().map(|b| b.basin_id()).collect();
        assert_eq!(ids, vec!["KANS", "NEOS", "VERD"]);
    }

    #[test]
    fn test_get_all_basins_resolves_each_stream_independently() {
        let mut store = MemoryStore::southwestern_division();
        let basins = get_all_basins(&mut store, "SWT").unwrap();

        assert_eq!(basins[0].primary_stream().unwrap().stream_id, "KANSR");
        assert_eq!(basins[1].primary_stream().unwrap().stream_id, "NEOSR");
        assert!(basins[2].primary_stream().is_none());
    }

    #[test]
    fn test_get_all_basins_unknown_office_is_empty() {
        let mut store = MemoryStore::southwestern_division();
        let basins = get_all_basins(&mut store, "NWD").unwrap();
        assert!(basins.is_empty());
    }

    #[test]
    fn test_get_all_basins_outage_is_unavailable() {
        let mut store = MemoryStore::southwestern_division();
        store.set_failing(true);
        let err = get_all_basins(&mut store, "SWT").unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }
}
