/// Stream resolution.
///
/// Turns a stream id into an immutable `Stream` value via one store call.
/// A stream is a leaf: basins reference at most one primary stream, and a
/// stream never references a primary basin back through this path, so no
/// cycle detection is needed — that shape is guaranteed by the store's
/// schema, not re-verified here.

use crate::model::{StoreError, Stream};
use crate::store::RecordStore;

/// Resolves one stream. Unknown id → `NotFound`; store failure →
/// `Unavailable`. Failures are never caught by callers assembling a basin:
/// a basin whose primary stream cannot be resolved is not a valid basin.
pub fn get_stream(
    store: &mut dyn RecordStore,
    stream_id: &str,
    office_id: &str,
) -> Result<Stream, StoreError> {
    if stream_id.trim().is_empty() {
        return Err(StoreError::InvalidInput(
            "stream id must not be empty".to_string(),
        ));
    }

    let row = store.query_stream(stream_id, office_id)?;
    Ok(Stream {
        stream_id: row.stream_id,
        office_id: row.office_id,
        flows_into_stream_id: row.flows_into_stream_id,
        flows_into_station: row.flows_into_station,
        stream_length: row.stream_length,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::fixtures::MemoryStore;

    #[test]
    fn test_get_stream_resolves_connectivity() {
        let mut store = MemoryStore::southwestern_division();
        let stream = get_stream(&mut store, "KANSR", "SWT").expect("KANSR should resolve");

        assert_eq!(stream.stream_id, "KANSR");
        assert_eq!(stream.office_id, "SWT");
        assert_eq!(stream.flows_into_stream_id.as_deref(), Some("MOR"));
        assert_eq!(stream.stream_length, Some(238.0));
    }

    #[test]
    fn test_get_stream_unknown_id_is_not_found() {
        let mut store = MemoryStore::southwestern_division();
        let err = get_stream(&mut store, "NOSUCH", "SWT").unwrap_err();
        assert!(matches!(err, StoreError::NotFound { entity: "stream", .. }));
    }

    #[test]
    fn test_get_stream_empty_id_rejected_before_store_call() {
        // A failing store proves the validation short-circuits.
        let mut store = MemoryStore::new();
        store.set_failing(true);
        let err = get_stream(&mut store, "  ", "SWT").unwrap_err();
        assert!(matches!(err, StoreError::InvalidInput(_)));
    }

    #[test]
    fn test_get_stream_outage_is_unavailable() {
        let mut store = MemoryStore::southwestern_division();
        store.set_failing(true);
        let err = get_stream(&mut store, "KANSR", "SWT").unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }
}
