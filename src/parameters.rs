/// Parameter catalog retrieval.

use crate::model::{Parameter, StoreError};
use crate::store::RecordStore;

/// The full parameter catalog, in the store's row order.
pub fn get_parameters(store: &mut dyn RecordStore) -> Result<Vec<Parameter>, StoreError> {
    let rows = store.query_parameters()?;
    Ok(rows
        .into_iter()
        .map(|row| Parameter {
            parameter_id: row.parameter_id,
            long_name: row.long_name,
            base_unit: row.base_unit,
        })
        .collect())
}
