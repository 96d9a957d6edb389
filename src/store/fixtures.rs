/// Test fixtures: an in-memory `RecordStore` with a representative
/// dataset, used by unit and integration tests in place of a live
/// `hydro_ref` schema.
///
/// The canned data models a small slice of the Tulsa District (`SWT`)
/// reference set: the Kansas, Neosho, and Verdigris basins, their primary
/// streams, a 15-minute stage series, and a handful of location levels.
/// Values are plausible, not authoritative.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::model::StoreError;
use crate::store::{
    BasinRow, LevelRow, ParameterRow, RecordStore, StreamRow, TsQuery, TsSample,
};

/// In-memory store. `set_failing(true)` makes every query fail with
/// `Unavailable`, for exercising outage paths.
#[derive(Debug, Default)]
pub struct MemoryStore {
    basins: Vec<BasinRow>,
    streams: Vec<StreamRow>,
    timeseries: HashMap<(String, String), TsQuery>,
    levels: Vec<LevelRow>,
    parameters: Vec<ParameterRow>,
    failing: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The canned `SWT` dataset described in the module doc.
    pub fn southwestern_division() -> Self {
        let mut store = Self::new();

        store.push_basin(BasinRow {
            office_id: "SWT".to_string(),
            basin_id: "KANS".to_string(),
            parent_basin_id: None,
            sort_order: Some(1.0),
            primary_stream_id: Some("KANSR".to_string()),
            total_drainage_area: Some(15000.0),
            contributing_drainage_area: Some(15000.0),
        });
        store.push_basin(BasinRow {
            office_id: "SWT".to_string(),
            basin_id: "NEOS".to_string(),
            parent_basin_id: None,
            sort_order: Some(2.0),
            primary_stream_id: Some("NEOSR".to_string()),
            total_drainage_area: Some(31950.0),
            contributing_drainage_area: Some(29800.0),
        });
        store.push_basin(BasinRow {
            office_id: "SWT".to_string(),
            basin_id: "VERD".to_string(),
            parent_basin_id: Some("NEOS".to_string()),
            sort_order: Some(3.0),
            primary_stream_id: None,
            total_drainage_area: Some(21300.0),
            contributing_drainage_area: None,
        });

        store.push_stream(StreamRow {
            stream_id: "KANSR".to_string(),
            office_id: "SWT".to_string(),
            flows_into_stream_id: Some("MOR".to_string()),
            flows_into_station: Some(591.4),
            stream_length: Some(238.0),
        });
        store.push_stream(StreamRow {
            stream_id: "NEOSR".to_string(),
            office_id: "SWT".to_string(),
            flows_into_stream_id: Some("ARK".to_string()),
            flows_into_station: Some(732.5),
            stream_length: Some(740.0),
        });

        // 15-minute stage series, five samples from 2024-05-01T12:00:00Z,
        // one sample missing its measurement.
        let t0 = 1_714_564_800;
        let samples = vec![
            stage_sample(t0, Some(229.31)),
            stage_sample(t0 + 900, Some(229.35)),
            stage_sample(t0 + 1800, None),
            stage_sample(t0 + 2700, Some(229.42)),
            stage_sample(t0 + 3600, Some(229.47)),
        ];
        store.insert_timeseries(
            "Kans-Gage.Stage.Inst.15Minutes.0.raw",
            "SWT",
            TsQuery {
                units: "m".to_string(),
                samples,
            },
        );

        let level_date = DateTime::from_timestamp(1_704_067_200, 0).unwrap(); // 2024-01-01
        store.push_level(LevelRow {
            office_id: "SWT".to_string(),
            level_id: "Kans-Gage.Stage.Top of Flood".to_string(),
            parameter_id: "Stage".to_string(),
            level_value: Some(230.5),
            level_unit: "m".to_string(),
            level_date,
        });
        store.push_level(LevelRow {
            office_id: "SWT".to_string(),
            level_id: "Kans-Gage.Flow.Minimum Release".to_string(),
            parameter_id: "Flow".to_string(),
            level_value: Some(4.25),
            level_unit: "cms".to_string(),
            level_date,
        });

        store.push_parameter(ParameterRow {
            parameter_id: "Stage".to_string(),
            long_name: "Stage (gage height)".to_string(),
            base_unit: "m".to_string(),
        });
        store.push_parameter(ParameterRow {
            parameter_id: "Flow".to_string(),
            long_name: "Volumetric flow rate".to_string(),
            base_unit: "cms".to_string(),
        });
        store.push_parameter(ParameterRow {
            parameter_id: "Elev".to_string(),
            long_name: "Elevation above datum".to_string(),
            base_unit: "m".to_string(),
        });

        store
    }

    pub fn push_basin(&mut self, row: BasinRow) {
        self.basins.push(row);
    }

    pub fn push_stream(&mut self, row: StreamRow) {
        self.streams.push(row);
    }

    pub fn insert_timeseries(&mut self, name: &str, office_id: &str, query: TsQuery) {
        self.timeseries
            .insert((name.to_string(), office_id.to_string()), query);
    }

    pub fn push_level(&mut self, row: LevelRow) {
        self.levels.push(row);
    }

    pub fn push_parameter(&mut self, row: ParameterRow) {
        self.parameters.push(row);
    }

    pub fn set_failing(&mut self, failing: bool) {
        self.failing = failing;
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.failing {
            Err(StoreError::Unavailable("simulated outage".to_string()))
        } else {
            Ok(())
        }
    }
}

fn stage_sample(epoch_seconds: i64, value: Option<f64>) -> TsSample {
    TsSample {
        date_time: DateTime::from_timestamp(epoch_seconds, 0).unwrap(),
        value,
        // 0 = screened and accepted; 5 = missing, per the store's quality
        // code convention.
        quality_code: if value.is_some() { 0 } else { 5 },
    }
}

impl RecordStore for MemoryStore {
    fn query_basins(&mut self, office_id: &str) -> Result<Vec<BasinRow>, StoreError> {
        self.check_available()?;
        Ok(self
            .basins
            .iter()
            .filter(|b| b.office_id == office_id)
            .cloned()
            .collect())
    }

    fn query_basin(&mut self, basin_id: &str, office_id: &str) -> Result<BasinRow, StoreError> {
        self.check_available()?;
        self.basins
            .iter()
            .find(|b| b.basin_id == basin_id && b.office_id == office_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                entity: "basin",
                id: basin_id.to_string(),
                office_id: office_id.to_string(),
            })
    }

    fn query_stream(&mut self, stream_id: &str, office_id: &str) -> Result<StreamRow, StoreError> {
        self.check_available()?;
        self.streams
            .iter()
            .find(|s| s.stream_id == stream_id && s.office_id == office_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                entity: "stream",
                id: stream_id.to_string(),
                office_id: office_id.to_string(),
            })
    }

    fn query_timeseries(
        &mut self,
        name: &str,
        office_id: &str,
        begin: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<TsQuery, StoreError> {
        self.check_available()?;
        let query = self
            .timeseries
            .get(&(name.to_string(), office_id.to_string()))
            .ok_or_else(|| StoreError::NotFound {
                entity: "timeseries",
                id: name.to_string(),
                office_id: office_id.to_string(),
            })?;

        Ok(TsQuery {
            units: query.units.clone(),
            samples: query
                .samples
                .iter()
                .filter(|s| s.date_time >= begin && s.date_time <= end)
                .cloned()
                .collect(),
        })
    }

    fn query_location_levels(&mut self, office_id: &str) -> Result<Vec<LevelRow>, StoreError> {
        self.check_available()?;
        Ok(self
            .levels
            .iter()
            .filter(|l| l.office_id == office_id)
            .cloned()
            .collect())
    }

    fn query_location_level(
        &mut self,
        level_id: &str,
        office_id: &str,
    ) -> Result<LevelRow, StoreError> {
        self.check_available()?;
        self.levels
            .iter()
            .find(|l| l.level_id == level_id && l.office_id == office_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                entity: "location level",
                id: level_id.to_string(),
                office_id: office_id.to_string(),
            })
    }

    fn query_parameters(&mut self) -> Result<Vec<ParameterRow>, StoreError> {
        self.check_available()?;
        Ok(self.parameters.clone())
    }
}
