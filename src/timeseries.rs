/// Time-series retrieval with cursor-based pagination.
///
/// A `TimeSeries` is one response page over an ordered sample stream.
/// Values are appended through `add_value`, which enforces the page-size
/// limit and computes the continuation cursor; the retrieval function
/// wires the store query into that state machine.

use chrono::{DateTime, Utc};
use serde::ser::SerializeTuple;
use serde::{Serialize, Serializer};

use crate::model::StoreError;
use crate::paging::{decode_cursor, encode_cursor};
use crate::store::RecordStore;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One time-series value. On the wire this is the 3-element array
/// `[date-time, value, quality-code]` with the timestamp in milliseconds
/// since the Unix epoch, always UTC.
#[derive(Debug, Clone, PartialEq)]
pub struct TsRecord {
    pub date_time: DateTime<Utc>,
    pub value: Option<f64>,
    pub quality_code: i32,
}

impl Serialize for TsRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(3)?;
        tuple.serialize_element(&self.date_time.timestamp_millis())?;
        tuple.serialize_element(&self.value)?;
        tuple.serialize_element(&self.quality_code)?;
        tuple.end()
    }
}

// ---------------------------------------------------------------------------
// Response page
// ---------------------------------------------------------------------------

/// One page of an ordered time-series result.
///
/// Page life cycle: collecting (fewer than `page_size` values held) →
/// full (`page_size` values held; every further candidate is rejected and
/// refreshes `next_page` from its key). A `page_size` of zero or less
/// disables the limit — everything is accepted and `next_page` never
/// appears.
#[derive(Debug, Clone, Serialize)]
pub struct TimeSeries {
    name: String,
    office_id: String,
    units: String,
    begin: DateTime<Utc>,
    end: DateTime<Utc>,
    page: Option<String>,
    next_page: Option<String>,
    total: usize,
    page_size: i32,
    values: Vec<TsRecord>,
}

impl TimeSeries {
    /// `page` is the incoming continuation token, verbatim, when this page
    /// resumes an earlier result; `None` for a first page, whose identity
    /// is then derived from its first accepted value.
    pub fn new(
        name: &str,
        office_id: &str,
        units: &str,
        begin: DateTime<Utc>,
        end: DateTime<Utc>,
        page_size: i32,
        total: usize,
        page: Option<String>,
    ) -> Self {
        TimeSeries {
            name: name.to_string(),
            office_id: office_id.to_string(),
            units: units.to_string(),
            begin,
            end,
            page,
            next_page: None,
            total,
            page_size,
            values: Vec::new(),
        }
    }

    /// Offers one candidate to the page. Returns whether it was accepted.
    ///
    /// The first candidate offered to a page with no cursor identity sets
    /// `page` from its own key, before acceptance is decided, so the page
    /// can always say where it started.
    pub fn add_value(
        &mut self,
        date_time: DateTime<Utc>,
        value: Option<f64>,
        quality_code: i32,
    ) -> bool {
        let key = date_time.timestamp_millis().to_string();

        if self.page.as_deref().is_none_or(str::is_empty) && self.values.is_empty() {
            self.page = Some(encode_cursor(&key, self.page_size, self.total));
        }

        if self.page_size > 0 && self.values.len() == self.page_size as usize {
            self.next_page = Some(encode_cursor(&key, self.page_size, self.total));
            false
        } else {
            self.values.push(TsRecord {
                date_time,
                value,
                quality_code,
            });
            true
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn units(&self) -> &str {
        &self.units
    }

    pub fn page(&self) -> Option<&str> {
        self.page.as_deref()
    }

    pub fn next_page(&self) -> Option<&str> {
        self.next_page.as_deref()
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn values(&self) -> &[TsRecord] {
        &self.values
    }
}

// ---------------------------------------------------------------------------
// Retrieval
// ---------------------------------------------------------------------------

/// Retrieves one page of a named time series.
///
/// With no incoming token this is a first page: the full ordered range is
/// counted for `total` and served from the top. With a token, the page
/// size and total recorded at the first page are carried forward and
/// serving resumes at the token's key (the first value the previous page
/// rejected).
pub fn get_timeseries(
    store: &mut dyn RecordStore,
    name: &str,
    office_id: &str,
    begin: DateTime<Utc>,
    end: DateTime<Utc>,
    page_token: Option<&str>,
    page_size: i32,
) -> Result<TimeSeries, StoreError> {
    if name.trim().is_empty() {
        return Err(StoreError::InvalidInput(
            "timeseries name must not be empty".to_string(),
        ));
    }

    let cursor = match page_token {
        Some(token) => Some(decode_cursor(token)?),
        None => None,
    };

    let query = store.query_timeseries(name, office_id, begin, end)?;

    let (resume_at, total, effective_page_size) = match &cursor {
        Some(c) => {
            let millis = c.last_key.parse::<i64>().map_err(|_| {
                StoreError::InvalidInput(format!(
                    "cursor key is not a millisecond timestamp: {}",
                    c.last_key
                ))
            })?;
            (Some(millis), c.total, c.page_size)
        }
        None => (None, query.samples.len(), page_size),
    };

    let mut page = TimeSeries::new(
        name,
        office_id,
        &query.units,
        begin,
        end,
        effective_page_size,
        total,
        page_token.map(str::to_string),
    );

    for sample in &query.samples {
        if let Some(at) = resume_at {
            if sample.date_time.timestamp_millis() < at {
                continue;
            }
        }
        if !page.add_value(sample.date_time, sample.value, sample.quality_code) {
            break;
        }
    }

    Ok(page)
}
