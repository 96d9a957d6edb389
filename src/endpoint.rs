/// HTTP endpoint for the reference-data API
///
/// Provides a small REST surface over the assembly modules. One request is
/// handled start to finish by one worker thread; each request opens its
/// own store connection and the connection is released by drop on every
/// exit path. Nothing is cached between requests.
///
/// Endpoints:
/// - GET /health - Service health check
/// - GET /basins?office={id} - Basin catalog with resolved primary streams
/// - GET /basins/{id}?office={id} - Single basin
/// - GET /streams/{id}?office={id} - Single stream
/// - GET /levels?office={id} - Location-level catalog
/// - GET /levels/{id}?office={id} - Single location level
/// - GET /parameters - Parameter catalog
/// - GET /timeseries?name=&office=&begin=&end=&page=&page-size= - Paged values

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};
use threadpool::ThreadPool;

use crate::basins;
use crate::config::ServiceConfig;
use crate::levels;
use crate::model::StoreError;
use crate::parameters;
use crate::store::{PgRecordStore, RecordStore};
use crate::streams;
use crate::timeseries;

// ---------------------------------------------------------------------------
// URL parsing
// ---------------------------------------------------------------------------

/// Splits a request URL into its percent-decoded path and query parameters.
fn parse_url(url: &str) -> (String, HashMap<String, String>) {
    let (path, query) = match url.split_once('?') {
        Some((p, q)) => (p, q),
        None => (url, ""),
    };

    let mut params = HashMap::new();
    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        params.insert(percent_decode(key), percent_decode(value));
    }

    (percent_decode(path), params)
}

fn percent_decode(s: &str) -> String {
    urlencoding::decode(s)
        .map(|cow| cow.into_owned())
        .unwrap_or_else(|_| s.to_string())
}

fn required_param<'a>(
    params: &'a HashMap<String, String>,
    name: &str,
) -> Result<&'a str, StoreError> {
    params
        .get(name)
        .map(String::as_str)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| StoreError::InvalidInput(format!("query parameter '{}' is required", name)))
}

fn parse_time(value: &str, name: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| {
            StoreError::InvalidInput(format!("'{}' is not an ISO-8601 timestamp: {}", name, value))
        })
}

// ---------------------------------------------------------------------------
// Routing
// ---------------------------------------------------------------------------

/// Routes one decoded request against a store handle. Returns the status
/// code and JSON body; conversion to a wire response happens at the edge
/// so handlers stay directly testable.
pub fn dispatch(
    store: &mut dyn RecordStore,
    config: &ServiceConfig,
    path: &str,
    params: &HashMap<String, String>,
) -> (u16, Value) {
    let result = match path {
        "/basins" => handle_basin_catalog(store, params),
        "/levels" => handle_level_catalog(store, params),
        "/parameters" => handle_parameters(store),
        "/timeseries" => handle_timeseries(store, config, params),
        _ => {
            if let Some(id) = path.strip_prefix("/basins/") {
                handle_basin(store, id, params)
            } else if let Some(id) = path.strip_prefix("/streams/") {
                handle_stream(store, id, params)
            } else if let Some(id) = path.strip_prefix("/levels/") {
                handle_level(store, id, params)
            } else {
                Ok((
                    404,
                    json!({
                        "error": "Not found",
                        "available_endpoints": [
                            "/health", "/basins", "/basins/{id}", "/streams/{id}",
                            "/levels", "/levels/{id}", "/parameters", "/timeseries"
                        ]
                    }),
                ))
            }
        }
    };

    result.unwrap_or_else(|e| error_body(&e))
}

fn handle_basin_catalog(
    store: &mut dyn RecordStore,
    params: &HashMap<String, String>,
) -> Result<(u16, Value), StoreError> {
    let office = required_param(params, "office")?;
    let basins = basins::get_all_basins(store, office)?;
    Ok((200, serde_json::to_value(&basins).unwrap()))
}

fn handle_basin(
    store: &mut dyn RecordStore,
    basin_id: &str,
    params: &HashMap<String, String>,
) -> Result<(u16, Value), StoreError> {
    let office = required_param(params, "office")?;
    let basin = basins::get_basin(store, basin_id, office)?;
    Ok((200, serde_json::to_value(&basin).unwrap()))
}

fn handle_stream(
    store: &mut dyn RecordStore,
    stream_id: &str,
    params: &HashMap<String, String>,
) -> Result<(u16, Value), StoreError> {
    let office = required_param(params, "office")?;
    let stream = streams::get_stream(store, stream_id, office)?;
    Ok((200, serde_json::to_value(&stream).unwrap()))
}

fn handle_level_catalog(
    store: &mut dyn RecordStore,
    params: &HashMap<String, String>,
) -> Result<(u16, Value), StoreError> {
    let office = required_param(params, "office")?;
    let levels = levels::get_location_levels(store, office)?;
    Ok((200, serde_json::to_value(&levels).unwrap()))
}

fn handle_level(
    store: &mut dyn RecordStore,
    level_id: &str,
    params: &HashMap<String, String>,
) -> Result<(u16, Value), StoreError> {
    let office = required_param(params, "office")?;
    let level = levels::get_location_level(store, level_id, office)?;
    Ok((200, serde_json::to_value(&level).unwrap()))
}

fn handle_parameters(store: &mut dyn RecordStore) -> Result<(u16, Value), StoreError> {
    let parameters = parameters::get_parameters(store)?;
    Ok((200, serde_json::to_value(&parameters).unwrap()))
}

fn handle_timeseries(
    store: &mut dyn RecordStore,
    config: &ServiceConfig,
    params: &HashMap<String, String>,
) -> Result<(u16, Value), StoreError> {
    let name = required_param(params, "name")?;
    let office = required_param(params, "office")?;

    // Default window: the last 24 hours.
    let end = match params.get("end") {
        Some(value) => parse_time(value, "end")?,
        None => Utc::now(),
    };
    let begin = match params.get("begin") {
        Some(value) => parse_time(value, "begin")?,
        None => end - Duration::hours(24),
    };

    let page_size = match params.get("page-size") {
        Some(value) => value.parse::<i32>().map_err(|_| {
            StoreError::InvalidInput(format!("'page-size' is not an integer: {}", value))
        })?,
        None => config.paging.default_page_size,
    };
    let page_size = page_size.min(config.paging.max_page_size);

    let page = params.get("page").map(String::as_str);
    let series = timeseries::get_timeseries(store, name, office, begin, end, page, page_size)?;
    Ok((200, serde_json::to_value(&series).unwrap()))
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

/// Maps an assembly failure to a status code and body. Store outages get a
/// generic body — the full cause is logged server-side, never sent to the
/// client.
fn error_body(err: &StoreError) -> (u16, Value) {
    match err {
        StoreError::InvalidInput(_) => (400, json!({ "error": err.to_string() })),
        StoreError::NotFound { .. } => (404, json!({ "error": err.to_string() })),
        StoreError::Unavailable(_) => {
            eprintln!("✗ store failure: {}", err);
            (500, json!({ "error": "internal data store error" }))
        }
        StoreError::UnresolvedStream { cause, .. } => match cause.as_ref() {
            StoreError::Unavailable(_) => {
                eprintln!("✗ store failure: {}", err);
                (500, json!({ "error": "internal data store error" }))
            }
            _ => (404, json!({ "error": err.to_string() })),
        },
    }
}

// ---------------------------------------------------------------------------
// HTTP Server
// ---------------------------------------------------------------------------

/// Starts the endpoint server and blocks serving requests.
pub fn start_endpoint_server(config: &ServiceConfig) -> Result<(), String> {
    let address = format!("0.0.0.0:{}", config.endpoint.port);
    let server = Arc::new(
        tiny_http::Server::http(&address)
            .map_err(|e| format!("Failed to start HTTP server on {}: {}", address, e))?,
    );

    println!("📡 HTTP endpoint listening on http://{}", address);
    println!("   GET /basins?office={{id}} - Basin catalog");
    println!("   GET /timeseries?name=&office= - Paged time-series values");
    println!("   GET /health - Service health check\n");

    let pool = ThreadPool::new(config.endpoint.workers);
    for _ in 0..config.endpoint.workers {
        let server = Arc::clone(&server);
        let config = config.clone();
        pool.execute(move || {
            for request in server.incoming_requests() {
                handle_request(request, &config);
            }
        });
    }

    // Workers run until the process exits.
    pool.join();
    Ok(())
}

fn handle_request(request: tiny_http::Request, config: &ServiceConfig) {
    let (path, params) = parse_url(request.url());

    let (status, body) = if path == "/health" {
        health_body()
    } else {
        // One connection per request; dropped - and therefore released -
        // on every exit path below.
        match PgRecordStore::connect() {
            Ok(mut store) => dispatch(&mut store, config, &path, &params),
            Err(e) => error_body(&e),
        }
    };

    if let Err(e) = request.respond(create_response(status, body)) {
        eprintln!("Failed to send response: {}", e);
    }
}

fn health_body() -> (u16, Value) {
    (
        200,
        json!({
            "status": "ok",
            "service": "hydref_service",
            "version": env!("CARGO_PKG_VERSION")
        }),
    )
}

/// Create HTTP response with JSON body
fn create_response(status_code: u16, body: Value) -> tiny_http::Response<std::io::Cursor<Vec<u8>>> {
    let body = serde_json::to_string_pretty(&body).unwrap();

    tiny_http::Response::from_data(body.into_bytes())
        .with_status_code(tiny_http::StatusCode::from(status_code))
        .with_header(
            tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]).unwrap(),
        )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::fixtures::MemoryStore;
    use crate::store::BasinRow;

    fn test_config() -> ServiceConfig {
        crate::config::load_config()
    }

    fn get(
        store: &mut MemoryStore,
        path: &str,
        query: &[(&str, &str)],
    ) -> (u16, Value) {
        let params: HashMap<String, String> = query
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        dispatch(store, &test_config(), path, &params)
    }

    #[test]
    fn test_parse_url_decodes_path_and_query() {
        let (path, params) =
            parse_url("/levels/Kans-Gage.Stage.Top%20of%20Flood?office=SWT&page-size=10");
        assert_eq!(path, "/levels/Kans-Gage.Stage.Top of Flood");
        assert_eq!(params.get("office").map(String::as_str), Some("SWT"));
        assert_eq!(params.get("page-size").map(String::as_str), Some("10"));
    }

    #[test]
    fn test_basin_query_returns_resolved_basin() {
        let mut store = MemoryStore::southwestern_division();
        let (status, body) = get(&mut store, "/basins/KANS", &[("office", "SWT")]);

        assert_eq!(status, 200);
        assert_eq!(body["basin_id"], "KANS");
        assert_eq!(body["total_drainage_area"], 15000.0);
        assert_eq!(body["primary_stream"]["stream_id"], "KANSR");
    }

    #[test]
    fn test_basin_catalog_returns_all_basins_in_order() {
        let mut store = MemoryStore::southwestern_division();
        let (status, body) = get(&mut store, "/basins", &[("office", "SWT")]);

        assert_eq!(status, 200);
        let list = body.as_array().expect("catalog body should be an array");
        assert_eq!(list.len(), 3);
        assert_eq!(list[0]["basin_id"], "KANS");
        assert_eq!(list[2]["basin_id"], "VERD");
    }

    #[test]
    fn test_missing_office_is_bad_request() {
        let mut store = MemoryStore::southwestern_division();
        let (status, body) = get(&mut store, "/basins/KANS", &[]);
        assert_eq!(status, 400);
        assert!(body["error"].as_str().unwrap().contains("office"));
    }

    #[test]
    fn test_unknown_basin_is_not_found() {
        let mut store = MemoryStore::southwestern_division();
        let (status, _) = get(&mut store, "/basins/NOSUCH", &[("office", "SWT")]);
        assert_eq!(status, 404);
    }

    #[test]
    fn test_unresolved_stream_surfaces_the_stream_failure() {
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

        let (status, body) = get(&mut store, "/basins/WALN", &[("office", "SWT")]);
        assert_eq!(status, 404);
        let message = body["error"].as_str().unwrap();
        assert!(message.contains("GHOST"), "should name the stream: {}", message);
        assert!(message.contains("WALN"), "should name the basin: {}", message);
    }

    #[test]
    fn test_store_outage_gets_generic_body() {
        let mut store = MemoryStore::southwestern_division();
        store.set_failing(true);
        let (status, body) = get(&mut store, "/basins", &[("office", "SWT")]);

        assert_eq!(status, 500);
        assert_eq!(body["error"], "internal data store error");
        assert!(
            !body.to_string().contains("simulated outage"),
            "cause must not leak to the client"
        );
    }

    #[test]
    fn test_level_lookup_with_encoded_id() {
        let mut store = MemoryStore::southwestern_division();
        let (path, params) =
            parse_url("/levels/Kans-Gage.Stage.Top%20of%20Flood?office=SWT");
        let (status, body) = dispatch(&mut store, &test_config(), &path, &params);

        assert_eq!(status, 200);
        assert_eq!(body["level_value"], 230.5);
    }

    #[test]
    fn test_timeseries_pages_through_dispatch() {
        let mut store = MemoryStore::southwestern_division();
        let (status, body) = get(
            &mut store,
            "/timeseries",
            &[
                ("name", "Kans-Gage.Stage.Inst.15Minutes.0.raw"),
                ("office", "SWT"),
                ("begin", "2024-05-01T00:00:00Z"),
                ("end", "2024-05-01T23:59:59Z"),
                ("page-size", "2"),
            ],
        );

        assert_eq!(status, 200);
        assert_eq!(body["values"].as_array().unwrap().len(), 2);
        assert_eq!(body["total"], 5);
        let token = body["next_page"].as_str().expect("should continue").to_string();

        let (status, body) = get(
            &mut store,
            "/timeseries",
            &[
                ("name", "Kans-Gage.Stage.Inst.15Minutes.0.raw"),
                ("office", "SWT"),
                ("begin", "2024-05-01T00:00:00Z"),
                ("end", "2024-05-01T23:59:59Z"),
                ("page", &token),
            ],
        );
        assert_eq!(status, 200);
        assert_eq!(body["values"].as_array().unwrap().len(), 2);
        assert_eq!(body["page"], token.as_str());
    }

    #[test]
    fn test_timeseries_bad_timestamp_is_bad_request() {
        let mut store = MemoryStore::southwestern_division();
        let (status, _) = get(
            &mut store,
            "/timeseries",
            &[
                ("name", "Kans-Gage.Stage.Inst.15Minutes.0.raw"),
                ("office", "SWT"),
                ("begin", "yesterday"),
            ],
        );
        assert_eq!(status, 400);
    }

    #[test]
    fn test_unknown_route_lists_endpoints() {
        let mut store = MemoryStore::southwestern_division();
        let (status, body) = get(&mut store, "/nope", &[]);
        assert_eq!(status, 404);
        assert!(body["available_endpoints"].is_array());
    }
}
