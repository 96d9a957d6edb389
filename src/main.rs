//! Hydrologic Reference Data Service
//!
//! A read-only HTTP service over the `hydro_ref` reference database:
//! basins with their drainage-stream topology, location levels, the
//! parameter catalog, and paged time-series values. All hydrology math
//! lives in the database's stored procedures; this process assembles
//! rows into response values and nothing more.
//!
//! Usage:
//!   cargo run --release                 # Serve on the configured port
//!   cargo run --release -- --port 8080  # Override the port
//!
//! Environment:
//!   DATABASE_URL - PostgreSQL connection string

use hydref_service::{config, db, endpoint};
use std::env;

fn main() {
    println!("🌊 Hydrologic Reference Data Service");
    println!("=====================================\n");

    // Parse command-line arguments
    let args: Vec<String> = env::args().collect();
    let mut port_override: Option<u16> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--port" => {
                if i + 1 < args.len() {
                    port_override = args[i + 1].parse().ok();
                    i += 2;
                } else {
                    eprintln!("Error: --port requires a port number");
                    std::process::exit(1);
                }
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                eprintln!("Usage: {} [--port PORT]", args[0]);
                std::process::exit(1);
            }
        }
    }

    let mut config = config::load_config();
    if let Some(port) = port_override {
        config.endpoint.port = port;
    }

    // Fail now, not on the first request, if the reference schema is
    // unreachable. The verification connection is dropped immediately -
    // request handling opens its own.
    println!("📊 Validating database...");
    match db::connect_and_verify(&["hydro_ref"]) {
        Ok(_) => println!("✓ hydro_ref schema reachable\n"),
        Err(e) => {
            eprintln!("\n❌ Database validation failed: {}\n", e);
            std::process::exit(1);
        }
    }

    if let Err(e) = endpoint::start_endpoint_server(&config) {
        eprintln!("\n❌ Endpoint server error: {}", e);
        std::process::exit(1);
    }
}
