/// Service configuration loader - parses service.toml
///
/// Keeps deployment knobs (listen port, worker count, paging limits) out
/// of the code so operators can tune them without recompiling.

use serde::Deserialize;
use std::fs;

/// Root configuration structure for TOML parsing.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub endpoint: EndpointConfig,
    pub paging: PagingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EndpointConfig {
    /// TCP port the HTTP endpoint binds.
    pub port: u16,
    /// Worker threads accepting requests; each request opens its own
    /// store connection, so this also bounds concurrent connections.
    pub workers: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PagingConfig {
    /// Page size applied when a time-series request names none.
    pub default_page_size: i32,
    /// Upper bound on a client-requested page size.
    pub max_page_size: i32,
}

/// Loads service configuration from service.toml.
///
/// # Panics
/// Panics if the configuration file is missing or malformed. This is
/// intentional — the service cannot pick a sane port or paging limit on
/// its own, and failing loudly at startup beats serving with guesses.
///
/// # File Location
/// Expects `service.toml` in the current working directory (project root
/// when running via `cargo run`).
pub fn load_config() -> ServiceConfig {
    let config_path = "service.toml";

    let contents = fs::read_to_string(config_path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", config_path, e));

    parse_config(&contents)
        .unwrap_or_else(|e| panic!("Failed to parse {}: {}", config_path, e))
}

fn parse_config(contents: &str) -> Result<ServiceConfig, toml::de::Error> {
    toml::from_str(contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_config_succeeds() {
        let config = load_config();
        assert!(config.endpoint.port > 0);
        assert!(config.endpoint.workers >= 1, "need at least one worker");
    }

    #[test]
    fn test_paging_limits_are_consistent() {
        let config = load_config();
        assert!(config.paging.default_page_size > 0);
        assert!(
            config.paging.default_page_size <= config.paging.max_page_size,
            "default page size must not exceed the maximum"
        );
    }

    #[test]
    fn test_parse_config_from_toml() {
        let config = parse_config(
            r#"
            [endpoint]
            port = 9090
            workers = 2

            [paging]
            default_page_size = 100
            max_page_size = 1000
            "#,
        )
        .expect("inline config should parse");

        assert_eq!(config.endpoint.port, 9090);
        assert_eq!(config.endpoint.workers, 2);
        assert_eq!(config.paging.default_page_size, 100);
        assert_eq!(config.paging.max_page_size, 1000);
    }

    #[test]
    fn test_parse_config_rejects_missing_section() {
        let result = parse_config(
            r#"
            [endpoint]
            port = 9090
            workers = 2
            "#,
        );
        assert!(result.is_err(), "paging section is required");
    }
}
