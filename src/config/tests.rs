use super::*;
use serial_test::serial;
use std::env;
use std::time::Duration;

fn clear_router_env() {
    for var in [
        "ROUTER_NAME",
        "ROUTER_PORT",
        "ROUTER_BIND_ADDR",
        "REQUEST_TIMEOUT",
        "UPSTREAM_TIMEOUT",
        "TENANTS_CONFIG",
        "TENANCY_ENABLE",
        "CORS_ENABLE",
        "CORS_ALLOW_ORIGINS",
        "METRICS_ENABLE",
        "CACHE_ENABLE",
        "CACHE_URL",
        "CACHE_TTL",
        "CACHE_TLS_VERIFY",
        "CACHE_CONNECT_TIMEOUT",
        "CACHE_SOCKET_TIMEOUT",
        "CACHE_CLUSTER_ENABLE",
        "CACHE_NORMALIZE_QUERY",
        "SEMCACHE_ENABLE",
        "SEMCACHE_PROVIDER",
        "SEMCACHE_THRESHOLD",
        "SEMCACHE_TTL",
        "SEMCACHE_EMBEDDER",
        "SEMCACHE_DIM",
        "SEMCACHE_CLIENT_TIMEOUT",
    ] {
        unsafe { env::remove_var(var) };
    }
}

#[test]
#[serial]
fn defaults_when_env_is_empty() {
    clear_router_env();
    let config = Config::from_env().expect("defaults should load");

    assert_eq!(config.port, 8080);
    assert_eq!(config.cache_ttl, Duration::from_secs(60));
    assert!(config.cache_enable);
    assert!(!config.tenancy_enable);
    assert!(!config.semcache_enable);
    assert_eq!(config.semcache_provider, "opensearch");
    assert_eq!(config.semcache_dim, 384);
    assert!((config.semcache_threshold - 0.90).abs() < f32::EPSILON);
}

#[test]
#[serial]
fn overrides_are_read_from_env() {
    clear_router_env();
    unsafe {
        env::set_var("ROUTER_PORT", "9090");
        env::set_var("CACHE_TTL", "120");
        env::set_var("TENANCY_ENABLE", "true");
        env::set_var("SEMCACHE_ENABLE", "1");
        env::set_var("SEMCACHE_PROVIDER", "pgvector");
        env::set_var("SEMCACHE_THRESHOLD", "0.85");
        env::set_var("CACHE_CONNECT_TIMEOUT", "0.5");
    }

    let config = Config::from_env().expect("overrides should load");
    assert_eq!(config.port, 9090);
    assert_eq!(config.cache_ttl, Duration::from_secs(120));
    assert!(config.tenancy_enable);
    assert!(config.semcache_enable);
    assert_eq!(config.semcache_provider, "pgvector");
    assert!((config.semcache_threshold - 0.85).abs() < f32::EPSILON);
    assert_eq!(config.cache_connect_timeout, Duration::from_millis(500));

    clear_router_env();
}

#[test]
#[serial]
fn boolean_parsing_accepts_common_forms() {
    clear_router_env();
    for (value, expected) in [("1", true), ("YES", true), ("on", true), ("0", false), ("off", false)] {
        unsafe { env::set_var("TENANCY_ENABLE", value) };
        let config = Config::from_env().expect("bool should parse");
        assert_eq!(config.tenancy_enable, expected, "value {value:?}");
    }
    clear_router_env();
}

#[test]
#[serial]
fn rejects_port_zero() {
    clear_router_env();
    unsafe { env::set_var("ROUTER_PORT", "0") };
    assert!(matches!(
        Config::from_env(),
        Err(ConfigError::InvalidPort { .. })
    ));
    clear_router_env();
}

#[test]
#[serial]
fn rejects_negative_timeout() {
    clear_router_env();
    unsafe { env::set_var("UPSTREAM_TIMEOUT", "-3") };
    assert!(matches!(
        Config::from_env(),
        Err(ConfigError::InvalidNumber { .. })
    ));
    clear_router_env();
}

#[test]
#[serial]
fn validate_rejects_out_of_range_threshold() {
    clear_router_env();
    let mut config = Config::default();
    config.semcache_threshold = 1.5;
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidThreshold { .. })
    ));

    config.semcache_threshold = 0.9;
    config.semcache_dim = 0;
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidDimension { .. })
    ));
}
