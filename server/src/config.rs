//! Server configuration
//!
//! Configuration is loaded from environment variables.

use std::env;

use crate::overlay::{GeoPoint, OverlayError};

/// Main server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address
    pub host: String,
    /// Server port
    pub port: u16,

    /// Overlay store configuration
    pub store: StoreConfig,
}

/// Overlay store related configuration
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Maximum request body size in bytes for overlay payloads
    pub max_update_size: usize,
    /// Location marker inserted as a system overlay at startup
    pub seed_location: Option<GeoPoint>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            store: StoreConfig::default(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_update_size: 1024 * 1024, // 1 MB
            seed_location: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup, e.g. a map in tests
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        // Server config
        if let Some(host) = lookup("HOST") {
            config.host = host;
        }
        if let Some(port) = lookup("PORT")
            && let Ok(p) = port.parse()
        {
            config.port = p;
        }

        // Store config
        if let Some(val) = lookup("MAX_UPDATE_SIZE_KB")
            && let Ok(kb) = val.parse::<usize>()
        {
            match kb.checked_mul(1024) {
                Some(bytes) => config.store.max_update_size = bytes,
                None => tracing::warn!("Ignoring MAX_UPDATE_SIZE_KB {:?}: too large", val),
            }
        }
        if let Some(val) = lookup("SEED_LOCATION")
            && !val.is_empty()
        {
            match parse_geo_point(&val) {
                Ok(point) => config.store.seed_location = Some(point),
                Err(e) => tracing::warn!("Ignoring SEED_LOCATION {:?}: {}", val, e),
            }
        }

        config
    }
}

/// Parse a `lat,lon` pair
pub fn parse_geo_point(s: &str) -> Result<GeoPoint, OverlayError> {
    let (lat, lon) = s
        .split_once(',')
        .ok_or_else(|| OverlayError::InvalidArgument(format!("expected 'lat,lon', got {:?}", s)))?;

    let lat = lat
        .trim()
        .parse::<f64>()
        .map_err(|e| OverlayError::InvalidArgument(format!("latitude: {}", e)))?;
    let lon = lon
        .trim()
        .parse::<f64>()
        .map_err(|e| OverlayError::InvalidArgument(format!("longitude: {}", e)))?;

    GeoPoint::new(lat, lon)
}
