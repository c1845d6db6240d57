//! Test Utilities Module
//!
//! Overlay fixtures shared by the unit tests. Only compiled for tests.

#![cfg(test)]

use crate::overlay::{CongestionLevel, GeoPoint, Overlay};
use uuid::Uuid;

/// A point in central Dortmund
pub fn sample_point() -> GeoPoint {
    GeoPoint {
        lat: 51.5136,
        lon: 7.4653,
    }
}

pub fn route() -> Overlay {
    Overlay::route(vec![
        sample_point(),
        GeoPoint {
            lat: 51.4556,
            lon: 7.0116,
        },
    ])
}

pub fn location() -> Overlay {
    Overlay::location(sample_point())
}

pub fn congestion() -> Overlay {
    Overlay::congestion(
        vec![
            sample_point(),
            GeoPoint {
                lat: 51.5200,
                lon: 7.4800,
            },
        ],
        CongestionLevel::Heavy,
    )
}

pub fn marker(label: &str) -> Overlay {
    Overlay::marker(sample_point(), label)
}

/// Ids of the given overlays, in order
pub fn ids(overlays: &[Overlay]) -> Vec<Uuid> {
    overlays.iter().map(Overlay::id).collect()
}
