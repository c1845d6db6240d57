//! Overlay variants and error definitions

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur when working with overlays
#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Overlay not found: {0}")]
    NotFound(String),
}

/// Geographic coordinate in WGS84 degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    /// Create a point, rejecting non-finite or out-of-range coordinates
    pub fn new(lat: f64, lon: f64) -> Result<Self, OverlayError> {
        let point = Self { lat, lon };
        point.validate()?;
        Ok(point)
    }

    pub fn validate(&self) -> Result<(), OverlayError> {
        if !self.lat.is_finite() || !(-90.0..=90.0).contains(&self.lat) {
            return Err(OverlayError::InvalidArgument(format!(
                "latitude {} out of range",
                self.lat
            )));
        }
        if !self.lon.is_finite() || !(-180.0..=180.0).contains(&self.lon) {
            return Err(OverlayError::InvalidArgument(format!(
                "longitude {} out of range",
                self.lon
            )));
        }
        Ok(())
    }
}

/// Route line drawn for the currently planned trip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteOverlay {
    pub id: Uuid,
    pub points: Vec<GeoPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Marker for the device's current position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationOverlay {
    pub id: Uuid,
    pub position: GeoPoint,
    /// Horizontal accuracy radius in meters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy_m: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bearing_deg: Option<f32>,
}

/// Severity reported by the traffic server for a road segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CongestionLevel {
    Light,
    Heavy,
    Standstill,
}

/// Congested road segment received from the traffic server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CongestionOverlay {
    pub id: Uuid,
    pub points: Vec<GeoPoint>,
    pub level: CongestionLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed_kmh: Option<f32>,
}

/// Any other point annotation (incident, speed camera, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerOverlay {
    pub id: Uuid,
    pub position: GeoPoint,
    pub label: String,
}

/// Coarse kind of an overlay, used for logging and metrics labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverlayCategory {
    Route,
    Location,
    Congestion,
    Marker,
}

impl OverlayCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverlayCategory::Route => "route",
            OverlayCategory::Location => "location",
            OverlayCategory::Congestion => "congestion",
            OverlayCategory::Marker => "marker",
        }
    }
}

/// A drawable map annotation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Overlay {
    Route(RouteOverlay),
    Location(LocationOverlay),
    Congestion(CongestionOverlay),
    Marker(MarkerOverlay),
}

impl Overlay {
    pub fn route(points: Vec<GeoPoint>) -> Self {
        Overlay::Route(RouteOverlay {
            id: Uuid::new_v4(),
            points,
            name: None,
        })
    }

    pub fn location(position: GeoPoint) -> Self {
        Overlay::Location(LocationOverlay {
            id: Uuid::new_v4(),
            position,
            accuracy_m: None,
            bearing_deg: None,
        })
    }

    pub fn congestion(points: Vec<GeoPoint>, level: CongestionLevel) -> Self {
        Overlay::Congestion(CongestionOverlay {
            id: Uuid::new_v4(),
            points,
            level,
            speed_kmh: None,
        })
    }

    pub fn marker(position: GeoPoint, label: impl Into<String>) -> Self {
        Overlay::Marker(MarkerOverlay {
            id: Uuid::new_v4(),
            position,
            label: label.into(),
        })
    }

    pub fn id(&self) -> Uuid {
        match self {
            Overlay::Route(o) => o.id,
            Overlay::Location(o) => o.id,
            Overlay::Congestion(o) => o.id,
            Overlay::Marker(o) => o.id,
        }
    }

    pub fn category(&self) -> OverlayCategory {
        match self {
            Overlay::Route(_) => OverlayCategory::Route,
            Overlay::Location(_) => OverlayCategory::Location,
            Overlay::Congestion(_) => OverlayCategory::Congestion,
            Overlay::Marker(_) => OverlayCategory::Marker,
        }
    }

    pub fn is_route(&self) -> bool {
        matches!(self, Overlay::Route(_))
    }

    pub fn as_route(&self) -> Option<&RouteOverlay> {
        match self {
            Overlay::Route(route) => Some(route),
            _ => None,
        }
    }

    pub fn as_location(&self) -> Option<&LocationOverlay> {
        match self {
            Overlay::Location(location) => Some(location),
            _ => None,
        }
    }

    /// Check the overlay's geometry before it is handed to the store.
    ///
    /// The store itself accepts anything; callers at the API boundary use
    /// this to reject malformed payloads.
    pub fn validate(&self) -> Result<(), OverlayError> {
        match self {
            Overlay::Route(route) => validate_polyline("route", &route.points),
            Overlay::Location(location) => {
                location.position.validate()?;
                if let Some(accuracy) = location.accuracy_m
                    && (!accuracy.is_finite() || accuracy < 0.0)
                {
                    return Err(OverlayError::InvalidArgument(format!(
                        "location accuracy {} must be a non-negative number",
                        accuracy
                    )));
                }
                Ok(())
            }
            Overlay::Congestion(congestion) => {
                validate_polyline("congestion segment", &congestion.points)
            }
            Overlay::Marker(marker) => {
                marker.position.validate()?;
                if marker.label.trim().is_empty() {
                    return Err(OverlayError::InvalidArgument(
                        "marker label must not be empty".to_string(),
                    ));
                }
                Ok(())
            }
        }
    }
}

fn validate_polyline(what: &str, points: &[GeoPoint]) -> Result<(), OverlayError> {
    if points.len() < 2 {
        return Err(OverlayError::InvalidArgument(format!(
            "{} needs at least 2 points, got {}",
            what,
            points.len()
        )));
    }
    points.iter().try_for_each(GeoPoint::validate)
}
