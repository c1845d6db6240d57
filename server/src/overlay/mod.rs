//! Overlay module
//!
//! Holds the overlay model and the store tracking which overlays are active.

pub mod set;
pub mod store;
pub mod types;

pub use set::OverlaySet;
pub use store::OverlayStore;
pub use types::{
    CongestionLevel, CongestionOverlay, GeoPoint, LocationOverlay, MarkerOverlay, Overlay,
    OverlayCategory, OverlayError, RouteOverlay,
};
