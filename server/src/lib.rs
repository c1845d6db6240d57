//! TrafficJam Server Library
//!
//! Exports the overlay store and its HTTP surface for use in integration
//! tests and by the map client collaborators.

pub mod config;
pub mod overlay;
pub mod protocol;
pub mod server;

mod test_utils;

// Re-export commonly used types
pub use overlay::{Overlay, OverlayError, OverlayStore};
pub use protocol::{OverlaysResponse, RemoteUpdate};
pub use server::{AppState, app_router};
