use serde::{Deserialize, Serialize};

use crate::overlay::{Overlay, OverlayCategory, OverlayError};

/// One traffic payload pushed by the server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteUpdate {
    pub has_congestions: bool,
    #[serde(default)]
    pub overlays: Vec<Overlay>,
}

impl RemoteUpdate {
    /// Reject payloads the store must not ingest: malformed geometry, and
    /// location markers, which only the application itself may place.
    pub fn validate(&self) -> Result<(), OverlayError> {
        for overlay in &self.overlays {
            if overlay.category() == OverlayCategory::Location {
                return Err(OverlayError::InvalidArgument(format!(
                    "location overlay {} cannot be a data overlay",
                    overlay.id()
                )));
            }
            overlay.validate()?;
        }
        Ok(())
    }
}

/// Current draw list: data overlays followed by system overlays
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlaysResponse {
    pub has_congestions: bool,
    pub overlays: Vec<Overlay>,
    pub data_count: usize,
    pub system_count: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CongestionState {
    pub has_congestions: bool,
}

/// Query parameters for adding a single overlay
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct AddOverlayParams {
    #[serde(default)]
    pub system: bool,
}

/// Which collections a clear request empties
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ClearScope {
    /// Only the server-derived overlays
    #[default]
    Data,
    /// Data and system overlays
    All,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ClearParams {
    #[serde(default)]
    pub scope: ClearScope,
}
