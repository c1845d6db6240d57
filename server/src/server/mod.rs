pub mod routes;

pub use routes::{AppState, app_router, build_state, overlay_routes};
