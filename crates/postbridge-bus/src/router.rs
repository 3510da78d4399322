//! Axum router wiring (HTTP -> WS upgrade).

use axum::{routing::get, Router};

use crate::{host::HostState, ops, transport};

pub fn build_router(state: HostState) -> Router {
    Router::new()
        .route("/v1/bridge", get(transport::ws::bridge_upgrade))
        .route("/healthz", get(ops::healthz))
        .with_state(state)
}
