//! postbridge host
//!
//! - WebSocket endpoint: /v1/bridge (one host bus per webview connection)
//! - Liveness: /healthz
//! - Config path: first argument, default `postbridge.yaml`

use std::net::SocketAddr;
use tracing_subscriber::{fmt, EnvFilter};

use postbridge_bus::{config, host::HostState, router};

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let path = std::env::args().nth(1).unwrap_or_else(|| "postbridge.yaml".to_string());
    let cfg = config::load_from_file(&path).expect("config load failed");
    let listen: SocketAddr = cfg
        .host
        .listen
        .parse()
        .expect("host.listen must be a valid SocketAddr");

    let state = HostState::new(cfg).expect("invalid config");
    let app = router::build_router(state);

    tracing::info!(%listen, config = %path, "postbridge-host starting");
    let listener = tokio::net::TcpListener::bind(listen).await.expect("failed to bind");

    axum::serve(listener, app).await.expect("server failed");
}
