//! Host-side composition root.
//!
//! Owns the config and the host state store, and attaches a host bus (with
//! its default handlers) to every raw channel a webview opens.

use std::sync::Arc;

use serde_json::Value;

use postbridge_core::error::Result;
use postbridge_core::protocol::{ActionResponse, ErrorReport, Message, MessageType, StateUpdate};

use crate::bus::Bus;
use crate::config::BridgeConfig;
use crate::context::Side;
use crate::store::StateStore;
use crate::transport::RawEndpoint;

#[derive(Clone)]
pub struct HostState {
    inner: Arc<HostStateInner>,
}

struct HostStateInner {
    cfg: BridgeConfig,
    store: StateStore,
}

impl HostState {
    pub fn new(cfg: BridgeConfig) -> Result<Self> {
        cfg.validate()?;
        let store = StateStore::new(cfg.host.initial_state.clone());
        Ok(Self {
            inner: Arc::new(HostStateInner { cfg, store }),
        })
    }

    pub fn cfg(&self) -> &BridgeConfig {
        &self.inner.cfg
    }

    pub fn store(&self) -> &StateStore {
        &self.inner.store
    }

    /// Start a host bus over `endpoint` and install the default handlers.
    pub fn attach(&self, endpoint: RawEndpoint) -> Bus {
        let bus = Bus::start(Side::Host, endpoint, self.inner.cfg.bus.clone());
        install_host_handlers(&bus, self.store());
        bus
    }
}

/// Default host behavior:
/// - `STATE_UPDATE` is applied to the store
/// - `STATE_REQUEST` / `DATA_REQUEST` / `USER_ACTION` are answered with the request id
/// - `WEBVIEW_READY` gets a full state snapshot
/// - `ERROR_REPORT` is logged and acknowledged
pub fn install_host_handlers(bus: &Bus, store: &StateStore) {
    {
        let store = store.clone();
        bus.on_fn(MessageType::StateUpdate, move |env| {
            let store = store.clone();
            async move {
                if let Message::StateUpdate(update) = env.into_message() {
                    store.apply(&update.path, update.value);
                }
                Ok(())
            }
        });
    }

    {
        let (weak, store) = (bus.downgrade(), store.clone());
        bus.on_fn(MessageType::StateRequest, move |env| {
            let (weak, store) = (weak.clone(), store.clone());
            async move {
                let Some(bus) = weak.upgrade() else {
                    return Ok(());
                };
                if let Message::StateRequest(req) = env.message() {
                    let value = store.get(&req.path).unwrap_or(Value::Null);
                    bus.reply(&env, StateUpdate { path: req.path.clone(), value });
                }
                Ok(())
            }
        });
    }

    {
        let (weak, store) = (bus.downgrade(), store.clone());
        bus.on_fn(MessageType::DataRequest, move |env| {
            let (weak, store) = (weak.clone(), store.clone());
            async move {
                let Some(bus) = weak.upgrade() else {
                    return Ok(());
                };
                let Message::DataRequest(req) = env.message() else {
                    return Ok(());
                };
                let path = ["data".to_string(), req.resource.clone()];
                match store.get(&path) {
                    Some(data) => {
                        bus.send_data_response(&env, req.resource.clone(), data, None);
                    }
                    None => {
                        tracing::debug!(resource = %req.resource, "data request for unknown resource");
                        let error = ErrorReport::new(
                            "NOT_FOUND",
                            format!("unknown resource: {}", req.resource),
                        );
                        bus.send_data_response(&env, req.resource.clone(), Value::Null, Some(error));
                    }
                }
                Ok(())
            }
        });
    }

    {
        let weak = bus.downgrade();
        bus.on_fn(MessageType::UserAction, move |env| {
            let weak = weak.clone();
            async move {
                let Some(bus) = weak.upgrade() else {
                    return Ok(());
                };
                if let Message::UserAction(action) = env.message() {
                    tracing::info!(action = %action.action, "user action");
                    bus.reply(
                        &env,
                        ActionResponse {
                            action: action.action.clone(),
                            data: action.data.clone(),
                            error: None,
                        },
                    );
                }
                Ok(())
            }
        });
    }

    {
        let (weak, store) = (bus.downgrade(), store.clone());
        bus.on_fn(MessageType::WebviewReady, move |_env| {
            let (weak, store) = (weak.clone(), store.clone());
            async move {
                let Some(bus) = weak.upgrade() else {
                    return Ok(());
                };
                tracing::info!("webview ready; sending state snapshot");
                bus.send_state_update(Vec::<String>::new(), store.snapshot());
                Ok(())
            }
        });
    }

    bus.on_fn(MessageType::WebviewMounted, |_env| async {
        tracing::info!("webview mounted");
        Ok(())
    });

    {
        let weak = bus.downgrade();
        bus.on_fn(MessageType::ErrorReport, move |env| {
            let weak = weak.clone();
            async move {
                let Some(bus) = weak.upgrade() else {
                    return Ok(());
                };
                if let Message::ErrorReport(report) = env.message() {
                    tracing::warn!(
                        kind = %report.kind,
                        message = %report.message,
                        failing_type = report.failing_type().unwrap_or("-"),
                        "error reported by webview"
                    );
                }
                bus.acknowledge_error(&env);
                Ok(())
            }
        });
    }
}
