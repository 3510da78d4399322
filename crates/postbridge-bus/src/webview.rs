//! Webview-side composition root.
//!
//! The webview keeps its own state store and an error surface for the UI.
//! Default handlers cover what the host pushes without being asked:
//! `STATE_UPDATE`, `ERROR_REPORT` and unsolicited `DATA_RESPONSE`.

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use serde_json::Value;

use postbridge_core::protocol::{ErrorReport, Message, MessageType};

use crate::bus::Bus;
use crate::config::BusConfig;
use crate::context::Side;
use crate::store::StateStore;
use crate::transport::RawEndpoint;

type Listener = Arc<dyn Fn(&ErrorReport) + Send + Sync>;

/// Last error plus a set of listeners (toasts, banners, error boundaries).
///
/// Every handled report is also mirrored into the state store under `error`.
#[derive(Clone)]
pub struct ErrorSurface {
    inner: Arc<ErrorSurfaceInner>,
}

struct ErrorSurfaceInner {
    store: StateStore,
    listeners: RwLock<Vec<(u64, Listener)>>,
    next_id: AtomicU64,
    last: RwLock<Option<ErrorReport>>,
}

impl ErrorSurface {
    pub fn new(store: StateStore) -> Self {
        Self {
            inner: Arc::new(ErrorSurfaceInner {
                store,
                listeners: RwLock::new(Vec::new()),
                next_id: AtomicU64::new(1),
                last: RwLock::new(None),
            }),
        }
    }

    /// Returns an id for `remove_listener`.
    pub fn add_listener<F>(&self, f: F) -> u64
    where
        F: Fn(&ErrorReport) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut listeners) = self.inner.listeners.write() {
            listeners.push((id, Arc::new(f)));
        }
        id
    }

    pub fn remove_listener(&self, id: u64) -> bool {
        let Ok(mut listeners) = self.inner.listeners.write() else {
            return false;
        };
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        listeners.len() != before
    }

    /// Record `report` as the last error, mirror it into the store and
    /// notify every listener. A panicking listener is logged and skipped.
    pub fn handle(&self, report: ErrorReport) {
        tracing::warn!(
            kind = %report.kind,
            message = %report.message,
            failing_type = report.failing_type().unwrap_or("-"),
            "error surfaced"
        );

        match serde_json::to_value(&report) {
            Ok(v) => self.inner.store.apply(&["error".to_string()], v),
            Err(e) => tracing::warn!(error = %e, "error report not mirrored into state"),
        }
        if let Ok(mut last) = self.inner.last.write() {
            *last = Some(report.clone());
        }

        let listeners: Vec<Listener> = self
            .inner
            .listeners
            .read()
            .map(|l| l.iter().map(|(_, f)| Arc::clone(f)).collect())
            .unwrap_or_default();

        for listener in listeners {
            if std::panic::catch_unwind(AssertUnwindSafe(|| listener(&report))).is_err() {
                tracing::warn!(kind = %report.kind, "error listener panicked");
            }
        }
    }

    pub fn last_error(&self) -> Option<ErrorReport> {
        self.inner.last.read().ok().and_then(|l| l.clone())
    }

    pub fn clear(&self) {
        if let Ok(mut last) = self.inner.last.write() {
            *last = None;
        }
        self.inner.store.apply(&["error".to_string()], Value::Null);
    }
}

#[derive(Clone)]
pub struct WebviewState {
    store: StateStore,
    surface: ErrorSurface,
}

impl Default for WebviewState {
    fn default() -> Self {
        Self::new(StateStore::default())
    }
}

impl WebviewState {
    pub fn new(store: StateStore) -> Self {
        let surface = ErrorSurface::new(store.clone());
        Self { store, surface }
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn error_surface(&self) -> &ErrorSurface {
        &self.surface
    }

    /// Start a webview bus over `endpoint` and install the default handlers.
    pub fn attach(&self, endpoint: RawEndpoint, cfg: BusConfig) -> Bus {
        let bus = Bus::start(Side::Webview, endpoint, cfg);
        install_webview_handlers(&bus, &self.store, &self.surface);
        bus
    }
}

/// Default webview behavior:
/// - `STATE_UPDATE` is applied to the store
/// - `ERROR_REPORT` goes to the error surface
/// - `DATA_RESPONSE` lands at `data.<resource>`, or its error block goes to the surface
pub fn install_webview_handlers(bus: &Bus, store: &StateStore, surface: &ErrorSurface) {
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
        let surface = surface.clone();
        bus.on_fn(MessageType::ErrorReport, move |env| {
            let surface = surface.clone();
            async move {
                if let Message::ErrorReport(report) = env.into_message() {
                    surface.handle(report);
                }
                Ok(())
            }
        });
    }

    {
        let (store, surface) = (store.clone(), surface.clone());
        bus.on_fn(MessageType::DataResponse, move |env| {
            let (store, surface) = (store.clone(), surface.clone());
            async move {
                let Message::DataResponse(resp) = env.into_message() else {
                    return Ok(());
                };
                match resp.error {
                    Some(error) => {
                        surface.handle(error.with_detail("resource", Value::String(resp.resource)));
                    }
                    None => store.apply(&["data".to_string(), resp.resource], resp.data),
                }
                Ok(())
            }
        });
    }
}
