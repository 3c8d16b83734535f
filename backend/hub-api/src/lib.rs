// Library root - the derived-view service, exported for the binary and tests.

pub mod backoff;
pub mod cache;
pub mod config;
pub mod consumer;
pub mod error;
pub mod fanout;
pub mod handlers;
pub mod notifications;
pub mod processor;
pub mod services;
pub mod upstream;

pub use config::Config;

use axum::{routing::get, Router};
use std::sync::Arc;

use notifications::{create_broadcast_channel, BroadcastChannel, BroadcastNotifier, Notifier};
use processor::EmployeeEventProcessor;
use services::ChecklistService;

#[derive(Clone)]
pub struct AppState {
    pub checklists: ChecklistService,
    pub broadcast_tx: BroadcastChannel,
}

impl AppState {
    pub fn new(checklists: ChecklistService) -> Self {
        Self {
            checklists,
            broadcast_tx: create_broadcast_channel(),
        }
    }

    /// Processor over the same cache the read handlers use.
    pub fn processor_with(&self, notifier: Arc<dyn Notifier>) -> EmployeeEventProcessor {
        EmployeeEventProcessor::new(self.checklists.cache().clone(), notifier)
    }

    /// Processor that also broadcasts straight to this process's WebSocket subscribers.
    pub fn local_processor(&self) -> EmployeeEventProcessor {
        self.processor_with(Arc::new(BroadcastNotifier::new(self.broadcast_tx.clone())))
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/checklists", get(handlers::get_checklist))
        .route("/api/employees", get(handlers::list_employees))
        .route("/api/employees/:id", get(handlers::get_employee))
        .route("/ws", get(notifications::websocket_handler))
        .layer(tower_http::cors::CorsLayer::permissive())
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
