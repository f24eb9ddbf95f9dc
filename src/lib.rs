//! FieldFlow Core Library
//!
//! Work order management for field-service jobs: a validated entity model,
//! invoice-total computation, an in-memory store with a pluggable persistence
//! backend, calendar queries, and an asynchronous gateway to the generative-AI
//! backend used for transcription, job analysis, and invoice drafting.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod config;
pub mod errors;
pub mod events;
pub mod gateway;
pub mod invoicing;
pub mod logging;
pub mod models;
pub mod queries;
pub mod services;
pub mod store;

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::config::AppConfig;
use crate::errors::ServiceError;
use crate::events::Event;
use crate::gateway::{AiGateway, HttpAiGateway};
use crate::services::work_orders::WorkOrderService;
use crate::store::{JsonFileBackend, StorageBackend, WorkOrderStore};

pub use crate::models::work_order::{
    CustomerInfo, InvoiceRecord, JobAnalysis, NewWorkOrder, PartCost, Urgency, WorkOrder,
    WorkOrderPatch,
};

const EVENT_CHANNEL_CAPACITY: usize = 64;

// App state definition
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<WorkOrderStore>,
    pub service: Arc<WorkOrderService>,
}

impl AppState {
    /// Wires up the default collaborators: a JSON file persistence slot and
    /// the HTTP AI gateway. Returns the state together with the receiving end
    /// of the lifecycle event channel.
    pub fn initialize(
        config: AppConfig,
    ) -> Result<(Self, mpsc::Receiver<Event>), ServiceError> {
        let backend: Arc<dyn StorageBackend> =
            Arc::new(JsonFileBackend::new(&config.persistence.path));
        let gateway: Arc<dyn AiGateway> = Arc::new(HttpAiGateway::new(&config.gateway)?);
        Self::with_collaborators(config, backend, gateway)
    }

    /// Same wiring with injected persistence and gateway, for embedding and
    /// tests. Loads whatever the backend currently holds; corrupt state
    /// surfaces as a persistence error rather than being discarded.
    pub fn with_collaborators(
        config: AppConfig,
        backend: Arc<dyn StorageBackend>,
        gateway: Arc<dyn AiGateway>,
    ) -> Result<(Self, mpsc::Receiver<Event>), ServiceError> {
        let store = Arc::new(WorkOrderStore::load(backend.as_ref())?);
        let (event_sender, receiver) = events::channel(EVENT_CHANNEL_CAPACITY);
        let service = Arc::new(WorkOrderService::new(
            store.clone(),
            backend,
            gateway,
            event_sender,
        ));
        Ok((
            Self {
                config,
                store,
                service,
            },
            receiver,
        ))
    }
}
