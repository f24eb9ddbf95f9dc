//! In-memory work order collection with a pluggable persistence slot.
//!
//! The store is constructed once per process and passed by reference to
//! consumers; all mutations happen on a single logical thread in response to
//! discrete actions, so the interior lock is uncontended in practice.

use std::sync::RwLock;

use chrono::NaiveDate;
use tracing::{error, warn};
use uuid::Uuid;
use validator::Validate;

use crate::errors::ServiceError;
use crate::models::work_order::{WorkOrder, WorkOrderPatch};

mod backend;

pub use backend::{InMemoryBackend, JsonFileBackend, PersistenceError, StorageBackend};

#[derive(Debug, Default)]
pub struct WorkOrderStore {
    // Vec keeps insertion order stable, and lookups stay cheap at the
    // expected collection sizes.
    orders: RwLock<Vec<WorkOrder>>,
}

impl WorkOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_orders(orders: Vec<WorkOrder>) -> Self {
        Self {
            orders: RwLock::new(orders),
        }
    }

    /// Inserts a new order. An already-present id is rejected and the
    /// collection is left untouched; ids are never silently overwritten.
    pub fn create(&self, order: WorkOrder) -> Result<(), ServiceError> {
        let mut orders = self.orders.write().unwrap();
        if orders.iter().any(|existing| existing.id == order.id) {
            error!(id = %order.id, "attempted to create a work order with a duplicate id");
            return Err(ServiceError::DuplicateId(order.id));
        }
        orders.push(order);
        Ok(())
    }

    pub fn get(&self, id: Uuid) -> Option<WorkOrder> {
        self.orders
            .read()
            .unwrap()
            .iter()
            .find(|order| order.id == id)
            .cloned()
    }

    /// Merges a patch into the stored order and returns the result. The
    /// merged order must still satisfy entity invariants; on any failure the
    /// stored order is left exactly as it was.
    pub fn update(&self, id: Uuid, patch: WorkOrderPatch) -> Result<WorkOrder, ServiceError> {
        let mut orders = self.orders.write().unwrap();
        let slot = orders.iter_mut().find(|order| order.id == id);
        let Some(stored) = slot else {
            error!(%id, "attempted to update a missing work order");
            return Err(ServiceError::NotFound(id));
        };
        let mut merged = stored.clone();
        merged.apply_patch(patch);
        merged.validate()?;
        *stored = merged.clone();
        Ok(merged)
    }

    /// Removes an order, returning it. Same contract as `update`: missing id
    /// is an error and the collection is untouched.
    pub fn remove(&self, id: Uuid) -> Result<WorkOrder, ServiceError> {
        let mut orders = self.orders.write().unwrap();
        let position = orders.iter().position(|order| order.id == id);
        let Some(index) = position else {
            error!(%id, "attempted to remove a missing work order");
            return Err(ServiceError::NotFound(id));
        };
        Ok(orders.remove(index))
    }

    /// Snapshot in insertion order.
    pub fn list(&self) -> Vec<WorkOrder> {
        self.orders.read().unwrap().clone()
    }

    /// Snapshot sorted by creation time, newest first — the display order.
    pub fn list_recent_first(&self) -> Vec<WorkOrder> {
        let mut orders = self.list();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        orders
    }

    /// Orders whose deadline falls on the given calendar day. Both sides are
    /// normalized to UTC dates so the time-of-day component never matters.
    pub fn find_by_deadline_day(&self, day: NaiveDate) -> Vec<WorkOrder> {
        self.orders
            .read()
            .unwrap()
            .iter()
            .filter(|order| order.deadline.map(|d| d.date_naive()) == Some(day))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.orders.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.read().unwrap().is_empty()
    }

    pub fn serialize(&self) -> Result<String, PersistenceError> {
        let orders = self.orders.read().unwrap();
        Ok(serde_json::to_string(&*orders)?)
    }

    /// Parses a persisted payload. Malformed text surfaces
    /// [`PersistenceError::Corrupt`] so the caller can decide between reset
    /// and abort instead of silently losing data.
    pub fn deserialize(payload: &str) -> Result<Vec<WorkOrder>, PersistenceError> {
        Ok(serde_json::from_str(payload)?)
    }

    /// Writes the whole collection to the backend.
    pub fn persist(&self, backend: &dyn StorageBackend) -> Result<(), PersistenceError> {
        backend.save(&self.serialize()?)
    }

    /// Loads a store from the backend. An empty slot yields an empty store;
    /// corrupt state is an error.
    pub fn load(backend: &dyn StorageBackend) -> Result<Self, PersistenceError> {
        let orders = match backend.load()? {
            Some(payload) => Self::deserialize(&payload)?,
            None => Vec::new(),
        };
        Ok(Self::with_orders(orders))
    }

    /// Lenient variant of [`WorkOrderStore::load`]: corrupt state falls back
    /// to an empty store with a warning.
    pub fn load_or_default(backend: &dyn StorageBackend) -> Self {
        match Self::load(backend) {
            Ok(store) => store,
            Err(error) => {
                warn!(%error, "discarding unreadable persisted work orders");
                Self::new()
            }
        }
    }
}
