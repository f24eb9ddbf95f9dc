use async_trait::async_trait;

use crate::errors::ServiceError;
use crate::store::WorkOrderStore;

pub mod calendar;

pub use calendar::{EventDaysQuery, WorkOrdersDueOnQuery};

/// A read-only question asked of the work order store.
#[async_trait]
pub trait Query: Send + Sync {
    type Result: Send + Sync;

    async fn execute(&self, store: &WorkOrderStore) -> Result<Self::Result, ServiceError>;
}
