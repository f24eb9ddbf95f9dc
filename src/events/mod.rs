use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use uuid::Uuid;

// Define the various events that can occur over a work order's lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    WorkOrderCreated(Uuid),
    WorkOrderUpdated(Uuid),
    WorkOrderDeleted(Uuid),
    WorkOrderAnalyzed(Uuid),
    InvoiceGenerated {
        work_order_id: Uuid,
        total_amount: Decimal,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|error| format!("Failed to send event: {}", error))
    }
}

/// Bounded event channel; the receiver side belongs to whoever embeds the
/// crate (UI refresh, notifications).
pub fn channel(capacity: usize) -> (EventSender, mpsc::Receiver<Event>) {
    let (sender, receiver) = mpsc::channel(capacity);
    (EventSender::new(sender), receiver)
}
