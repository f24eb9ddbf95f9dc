// Core services
pub mod work_orders;

pub use work_orders::{InvoiceMismatch, InvoiceOutcome, WorkOrderDraft, WorkOrderService};
