// Core models
pub mod work_order;

pub use work_order::{
    status, CustomerInfo, InvoiceRecord, JobAnalysis, NewWorkOrder, PartCost, Urgency, WorkOrder,
    WorkOrderPatch,
};
