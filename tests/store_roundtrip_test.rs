//! Persistence round-trip tests: serialize/deserialize must be the identity
//! on the semantic content of every work order, timestamps included, and
//! optional fields that were absent must stay absent.

use chrono::{TimeZone, Utc};
use fieldflow::models::work_order::{
    status, CustomerInfo, InvoiceRecord, JobAnalysis, NewWorkOrder, PartCost, Urgency, WorkOrder,
};
use fieldflow::store::{
    InMemoryBackend, JsonFileBackend, PersistenceError, StorageBackend, WorkOrderStore,
};
use rust_decimal_macros::dec;

fn bare_order() -> WorkOrder {
    NewWorkOrder {
        customer_details: CustomerInfo {
            name: "Mo Farrell".to_string(),
            email: "mo@example.com".to_string(),
            phone: "555-0147".to_string(),
            address: "61 Foundry Way".to_string(),
        },
        job_description: "Annual boiler service".to_string(),
        urgency: Urgency::Low,
        location: "Rooftop plant".to_string(),
        deadline: None,
        voice_notes: None,
    }
    .into_work_order()
}

fn full_order() -> WorkOrder {
    let mut order = bare_order();
    order.deadline = Some(Utc.with_ymd_and_hms(2024, 9, 14, 16, 45, 30).unwrap());
    order.voice_notes = Some("gate code 4411".to_string());
    order.status = status::INVOICED.to_string();
    order.analysis = Some(JobAnalysis {
        part_list: "gasket kit, inhibitor".to_string(),
        job_duration: "half a day".to_string(),
        tools_needed: "flue analyser".to_string(),
        man_hours: "4".to_string(),
    });
    order.part_costs = Some(vec![PartCost {
        part_name: "gasket kit".to_string(),
        cost: dec!(18.75),
        quantity: 2,
    }]);
    order.labor_estimate = Some(dec!(120));
    order.tax_rate = Some(dec!(0.08));
    order.invoice = Some(InvoiceRecord {
        text: "Invoice for annual boiler service".to_string(),
        total_amount: dec!(170.10),
        computed_total: dec!(170.10),
    });
    order
}

#[test]
fn round_trip_is_identity_for_sparse_and_dense_orders() {
    let store = WorkOrderStore::with_orders(vec![bare_order(), full_order()]);
    let payload = store.serialize().unwrap();
    let reloaded = WorkOrderStore::deserialize(&payload).unwrap();
    assert_eq!(reloaded, store.list());
}

#[test]
fn round_trip_preserves_exact_timestamps() {
    let mut order = bare_order();
    order.deadline = Some(Utc.timestamp_opt(1_726_329_930, 123_456_789).unwrap());
    let created_at = order.created_at;
    let deadline = order.deadline;

    let store = WorkOrderStore::with_orders(vec![order]);
    let reloaded = WorkOrderStore::deserialize(&store.serialize().unwrap()).unwrap();
    assert_eq!(reloaded[0].created_at, created_at);
    assert_eq!(reloaded[0].deadline, deadline);
}

#[test]
fn absent_optionals_do_not_resurface_after_a_round_trip() {
    let store = WorkOrderStore::with_orders(vec![bare_order()]);
    let payload = store.serialize().unwrap();
    assert!(!payload.contains("\"analysis\""));
    assert!(!payload.contains("\"invoice\""));
    assert!(!payload.contains("\"deadline\""));

    let reloaded = WorkOrderStore::deserialize(&payload).unwrap();
    assert!(reloaded[0].analysis.is_none());
    assert!(reloaded[0].invoice.is_none());
    assert!(reloaded[0].deadline.is_none());
}

#[test]
fn file_backend_survives_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let backend = JsonFileBackend::new(dir.path().join("orders.json"));

    let store = WorkOrderStore::with_orders(vec![full_order()]);
    store.persist(&backend).unwrap();

    let reloaded = WorkOrderStore::load(&backend).unwrap();
    assert_eq!(reloaded.list(), store.list());
}

#[test]
fn corrupt_file_is_an_error_not_silent_data_loss() {
    let backend = InMemoryBackend::new();
    backend.save("[{\"id\": \"truncated").unwrap();
    assert!(matches!(
        WorkOrderStore::load(&backend),
        Err(PersistenceError::Corrupt(_))
    ));
}
