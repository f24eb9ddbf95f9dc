//! Calendar-facing deadline queries.

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::ServiceError;
use crate::models::work_order::WorkOrder;
use crate::store::WorkOrderStore;

use super::Query;

/// Work orders whose deadline falls on the selected calendar day, ignoring
/// the time-of-day component.
#[derive(Debug, Serialize, Deserialize)]
pub struct WorkOrdersDueOnQuery {
    pub day: NaiveDate,
}

#[async_trait]
impl Query for WorkOrdersDueOnQuery {
    type Result = Vec<WorkOrder>;

    async fn execute(&self, store: &WorkOrderStore) -> Result<Self::Result, ServiceError> {
        Ok(store.find_by_deadline_day(self.day))
    }
}

/// The distinct days having at least one deadline, for calendar markers.
#[derive(Debug, Serialize, Deserialize)]
pub struct EventDaysQuery;

#[async_trait]
impl Query for EventDaysQuery {
    type Result = BTreeSet<NaiveDate>;

    async fn execute(&self, store: &WorkOrderStore) -> Result<Self::Result, ServiceError> {
        Ok(store
            .list()
            .into_iter()
            .filter_map(|order| order.deadline.map(|deadline| deadline.date_naive()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::work_order::{CustomerInfo, NewWorkOrder, Urgency};
    use chrono::{TimeZone, Utc};

    fn order_due(day: u32, hour: u32) -> crate::models::work_order::WorkOrder {
        let mut order = NewWorkOrder {
            customer_details: CustomerInfo {
                name: "Riko Tan".to_string(),
                email: "riko@example.com".to_string(),
                phone: "555-0110".to_string(),
                address: "3 Mill Ln".to_string(),
            },
            job_description: "service compressor".to_string(),
            urgency: Urgency::Low,
            location: "Basement plant room".to_string(),
            deadline: None,
            voice_notes: None,
        }
        .into_work_order();
        order.deadline = Some(Utc.with_ymd_and_hms(2024, 5, day, hour, 15, 0).unwrap());
        order
    }

    #[tokio::test]
    async fn event_days_are_deduplicated() {
        let store = WorkOrderStore::new();
        store.create(order_due(7, 9)).unwrap();
        store.create(order_due(7, 18)).unwrap();
        store.create(order_due(9, 12)).unwrap();

        let days = EventDaysQuery.execute(&store).await.unwrap();
        assert_eq!(days.len(), 2);
        assert!(days.contains(&NaiveDate::from_ymd_opt(2024, 5, 7).unwrap()));
        assert!(days.contains(&NaiveDate::from_ymd_opt(2024, 5, 9).unwrap()));
    }

    #[tokio::test]
    async fn due_on_query_matches_by_day() {
        let store = WorkOrderStore::new();
        let morning = order_due(7, 0);
        let night = order_due(7, 23);
        store.create(morning.clone()).unwrap();
        store.create(night.clone()).unwrap();
        store.create(order_due(8, 12)).unwrap();

        let due = WorkOrdersDueOnQuery {
            day: NaiveDate::from_ymd_opt(2024, 5, 7).unwrap(),
        }
        .execute(&store)
        .await
        .unwrap();
        let ids: Vec<_> = due.iter().map(|order| order.id).collect();
        assert_eq!(ids, vec![morning.id, night.id]);
    }
}
