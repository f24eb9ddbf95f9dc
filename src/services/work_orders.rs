use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::gateway::{
    known, AiGateway, AnalysisRequest, AudioDataUri, InvoiceDraftRequest, InvoicePartLine,
    TranscriptionRequest,
};
use crate::invoicing::{to_currency, InvoiceInputs};
use crate::models::work_order::{
    status, InvoiceRecord, JobAnalysis, NewWorkOrder, Urgency, WorkOrder, WorkOrderPatch,
};
use crate::queries::{EventDaysQuery, Query, WorkOrdersDueOnQuery};
use crate::store::{StorageBackend, WorkOrderStore};

/// Pre-creation draft produced from a voice transcription. Fields the model
/// marked unknown come back as `None` so the form can keep whatever the user
/// already typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkOrderDraft {
    pub job_description: Option<String>,
    pub location: Option<String>,
    pub customer_notes: Option<String>,
    pub urgency: Urgency,
}

/// Gateway total vs locally computed total, both at currency precision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceMismatch {
    pub gateway_total: Decimal,
    pub computed_total: Decimal,
}

#[derive(Debug, Clone)]
pub struct InvoiceOutcome {
    pub work_order: WorkOrder,
    /// Full-precision locally computed total (source of truth).
    pub computed_total: Decimal,
    /// Present when the gateway figure disagrees beyond a cent of rounding.
    pub mismatch: Option<InvoiceMismatch>,
}

/// Service for managing work orders across creation, AI-assisted intake,
/// analysis, and invoicing.
///
/// Every gateway-calling operation snapshots the order's revision before the
/// call and merges the response only if the order is unchanged when the
/// response arrives; a superseding edit makes the response stale and it is
/// discarded with the order left intact.
pub struct WorkOrderService {
    store: Arc<WorkOrderStore>,
    backend: Arc<dyn StorageBackend>,
    gateway: Arc<dyn AiGateway>,
    event_sender: EventSender,
    revisions: Mutex<HashMap<Uuid, u64>>,
}

impl WorkOrderService {
    /// Creates a new work order service instance
    pub fn new(
        store: Arc<WorkOrderStore>,
        backend: Arc<dyn StorageBackend>,
        gateway: Arc<dyn AiGateway>,
        event_sender: EventSender,
    ) -> Self {
        Self {
            store,
            backend,
            gateway,
            event_sender,
            revisions: Mutex::new(HashMap::new()),
        }
    }

    /// Creates a new work order
    #[instrument(skip(self, input))]
    pub async fn create_work_order(&self, input: NewWorkOrder) -> Result<WorkOrder, ServiceError> {
        input.validate()?;
        let order = input.into_work_order();
        self.store.create(order.clone())?;
        self.persist()?;
        info!(id = %order.id, "work order created");
        self.emit(Event::WorkOrderCreated(order.id)).await;
        Ok(order)
    }

    /// Applies a partial edit, preserving untouched fields
    #[instrument(skip(self, patch))]
    pub async fn update_work_order(
        &self,
        id: Uuid,
        patch: WorkOrderPatch,
    ) -> Result<WorkOrder, ServiceError> {
        let updated = self.store.update(id, patch)?;
        self.persist()?;
        self.bump_revision(id);
        info!(%id, "work order updated");
        self.emit(Event::WorkOrderUpdated(id)).await;
        Ok(updated)
    }

    /// Removes a work order permanently
    #[instrument(skip(self))]
    pub async fn delete_work_order(&self, id: Uuid) -> Result<WorkOrder, ServiceError> {
        let removed = self.store.remove(id)?;
        self.persist()?;
        self.revisions.lock().unwrap().remove(&id);
        info!(%id, "work order deleted");
        self.emit(Event::WorkOrderDeleted(id)).await;
        Ok(removed)
    }

    /// Gets a work order by ID
    pub fn get_work_order(&self, id: Uuid) -> Option<WorkOrder> {
        self.store.get(id)
    }

    /// All work orders, newest first, for list display
    pub fn list_work_orders(&self) -> Vec<WorkOrder> {
        self.store.list_recent_first()
    }

    /// Work orders whose deadline falls on the given calendar day
    pub async fn work_orders_due_on(&self, day: NaiveDate) -> Result<Vec<WorkOrder>, ServiceError> {
        WorkOrdersDueOnQuery { day }.execute(&self.store).await
    }

    /// Distinct days carrying at least one deadline, for calendar markers
    pub async fn deadline_event_days(&self) -> Result<BTreeSet<NaiveDate>, ServiceError> {
        EventDaysQuery.execute(&self.store).await
    }

    /// Runs voice transcription and maps the best-effort extraction into a
    /// form draft. Touches no stored order.
    #[instrument(skip(self, audio))]
    pub async fn transcribe_intake(
        &self,
        audio: AudioDataUri,
    ) -> Result<WorkOrderDraft, ServiceError> {
        let response = self
            .gateway
            .transcribe(TranscriptionRequest {
                audio_data_uri: audio,
            })
            .await?;
        let urgency = Urgency::parse_lenient(&response.urgency).unwrap_or_default();
        Ok(WorkOrderDraft {
            job_description: known(&response.job_description).map(str::to_string),
            location: known(&response.location).map(str::to_string),
            customer_notes: known(&response.customer_details).map(str::to_string),
            urgency,
        })
    }

    /// Runs AI job analysis and attaches the result, advancing the order to
    /// `Analyzed`. A failed or superseded call leaves the order unchanged.
    #[instrument(skip(self))]
    pub async fn analyze_work_order(&self, id: Uuid) -> Result<WorkOrder, ServiceError> {
        let order = self.store.get(id).ok_or(ServiceError::NotFound(id))?;
        let revision = self.revision_of(id);

        let request = AnalysisRequest {
            job_description: order.job_description.clone(),
            customer_details: format!(
                "{}, {}",
                order.customer_details.name, order.customer_details.address
            ),
            urgency: order.urgency.to_string(),
            location: order.location.clone(),
        };
        let response = self.gateway.analyze(request).await?;

        if self.revision_of(id) != revision {
            warn!(%id, "work order changed while analysis was in flight; discarding response");
            return Err(ServiceError::StaleResponse(id));
        }

        let analysis = JobAnalysis {
            part_list: response.part_list,
            job_duration: response.job_duration_estimate,
            tools_needed: response.tools_needed,
            man_hours: response.man_hours_needed,
        };
        let updated = self.store.update(
            id,
            WorkOrderPatch {
                analysis: Some(analysis),
                status: Some(status::ANALYZED.to_string()),
                ..Default::default()
            },
        )?;
        self.persist()?;
        self.bump_revision(id);
        info!(%id, "work order analyzed");
        self.emit(Event::WorkOrderAnalyzed(id)).await;
        Ok(updated)
    }

    /// Computes the invoice total locally, asks the gateway for a drafted
    /// invoice, cross-checks the two figures, and attaches the result with
    /// status `Invoiced`. The gateway's total is stored for display; a
    /// discrepancy beyond a cent is surfaced in the outcome and logged.
    #[instrument(skip(self, inputs))]
    pub async fn generate_invoice(
        &self,
        id: Uuid,
        inputs: InvoiceInputs,
    ) -> Result<InvoiceOutcome, ServiceError> {
        let order = self.store.get(id).ok_or(ServiceError::NotFound(id))?;
        let revision = self.revision_of(id);

        let computed_total = inputs.total()?;
        let request = InvoiceDraftRequest {
            customer_info: order.customer_details.clone(),
            job_summary: order.job_description.clone(),
            part_costs: inputs.part_costs.iter().map(InvoicePartLine::from).collect(),
            labor_estimate: inputs.labor_estimate,
            tax_rate: inputs.tax_rate,
        };
        let response = self.gateway.draft_invoice(request).await?;

        if self.revision_of(id) != revision {
            warn!(%id, "work order changed while invoicing was in flight; discarding response");
            return Err(ServiceError::StaleResponse(id));
        }

        let rounded = to_currency(computed_total);
        let mismatch = if (response.total_amount - rounded).abs() > dec!(0.01) {
            warn!(
                %id,
                gateway_total = %response.total_amount,
                computed_total = %rounded,
                "gateway invoice total disagrees with computed total"
            );
            Some(InvoiceMismatch {
                gateway_total: response.total_amount,
                computed_total: rounded,
            })
        } else {
            None
        };

        let record = InvoiceRecord {
            text: response.invoice_text,
            total_amount: response.total_amount,
            computed_total,
        };
        let updated = self.store.update(
            id,
            WorkOrderPatch {
                part_costs: Some(inputs.part_costs),
                labor_estimate: Some(inputs.labor_estimate),
                tax_rate: Some(inputs.tax_rate),
                invoice: Some(record),
                status: Some(status::INVOICED.to_string()),
                ..Default::default()
            },
        )?;
        self.persist()?;
        self.bump_revision(id);
        info!(%id, total = %response.total_amount, "invoice generated");
        self.emit(Event::InvoiceGenerated {
            work_order_id: id,
            total_amount: response.total_amount,
        })
        .await;

        Ok(InvoiceOutcome {
            work_order: updated,
            computed_total,
            mismatch,
        })
    }

    fn persist(&self) -> Result<(), ServiceError> {
        self.store
            .persist(self.backend.as_ref())
            .map_err(ServiceError::from)
    }

    fn revision_of(&self, id: Uuid) -> u64 {
        *self.revisions.lock().unwrap().get(&id).unwrap_or(&0)
    }

    fn bump_revision(&self, id: Uuid) {
        *self.revisions.lock().unwrap().entry(id).or_insert(0) += 1;
    }

    async fn emit(&self, event: Event) {
        if let Err(error) = self.event_sender.send(event).await {
            warn!(%error, "failed to deliver lifecycle event");
        }
    }
}
