use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Conventional status labels. The status field itself is free-form: any
/// component may set it, and no state machine is enforced.
pub mod status {
    pub const NEW: &str = "New";
    pub const ANALYZED: &str = "Analyzed";
    pub const INVOICED: &str = "Invoiced";
    pub const SCHEDULED: &str = "Scheduled";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Urgency {
    Low,
    #[default]
    Medium,
    High,
}

impl Urgency {
    /// Lenient parser for free-form gateway output. Returns `None` for
    /// anything that is not recognizably one of the three levels.
    pub fn parse_lenient(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Urgency::Low),
            "medium" | "normal" => Some(Urgency::Medium),
            "high" | "urgent" => Some(Urgency::High),
            _ => None,
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Urgency::Low => "Low",
            Urgency::Medium => "Medium",
            Urgency::High => "High",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct CustomerInfo {
    #[validate(length(min = 1, message = "Customer name is required"))]
    pub name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Customer phone is required"))]
    pub phone: String,
    #[validate(length(min = 1, message = "Customer address is required"))]
    pub address: String,
}

/// A single itemized line on an invoice: unit cost times quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PartCost {
    #[validate(length(min = 1, message = "Part name is required"))]
    pub part_name: String,
    #[validate(custom = "validate_non_negative")]
    pub cost: Decimal,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: u32,
}

impl PartCost {
    pub fn line_total(&self) -> Decimal {
        self.cost * Decimal::from(self.quantity)
    }
}

/// Result of the AI analysis step. All fields are free-form descriptive
/// strings; the gateway makes no promise of numeric parseability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobAnalysis {
    pub part_list: String,
    pub job_duration: String,
    pub tools_needed: String,
    pub man_hours: String,
}

/// Invoice attached once invoicing completes. `total_amount` is the gateway's
/// figure and is what gets displayed; `computed_total` is this crate's own
/// full-precision calculation, kept for cross-checking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceRecord {
    pub text: String,
    pub total_amount: Decimal,
    pub computed_total: Decimal,
}

/// The aggregate root. `id` and `created_at` are fixed at creation and never
/// touched by patches. AI-derived state lives in the optional `analysis` and
/// `invoice` sub-records; `None` means the step has not run yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct WorkOrder {
    pub id: Uuid,
    #[validate]
    pub customer_details: CustomerInfo,
    #[validate(length(min = 1, message = "Job description is required"))]
    pub job_description: String,
    pub urgency: Urgency,
    #[validate(length(min = 1, message = "Location is required"))]
    pub location: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<JobAnalysis>,
    #[validate]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part_costs: Option<Vec<PartCost>>,
    #[validate(custom = "validate_non_negative")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labor_estimate: Option<Decimal>,
    #[validate(custom = "validate_unit_interval")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_rate: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice: Option<InvoiceRecord>,
}

impl WorkOrder {
    /// Applies a partial update in place. Fields absent from the patch are
    /// left untouched; `id` and `created_at` are not patchable at all.
    pub fn apply_patch(&mut self, patch: WorkOrderPatch) {
        let WorkOrderPatch {
            customer_details,
            job_description,
            urgency,
            location,
            status,
            deadline,
            voice_notes,
            analysis,
            part_costs,
            labor_estimate,
            tax_rate,
            invoice,
        } = patch;
        if let Some(value) = customer_details {
            self.customer_details = value;
        }
        if let Some(value) = job_description {
            self.job_description = value;
        }
        if let Some(value) = urgency {
            self.urgency = value;
        }
        if let Some(value) = location {
            self.location = value;
        }
        if let Some(value) = status {
            self.status = value;
        }
        if let Some(value) = deadline {
            self.deadline = Some(value);
        }
        if let Some(value) = voice_notes {
            self.voice_notes = Some(value);
        }
        if let Some(value) = analysis {
            self.analysis = Some(value);
        }
        if let Some(value) = part_costs {
            self.part_costs = Some(value);
        }
        if let Some(value) = labor_estimate {
            self.labor_estimate = Some(value);
        }
        if let Some(value) = tax_rate {
            self.tax_rate = Some(value);
        }
        if let Some(value) = invoice {
            self.invoice = Some(value);
        }
    }
}

/// Validated input for creating a work order.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewWorkOrder {
    #[validate]
    pub customer_details: CustomerInfo,
    #[validate(length(min = 1, message = "Job description is required"))]
    pub job_description: String,
    pub urgency: Urgency,
    #[validate(length(min = 1, message = "Location is required"))]
    pub location: String,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub voice_notes: Option<String>,
}

impl NewWorkOrder {
    /// Assigns a fresh id, stamps `created_at`, and starts the order in the
    /// `New` status.
    pub fn into_work_order(self) -> WorkOrder {
        WorkOrder {
            id: Uuid::new_v4(),
            customer_details: self.customer_details,
            job_description: self.job_description,
            urgency: self.urgency,
            location: self.location,
            status: status::NEW.to_string(),
            created_at: Utc::now(),
            deadline: self.deadline,
            voice_notes: self.voice_notes,
            analysis: None,
            part_costs: None,
            labor_estimate: None,
            tax_rate: None,
            invoice: None,
        }
    }
}

/// Field-wise patch for `WorkOrderStore::update`. A `None` field leaves the
/// stored value untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkOrderPatch {
    pub customer_details: Option<CustomerInfo>,
    pub job_description: Option<String>,
    pub urgency: Option<Urgency>,
    pub location: Option<String>,
    pub status: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub voice_notes: Option<String>,
    pub analysis: Option<JobAnalysis>,
    pub part_costs: Option<Vec<PartCost>>,
    pub labor_estimate: Option<Decimal>,
    pub tax_rate: Option<Decimal>,
    pub invoice: Option<InvoiceRecord>,
}

pub fn validate_non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        let mut error = ValidationError::new("non_negative");
        error.message = Some("Value must be non-negative".into());
        return Err(error);
    }
    Ok(())
}

pub fn validate_unit_interval(value: &Decimal) -> Result<(), ValidationError> {
    if *value < Decimal::ZERO || *value > Decimal::ONE {
        let mut error = ValidationError::new("unit_interval");
        error.message = Some("Value must be between 0 and 1".into());
        return Err(error);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn customer() -> CustomerInfo {
        CustomerInfo {
            name: "Dana Reyes".to_string(),
            email: "dana@example.com".to_string(),
            phone: "555-0132".to_string(),
            address: "14 Harbor Rd".to_string(),
        }
    }

    fn order() -> WorkOrder {
        NewWorkOrder {
            customer_details: customer(),
            job_description: "Replace breaker panel".to_string(),
            urgency: Urgency::High,
            location: "Pier 3 warehouse".to_string(),
            deadline: None,
            voice_notes: None,
        }
        .into_work_order()
    }

    #[test]
    fn new_work_order_starts_in_new_status() {
        let order = order();
        assert_eq!(order.status, status::NEW);
        assert!(order.analysis.is_none());
        assert!(order.invoice.is_none());
    }

    #[test]
    fn urgency_parses_leniently() {
        assert_eq!(Urgency::parse_lenient(" HIGH "), Some(Urgency::High));
        assert_eq!(Urgency::parse_lenient("normal"), Some(Urgency::Medium));
        assert_eq!(Urgency::parse_lenient("unknown"), None);
    }

    #[test]
    fn empty_patch_is_identity() {
        let original = order();
        let mut patched = original.clone();
        patched.apply_patch(WorkOrderPatch::default());
        assert_eq!(patched, original);
    }

    #[test]
    fn patch_preserves_untouched_fields() {
        let mut order = order();
        let id = order.id;
        let created_at = order.created_at;
        order.apply_patch(WorkOrderPatch {
            status: Some(status::SCHEDULED.to_string()),
            ..Default::default()
        });
        assert_eq!(order.id, id);
        assert_eq!(order.created_at, created_at);
        assert_eq!(order.status, status::SCHEDULED);
        assert_eq!(order.job_description, "Replace breaker panel");
    }

    #[test]
    fn customer_validation_reports_every_offending_field() {
        let invalid = CustomerInfo {
            name: String::new(),
            email: "not-an-email".to_string(),
            phone: String::new(),
            address: "somewhere".to_string(),
        };
        let errors = invalid.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("phone"));
        assert!(!fields.contains_key("address"));
    }

    #[test]
    fn part_cost_line_total_multiplies_by_quantity() {
        let part = PartCost {
            part_name: "20A breaker".to_string(),
            cost: dec!(12.50),
            quantity: 4,
        };
        assert_eq!(part.line_total(), dec!(50.00));
    }

    #[test]
    fn negative_cost_and_zero_quantity_are_rejected() {
        let part = PartCost {
            part_name: "wire".to_string(),
            cost: dec!(-1),
            quantity: 0,
        };
        let errors = part.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("cost"));
        assert!(fields.contains_key("quantity"));
    }

    #[test]
    fn absent_optionals_stay_absent_in_json() {
        let order = order();
        let json = serde_json::to_value(&order).unwrap();
        let object = json.as_object().unwrap();
        assert!(!object.contains_key("deadline"));
        assert!(!object.contains_key("analysis"));
        assert!(!object.contains_key("invoice"));
        assert!(object.contains_key("createdAt"));
    }
}
