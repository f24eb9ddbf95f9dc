//! Invoice total computation.
//!
//! Totals are computed and stored at full `Decimal` precision; rounding to
//! currency precision happens only at presentation via [`to_currency`].

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::errors::ServiceError;
use crate::models::work_order::{validate_non_negative, validate_unit_interval, PartCost};

/// Itemized inputs for an invoice computation.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceInputs {
    #[validate]
    pub part_costs: Vec<PartCost>,
    #[validate(custom = "validate_non_negative")]
    pub labor_estimate: Decimal,
    #[validate(custom = "validate_unit_interval")]
    pub tax_rate: Decimal,
}

impl InvoiceInputs {
    /// Validates every constraint and returns the tax-inclusive total.
    ///
    /// All violated fields are reported together, not just the first.
    pub fn total(&self) -> Result<Decimal, ServiceError> {
        self.validate()?;
        let subtotal: Decimal = self
            .part_costs
            .iter()
            .map(PartCost::line_total)
            .sum::<Decimal>()
            + self.labor_estimate;
        Ok(subtotal * (Decimal::ONE + self.tax_rate))
    }
}

/// Tax-inclusive total from itemized part costs, labor, and tax rate.
///
/// Pure and idempotent; fails with a field-level validation error when any
/// cost is negative, any quantity is zero, labor is negative, or the tax rate
/// falls outside `[0, 1]`.
pub fn compute_invoice_total(
    part_costs: &[PartCost],
    labor_estimate: Decimal,
    tax_rate: Decimal,
) -> Result<Decimal, ServiceError> {
    InvoiceInputs {
        part_costs: part_costs.to_vec(),
        labor_estimate,
        tax_rate,
    }
    .total()
}

/// Rounds a stored full-precision amount to currency precision (2 decimal
/// digits) for display.
pub fn to_currency(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn part(name: &str, cost: Decimal, quantity: u32) -> PartCost {
        PartCost {
            part_name: name.to_string(),
            cost,
            quantity,
        }
    }

    #[test]
    fn worked_example_from_the_ticket() {
        let total =
            compute_invoice_total(&[part("X", dec!(10), 2)], dec!(50), dec!(0.08)).unwrap();
        assert_eq!(to_currency(total), dec!(75.60));
    }

    #[test]
    fn empty_inputs_yield_zero() {
        let total = compute_invoice_total(&[], Decimal::ZERO, Decimal::ZERO).unwrap();
        assert_eq!(to_currency(total), dec!(0.00));
    }

    #[test]
    fn stored_total_keeps_full_precision() {
        let total =
            compute_invoice_total(&[part("seal kit", dec!(0.333), 3)], dec!(0), dec!(0.1))
                .unwrap();
        assert_eq!(total, dec!(1.0989));
        assert_eq!(to_currency(total), dec!(1.10));
    }

    #[test]
    fn every_violated_field_is_reported() {
        let error = compute_invoice_total(
            &[part("", dec!(-5), 0)],
            dec!(-1),
            dec!(1.5),
        )
        .unwrap_err();
        let ServiceError::Validation(errors) = error else {
            panic!("expected validation error");
        };
        let all = errors.errors();
        assert!(all.contains_key("part_costs"));
        assert!(all.contains_key("labor_estimate"));
        assert!(all.contains_key("tax_rate"));
    }

    #[test]
    fn quantity_scales_the_line_total() {
        let one = compute_invoice_total(&[part("filter", dec!(7.25), 1)], dec!(0), dec!(0))
            .unwrap();
        let three = compute_invoice_total(&[part("filter", dec!(7.25), 3)], dec!(0), dec!(0))
            .unwrap();
        assert_eq!(three, one * dec!(3));
    }
}
