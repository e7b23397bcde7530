//! Order money arithmetic. Amounts are integer minor units.

use crate::error::{AppError, AppResult};

/// One priced line of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricedLine {
    pub unit_price: i64,
    pub quantity: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderTotals {
    pub subtotal: i64,
    pub delivery_fee: i64,
    pub tax: i64,
    pub total: i64,
}

impl OrderTotals {
    pub fn compute(lines: &[PricedLine], delivery_fee: i64, tax: i64) -> AppResult<Self> {
        if delivery_fee < 0 {
            return Err(AppError::BadRequest("Delivery fee cannot be negative".into()));
        }
        if tax < 0 {
            return Err(AppError::BadRequest("Tax cannot be negative".into()));
        }

        let mut subtotal: i64 = 0;
        for line in lines {
            if line.quantity < 1 {
                return Err(AppError::BadRequest("Quantity must be at least 1".into()));
            }
            if line.unit_price < 0 {
                return Err(AppError::BadRequest("Price cannot be negative".into()));
            }
            let line_total = line
                .unit_price
                .checked_mul(i64::from(line.quantity))
                .ok_or_else(overflow)?;
            subtotal = subtotal.checked_add(line_total).ok_or_else(overflow)?;
        }

        Ok(Self {
            subtotal,
            delivery_fee,
            tax,
            total: grand_total(subtotal, delivery_fee, tax).ok_or_else(overflow)?,
        })
    }
}

pub fn grand_total(subtotal: i64, delivery_fee: i64, tax: i64) -> Option<i64> {
    subtotal.checked_add(delivery_fee)?.checked_add(tax)
}

fn overflow() -> AppError {
    AppError::BadRequest("Order amount is too large".into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_is_lines_plus_fee_plus_tax() {
        let lines = [
            PricedLine { unit_price: 10, quantity: 2 },
            PricedLine { unit_price: 350, quantity: 1 },
        ];
        let totals = OrderTotals::compute(&lines, 199, 42).unwrap();
        assert_eq!(totals.subtotal, 370);
        assert_eq!(totals.total, 370 + 199 + 42);
    }

    #[test]
    fn defaults_to_subtotal_without_fee_or_tax() {
        let lines = [PricedLine { unit_price: 10, quantity: 2 }];
        let totals = OrderTotals::compute(&lines, 0, 0).unwrap();
        assert_eq!(totals.total, 20);
    }

    #[test]
    fn rejects_bad_lines() {
        let zero_qty = [PricedLine { unit_price: 10, quantity: 0 }];
        assert!(matches!(
            OrderTotals::compute(&zero_qty, 0, 0),
            Err(AppError::BadRequest(_))
        ));
        let negative = [PricedLine { unit_price: -1, quantity: 1 }];
        assert!(OrderTotals::compute(&negative, 0, 0).is_err());
        assert!(OrderTotals::compute(&[], -5, 0).is_err());
        assert!(OrderTotals::compute(&[], 0, -5).is_err());
    }

    #[test]
    fn overflow_is_an_error_not_a_wrap() {
        let huge = [PricedLine { unit_price: i64::MAX, quantity: 2 }];
        assert!(OrderTotals::compute(&huge, 0, 0).is_err());
        assert_eq!(grand_total(i64::MAX, 1, 0), None);
    }
}
