//! Price calculation for a delivery (金額・消費税・合計)

use thiserror::Error;
use toyu_types::{Error, NewDelivery, PriceBreakdown, Result};

/// Consumption tax rate in percent
pub const TAX_RATE_PERCENT: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("quantity must not be negative: {0}")]
pub struct NegativeQuantity(pub f64);

/// Compute amount, tax and total.
///
/// `tax = round(amount * 10 / 100)`. Scaling by the integer percentage keeps
/// `.5` cases exact for whole-yen amounts; `f64::round` then rounds half away
/// from zero, i.e. half up for the non-negative amounts seen here.
pub fn price(qty: f64, unit_price: f64) -> std::result::Result<PriceBreakdown, NegativeQuantity> {
    if qty.is_nan() || qty < 0.0 {
        return Err(NegativeQuantity(qty));
    }
    let amount = qty * unit_price;
    let tax = (amount * TAX_RATE_PERCENT / 100.0).round();
    Ok(PriceBreakdown {
        amount,
        tax,
        total: amount + tax,
    })
}

/// Price a delivery about to be saved; zero and negative quantities are refused
pub fn price_delivery(input: &NewDelivery) -> Result<PriceBreakdown> {
    if !input.qty.is_finite() || input.qty <= 0.0 {
        return Err(Error::InvalidQuantity {
            tank_id: input.tank_id.clone(),
            qty: input.qty,
        });
    }
    price(input.qty, input.unit_price).map_err(|NegativeQuantity(qty)| Error::InvalidQuantity {
        tank_id: input.tank_id.clone(),
        qty,
    })
}
