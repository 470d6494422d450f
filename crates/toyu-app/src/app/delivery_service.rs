//! Delivery entry (給油記録)
//!
//! A delivery is entered for one customer with a quantity per tank. Every
//! tank with a positive quantity becomes one record; all of them are saved
//! in a single transaction or not at all. A tank may appear only once per
//! request.

use std::collections::HashSet;

use serde::Serialize;
use toyu_domain::repository::{MasterRepository, RecordLedger};
use toyu_domain::service::{price, NegativeQuantity};
use toyu_types::{DeliveryRecord, Error, NewDelivery, PriceBreakdown, Result};

use super::session::Session;

/// Quantities entered for one customer
#[derive(Debug, Clone, Default)]
pub struct DeliveryRequest {
    pub customer_code: String,
    /// `(tank_id, litres)`; zero means the tank was not filled
    pub quantities: Vec<(String, f64)>,
}

/// Save the request; returns the stored records in entry order
pub fn save_deliveries(session: &Session, request: &DeliveryRequest) -> Result<Vec<DeliveryRecord>> {
    let masters = session.masters().load_all()?;
    let customer = masters
        .customer(&request.customer_code)
        .ok_or_else(|| Error::CustomerNotFound(request.customer_code.clone()))?;

    let date = session.clock().date_string();
    let time = session.clock().time_string();

    let mut seen = HashSet::new();
    for (tank_id, _) in &request.quantities {
        if !seen.insert(tank_id.as_str()) {
            return Err(Error::DuplicateTank(tank_id.clone()));
        }
    }

    let mut inputs = Vec::new();
    for (tank_id, qty) in &request.quantities {
        let tank = masters
            .tank(tank_id)
            .filter(|t| t.customer_code == customer.customer_code)
            .ok_or_else(|| Error::TankNotFound(tank_id.clone()))?;

        if !qty.is_finite() || *qty < 0.0 {
            return Err(Error::InvalidQuantity {
                tank_id: tank_id.clone(),
                qty: *qty,
            });
        }
        if *qty == 0.0 {
            continue;
        }
        if let Some(capacity) = tank.tank_capacity.filter(|capacity| *qty > *capacity) {
            return Err(Error::CapacityExceeded {
                tank_id: tank_id.clone(),
                capacity,
                qty: *qty,
            });
        }

        inputs.push(NewDelivery {
            cust_code: customer.customer_code.clone(),
            cust_name: customer.official_name.clone(),
            date: date.clone(),
            time: time.clone(),
            tank_id: tank.tank_id.clone(),
            tank_name: tank.tank_name.clone(),
            qty: *qty,
            unit_price: customer.unit_price,
        });
    }

    if inputs.is_empty() {
        return Err(Error::InvalidQuantity {
            tank_id: request
                .quantities
                .first()
                .map(|(id, _)| id.clone())
                .unwrap_or_else(|| "(none)".to_string()),
            qty: 0.0,
        });
    }

    session.ledger().append_all(inputs)
}

/// Price preview for a quantity, without saving
#[derive(Debug, Clone, Serialize)]
pub struct Quote {
    pub customer_code: String,
    pub customer_name: String,
    pub qty: f64,
    pub unit_price: f64,
    #[serde(flatten)]
    pub price: PriceBreakdown,
}

pub fn quote(session: &Session, customer_code: &str, qty: f64) -> Result<Quote> {
    let masters = session.masters().load_all()?;
    let customer = masters
        .customer(customer_code)
        .ok_or_else(|| Error::CustomerNotFound(customer_code.to_string()))?;

    let price = price(qty, customer.unit_price).map_err(|NegativeQuantity(qty)| {
        Error::InvalidQuantity {
            tank_id: "-".to_string(),
            qty,
        }
    })?;

    Ok(Quote {
        customer_code: customer.customer_code.clone(),
        customer_name: customer.official_name.clone(),
        qty,
        unit_price: customer.unit_price,
        price,
    })
}
