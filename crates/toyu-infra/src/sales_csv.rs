//! Sales CSV handed to the accounting software (売上データ)

use encoding_rs::SHIFT_JIS;
use tracing::warn;

use toyu_types::{DeliveryRecord, Error, ExportEncoding, Result};

pub const SALES_HEADER: [&str; 12] = [
    "customer_code",
    "customer_name",
    "sale_date",
    "delivery_time",
    "sale_type",
    "quantity",
    "unit_price",
    "amount",
    "tax",
    "total",
    "paid_amount",
    "tank_id",
];

/// Every delivery is sold on account (掛売)
pub const SALE_TYPE: &str = "on-account";

/// Deliveries are paid later, never at the door
pub const PAID_AMOUNT: &str = "0";

/// Encode records in the given order, one row per record
pub fn encode_sales_csv(records: &[DeliveryRecord], encoding: ExportEncoding) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(SALES_HEADER)
        .map_err(|e| Error::Csv(e.to_string()))?;

    for r in records {
        writer
            .write_record([
                r.cust_code.clone(),
                r.cust_name.clone(),
                r.date.clone(),
                r.time.clone(),
                SALE_TYPE.to_string(),
                r.qty.to_string(),
                r.unit_price.to_string(),
                r.amount.to_string(),
                r.tax.to_string(),
                r.total.to_string(),
                PAID_AMOUNT.to_string(),
                r.tank_id.clone(),
            ])
            .map_err(|e| Error::Csv(e.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| Error::Csv(e.to_string()))?;

    match encoding {
        ExportEncoding::Utf8 => Ok(bytes),
        ExportEncoding::Cp932 => {
            let text = String::from_utf8(bytes).map_err(|e| Error::Csv(e.to_string()))?;
            let (encoded, _, had_errors) = SHIFT_JIS.encode(&text);
            if had_errors {
                warn!("some characters have no CP932 form and were replaced");
            }
            Ok(encoded.into_owned())
        }
    }
}
