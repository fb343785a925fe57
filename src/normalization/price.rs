/// Convert integer minor units (cents) to decimal currency.
pub fn cents_to_decimal(cents: i64) -> f64 {
    cents as f64 / 100.0
}
