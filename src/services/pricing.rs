use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Pricing rules for a single garment.
///
/// The chargeable unit price is the variant's base price plus flat
/// surcharges for extended sizes and for a printed custom name. These
/// functions are the only place surcharges are computed; carts call them for
/// display, checkout and finalization call them for the authoritative
/// charge. A price captured earlier is never trusted.

/// Flat surcharge for extended sizes. 4X is priced on its own tier and
/// never stacks with the 2X/3X surcharge.
pub fn size_surcharge(size: &str) -> Decimal {
    match size {
        "2X" | "3X" => dec!(2),
        "4X" => dec!(3),
        _ => Decimal::ZERO,
    }
}

/// Flat surcharge for a printed custom name, additive with any size surcharge.
pub fn customization_surcharge(has_customization: bool) -> Decimal {
    if has_customization {
        dec!(2)
    } else {
        Decimal::ZERO
    }
}

/// Chargeable price for one unit, at currency precision.
pub fn unit_price(base_price: Decimal, size: &str, has_customization: bool) -> Decimal {
    (base_price + size_surcharge(size) + customization_surcharge(has_customization)).round_dp(2)
}

pub fn line_total(unit_price: Decimal, quantity: i32) -> Decimal {
    unit_price * Decimal::from(quantity)
}
