//! Pure fee and price-tick math.
//!
//! All functions are free of state; the simulator calls them on every
//! listing, reprice, and fill.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

/// Convert an f64 ratio into a Decimal multiplier.
pub fn dec(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or(Decimal::ZERO)
}

/// Proceeds per unit of gross sale price after sales tax and broker margin.
pub fn net_sell(gross: Decimal, tax_pct: f64, broker_pct: f64) -> Decimal {
    gross * (Decimal::ONE - dec(tax_pct) - dec(broker_pct))
}

/// Broker fee charged when listing an order, on the full listed value.
pub fn listing_fee(listed_value: Decimal, broker_pct: f64) -> Decimal {
    listed_value * dec(broker_pct)
}

/// Relist fee for repricing an existing order, accrued per assumed
/// reprices per day on the remaining order value.
pub fn relist_fee(order_value: Decimal, relist_pct: f64, reprices_per_day: f64) -> Decimal {
    order_value * dec(relist_pct) * dec(reprices_per_day)
}

/// Per-unit margin as a fraction of acquisition cost.
pub fn margin_pct(net_unit_price: Decimal, unit_cost: Decimal) -> f64 {
    if unit_cost <= Decimal::ZERO {
        return f64::INFINITY;
    }
    ((net_unit_price - unit_cost) / unit_cost)
        .to_f64()
        .unwrap_or(0.0)
}

/// The next listable price strictly below `price`.
///
/// Prices tick at four significant digits: the tick size is one unit of
/// the fourth significant digit. Non-positive prices pass through.
pub fn next_cheaper_tick(price: Decimal) -> Decimal {
    if price <= Decimal::ZERO {
        return price;
    }
    let approx = price.to_f64().unwrap_or(0.0);
    if approx <= 0.0 {
        return price;
    }
    let magnitude = approx.log10().floor() as i32;
    let tick = pow10((magnitude - 3).clamp(-10, 15));
    let snapped = (price / tick).floor() * tick;
    if snapped < price {
        snapped
    } else {
        snapped - tick
    }
}

fn pow10(exp: i32) -> Decimal {
    if exp >= 0 {
        Decimal::from(10u64.pow(exp as u32))
    } else {
        Decimal::new(1, (-exp) as u32)
    }
}
