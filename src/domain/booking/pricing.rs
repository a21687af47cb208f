//! Booking price calculation.
//!
//! Each line pays a service fee of 10% of its total, but never less than
//! a fixed amount per ticket. Fees are computed per line and summed.

use crate::domain::foundation::Money;

use super::BookingLine;

/// Service fee percentage applied to each line total.
pub const SERVICE_FEE_PERCENT: i64 = 10;

/// Minimum service fee charged per ticket.
pub const SERVICE_FEE_FLOOR_PER_TICKET: Money = Money::from_major(50);

/// Subtotal, fee and total of a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceBreakdown {
    pub subtotal: Money,
    pub service_fee: Money,
    pub total: Money,
}

/// Service fee for a single line.
pub fn line_service_fee(line_total: Money, quantity: u32) -> Money {
    let percentage = line_total.percent(SERVICE_FEE_PERCENT);
    let floor = SERVICE_FEE_FLOOR_PER_TICKET.times(quantity);
    percentage.max(floor)
}

/// Prices a set of snapshotted booking lines.
pub fn price_lines(lines: &[BookingLine]) -> PriceBreakdown {
    let subtotal: Money = lines.iter().map(|l| l.line_total).sum();
    let service_fee: Money = lines
        .iter()
        .map(|l| line_service_fee(l.line_total, l.quantity))
        .sum();
    PriceBreakdown {
        subtotal,
        service_fee,
        total: subtotal + service_fee,
    }
}
