//! Street-side pre-sort ("lazy walker").
//!
//! Orders stops by street, then by side of the street (even house numbers
//! before odd), then by the raw house-number text. The optimizer's first
//! solution follows input order on ties, so this nudges agents into working
//! one side of a block before crossing. It does not make routes feasible or
//! optimal on its own.

use std::cmp::Ordering;

use crate::model::Stop;

/// Side of the street a house number sits on: 0 for even, 1 for odd.
///
/// Uses the ASCII digits of the house number read as one integer; other
/// numeric characters are ignored and a number with no ASCII digits counts
/// as even.
pub fn street_side(house_number: &str) -> u8 {
    house_number
        .chars()
        .filter(char::is_ascii_digit)
        .last()
        .and_then(|digit| digit.to_digit(10))
        .map(|digit| (digit % 2) as u8)
        .unwrap_or(0)
}

fn compare(a: &Stop, b: &Stop) -> Ordering {
    a.street_name
        .cmp(&b.street_name)
        .then_with(|| street_side(&a.house_number).cmp(&street_side(&b.house_number)))
        .then_with(|| a.house_number.cmp(&b.house_number))
}

/// Reorder stops by (street name, side parity, house-number text).
///
/// Stable, so stops with identical keys keep their input order.
pub fn sort_by_street_side(mut stops: Vec<Stop>) -> Vec<Stop> {
    stops.sort_by(compare);
    stops
}
