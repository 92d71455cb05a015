//! Price arithmetic shared by the cart, checkout and review code.
//!
//! All money values are [`Decimal`]s rounded to two places, half away from
//! zero.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::types::{Discount, Rating};

/// Round a money amount to cents.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Price after applying a percentage discount.
#[must_use]
pub fn discounted_price(price: Decimal, discount: Discount) -> Decimal {
    round_money(price * discount.factor())
}

/// Unit price times quantity.
#[must_use]
pub fn line_total(unit_price: Decimal, quantity: i32) -> Decimal {
    round_money(unit_price * Decimal::from(quantity))
}

/// Sum of `(line total, quantity)` pairs into `(total price, total quantity)`.
pub fn sum_totals<I>(lines: I) -> (Decimal, i64)
where
    I: IntoIterator<Item = (Decimal, i32)>,
{
    lines
        .into_iter()
        .fold((Decimal::ZERO, 0_i64), |(price, qty), (line, q)| {
            (price + line, qty + i64::from(q))
        })
}

/// Mean of the given ratings, or `0.0` when there are none.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn average_rating(ratings: &[Rating]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }
    let sum: u32 = ratings.iter().map(|r| u32::from(r.value())).sum();
    f64::from(sum) / ratings.len() as f64
}
