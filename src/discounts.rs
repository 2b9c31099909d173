//! Discounts
//!
//! Discount amounts for an applied promo, with the storefront caps: a
//! percentage code never removes more than half of the subtotal, and a flat
//! code never exceeds the subtotal itself, so the pre-shipping total cannot
//! go negative.

use rust_decimal::{Decimal, RoundingStrategy};
use rusty_money::{Money, iso::Currency};
use thiserror::Error;

use crate::promotions::{AppliedPromo, PromoDiscount};

/// Errors specific to discount calculations.
#[derive(Debug, Error, PartialEq)]
pub enum DiscountError {
    /// Percentage calculation overflowed or could not be represented.
    #[error("percentage calculation overflowed")]
    PercentConversion,

    /// The flat amount is denominated in a different currency than the
    /// subtotal.
    #[error("discount is denominated in {promo}, but the subtotal uses {subtotal}")]
    CurrencyMismatch {
        /// Promo amount currency code.
        promo: &'static str,

        /// Subtotal currency code.
        subtotal: &'static str,
    },
}

/// Calculate the discount amount for a subtotal and an optional promo.
///
/// No active promo yields a zero amount. Percentage discounts are clamped
/// to half of the subtotal regardless of the code's nominal percentage;
/// flat discounts are clamped to the subtotal.
///
/// # Errors
///
/// - [`DiscountError::PercentConversion`]: the decimal arithmetic
///   overflowed.
/// - [`DiscountError::CurrencyMismatch`]: a flat amount is in a different
///   currency than the subtotal.
pub fn discount_amount<'a>(
    subtotal: &Money<'a, Currency>,
    promo: Option<&AppliedPromo<'_>>,
) -> Result<Money<'a, Currency>, DiscountError> {
    let currency = subtotal.currency();

    let Some(applied) = promo else {
        return Ok(Money::from_minor(0, currency));
    };

    let subtotal_amount = (*subtotal.amount()).max(Decimal::ZERO);

    let amount = match applied.promo().discount() {
        PromoDiscount::Percentage(percent) => {
            let fraction = (*percent * Decimal::ONE).clamp(Decimal::ZERO, percentage_cap());

            fraction
                .checked_mul(subtotal_amount)
                .ok_or(DiscountError::PercentConversion)?
                .round_dp_with_strategy(currency.exponent, RoundingStrategy::MidpointAwayFromZero)
        }
        PromoDiscount::FixedAmount(flat) => {
            if flat.currency() != currency {
                return Err(DiscountError::CurrencyMismatch {
                    promo: flat.currency().iso_alpha_code,
                    subtotal: currency.iso_alpha_code,
                });
            }

            (*flat.amount()).clamp(Decimal::ZERO, subtotal_amount)
        }
    };

    Ok(Money::from_decimal(amount, currency))
}

/// Largest share of the subtotal a percentage code may remove.
fn percentage_cap() -> Decimal {
    Decimal::new(5, 1)
}
