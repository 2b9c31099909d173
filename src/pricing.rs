//! Pricing
//!
//! Line totals, subtotal folding, the flat-rate shipping step function, and
//! the combined [`Quote`] handed back to the cart page.

use rust_decimal::Decimal;
use rusty_money::{
    Money,
    iso::{self, Currency},
};
use thiserror::Error;

use crate::{
    discounts::{self, DiscountError},
    items::LineItem,
    promotions::AppliedPromo,
};

/// Errors that can occur while pricing a cart.
#[derive(Debug, Error, PartialEq)]
pub enum PricingError {
    /// Decimal arithmetic overflowed.
    #[error("amount arithmetic overflowed")]
    AmountOverflow,

    /// Two amounts that must share a currency did not.
    #[error("expected amounts in {expected}, found {actual}")]
    CurrencyMismatch {
        /// The currency the calculation is denominated in.
        expected: &'static str,

        /// The currency that was found.
        actual: &'static str,
    },

    /// Errors bubbled up from discount calculation.
    #[error(transparent)]
    Discount(#[from] DiscountError),
}

/// Shipping constants for one storefront.
///
/// The defaults are the storefront's \u{20b9}500 free-shipping threshold
/// and \u{20b9}50 flat fee below it.
#[derive(Debug, Clone)]
pub struct PricingConfig<'a> {
    free_shipping_threshold: Money<'a, Currency>,
    flat_shipping_fee: Money<'a, Currency>,
}

impl<'a> PricingConfig<'a> {
    /// Create a config from a threshold and a flat fee.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::CurrencyMismatch`] if the two amounts are in
    /// different currencies.
    pub fn new(
        free_shipping_threshold: Money<'a, Currency>,
        flat_shipping_fee: Money<'a, Currency>,
    ) -> Result<Self, PricingError> {
        if free_shipping_threshold.currency() != flat_shipping_fee.currency() {
            return Err(PricingError::CurrencyMismatch {
                expected: free_shipping_threshold.currency().iso_alpha_code,
                actual: flat_shipping_fee.currency().iso_alpha_code,
            });
        }

        Ok(Self {
            free_shipping_threshold,
            flat_shipping_fee,
        })
    }

    /// Subtotal at or above which shipping is free.
    pub fn free_shipping_threshold(&self) -> &Money<'a, Currency> {
        &self.free_shipping_threshold
    }

    /// Shipping cost below the threshold.
    pub fn flat_shipping_fee(&self) -> &Money<'a, Currency> {
        &self.flat_shipping_fee
    }

    /// The currency both constants are denominated in.
    pub fn currency(&self) -> &'a Currency {
        self.free_shipping_threshold.currency()
    }
}

impl Default for PricingConfig<'static> {
    fn default() -> Self {
        Self {
            free_shipping_threshold: Money::from_major(500, iso::INR),
            flat_shipping_fee: Money::from_major(50, iso::INR),
        }
    }
}

/// Priced summary of a cart with an optional promotion applied.
#[derive(Debug, Clone)]
pub struct Quote<'a> {
    subtotal: Money<'a, Currency>,
    discount: Money<'a, Currency>,
    shipping: Money<'a, Currency>,
    total: Money<'a, Currency>,
}

impl<'a> Quote<'a> {
    /// Sum of unit price times quantity, before discount or shipping.
    pub fn subtotal(&self) -> Money<'a, Currency> {
        self.subtotal
    }

    /// Amount removed by the applied promo; zero without one.
    pub fn discount(&self) -> Money<'a, Currency> {
        self.discount
    }

    /// Shipping cost for this order.
    pub fn shipping(&self) -> Money<'a, Currency> {
        self.shipping
    }

    /// Final payable amount, never negative.
    pub fn total(&self) -> Money<'a, Currency> {
        self.total
    }
}

/// Calculate the total price of one line item.
///
/// # Errors
///
/// Returns [`PricingError::AmountOverflow`] if the multiplication
/// overflows.
pub fn line_total<'a>(item: &LineItem<'a>) -> Result<Money<'a, Currency>, PricingError> {
    let amount = item
        .unit_price()
        .amount()
        .checked_mul(Decimal::from(item.quantity()))
        .ok_or(PricingError::AmountOverflow)?;

    Ok(Money::from_decimal(amount, item.unit_price().currency()))
}

/// Fold the line totals of a collection of items.
///
/// An empty collection yields zero in the given currency.
///
/// # Errors
///
/// Returns [`PricingError::AmountOverflow`] if the decimal arithmetic
/// overflows.
pub fn subtotal_of<'a>(
    items: &[LineItem<'a>],
    currency: &'static Currency,
) -> Result<Money<'a, Currency>, PricingError> {
    let mut total = Decimal::ZERO;

    for item in items {
        let line = line_total(item)?;

        total = total
            .checked_add(*line.amount())
            .ok_or(PricingError::AmountOverflow)?;
    }

    Ok(Money::from_decimal(total, currency))
}

/// Calculate the shipping cost for a subtotal.
///
/// Zero at or above the free-shipping threshold, the flat fee below it.
/// A single step, no proration.
///
/// # Errors
///
/// Returns [`PricingError::CurrencyMismatch`] if the subtotal currency
/// differs from the config currency.
pub fn shipping_cost<'a>(
    subtotal: &Money<'a, Currency>,
    config: &PricingConfig<'_>,
) -> Result<Money<'a, Currency>, PricingError> {
    if subtotal.currency() != config.currency() {
        return Err(PricingError::CurrencyMismatch {
            expected: config.currency().iso_alpha_code,
            actual: subtotal.currency().iso_alpha_code,
        });
    }

    if subtotal.amount() >= config.free_shipping_threshold().amount() {
        Ok(Money::from_minor(0, subtotal.currency()))
    } else {
        Ok(Money::from_decimal(
            *config.flat_shipping_fee().amount(),
            subtotal.currency(),
        ))
    }
}

/// Combine subtotal, discount, and shipping into the payable total.
///
/// The result is floored at zero, so the displayed total is never negative
/// under any combination of caps.
///
/// # Errors
///
/// Returns [`PricingError::CurrencyMismatch`] if the three amounts do not
/// share a currency, or [`PricingError::AmountOverflow`] if the arithmetic
/// overflows.
pub fn order_total<'a>(
    subtotal: &Money<'a, Currency>,
    discount: &Money<'_, Currency>,
    shipping: &Money<'_, Currency>,
) -> Result<Money<'a, Currency>, PricingError> {
    for amount in [discount, shipping] {
        if amount.currency() != subtotal.currency() {
            return Err(PricingError::CurrencyMismatch {
                expected: subtotal.currency().iso_alpha_code,
                actual: amount.currency().iso_alpha_code,
            });
        }
    }

    let total = subtotal
        .amount()
        .checked_sub(*discount.amount())
        .ok_or(PricingError::AmountOverflow)?
        .checked_add(*shipping.amount())
        .ok_or(PricingError::AmountOverflow)?
        .max(Decimal::ZERO);

    Ok(Money::from_decimal(total, subtotal.currency()))
}

/// Price a subtotal with an optional promo under the given config.
///
/// # Errors
///
/// Returns a [`PricingError`] if the discount calculation fails, the
/// currencies disagree, or the arithmetic overflows.
pub fn quote<'a>(
    subtotal: Money<'a, Currency>,
    promo: Option<&AppliedPromo<'_>>,
    config: &PricingConfig<'_>,
) -> Result<Quote<'a>, PricingError> {
    let discount = discounts::discount_amount(&subtotal, promo)?;
    let shipping = shipping_cost(&subtotal, config)?;
    let total = order_total(&subtotal, &discount, &shipping)?;

    Ok(Quote {
        subtotal,
        discount,
        shipping,
        total,
    })
}
