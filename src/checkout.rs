//! Checkout
//!
//! [`CartSession`] ties the cart, the promo catalog, and the pricing config
//! together behind the surface the cart page drives: mutate the cart, apply
//! or clear a promo code, and read back a priced [`Quote`].

use rusty_money::{
    Money,
    iso::{self, Currency},
};
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    cart::{Cart, CartError},
    items::{CandidateItem, LineItem, Specifications},
    pricing::{self, PricingConfig, PricingError, Quote},
    promotions::{AppliedPromo, PromoCatalog, PromoError},
};

/// Any error a session operation can surface.
#[derive(Debug, Error, PartialEq)]
pub enum CheckoutError<'a> {
    /// Errors from cart mutation.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// Errors from promo resolution.
    #[error("{0}")]
    Promo(PromoError<'a>),

    /// Errors from pricing arithmetic.
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

impl<'a> From<PromoError<'a>> for CheckoutError<'a> {
    fn from(error: PromoError<'a>) -> Self {
        CheckoutError::Promo(error)
    }
}

/// One shopper's cart plus the storefront's promo and shipping rules.
///
/// At most one promo is active at a time; applying a second code replaces
/// the first. A failed application leaves both the cart and any previously
/// applied promo untouched.
#[derive(Debug)]
pub struct CartSession<'a> {
    cart: Cart<'a>,
    catalog: PromoCatalog<'a>,
    config: PricingConfig<'a>,
    promo: Option<AppliedPromo<'a>>,
}

impl<'a> CartSession<'a> {
    /// Create a session over an empty cart.
    #[must_use]
    pub fn new(
        currency: &'static Currency,
        catalog: PromoCatalog<'a>,
        config: PricingConfig<'a>,
    ) -> Self {
        Self {
            cart: Cart::new(currency),
            catalog,
            config,
            promo: None,
        }
    }

    /// Add a candidate to the cart, merging duplicates by identity.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::CurrencyMismatch`] via [`CheckoutError::Cart`]
    /// if the candidate is priced in a foreign currency.
    pub fn add_to_cart(&mut self, candidate: CandidateItem<'a>) -> Result<(), CheckoutError<'a>> {
        self.cart.add(candidate)?;

        Ok(())
    }

    /// Remove the row with the given identity; no-op when there is no match.
    pub fn remove_from_cart(&mut self, product_id: &str, specifications: &Specifications) {
        self.cart.remove(product_id, specifications);
    }

    /// Set a row's quantity verbatim; zero or below removes the row.
    pub fn update_quantity(
        &mut self,
        product_id: &str,
        specifications: &Specifications,
        quantity: i64,
    ) {
        self.cart.set_quantity(product_id, specifications, quantity);
    }

    /// Empty the cart. An applied promo is kept and simply prices against
    /// the empty subtotal until cleared or replaced.
    pub fn clear_cart(&mut self) {
        self.cart.clear();
    }

    /// Read access to the underlying cart.
    pub fn cart(&self) -> &Cart<'a> {
        &self.cart
    }

    /// The line items in insertion order.
    pub fn items(&self) -> &[LineItem<'a>] {
        self.cart.items()
    }

    /// Total number of units across all rows.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.cart.count()
    }

    /// Sum of unit price times quantity over all rows.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] if the decimal arithmetic overflows.
    pub fn subtotal(&self) -> Result<Money<'a, Currency>, PricingError> {
        self.cart.subtotal()
    }

    /// Resolve an entered code against the current subtotal and make it the
    /// session's active promo, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns the [`PromoError`] from resolution; on failure the cart and
    /// the previously applied promo are left untouched.
    pub fn apply_promo_code(&mut self, entered: &str) -> Result<(), CheckoutError<'a>> {
        let subtotal = self.cart.subtotal()?;
        let applied = self.catalog.resolve(entered, &subtotal)?;

        info!(
            code = %applied.code(),
            subtotal = %subtotal,
            "applied promo code"
        );

        self.promo = Some(applied);

        Ok(())
    }

    /// The active promo, if any.
    pub fn applied_promo(&self) -> Option<&AppliedPromo<'a>> {
        self.promo.as_ref()
    }

    /// Drop the active promo, if any.
    pub fn clear_promo(&mut self) {
        if self.promo.take().is_some() {
            debug!("cleared applied promo");
        }
    }

    /// Price the current cart with the active promo and shipping rules.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] via [`CheckoutError::Pricing`] if the
    /// arithmetic overflows or the currencies disagree.
    pub fn quote(&self) -> Result<Quote<'a>, CheckoutError<'a>> {
        let subtotal = self.cart.subtotal()?;
        let quote = pricing::quote(subtotal, self.promo.as_ref(), &self.config)?;

        Ok(quote)
    }
}

impl CartSession<'static> {
    /// A session with the storefront defaults: an INR cart, the five
    /// shipped promo codes, and the standard shipping rules.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(iso::INR, PromoCatalog::standard(), PricingConfig::default())
    }
}
