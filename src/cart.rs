//! Cart
//!
//! The cart store owns the ordered collection of line items and guarantees
//! that equivalent product configurations never produce duplicate rows.
//! Count and subtotal are derived from the items on every read, so they can
//! never drift from the underlying collection.

use rusty_money::{Money, iso::Currency};
use thiserror::Error;
use tracing::debug;

use crate::{
    items::{CandidateItem, LineItem, Specifications},
    pricing::{self, PricingError},
};

/// Why a candidate was rejected by [`Cart::try_add`].
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// The candidate has no product id.
    #[error("candidate has an empty product id")]
    EmptyProductId,

    /// The candidate has no unit price.
    #[error("candidate for {0} has no unit price")]
    MissingPrice(String),

    /// The candidate asked for zero units.
    #[error("candidate for {0} has an explicit quantity of zero")]
    ZeroQuantity(String),
}

/// Errors related to cart mutation.
#[derive(Debug, Error, PartialEq)]
pub enum CartError {
    /// A candidate's price currency differs from the cart currency
    /// (product id, item currency, cart currency).
    #[error("candidate for {0} is priced in {1}, but the cart uses {2}")]
    CurrencyMismatch(String, &'static str, &'static str),

    /// A candidate failed the precondition checks of [`Cart::try_add`].
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// The authoritative line-item collection for one shopper session.
///
/// Insertion order is preserved; merging an existing configuration updates
/// the row in place at its original position.
#[derive(Debug)]
pub struct Cart<'a> {
    items: Vec<LineItem<'a>>,
    currency: &'static Currency,
}

impl<'a> Cart<'a> {
    /// Create an empty cart bound to one currency.
    #[must_use]
    pub fn new(currency: &'static Currency) -> Self {
        Cart {
            items: Vec::new(),
            currency,
        }
    }

    /// Add a candidate, merging it into an existing row with the same
    /// identity or appending a new row.
    ///
    /// Missing candidate fields are defaulted: quantity to 1, the
    /// specification map to empty, the row id to one generated from the
    /// identity, the price to zero in the cart currency. On a merge only
    /// the quantity changes; price and metadata keep their first-written
    /// values.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::CurrencyMismatch`] if the candidate is priced
    /// in a different currency than the cart. Well-formed callers never
    /// see an error.
    pub fn add(&mut self, candidate: CandidateItem<'a>) -> Result<(), CartError> {
        if let Some(price) = &candidate.unit_price {
            let item_currency = price.currency();

            if item_currency != self.currency {
                return Err(CartError::CurrencyMismatch(
                    candidate.product_id.clone(),
                    item_currency.iso_alpha_code,
                    self.currency.iso_alpha_code,
                ));
            }
        }

        let extra = candidate.quantity.unwrap_or(1);

        if let Some(existing) = self
            .items
            .iter_mut()
            .find(|item| item.matches(&candidate.product_id, &candidate.specifications))
        {
            existing.merge_quantity(extra);

            debug!(
                product_id = %candidate.product_id,
                quantity = existing.quantity(),
                "merged candidate into existing line item"
            );

            return Ok(());
        }

        let item = LineItem::from_candidate(candidate, self.currency);

        debug!(
            product_id = %item.product_id(),
            row_id = %item.row_id(),
            quantity = item.quantity(),
            "appended new line item"
        );

        self.items.push(item);

        Ok(())
    }

    /// Validating variant of [`Cart::add`].
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for an empty product id, a missing
    /// unit price, or an explicit zero quantity, and
    /// [`CartError::CurrencyMismatch`] as [`Cart::add`] does.
    pub fn try_add(&mut self, candidate: CandidateItem<'a>) -> Result<(), CartError> {
        if candidate.product_id.is_empty() {
            return Err(ValidationError::EmptyProductId.into());
        }

        if candidate.unit_price.is_none() {
            return Err(ValidationError::MissingPrice(candidate.product_id).into());
        }

        if candidate.quantity == Some(0) {
            return Err(ValidationError::ZeroQuantity(candidate.product_id).into());
        }

        self.add(candidate)
    }

    /// Delete the row with the given identity; no-op when there is no match.
    pub fn remove(&mut self, product_id: &str, specifications: &Specifications) {
        if let Some(position) = self.position(product_id, specifications) {
            self.items.remove(position);

            debug!(product_id, "removed line item");
        }
    }

    /// Set the matched row's quantity verbatim.
    ///
    /// A quantity of zero or below behaves exactly as [`Cart::remove`].
    /// No-op when there is no match.
    pub fn set_quantity(&mut self, product_id: &str, specifications: &Specifications, quantity: i64) {
        if quantity <= 0 {
            self.remove(product_id, specifications);
            return;
        }

        if let Some(item) = self
            .items
            .iter_mut()
            .find(|item| item.matches(product_id, specifications))
        {
            item.set_quantity(u32::try_from(quantity).unwrap_or(u32::MAX));

            debug!(product_id, quantity = item.quantity(), "updated line item quantity");
        }
    }

    /// Empty the collection unconditionally.
    pub fn clear(&mut self) {
        self.items.clear();

        debug!("cleared cart");
    }

    /// The line items in insertion order.
    pub fn items(&self) -> &[LineItem<'a>] {
        &self.items
    }

    /// Iterate over the line items.
    pub fn iter(&self) -> impl Iterator<Item = &LineItem<'a>> {
        self.items.iter()
    }

    /// Number of rows in the cart.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check whether the cart has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total number of units across all rows.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.items
            .iter()
            .map(|item| u64::from(item.quantity()))
            .sum()
    }

    /// Sum of unit price times quantity over all rows.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] if the decimal arithmetic overflows.
    pub fn subtotal(&self) -> Result<Money<'a, Currency>, PricingError> {
        pricing::subtotal_of(&self.items, self.currency)
    }

    /// The currency every row is priced in.
    #[must_use]
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    fn position(&self, product_id: &str, specifications: &Specifications) -> Option<usize> {
        self.items
            .iter()
            .position(|item| item.matches(product_id, specifications))
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::{
        Money,
        iso::{INR, USD},
    };
    use testresult::TestResult;

    use super::*;

    fn crochet_heart<'a>() -> CandidateItem<'a> {
        CandidateItem::new("crochet-heart", "Crochet Heart", "crochet")
            .priced(Money::from_major(200, INR))
            .specification("colour", "red")
    }

    #[test]
    fn adding_same_identity_twice_merges_into_one_row() -> TestResult {
        let mut cart = Cart::new(INR);

        cart.add(crochet_heart())?;
        cart.add(crochet_heart())?;

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.count(), 2);
        assert_eq!(cart.subtotal()?, Money::from_major(400, INR));

        Ok(())
    }

    #[test]
    fn different_specifications_produce_separate_rows() -> TestResult {
        let mut cart = Cart::new(INR);

        cart.add(crochet_heart())?;
        cart.add(
            CandidateItem::new("crochet-heart", "Crochet Heart", "crochet")
                .priced(Money::from_major(200, INR))
                .specification("colour", "blue"),
        )?;

        assert_eq!(cart.len(), 2);

        Ok(())
    }

    #[test]
    fn merge_updates_in_place_and_preserves_order() -> TestResult {
        let mut cart = Cart::new(INR);

        cart.add(crochet_heart())?;
        cart.add(
            CandidateItem::new("bookmark-fox", "Fox Bookmark", "bookmarks")
                .priced(Money::from_major(120, INR)),
        )?;
        cart.add(crochet_heart())?;

        let product_ids: Vec<&str> = cart.iter().map(LineItem::product_id).collect();

        assert_eq!(product_ids, vec!["crochet-heart", "bookmark-fox"]);
        assert_eq!(cart.items().first().map(LineItem::quantity), Some(2));

        Ok(())
    }

    #[test]
    fn merge_keeps_first_written_price_and_metadata() -> TestResult {
        let mut cart = Cart::new(INR);

        cart.add(crochet_heart().metadata(serde_json::json!({ "image": "heart.jpg" })))?;
        cart.add(
            crochet_heart()
                .priced(Money::from_major(999, INR))
                .metadata(serde_json::json!({ "image": "other.jpg" })),
        )?;

        let Some(item) = cart.items().first() else {
            panic!("expected one row");
        };

        assert_eq!(item.unit_price(), &Money::from_major(200, INR));
        assert_eq!(item.metadata(), &serde_json::json!({ "image": "heart.jpg" }));

        Ok(())
    }

    #[test]
    fn add_rejects_currency_mismatch() {
        let mut cart = Cart::new(INR);

        let result = cart.add(
            CandidateItem::new("card-1", "Birthday Card", "cards")
                .priced(Money::from_major(5, USD)),
        );

        match result {
            Err(CartError::CurrencyMismatch(product_id, item_currency, cart_currency)) => {
                assert_eq!(product_id, "card-1");
                assert_eq!(item_currency, USD.iso_alpha_code);
                assert_eq!(cart_currency, INR.iso_alpha_code);
            }
            other => panic!("expected CurrencyMismatch error, got {other:?}"),
        }
    }

    #[test]
    fn try_add_rejects_malformed_candidates() {
        let mut cart = Cart::new(INR);

        assert_eq!(
            cart.try_add(CandidateItem::new("", "Nameless", "cards")),
            Err(CartError::Validation(ValidationError::EmptyProductId)),
        );

        assert_eq!(
            cart.try_add(CandidateItem::new("card-1", "Birthday Card", "cards")),
            Err(CartError::Validation(ValidationError::MissingPrice(
                "card-1".to_string()
            ))),
        );

        assert_eq!(
            cart.try_add(
                CandidateItem::new("card-1", "Birthday Card", "cards")
                    .priced(Money::from_major(150, INR))
                    .quantity(0)
            ),
            Err(CartError::Validation(ValidationError::ZeroQuantity(
                "card-1".to_string()
            ))),
        );

        assert!(cart.is_empty());
    }

    #[test]
    fn remove_deletes_matching_row_and_ignores_missing() -> TestResult {
        let mut cart = Cart::new(INR);
        let specs = Specifications::new().with("colour", "red");

        cart.add(crochet_heart())?;

        cart.remove("crochet-heart", &Specifications::new());
        assert_eq!(cart.len(), 1);

        cart.remove("crochet-heart", &specs);
        assert!(cart.is_empty());

        // Removing again is a silent no-op.
        cart.remove("crochet-heart", &specs);
        assert!(cart.is_empty());

        Ok(())
    }

    #[test]
    fn set_quantity_is_verbatim_not_incremental() -> TestResult {
        let mut cart = Cart::new(INR);
        let specs = Specifications::new().with("colour", "red");

        cart.add(crochet_heart().quantity(5))?;
        cart.set_quantity("crochet-heart", &specs, 2);

        assert_eq!(cart.count(), 2);
        assert_eq!(cart.subtotal()?, Money::from_major(400, INR));

        Ok(())
    }

    #[test]
    fn set_quantity_zero_or_negative_removes_the_row() -> TestResult {
        let specs = Specifications::new().with("colour", "red");

        let mut cart = Cart::new(INR);
        cart.add(crochet_heart())?;
        cart.set_quantity("crochet-heart", &specs, 0);
        assert!(cart.is_empty());

        let mut cart = Cart::new(INR);
        cart.add(crochet_heart())?;
        cart.set_quantity("crochet-heart", &specs, -3);
        assert!(cart.is_empty());

        Ok(())
    }

    #[test]
    fn set_quantity_on_missing_identity_is_a_no_op() -> TestResult {
        let mut cart = Cart::new(INR);

        cart.add(crochet_heart())?;
        cart.set_quantity("bookmark-fox", &Specifications::new(), 4);

        assert_eq!(cart.count(), 1);

        Ok(())
    }

    #[test]
    fn clear_empties_the_cart() -> TestResult {
        let mut cart = Cart::new(INR);

        cart.add(crochet_heart())?;
        cart.clear();

        assert!(cart.is_empty());
        assert_eq!(cart.count(), 0);
        assert_eq!(cart.subtotal()?, Money::from_minor(0, INR));

        Ok(())
    }

    #[test]
    fn count_tracks_added_and_removed_quantities() -> TestResult {
        let mut cart = Cart::new(INR);
        let specs = Specifications::new().with("colour", "red");

        cart.add(crochet_heart().quantity(3))?;
        cart.add(
            CandidateItem::new("bookmark-fox", "Fox Bookmark", "bookmarks")
                .priced(Money::from_major(120, INR))
                .quantity(2),
        )?;

        assert_eq!(cart.count(), 5);

        cart.set_quantity("crochet-heart", &specs, 1);
        assert_eq!(cart.count(), 3);

        cart.remove("bookmark-fox", &Specifications::new());
        assert_eq!(cart.count(), 1);

        Ok(())
    }

    #[test]
    fn subtotal_of_empty_cart_is_zero() -> TestResult {
        let cart = Cart::new(INR);

        assert_eq!(cart.subtotal()?, Money::from_minor(0, INR));

        Ok(())
    }

    #[test]
    fn unpriced_candidate_defaults_to_zero_in_cart_currency() -> TestResult {
        let mut cart = Cart::new(INR);

        cart.add(CandidateItem::new("card-1", "Birthday Card", "cards"))?;

        assert_eq!(cart.subtotal()?, Money::from_minor(0, INR));

        Ok(())
    }
}
