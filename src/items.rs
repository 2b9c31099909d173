//! Line items
//!
//! A line item is one configured product in the cart. The customisation
//! choices that distinguish two purchases of the same base product (design,
//! colour, message, and so on) travel in a [`Specifications`] map, and the
//! pair of product id and specification map is the item's identity.

use std::collections::BTreeMap;
use std::fmt;

use jiff::Timestamp;
use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};

/// A single customisation value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SpecValue {
    /// Free-text choice, such as an engraved message or a colour name.
    Text(String),

    /// Numeric choice, such as a size or a letter count.
    Number(Decimal),
}

impl fmt::Display for SpecValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecValue::Text(text) => write!(f, "{text}"),
            SpecValue::Number(number) => write!(f, "{number}"),
        }
    }
}

impl From<&str> for SpecValue {
    fn from(value: &str) -> Self {
        SpecValue::Text(value.to_string())
    }
}

impl From<String> for SpecValue {
    fn from(value: String) -> Self {
        SpecValue::Text(value)
    }
}

impl From<i64> for SpecValue {
    fn from(value: i64) -> Self {
        SpecValue::Number(Decimal::from(value))
    }
}

impl From<Decimal> for SpecValue {
    fn from(value: Decimal) -> Self {
        SpecValue::Number(value)
    }
}

/// Customisation choices keyed by option name.
///
/// Keys are held in a sorted map, so two maps built in different insertion
/// orders compare equal and produce the same canonical rendering. Identity
/// checks therefore never split one configuration into duplicate cart rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Specifications(BTreeMap<String, SpecValue>);

impl Specifications {
    /// Create an empty specification map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one choice, replacing any previous value for the same option.
    pub fn set(&mut self, option: impl Into<String>, value: impl Into<SpecValue>) {
        self.0.insert(option.into(), value.into());
    }

    /// Builder-style variant of [`Specifications::set`].
    #[must_use]
    pub fn with(mut self, option: impl Into<String>, value: impl Into<SpecValue>) -> Self {
        self.set(option, value);
        self
    }

    /// Get the value chosen for an option, if any.
    pub fn get(&self, option: &str) -> Option<&SpecValue> {
        self.0.get(option)
    }

    /// Number of chosen options.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check whether no options have been chosen.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the choices in sorted option order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SpecValue)> {
        self.0.iter().map(|(option, value)| (option.as_str(), value))
    }

    /// Render the choices as a sorted `option=value` list.
    ///
    /// The rendering is canonical: equal maps always render identically,
    /// which makes it suitable for generated row ids.
    #[must_use]
    pub fn canonical(&self) -> String {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(option, value)| format!("{option}={value}"))
            .collect();

        parts.join(";")
    }
}

impl fmt::Display for Specifications {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical())
    }
}

impl<K: Into<String>, V: Into<SpecValue>> FromIterator<(K, V)> for Specifications {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(choices: I) -> Self {
        Specifications(
            choices
                .into_iter()
                .map(|(option, value)| (option.into(), value.into()))
                .collect(),
        )
    }
}

/// A candidate line item, as produced by a product configurator page.
///
/// Only the descriptive fields are required. A missing price, quantity, or
/// row id is defaulted by [`Cart::add`](crate::cart::Cart::add); the
/// stricter [`Cart::try_add`](crate::cart::Cart::try_add) rejects such
/// candidates instead.
#[derive(Debug, Clone)]
pub struct CandidateItem<'a> {
    /// Base product identifier, shared by all configurations of a product.
    pub product_id: String,

    /// Name shown on the cart page.
    pub display_name: String,

    /// Product category (letters, cards, bookmarks, crochet).
    pub category: String,

    /// Price per unit; defaulted to zero in the cart currency when absent.
    pub unit_price: Option<Money<'a, Currency>>,

    /// Units to add; defaulted to 1 when absent.
    pub quantity: Option<u32>,

    /// Customisation choices; empty when the product has none.
    pub specifications: Specifications,

    /// Row id; generated from the identity when absent.
    pub row_id: Option<String>,

    /// Opaque display payload (image reference, tags, rating, delivery
    /// estimate). Never inspected by the engine.
    pub metadata: serde_json::Value,
}

impl<'a> CandidateItem<'a> {
    /// Create a candidate with the required descriptive fields.
    #[must_use]
    pub fn new(
        product_id: impl Into<String>,
        display_name: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            display_name: display_name.into(),
            category: category.into(),
            unit_price: None,
            quantity: None,
            specifications: Specifications::new(),
            row_id: None,
            metadata: serde_json::Value::Null,
        }
    }

    /// Set the unit price.
    #[must_use]
    pub fn priced(mut self, unit_price: Money<'a, Currency>) -> Self {
        self.unit_price = Some(unit_price);
        self
    }

    /// Set the quantity.
    #[must_use]
    pub fn quantity(mut self, quantity: u32) -> Self {
        self.quantity = Some(quantity);
        self
    }

    /// Add one customisation choice.
    #[must_use]
    pub fn specification(mut self, option: impl Into<String>, value: impl Into<SpecValue>) -> Self {
        self.specifications.set(option, value);
        self
    }

    /// Replace the whole specification map.
    #[must_use]
    pub fn specifications(mut self, specifications: Specifications) -> Self {
        self.specifications = specifications;
        self
    }

    /// Set an explicit row id.
    #[must_use]
    pub fn row_id(mut self, row_id: impl Into<String>) -> Self {
        self.row_id = Some(row_id.into());
        self
    }

    /// Attach the opaque display payload.
    #[must_use]
    pub fn metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

/// One configured product entry in the cart.
#[derive(Debug, Clone)]
pub struct LineItem<'a> {
    row_id: String,
    product_id: String,
    display_name: String,
    category: String,
    unit_price: Money<'a, Currency>,
    quantity: u32,
    specifications: Specifications,
    added_at: Timestamp,
    metadata: serde_json::Value,
}

impl<'a> LineItem<'a> {
    /// Build a line item from a candidate, filling defaults.
    ///
    /// The caller has already established that any explicit price is in
    /// `currency`; a missing price becomes zero in that currency.
    pub(crate) fn from_candidate(
        candidate: CandidateItem<'a>,
        currency: &'static Currency,
    ) -> Self {
        let unit_price = candidate
            .unit_price
            .unwrap_or_else(|| Money::from_minor(0, currency));

        let row_id = candidate.row_id.unwrap_or_else(|| {
            if candidate.specifications.is_empty() {
                candidate.product_id.clone()
            } else {
                format!(
                    "{}#{}",
                    candidate.product_id,
                    candidate.specifications.canonical()
                )
            }
        });

        Self {
            row_id,
            product_id: candidate.product_id,
            display_name: candidate.display_name,
            category: candidate.category,
            unit_price,
            // Stored quantities are always at least 1; zero means "not in the cart".
            quantity: candidate.quantity.unwrap_or(1).max(1),
            specifications: candidate.specifications,
            added_at: Timestamp::now(),
            metadata: candidate.metadata,
        }
    }

    /// Check whether this row has the given identity.
    #[must_use]
    pub fn matches(&self, product_id: &str, specifications: &Specifications) -> bool {
        self.product_id == product_id && &self.specifications == specifications
    }

    /// Fold another purchase of the same configuration into this row.
    ///
    /// Price, metadata, and `added_at` keep their first-written values.
    pub(crate) fn merge_quantity(&mut self, extra: u32) {
        self.quantity = self.quantity.saturating_add(extra.max(1));
    }

    pub(crate) fn set_quantity(&mut self, quantity: u32) {
        self.quantity = quantity.max(1);
    }

    /// Row id, unique within the cart for display purposes.
    pub fn row_id(&self) -> &str {
        &self.row_id
    }

    /// Base product identifier.
    pub fn product_id(&self) -> &str {
        &self.product_id
    }

    /// Name shown on the cart page.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Product category.
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Price per unit, fixed when the row was created.
    pub fn unit_price(&self) -> &Money<'a, Currency> {
        &self.unit_price
    }

    /// Units of this configuration in the cart, always at least 1.
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Customisation choices for this row.
    pub fn specifications(&self) -> &Specifications {
        &self.specifications
    }

    /// When the row was first added; merges do not update it.
    pub fn added_at(&self) -> Timestamp {
        self.added_at
    }

    /// Opaque display payload.
    pub fn metadata(&self) -> &serde_json::Value {
        &self.metadata
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::INR;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn specifications_compare_equal_regardless_of_insertion_order() {
        let mut forwards = Specifications::new();
        forwards.set("design", "heart");
        forwards.set("size", 3i64);

        let mut backwards = Specifications::new();
        backwards.set("size", 3i64);
        backwards.set("design", "heart");

        assert_eq!(forwards, backwards);
        assert_eq!(forwards.canonical(), backwards.canonical());
    }

    #[test]
    fn canonical_renders_sorted_option_value_pairs() {
        let specs = Specifications::new()
            .with("size", 3i64)
            .with("design", "heart");

        assert_eq!(specs.canonical(), "design=heart;size=3");
    }

    #[test]
    fn canonical_of_empty_map_is_empty() {
        assert_eq!(Specifications::new().canonical(), "");
    }

    #[test]
    fn from_candidate_fills_defaults() {
        let candidate = CandidateItem::new("letter-a", "Letter A", "letters");
        let item = LineItem::from_candidate(candidate, INR);

        assert_eq!(item.quantity(), 1);
        assert_eq!(item.unit_price(), &Money::from_minor(0, INR));
        assert_eq!(item.row_id(), "letter-a");
        assert!(item.specifications().is_empty());
        assert_eq!(item.metadata(), &serde_json::Value::Null);
    }

    #[test]
    fn from_candidate_generates_row_id_from_identity() {
        let candidate = CandidateItem::new("card-1", "Birthday Card", "cards")
            .priced(Money::from_major(150, INR))
            .specification("colour", "red");

        let item = LineItem::from_candidate(candidate, INR);

        assert_eq!(item.row_id(), "card-1#colour=red");
    }

    #[test]
    fn from_candidate_keeps_explicit_row_id() {
        let candidate = CandidateItem::new("card-1", "Birthday Card", "cards").row_id("row-77");
        let item = LineItem::from_candidate(candidate, INR);

        assert_eq!(item.row_id(), "row-77");
    }

    #[test]
    fn matches_requires_product_and_specifications() {
        let specs = Specifications::new().with("colour", "red");

        let candidate = CandidateItem::new("card-1", "Birthday Card", "cards")
            .specifications(specs.clone())
            .priced(Money::from_major(150, INR));

        let item = LineItem::from_candidate(candidate, INR);

        assert!(item.matches("card-1", &specs));
        assert!(!item.matches("card-2", &specs));
        assert!(!item.matches("card-1", &Specifications::new()));
    }

    #[test]
    fn merge_quantity_saturates_and_keeps_price() {
        let candidate = CandidateItem::new("card-1", "Birthday Card", "cards")
            .priced(Money::from_major(150, INR))
            .quantity(2);

        let mut item = LineItem::from_candidate(candidate, INR);
        item.merge_quantity(3);

        assert_eq!(item.quantity(), 5);
        assert_eq!(item.unit_price(), &Money::from_major(150, INR));

        item.merge_quantity(u32::MAX);
        assert_eq!(item.quantity(), u32::MAX);
    }

    #[test]
    fn specifications_round_trip_through_yaml() -> TestResult {
        let specs = Specifications::new()
            .with("message", "with love")
            .with("length", 12i64);

        let yaml = serde_norway::to_string(&specs)?;
        let parsed: Specifications = serde_norway::from_str(&yaml)?;

        assert_eq!(parsed, specs);

        Ok(())
    }
}
