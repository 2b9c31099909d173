//! Wicker prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    cart::{Cart, CartError, ValidationError},
    checkout::{CartSession, CheckoutError},
    discounts::{DiscountError, discount_amount},
    items::{CandidateItem, LineItem, SpecValue, Specifications},
    pricing::{PricingConfig, PricingError, Quote, line_total, order_total, quote, shipping_cost, subtotal_of},
    promotions::{
        AppliedPromo, CatalogError, PromoCatalog, PromoCode, PromoDiscount, PromoError,
    },
};
