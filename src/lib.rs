//! Wicker
//!
//! Wicker is the cart and promotional pricing engine for a handmade-goods storefront: a line-item cart with configuration-aware merging, a promo-code catalog, and deterministic subtotal, discount, shipping and total calculations.

pub mod cart;
pub mod checkout;
pub mod discounts;
pub mod items;
pub mod prelude;
pub mod pricing;
pub mod promotions;
