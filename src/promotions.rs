//! Promotions
//!
//! The promo catalog maps case-insensitive codes to discount rules, each
//! gated behind a minimum order value. Resolution is the only fallible step
//! in the promo lifecycle: on failure the caller's cart and any previously
//! applied promo are left untouched.

use std::{fs, path::Path};

use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use rusty_money::{
    Money,
    iso::{self, Currency},
};
use serde::Deserialize;
use thiserror::Error;

/// The discount rule carried by a promo code.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum PromoDiscount<'a> {
    /// A fraction of the subtotal (`0.10` is 10% off).
    Percentage(Percentage),

    /// A flat amount off the subtotal.
    FixedAmount(Money<'a, Currency>),
}

/// One entry in the static promo catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct PromoCode<'a> {
    code: String,
    discount: PromoDiscount<'a>,
    min_order: Money<'a, Currency>,
    description: String,
}

impl<'a> PromoCode<'a> {
    /// Create a catalog entry; the code is normalized to uppercase.
    #[must_use]
    pub fn new(
        code: impl Into<String>,
        discount: PromoDiscount<'a>,
        min_order: Money<'a, Currency>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into().trim().to_uppercase(),
            discount,
            min_order,
            description: description.into(),
        }
    }

    /// The normalized (uppercase) code.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// The discount rule.
    pub fn discount(&self) -> &PromoDiscount<'a> {
        &self.discount
    }

    /// Smallest subtotal the code applies to.
    pub fn min_order(&self) -> &Money<'a, Currency> {
        &self.min_order
    }

    /// Human-readable label for the cart page.
    pub fn description(&self) -> &str {
        &self.description
    }
}

/// A promo that has been resolved against a cart subtotal.
///
/// At most one promo is active per session; applying another replaces it.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedPromo<'a> {
    promo: PromoCode<'a>,
    entered: String,
}

impl<'a> AppliedPromo<'a> {
    /// Pair a resolved catalog entry with the text the user typed.
    #[must_use]
    pub fn new(promo: PromoCode<'a>, entered: impl Into<String>) -> Self {
        Self {
            promo,
            entered: entered.into(),
        }
    }

    /// The resolved catalog entry.
    pub fn promo(&self) -> &PromoCode<'a> {
        &self.promo
    }

    /// The normalized code.
    pub fn code(&self) -> &str {
        self.promo.code()
    }

    /// The code text as the user entered it (whitespace trimmed).
    pub fn entered(&self) -> &str {
        &self.entered
    }
}

/// Why a promo code could not be applied.
#[derive(Debug, Error, PartialEq)]
pub enum PromoError<'a> {
    /// No catalog entry matches the entered code.
    #[error("unknown promo code \"{0}\"")]
    UnknownCode(String),

    /// The code matched, but the subtotal is below its minimum order value.
    #[error("orders must reach {required} before {code} applies")]
    BelowMinimumOrder {
        /// The normalized code that was gated.
        code: String,

        /// The minimum order value, for user messaging.
        required: Money<'a, Currency>,
    },

    /// The subtotal currency differs from the catalog currency.
    #[error("promo {code} is denominated in {promo}, but the cart uses {cart}")]
    CurrencyMismatch {
        /// The normalized code that was looked up.
        code: String,

        /// Catalog currency code.
        promo: &'static str,

        /// Cart currency code.
        cart: &'static str,
    },
}

/// Errors building a catalog, in code or from YAML.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// IO error reading a catalog file.
    #[error("Failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error.
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid price format; expected e.g. `"50.00 INR"`.
    #[error("Invalid price format: {0}")]
    InvalidPrice(String),

    /// Unknown ISO currency code.
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// Percentage outside the `(0, 1]` fraction range.
    #[error("Invalid percentage value: {0}")]
    InvalidPercentage(f64),

    /// Currency mismatch between catalog entries.
    #[error("Currency mismatch: expected {0}, found {1}")]
    CurrencyMismatch(String, String),

    /// Two entries normalize to the same code.
    #[error("Duplicate promo code: {0}")]
    DuplicateCode(String),
}

/// The static promo catalog for one storefront.
#[derive(Debug, Clone)]
pub struct PromoCatalog<'a> {
    codes: FxHashMap<String, PromoCode<'a>>,
    currency: &'static Currency,
}

impl<'a> PromoCatalog<'a> {
    /// Build a catalog from entries, validating currency consistency and
    /// duplicate codes.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if an entry is denominated in a different
    /// currency than the catalog or if two entries share a code.
    pub fn new(
        currency: &'static Currency,
        entries: impl IntoIterator<Item = PromoCode<'a>>,
    ) -> Result<Self, CatalogError> {
        let mut codes = FxHashMap::default();

        for entry in entries {
            ensure_catalog_currency(currency, &entry)?;

            let code = entry.code().to_string();

            if codes.insert(code.clone(), entry).is_some() {
                return Err(CatalogError::DuplicateCode(code));
            }
        }

        Ok(Self { codes, currency })
    }

    /// Look up an entry by code, case-insensitively.
    pub fn get(&self, code: &str) -> Option<&PromoCode<'a>> {
        self.codes.get(&code.trim().to_uppercase())
    }

    /// Number of catalog entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Check whether the catalog has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// The currency every entry is denominated in.
    #[must_use]
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Resolve an entered code against the current subtotal.
    ///
    /// # Errors
    ///
    /// - [`PromoError::UnknownCode`]: no entry matches the entered text.
    /// - [`PromoError::BelowMinimumOrder`]: the subtotal has not reached the
    ///   entry's minimum order value; carries that minimum.
    /// - [`PromoError::CurrencyMismatch`]: the subtotal currency differs
    ///   from the catalog currency.
    pub fn resolve(
        &self,
        entered: &str,
        subtotal: &Money<'_, Currency>,
    ) -> Result<AppliedPromo<'a>, PromoError<'a>> {
        let entered = entered.trim();
        let normalized = entered.to_uppercase();

        let Some(promo) = self.codes.get(&normalized) else {
            return Err(PromoError::UnknownCode(entered.to_string()));
        };

        if subtotal.currency() != self.currency {
            return Err(PromoError::CurrencyMismatch {
                code: normalized,
                promo: self.currency.iso_alpha_code,
                cart: subtotal.currency().iso_alpha_code,
            });
        }

        if subtotal.amount() < promo.min_order().amount() {
            return Err(PromoError::BelowMinimumOrder {
                code: normalized,
                required: *promo.min_order(),
            });
        }

        Ok(AppliedPromo::new(promo.clone(), entered))
    }
}

impl PromoCatalog<'static> {
    /// The storefront's five shipped codes, denominated in INR.
    #[must_use]
    pub fn standard() -> Self {
        let entries = [
            PromoCode::new(
                "FIRST10",
                PromoDiscount::Percentage(Percentage::from(0.10)),
                Money::from_major(200, iso::INR),
                "10% off your first order",
            ),
            PromoCode::new(
                "LOVE20",
                PromoDiscount::Percentage(Percentage::from(0.20)),
                Money::from_major(500, iso::INR),
                "20% off orders over \u{20b9}500",
            ),
            PromoCode::new(
                "SAVE50",
                PromoDiscount::FixedAmount(Money::from_major(50, iso::INR)),
                Money::from_major(300, iso::INR),
                "Flat \u{20b9}50 off orders over \u{20b9}300",
            ),
            PromoCode::new(
                "FESTIVE25",
                PromoDiscount::Percentage(Percentage::from(0.25)),
                Money::from_major(800, iso::INR),
                "25% festive discount on orders over \u{20b9}800",
            ),
            PromoCode::new(
                "CRAFT100",
                PromoDiscount::FixedAmount(Money::from_major(100, iso::INR)),
                Money::from_major(1000, iso::INR),
                "Flat \u{20b9}100 off orders over \u{20b9}1000",
            ),
        ];

        let mut codes = FxHashMap::default();

        for entry in entries {
            codes.insert(entry.code().to_string(), entry);
        }

        Self {
            codes,
            currency: iso::INR,
        }
    }

    /// Load a catalog from YAML.
    ///
    /// The format mirrors the storefront configuration files:
    ///
    /// ```yaml
    /// promos:
    ///   first10:
    ///     description: 10% off your first order
    ///     min_order: "200.00 INR"
    ///     discount:
    ///       type: percentage
    ///       value: 0.10
    ///   save50:
    ///     description: Flat 50 off
    ///     min_order: "300.00 INR"
    ///     discount:
    ///       type: fixed_amount
    ///       value: "50.00 INR"
    /// ```
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if the YAML cannot be parsed, a price or
    /// percentage is malformed, entries mix currencies, or two entries
    /// normalize to the same code.
    pub fn from_yaml(yaml: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_norway::from_str(yaml)?;

        let mut codes: FxHashMap<String, PromoCode<'static>> = FxHashMap::default();
        let mut currency: Option<&'static Currency> = None;

        for (code, entry) in file.promos {
            let min_order = parse_price(&entry.min_order)?;

            let discount = match entry.discount {
                DiscountEntry::Percentage { value } => {
                    if value <= 0.0 || value > 1.0 {
                        return Err(CatalogError::InvalidPercentage(value));
                    }

                    PromoDiscount::Percentage(Percentage::from(value))
                }
                DiscountEntry::FixedAmount { value } => {
                    PromoDiscount::FixedAmount(parse_price(&value)?)
                }
            };

            let promo = PromoCode::new(code, discount, min_order, entry.description);

            let catalog_currency = *currency.get_or_insert(min_order.currency());
            ensure_catalog_currency(catalog_currency, &promo)?;

            let normalized = promo.code().to_string();

            if codes.insert(normalized.clone(), promo).is_some() {
                return Err(CatalogError::DuplicateCode(normalized));
            }
        }

        Ok(Self {
            codes,
            currency: currency.unwrap_or(iso::INR),
        })
    }

    /// Load a catalog from a YAML file on disk.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if the file cannot be read or parsed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let contents = fs::read_to_string(path)?;

        Self::from_yaml(&contents)
    }
}

/// Wrapper for the catalog YAML document.
#[derive(Debug, Deserialize)]
struct CatalogFile {
    /// Map of code -> entry; codes are normalized to uppercase on load.
    promos: FxHashMap<String, PromoEntry>,
}

#[derive(Debug, Deserialize)]
struct PromoEntry {
    description: String,
    min_order: String,
    discount: DiscountEntry,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum DiscountEntry {
    /// Percentage discount as a fraction (e.g. `0.15` for 15%).
    Percentage {
        /// Fraction in `(0, 1]`.
        value: f64,
    },

    /// Flat amount off (e.g. `"50.00 INR"`).
    FixedAmount {
        /// Price string.
        value: String,
    },
}

fn ensure_catalog_currency(
    currency: &'static Currency,
    entry: &PromoCode<'_>,
) -> Result<(), CatalogError> {
    let mut currencies = vec![entry.min_order().currency()];

    if let PromoDiscount::FixedAmount(amount) = entry.discount() {
        currencies.push(amount.currency());
    }

    for found in currencies {
        if found != currency {
            return Err(CatalogError::CurrencyMismatch(
                currency.iso_alpha_code.to_string(),
                found.iso_alpha_code.to_string(),
            ));
        }
    }

    Ok(())
}

/// Parse a `"50.00 INR"` style price string.
fn parse_price(input: &str) -> Result<Money<'static, Currency>, CatalogError> {
    let mut parts = input.split_whitespace();

    let (Some(amount), Some(code), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(CatalogError::InvalidPrice(input.to_string()));
    };

    let amount = Decimal::from_str_exact(amount)
        .map_err(|err| CatalogError::InvalidPrice(format!("{input}: {err}")))?;

    let currency =
        iso::find(code).ok_or_else(|| CatalogError::UnknownCurrency(code.to_string()))?;

    Ok(Money::from_decimal(amount, currency))
}
