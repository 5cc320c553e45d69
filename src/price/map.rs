use std::collections::BTreeMap;

use bigdecimal::{BigDecimal, One, Zero};
use serde::{Deserialize, Serialize};

/// Symbol -> USD price.
///
/// A symbol is priced at most once: [`PriceMap::insert_first`] never replaces
/// an existing price. Symbols are stored upper-cased, and symbols without a
/// price read as zero through [`PriceMap::price_or_zero`].
///
/// # Examples
///
/// ```rust
/// use alphascan::PriceMap;
/// use bigdecimal::BigDecimal;
///
/// let mut prices = PriceMap::with_stablecoins(["usdt"]);
/// assert_eq!(prices.price_or_zero("USDT"), BigDecimal::from(1));
///
/// assert!(prices.insert_first("TOKEN", BigDecimal::from(2)));
/// assert!(!prices.insert_first("TOKEN", BigDecimal::from(3)));
/// assert_eq!(prices.price_or_zero("TOKEN"), BigDecimal::from(2));
/// assert_eq!(prices.price_or_zero("UNKNOWN"), BigDecimal::from(0));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceMap {
    prices: BTreeMap<String, BigDecimal>,
}

fn normalize(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

impl PriceMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a map with every symbol in `stablecoins` priced at 1.
    pub fn with_stablecoins<I, S>(stablecoins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut map = Self::new();
        for symbol in stablecoins {
            map.insert_first(symbol.as_ref(), BigDecimal::one());
        }
        map
    }

    /// Prices `symbol` unless it already has a price.
    ///
    /// Returns `true` if the price was recorded. Non-positive prices are never
    /// recorded, so a priced symbol can always be divided by.
    pub fn insert_first(&mut self, symbol: &str, price: BigDecimal) -> bool {
        if price <= BigDecimal::zero() {
            return false;
        }
        let symbol = normalize(symbol);
        if self.prices.contains_key(&symbol) {
            return false;
        }
        self.prices.insert(symbol, price);
        true
    }

    /// Price of `symbol`, if known.
    pub fn get(&self, symbol: &str) -> Option<&BigDecimal> {
        self.prices.get(&normalize(symbol))
    }

    /// Price of `symbol`, or zero if unknown.
    pub fn price_or_zero(&self, symbol: &str) -> BigDecimal {
        self.get(symbol).cloned().unwrap_or_else(BigDecimal::zero)
    }

    /// Whether `symbol` has a price.
    pub fn contains(&self, symbol: &str) -> bool {
        self.prices.contains_key(&normalize(symbol))
    }

    /// Number of priced symbols.
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    /// Whether no symbol is priced.
    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// Priced symbols in alphabetical order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BigDecimal)> {
        self.prices.iter().map(|(symbol, price)| (symbol.as_str(), price))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_positive_prices_are_ignored() {
        let mut prices = PriceMap::new();
        assert!(!prices.insert_first("TOKEN", BigDecimal::zero()));
        assert!(!prices.insert_first("TOKEN", BigDecimal::from(-1)));
        assert!(!prices.contains("TOKEN"));
        assert!(prices.insert_first("token", BigDecimal::from(5)));
        assert_eq!(prices.get("Token"), Some(&BigDecimal::from(5)));
    }

    #[test]
    fn test_serializes_as_plain_object() {
        let prices = PriceMap::with_stablecoins(["USDT"]);
        let json = serde_json::to_value(&prices).unwrap();
        assert!(json.get("USDT").is_some());
    }
}
