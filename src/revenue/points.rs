//! Points estimation from USD balance and USD trading volume.
//!
//! `total = balance_points + volume_points` where
//!
//! - `balance_points` is a step function over configured balance tiers
//! - `volume_points = floor(log2(max(1, volume x multiplier)))`, with a
//!   multiplier that depends on where and when the volume was traded

use bigdecimal::num_bigint::Sign;
use bigdecimal::{BigDecimal, Zero};
use serde::{Deserialize, Serialize};

/// Where a trade falls relative to its token's promotion window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromotionWindow {
    /// Inside the window, on the promotion's primary network
    PrimaryChain,
    /// Inside the window, on any other network
    OtherChain,
    /// Outside the window
    Outside,
}

/// A balance threshold and the points it earns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceTier {
    /// Smallest USD balance that reaches the tier
    pub min_usd: BigDecimal,
    /// Points earned at this tier
    pub points: u32,
}

impl BalanceTier {
    /// Creates a tier.
    pub fn new(min_usd: impl Into<BigDecimal>, points: u32) -> Self {
        Self {
            min_usd: min_usd.into(),
            points,
        }
    }
}

/// Points rules.
///
/// # Examples
///
/// ```rust
/// use alphascan::{BalanceTier, PointsConfig, PromotionWindow};
/// use bigdecimal::BigDecimal;
///
/// let config = PointsConfig::default().with_tiers(vec![BalanceTier::new(100, 1)]);
/// let estimate = config.estimate(
///     &BigDecimal::from(150),
///     &BigDecimal::from(1_000),
///     PromotionWindow::PrimaryChain,
/// );
/// // 1_000 x 4 = 4_000 -> floor(log2(4_000)) = 11
/// assert_eq!(estimate.volume_points, 11);
/// assert_eq!(estimate.total, 12);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsConfig {
    /// Balance tiers, in any order
    #[serde(default = "default_tiers")]
    pub tiers: Vec<BalanceTier>,
    /// Volume multiplier inside the window on the primary network
    #[serde(default = "default_primary_multiplier")]
    pub primary_multiplier: u32,
    /// Volume multiplier inside the window on other networks
    #[serde(default = "default_other_chain_multiplier")]
    pub other_chain_multiplier: u32,
    /// Volume multiplier outside the window
    #[serde(default = "default_outside_multiplier")]
    pub outside_multiplier: u32,
}

fn default_tiers() -> Vec<BalanceTier> {
    vec![
        BalanceTier::new(100, 1),
        BalanceTier::new(1_000, 2),
        BalanceTier::new(10_000, 3),
        BalanceTier::new(100_000, 4),
    ]
}

fn default_primary_multiplier() -> u32 {
    4
}

fn default_other_chain_multiplier() -> u32 {
    2
}

fn default_outside_multiplier() -> u32 {
    1
}

impl Default for PointsConfig {
    fn default() -> Self {
        Self {
            tiers: default_tiers(),
            primary_multiplier: default_primary_multiplier(),
            other_chain_multiplier: default_other_chain_multiplier(),
            outside_multiplier: default_outside_multiplier(),
        }
    }
}

/// Points breakdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsEstimate {
    /// Points from the USD balance
    pub balance_points: u32,
    /// Points from the effective USD volume
    pub volume_points: u32,
    /// `balance_points + volume_points`
    pub total: u32,
}

impl PointsConfig {
    /// Replaces the balance tiers.
    pub fn with_tiers(mut self, tiers: Vec<BalanceTier>) -> Self {
        self.tiers = tiers;
        self
    }

    /// Volume multiplier for `window`.
    pub fn multiplier(&self, window: PromotionWindow) -> u32 {
        match window {
            PromotionWindow::PrimaryChain => self.primary_multiplier,
            PromotionWindow::OtherChain => self.other_chain_multiplier,
            PromotionWindow::Outside => self.outside_multiplier,
        }
    }

    /// Points of the highest tier reached by `usd_balance`, or 0.
    pub fn balance_points(&self, usd_balance: &BigDecimal) -> u32 {
        self.tiers
            .iter()
            .filter(|tier| *usd_balance >= tier.min_usd)
            .max_by(|a, b| a.min_usd.cmp(&b.min_usd))
            .map_or(0, |tier| tier.points)
    }

    /// Estimates points for volume traded in a single window.
    pub fn estimate(
        &self,
        usd_balance: &BigDecimal,
        usd_volume: &BigDecimal,
        window: PromotionWindow,
    ) -> PointsEstimate {
        self.estimate_weighted(usd_balance, [(usd_volume.clone(), window)])
    }

    /// Estimates points for volume spread over several windows.
    ///
    /// Effective volumes are summed before the logarithm is taken.
    pub fn estimate_weighted(
        &self,
        usd_balance: &BigDecimal,
        volumes: impl IntoIterator<Item = (BigDecimal, PromotionWindow)>,
    ) -> PointsEstimate {
        let effective = volumes
            .into_iter()
            .fold(BigDecimal::zero(), |acc, (volume, window)| {
                acc + volume * BigDecimal::from(self.multiplier(window))
            });

        let balance_points = self.balance_points(usd_balance);
        let volume_points = volume_points(&effective);
        PointsEstimate {
            balance_points,
            volume_points,
            total: balance_points + volume_points,
        }
    }
}

/// `floor(log2(max(1, volume)))`, computed exactly.
///
/// For `v >= 1`, `floor(log2(v)) == floor(log2(floor(v)))`, so only the
/// integer part matters, and for a positive integer `n` the result is its bit
/// length minus one.
pub fn volume_points(volume: &BigDecimal) -> u32 {
    let (whole, _) = volume.with_scale(0).into_bigint_and_exponent();
    if whole.sign() != Sign::Plus {
        return 0;
    }
    u32::try_from(whole.bits().saturating_sub(1)).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    #[test]
    fn test_volume_points() {
        assert_eq!(volume_points(&dec("0")), 0);
        assert_eq!(volume_points(&dec("0.99")), 0);
        assert_eq!(volume_points(&dec("1")), 0);
        assert_eq!(volume_points(&dec("1.99")), 0);
        assert_eq!(volume_points(&dec("2")), 1);
        assert_eq!(volume_points(&dec("1023.999")), 9);
        assert_eq!(volume_points(&dec("1024")), 10);
        assert_eq!(volume_points(&dec("-50")), 0);
    }

    #[test]
    fn test_balance_tiers_pick_highest_reached() {
        let config = PointsConfig::default();
        assert_eq!(config.balance_points(&dec("99.99")), 0);
        assert_eq!(config.balance_points(&dec("100")), 1);
        assert_eq!(config.balance_points(&dec("9999")), 2);
        assert_eq!(config.balance_points(&dec("250000")), 4);

        let unordered = PointsConfig::default()
            .with_tiers(vec![BalanceTier::new(1_000, 5), BalanceTier::new(10, 1)]);
        assert_eq!(unordered.balance_points(&dec("5000")), 5);
        assert_eq!(unordered.balance_points(&dec("50")), 1);
    }

    #[test]
    fn test_multipliers() {
        let config = PointsConfig::default();
        let volume = dec("256");
        let balance = BigDecimal::zero();

        assert_eq!(config.estimate(&balance, &volume, PromotionWindow::Outside).volume_points, 8);
        assert_eq!(config.estimate(&balance, &volume, PromotionWindow::OtherChain).volume_points, 9);
        assert_eq!(config.estimate(&balance, &volume, PromotionWindow::PrimaryChain).volume_points, 10);
    }

    #[test]
    fn test_weighted_volumes_sum_before_log() {
        let config = PointsConfig::default();
        // 64 x 4 + 256 x 1 = 512 -> 9 points, not 8 + 8
        let estimate = config.estimate_weighted(
            &dec("1000"),
            [
                (dec("64"), PromotionWindow::PrimaryChain),
                (dec("256"), PromotionWindow::Outside),
            ],
        );
        assert_eq!(estimate.volume_points, 9);
        assert_eq!(estimate.balance_points, 2);
        assert_eq!(estimate.total, 11);
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: PointsConfig = serde_json::from_str(r#"{"primary_multiplier": 8}"#).unwrap();
        assert_eq!(config.primary_multiplier, 8);
        assert_eq!(config.outside_multiplier, 1);
        assert_eq!(config.tiers.len(), 4);
    }
}
