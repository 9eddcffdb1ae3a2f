//! Sale configuration: operator parameters, validated exactly once.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{MAX_DECIMALS, WINDOW_MAX, WINDOW_MIN};
use crate::decimal::Scale;
use crate::error::ConfigError;
use crate::serde_compat::u128_string;

/// The asset buyers pay with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    /// The environment's native currency, attached to the call itself.
    Native,
    /// A fungible token balance, moved through the purchase collaborator.
    Token(Uuid),
}

impl AssetKind {
    pub fn is_native(&self) -> bool {
        matches!(self, AssetKind::Native)
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetKind::Native => write!(f, "native"),
            AssetKind::Token(id) => write!(f, "token:{id}"),
        }
    }
}

impl std::str::FromStr for AssetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "native" {
            return Ok(AssetKind::Native);
        }
        match s.strip_prefix("token:") {
            Some(id) => id
                .parse()
                .map(AssetKind::Token)
                .map_err(|_| format!("invalid token id {id:?}")),
            None => Err(format!("unknown asset kind {s:?}")),
        }
    }
}

/// Operator parameters as written in config files and snapshots.
///
/// Amounts are smallest native units. They serialize as decimal strings:
/// JSON and TOML integers top out at 64 bits.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleParams {
    pub purchase_asset: AssetKind,
    /// Accounting period length, seconds.
    pub period_secs: u64,
    /// Demand window, periods.
    pub window: u32,
    /// Throughput the price steers toward, sale-asset units per period.
    #[serde(with = "u128_string")]
    pub target_per_period: u128,
    /// Hard cap on sales per period, sale-asset units.
    #[serde(with = "u128_string")]
    pub max_per_period: u128,
    /// Price at target demand, purchase-asset units per whole sale token.
    #[serde(with = "u128_string")]
    pub starting_price: u128,
    pub sale_decimals: u32,
    pub purchase_decimals: u32,
}

/// Validated configuration with amounts pre-scaled to internal units.
///
/// Built once at initialisation and immutable for the engine's lifetime;
/// every component borrows it, none copies it. Deliberately not
/// serializable: persistence stores the raw [`SaleParams`] and revalidates
/// on the way back in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SaleConfig {
    params: SaleParams,
    scale: Scale,
    target: u128,
    max: u128,
    starting_price: u128,
}

impl SaleConfig {
    pub fn new(params: SaleParams) -> Result<Self, ConfigError> {
        if params.period_secs == 0 {
            return Err(ConfigError::ZeroPeriod);
        }
        if !(WINDOW_MIN..=WINDOW_MAX).contains(&params.window) {
            return Err(ConfigError::WindowOutOfRange(params.window));
        }
        if params.target_per_period == 0 {
            return Err(ConfigError::ZeroTarget);
        }
        if params.max_per_period < params.target_per_period {
            return Err(ConfigError::MaxBelowTarget {
                max: params.max_per_period,
                target: params.target_per_period,
            });
        }
        if params.sale_decimals > MAX_DECIMALS {
            return Err(ConfigError::DecimalsOutOfRange(params.sale_decimals));
        }
        if params.purchase_decimals > MAX_DECIMALS {
            return Err(ConfigError::DecimalsOutOfRange(params.purchase_decimals));
        }

        let scale = Scale::new(params.sale_decimals, params.purchase_decimals);
        let target = scale
            .sale_to_internal(params.target_per_period)
            .ok_or(ConfigError::AmountOutOfRange("target_per_period"))?;
        let max = scale
            .sale_to_internal(params.max_per_period)
            .ok_or(ConfigError::AmountOutOfRange("max_per_period"))?;
        let starting_price = scale
            .purchase_to_internal(params.starting_price)
            .ok_or(ConfigError::AmountOutOfRange("starting_price"))?;

        Ok(Self {
            params,
            scale,
            target,
            max,
            starting_price,
        })
    }

    pub fn params(&self) -> &SaleParams {
        &self.params
    }

    pub fn purchase_asset(&self) -> AssetKind {
        self.params.purchase_asset
    }

    pub fn period_secs(&self) -> u64 {
        self.params.period_secs
    }

    pub fn window(&self) -> u32 {
        self.params.window
    }

    /// Sale-asset native units.
    pub fn target_per_period(&self) -> u128 {
        self.params.target_per_period
    }

    /// Sale-asset native units.
    pub fn max_per_period(&self) -> u128 {
        self.params.max_per_period
    }

    /// Purchase-asset native units per whole sale token.
    pub fn starting_price(&self) -> u128 {
        self.params.starting_price
    }

    pub fn scale(&self) -> Scale {
        self.scale
    }

    /// Target per period, internal units.
    pub fn target_scaled(&self) -> u128 {
        self.target
    }

    /// Max per period, internal units.
    pub fn max_scaled(&self) -> u128 {
        self.max
    }

    /// Starting price, internal units per whole sale token.
    pub fn starting_price_scaled(&self) -> u128 {
        self.starting_price
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> SaleParams {
        SaleParams {
            purchase_asset: AssetKind::Native,
            period_secs: 3600,
            window: 10,
            target_per_period: 100,
            max_per_period: 200,
            starting_price: 10,
            sale_decimals: 0,
            purchase_decimals: 1,
        }
    }

    #[test]
    fn test_valid_config() {
        let config = SaleConfig::new(params()).unwrap();
        assert_eq!(config.window(), 10);
        assert_eq!(config.target_per_period(), 100);
        // internal scale is the purchase side's 1 decimal
        assert_eq!(config.target_scaled(), 1000);
        assert_eq!(config.max_scaled(), 2000);
        assert_eq!(config.starting_price_scaled(), 10);
    }

    #[test]
    fn test_zero_period_rejected() {
        let mut p = params();
        p.period_secs = 0;
        assert_eq!(SaleConfig::new(p), Err(ConfigError::ZeroPeriod));
    }

    #[test]
    fn test_window_bounds() {
        let mut p = params();
        p.window = 0;
        assert_eq!(SaleConfig::new(p.clone()), Err(ConfigError::WindowOutOfRange(0)));
        p.window = 257;
        assert_eq!(SaleConfig::new(p.clone()), Err(ConfigError::WindowOutOfRange(257)));
        p.window = 256;
        assert!(SaleConfig::new(p).is_ok());
    }

    #[test]
    fn test_zero_target_rejected() {
        let mut p = params();
        p.target_per_period = 0;
        p.max_per_period = 0;
        assert_eq!(SaleConfig::new(p), Err(ConfigError::ZeroTarget));
    }

    #[test]
    fn test_max_below_target_rejected() {
        let mut p = params();
        p.max_per_period = 99;
        assert_eq!(
            SaleConfig::new(p),
            Err(ConfigError::MaxBelowTarget { max: 99, target: 100 })
        );
    }

    #[test]
    fn test_max_equal_target_allowed() {
        let mut p = params();
        p.max_per_period = 100;
        assert!(SaleConfig::new(p).is_ok());
    }

    #[test]
    fn test_zero_starting_price_allowed() {
        let mut p = params();
        p.starting_price = 0;
        assert!(SaleConfig::new(p).is_ok());
    }

    #[test]
    fn test_decimals_cap() {
        let mut p = params();
        p.sale_decimals = 19;
        assert_eq!(SaleConfig::new(p), Err(ConfigError::DecimalsOutOfRange(19)));
    }

    #[test]
    fn test_amount_out_of_range() {
        let mut p = params();
        p.sale_decimals = 0;
        p.purchase_decimals = 18;
        p.target_per_period = u128::MAX;
        p.max_per_period = u128::MAX;
        assert_eq!(
            SaleConfig::new(p),
            Err(ConfigError::AmountOutOfRange("target_per_period"))
        );
    }

    #[test]
    fn test_params_toml_roundtrip_via_json() {
        // the string codec keeps u128 amounts exact through serde
        let p = params();
        let json = serde_json::to_string(&p).unwrap();
        assert!(json.contains("\"100\""), "amounts serialize as strings: {json}");
        let back: SaleParams = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn test_asset_kind_display_parse_roundtrip() {
        assert_eq!(AssetKind::Native.to_string(), "native");
        assert_eq!("native".parse::<AssetKind>(), Ok(AssetKind::Native));

        let id = Uuid::nil();
        let token = AssetKind::Token(id);
        assert_eq!(token.to_string(), format!("token:{id}"));
        assert_eq!(token.to_string().parse::<AssetKind>(), Ok(token));

        assert!("shells".parse::<AssetKind>().is_err());
        assert!("token:not-a-uuid".parse::<AssetKind>().is_err());
    }
}
