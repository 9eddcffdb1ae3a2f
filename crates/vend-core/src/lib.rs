//! Self-adjusting sale engine.
//!
//! Sells units of a sale asset for a purchase asset (a fungible token
//! balance or native currency), re-pricing every accounting period so that
//! long-run throughput tracks an operator-chosen target. The demand signal
//! is a windowed moving average of per-period sales; the price is derived
//! fresh from it each period, and idle gaps of any length roll forward in
//! constant time.
//!
//! Zero I/O — pure engine with no opinions about transport or persistence.

pub mod bridge;
pub mod config;
pub mod constants;
pub mod decimal;
pub mod engine;
pub mod error;
pub mod period;
pub mod price;
pub mod serde_compat;
pub mod settle;
pub mod time;

pub use bridge::{AssetBridge, Balances, MemoryBridge};
pub use config::{AssetKind, SaleConfig, SaleParams};
pub use constants::{MAX_DECIMALS, WINDOW_MAX, WINDOW_MIN};
pub use decimal::Scale;
pub use engine::{Purchase, SaleEngine};
pub use error::{ConfigError, InvariantError, PaymentError, Result, SaleError};
pub use period::{PeriodState, Rollover};
pub use price::unit_price;
pub use serde_compat::{CURRENT_VERSION, Snapshot, SnapshotError, export_json, import_json};
pub use settle::{Settlement, settle};
pub use time::now_unix_secs;
