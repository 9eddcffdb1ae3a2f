//! JSON wire format for engine snapshots.
//!
//! A snapshot carries the full replay surface: the operator parameters and
//! the period accounting state. Amounts travel as decimal strings, since
//! JSON integers cannot represent u128 faithfully.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::{SaleConfig, SaleParams};
use crate::engine::SaleEngine;
use crate::error::ConfigError;
use crate::period::PeriodState;

pub const CURRENT_VERSION: &str = "1";

/// Decimal-string codec for u128 amounts, used via `#[serde(with)]`.
pub mod u128_string {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse()
            .map_err(|_| D::Error::custom(format!("invalid amount {raw:?}")))
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct Snapshot {
    pub version: String,
    /// Unix seconds at export time; informational only.
    pub exported_at: u64,
    pub params: SaleParams,
    pub state: PeriodState,
}

#[derive(Debug)]
pub enum SnapshotError {
    Json(serde_json::Error),
    Config(ConfigError),
    Invalid(String),
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotError::Json(e) => write!(f, "snapshot JSON error: {e}"),
            SnapshotError::Config(e) => write!(f, "snapshot configuration error: {e}"),
            SnapshotError::Invalid(msg) => write!(f, "invalid snapshot: {msg}"),
        }
    }
}

impl std::error::Error for SnapshotError {}

impl From<serde_json::Error> for SnapshotError {
    fn from(e: serde_json::Error) -> Self {
        SnapshotError::Json(e)
    }
}

impl From<ConfigError> for SnapshotError {
    fn from(e: ConfigError) -> Self {
        SnapshotError::Config(e)
    }
}

/// Serialize an engine snapshot to pretty JSON.
pub fn export_json(engine: &SaleEngine, exported_at: u64) -> Result<String, serde_json::Error> {
    let snapshot = Snapshot {
        version: CURRENT_VERSION.to_string(),
        exported_at,
        params: engine.config().params().clone(),
        state: engine.state().clone(),
    };
    serde_json::to_string_pretty(&snapshot)
}

/// Parse a JSON snapshot back into an engine. Parameters are re-validated
/// and the state is checked against them.
pub fn import_json(json: &str) -> Result<SaleEngine, SnapshotError> {
    let snapshot: Snapshot = serde_json::from_str(json)?;
    if snapshot.version != CURRENT_VERSION {
        return Err(SnapshotError::Invalid(format!(
            "unsupported snapshot version {:?}",
            snapshot.version
        )));
    }

    let config = SaleConfig::new(snapshot.params)?;
    if snapshot.state.sold_this_period > config.max_scaled() {
        return Err(SnapshotError::Invalid(format!(
            "sold this period {} exceeds the period cap {}",
            snapshot.state.sold_this_period,
            config.max_scaled()
        )));
    }

    Ok(SaleEngine::from_parts(config, snapshot.state))
}
