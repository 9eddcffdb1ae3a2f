//! Period accounting: the demand clock and its constant-time rollover.
//!
//! The demand signal is a windowed moving average of per-period sales.
//! Closing a period folds its recorded sales into the signal; every fully
//! idle period after that subtracts a fixed step. Because the step is
//! fixed and the signal floors at zero, a gap of any length collapses to
//! one division: rolling forward a million idle periods costs the same
//! as rolling forward one.

use serde::{Deserialize, Serialize};

use crate::config::SaleConfig;
use crate::error::InvariantError;
use crate::serde_compat::u128_string;

/// Mutable accounting state for the current period. Amounts are internal
/// fixed-point units; the single shared mutable record of the engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodState {
    pub period_index: u64,
    /// Unix seconds at which the current period began.
    pub period_start: u64,
    /// Demand signal: windowed moving average of per-period sales.
    #[serde(with = "u128_string")]
    pub ema: u128,
    #[serde(with = "u128_string")]
    pub sold_this_period: u128,
}

/// A state rolled forward to some point in time, not yet committed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rollover {
    pub state: PeriodState,
    pub periods_elapsed: u64,
}

impl PeriodState {
    /// Period 0 starting at `now`, demand pinned to the target so the
    /// first period prices at the starting price.
    pub fn genesis(config: &SaleConfig, now: u64) -> Self {
        Self {
            period_index: 0,
            period_start: now,
            ema: config.target_scaled(),
            sold_this_period: 0,
        }
    }

    /// Roll forward to `now` without touching `self`.
    ///
    /// Read paths and mutating paths share this one implementation, so a
    /// virtual read and a materializing update cannot diverge. A `now`
    /// before the period start (clock regression) is a no-op.
    pub fn rolled_forward(
        &self,
        config: &SaleConfig,
        now: u64,
    ) -> Result<Rollover, InvariantError> {
        let elapsed = now.saturating_sub(self.period_start) / config.period_secs();
        if elapsed == 0 {
            return Ok(Rollover {
                state: self.clone(),
                periods_elapsed: 0,
            });
        }

        let window = u128::from(config.window());
        let target = config.target_scaled();

        // The period that just ended contributes its recorded sales.
        let mut ema = close_out(self.ema, self.sold_this_period, target, window)?;

        // Every further elapsed period had zero sales. The decay step is
        // fixed, so the whole run is one division: after ema.div_ceil(step)
        // idle periods the signal is zero and stays there. A zero step
        // (scaled target below the window) decays nothing, exactly like
        // the per-period recurrence.
        let idle = u128::from(elapsed - 1);
        let step = target / window;
        if idle > 0 && step > 0 {
            if idle >= ema.div_ceil(step) {
                ema = 0;
            } else {
                ema -= idle * step;
            }
        }

        let period_index = self
            .period_index
            .checked_add(elapsed)
            .ok_or(InvariantError::Overflow("period index"))?;

        Ok(Rollover {
            state: PeriodState {
                period_index,
                // advance by whole periods only, preserving the sub-period
                // remainder rather than snapping to `now`
                period_start: self.period_start + elapsed * config.period_secs(),
                ema,
                sold_this_period: 0,
            },
            periods_elapsed: elapsed,
        })
    }

    /// Roll forward in place. Returns the number of periods applied.
    pub fn roll_forward(
        &mut self,
        config: &SaleConfig,
        now: u64,
    ) -> Result<u64, InvariantError> {
        let rollover = self.rolled_forward(config, now)?;
        *self = rollover.state;
        Ok(rollover.periods_elapsed)
    }
}

/// One closed period's contribution to the demand signal:
/// `ema + (sold - target) / window`, truncated toward zero, floored at 0.
fn close_out(ema: u128, sold: u128, target: u128, window: u128) -> Result<u128, InvariantError> {
    let ema = i128::try_from(ema).map_err(|_| InvariantError::Overflow("demand signal"))?;
    let sold = i128::try_from(sold).map_err(|_| InvariantError::Overflow("sold this period"))?;
    let target = i128::try_from(target).map_err(|_| InvariantError::Overflow("target"))?;

    let delta = (sold - target) / (window as i128);
    let adjusted = ema
        .checked_add(delta)
        .ok_or(InvariantError::Overflow("demand signal"))?;
    Ok(adjusted.max(0) as u128)
}
