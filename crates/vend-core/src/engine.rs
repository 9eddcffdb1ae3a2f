//! Purchase orchestration over the period accountant, price function,
//! normalizer, and settlement.

use uuid::Uuid;

use crate::bridge::AssetBridge;
use crate::config::SaleConfig;
use crate::error::{InvariantError, Result};
use crate::period::{PeriodState, Rollover};
use crate::price::unit_price;
use crate::settle::settle;

/// Receipt for one successful purchase, native units.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Purchase {
    pub buyer: Uuid,
    /// Period the fill landed in, after rollover.
    pub period_index: u64,
    /// Sale asset delivered.
    pub quantity: u128,
    /// Purchase asset per whole sale token at fill time.
    pub unit_price: u128,
    /// Purchase asset collected.
    pub cost: u128,
    /// Native currency returned to the buyer (zero for token purchases).
    pub refund: u128,
}

/// The sale engine: one sale asset, one purchase asset, one period clock.
///
/// Every entry point first rolls the period clock forward to `now`. Reads
/// roll virtually and never store the result; mutations commit it. All
/// external transfers happen before anything is committed, so a failed
/// call leaves no trace. The exclusive borrow on mutating entry points is
/// the reentrancy guard: a collaborator cannot call back into the engine
/// that is driving it.
#[derive(Clone, Debug, PartialEq)]
pub struct SaleEngine {
    config: SaleConfig,
    state: PeriodState,
}

impl SaleEngine {
    /// One-time setup. Period 0 starts at `now` with the demand signal at
    /// the target, pricing the first period at the starting price.
    pub fn initialise(config: SaleConfig, now: u64) -> Self {
        let state = PeriodState::genesis(&config, now);
        Self { config, state }
    }

    /// Rehydrate from persisted parts.
    pub fn from_parts(config: SaleConfig, state: PeriodState) -> Self {
        Self { config, state }
    }

    pub fn config(&self) -> &SaleConfig {
        &self.config
    }

    pub fn state(&self) -> &PeriodState {
        &self.state
    }

    pub fn period_secs(&self) -> u64 {
        self.config.period_secs()
    }

    pub fn window(&self) -> u32 {
        self.config.window()
    }

    /// Sale-asset native units.
    pub fn target_per_period(&self) -> u128 {
        self.config.target_per_period()
    }

    /// Sale-asset native units.
    pub fn max_per_period(&self) -> u128 {
        self.config.max_per_period()
    }

    /// Materialize the rollover to `now` with no purchase. Returns the
    /// number of periods applied.
    pub fn update_period(&mut self, now: u64) -> Result<u64> {
        Ok(self.state.roll_forward(&self.config, now)?)
    }

    /// Current unit price, purchase native units per whole sale token.
    /// Rolls forward virtually; never mutates.
    pub fn current_price(&self, now: u64) -> Result<u128> {
        let rollover = self.state.rolled_forward(&self.config, now)?;
        let price = self.price_scaled(&rollover.state)?;
        Ok(self.config.scale().internal_to_purchase(price))
    }

    /// Quantity still sellable this period, sale native units. Rolls
    /// forward virtually; never mutates.
    pub fn num_available(&self, now: u64) -> Result<u128> {
        let rollover = self.state.rolled_forward(&self.config, now)?;
        let available = self.available_scaled(&rollover.state)?;
        Ok(self.config.scale().internal_to_sale(available))
    }

    /// Buy up to `requested` units (sale native). Asking beyond current
    /// availability partial-fills silently; size never fails a purchase.
    /// `payment_provided` is the native currency attached to the call,
    /// ignored for token purchases.
    pub fn buy_tokens(
        &mut self,
        bridge: &mut dyn AssetBridge,
        buyer: Uuid,
        requested: u128,
        payment_provided: u128,
        now: u64,
    ) -> Result<Purchase> {
        let scale = self.config.scale();
        let Rollover { mut state, .. } = self.state.rolled_forward(&self.config, now)?;

        let available = self.available_scaled(&state)?;
        let quantity_native = requested.min(scale.internal_to_sale(available));
        let quantity = scale
            .sale_to_internal(quantity_native)
            .ok_or(InvariantError::Overflow("fill quantity"))?;

        let price = self.price_scaled(&state)?;
        let cost_internal = scale
            .cost(quantity, price)
            .ok_or(InvariantError::Overflow("cost"))?;
        let cost = scale.internal_to_purchase(cost_internal);

        let settlement = settle(
            bridge,
            buyer,
            self.config.purchase_asset(),
            cost,
            payment_provided,
        )?;
        bridge.issue_sale_asset(buyer, quantity_native)?;

        // Every external call succeeded; commit the rolled state and the
        // sale in one step.
        state.sold_this_period += quantity;
        let period_index = state.period_index;
        self.state = state;

        Ok(Purchase {
            buyer,
            period_index,
            quantity: quantity_native,
            unit_price: scale.internal_to_purchase(price),
            cost: settlement.collected,
            refund: settlement.refund,
        })
    }

    fn price_scaled(&self, state: &PeriodState) -> Result<u128> {
        Ok(unit_price(
            state.ema,
            self.config.target_scaled(),
            self.config.starting_price_scaled(),
        )
        .ok_or(InvariantError::Overflow("unit price"))?)
    }

    fn available_scaled(&self, state: &PeriodState) -> Result<u128> {
        Ok(self
            .config
            .max_scaled()
            .checked_sub(state.sold_this_period)
            .ok_or(InvariantError::Overflow("availability"))?)
    }
}
