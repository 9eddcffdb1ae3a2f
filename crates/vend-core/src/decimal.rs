//! Fixed-point normalization between asset precisions.
//!
//! The sale asset and the purchase asset each carry their own native
//! decimal precision. All engine arithmetic runs at a single internal
//! scale (the larger of the two), so quantities and prices multiply
//! without cross-scale bookkeeping. Scaling up is exact; scaling down and
//! every division truncate toward zero, losing at most one unit of native
//! precision per conversion and never rounding a refund against the buyer.

/// Conversion factors between sale-native, purchase-native, and internal
/// fixed-point units. Stateless; copied freely.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Scale {
    sale_decimals: u32,
    purchase_decimals: u32,
    internal_decimals: u32,
}

impl Scale {
    /// Callers validate both precisions against `MAX_DECIMALS` first.
    pub fn new(sale_decimals: u32, purchase_decimals: u32) -> Self {
        Self {
            sale_decimals,
            purchase_decimals,
            internal_decimals: sale_decimals.max(purchase_decimals),
        }
    }

    pub fn internal_decimals(&self) -> u32 {
        self.internal_decimals
    }

    /// Internal units per whole sale token.
    pub fn whole_token(&self) -> u128 {
        pow10(self.internal_decimals)
    }

    /// Sale-native quantity to internal units. Exact; `None` on overflow.
    pub fn sale_to_internal(&self, amount: u128) -> Option<u128> {
        amount.checked_mul(pow10(self.internal_decimals - self.sale_decimals))
    }

    /// Internal units to sale-native quantity, truncating.
    pub fn internal_to_sale(&self, amount: u128) -> u128 {
        amount / pow10(self.internal_decimals - self.sale_decimals)
    }

    /// Purchase-native amount to internal units. Exact; `None` on overflow.
    pub fn purchase_to_internal(&self, amount: u128) -> Option<u128> {
        amount.checked_mul(pow10(self.internal_decimals - self.purchase_decimals))
    }

    /// Internal units to purchase-native amount, truncating.
    pub fn internal_to_purchase(&self, amount: u128) -> u128 {
        amount / pow10(self.internal_decimals - self.purchase_decimals)
    }

    /// `floor(quantity * price / whole_token)`: cost in internal purchase
    /// units for `quantity` internal sale units at `price` internal
    /// purchase units per whole token. `None` on overflow.
    pub fn cost(&self, quantity: u128, price: u128) -> Option<u128> {
        quantity.checked_mul(price).map(|raw| raw / self.whole_token())
    }
}

fn pow10(exp: u32) -> u128 {
    // exp <= MAX_DECIMALS, enforced by config validation
    10u128.pow(exp)
}
