//! Payment settlement: collect the cost, refund the surplus.

use uuid::Uuid;

use crate::bridge::AssetBridge;
use crate::config::AssetKind;
use crate::error::PaymentError;

/// Outcome of settling one purchase, purchase-asset native units.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Settlement {
    pub collected: u128,
    pub refund: u128,
}

/// Collect exactly `cost` from `buyer`.
///
/// Token purchases pull the cost through the collaborator and ignore
/// `payment_provided`; that field only travels with native-currency
/// calls. Native purchases check the attached amount covers the cost and
/// return the surplus; the refund transfer must itself succeed or the
/// settlement fails as a whole.
pub fn settle(
    bridge: &mut dyn AssetBridge,
    buyer: Uuid,
    asset: AssetKind,
    cost: u128,
    payment_provided: u128,
) -> Result<Settlement, PaymentError> {
    match asset {
        AssetKind::Token(_) => {
            if cost > 0 {
                bridge.collect_purchase_asset(buyer, cost)?;
            }
            Ok(Settlement {
                collected: cost,
                refund: 0,
            })
        }
        AssetKind::Native => {
            if payment_provided < cost {
                return Err(PaymentError::InsufficientFunds {
                    required: cost,
                    provided: payment_provided,
                });
            }
            let refund = payment_provided - cost;
            if refund > 0 {
                bridge.refund_native(buyer, refund)?;
            }
            Ok(Settlement {
                collected: cost,
                refund,
            })
        }
    }
}
