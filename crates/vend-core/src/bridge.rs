//! External asset collaborators.
//!
//! The engine decides amounts; whatever ledger actually hosts the assets
//! moves them. Implementations are synchronous and must either complete a
//! transfer or report failure. The engine aborts the whole purchase on
//! any failure, so a bridge never needs compensation logic of its own.

use std::collections::HashMap;

use uuid::Uuid;

use crate::error::PaymentError;

/// Synchronous collaborator moving asset balances on the engine's behalf.
/// Amounts are native units of the asset in question.
pub trait AssetBridge {
    /// Pull `amount` of the purchase asset from `from` into escrow.
    fn collect_purchase_asset(&mut self, from: Uuid, amount: u128) -> Result<(), PaymentError>;

    /// Return `amount` of native currency to `to`.
    fn refund_native(&mut self, to: Uuid, amount: u128) -> Result<(), PaymentError>;

    /// Deliver `quantity` of the sale asset to `to`.
    fn issue_sale_asset(&mut self, to: Uuid, quantity: u128) -> Result<(), PaymentError>;
}

/// Per-account balances held by [`MemoryBridge`], native units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Balances {
    pub purchase: u128,
    pub sale: u128,
}

/// In-memory reference ledger: a plain account map with no I/O.
#[derive(Debug, Default)]
pub struct MemoryBridge {
    accounts: HashMap<Uuid, Balances>,
}

impl MemoryBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `amount` of the purchase asset to `account`.
    pub fn fund(&mut self, account: Uuid, amount: u128) {
        let balances = self.accounts.entry(account).or_default();
        balances.purchase = balances.purchase.saturating_add(amount);
    }

    pub fn balances(&self, account: Uuid) -> Balances {
        self.accounts.get(&account).copied().unwrap_or_default()
    }
}

impl AssetBridge for MemoryBridge {
    fn collect_purchase_asset(&mut self, from: Uuid, amount: u128) -> Result<(), PaymentError> {
        let balances = self.accounts.entry(from).or_default();
        if balances.purchase < amount {
            return Err(PaymentError::TransferFailed(format!(
                "account {from} holds {} of {amount} required",
                balances.purchase
            )));
        }
        balances.purchase -= amount;
        Ok(())
    }

    fn refund_native(&mut self, to: Uuid, amount: u128) -> Result<(), PaymentError> {
        let balances = self.accounts.entry(to).or_default();
        balances.purchase = balances
            .purchase
            .checked_add(amount)
            .ok_or_else(|| PaymentError::TransferFailed(format!("refund overflows {to}")))?;
        Ok(())
    }

    fn issue_sale_asset(&mut self, to: Uuid, quantity: u128) -> Result<(), PaymentError> {
        let balances = self.accounts.entry(to).or_default();
        balances.sale = balances
            .sale
            .checked_add(quantity)
            .ok_or_else(|| PaymentError::TransferFailed(format!("issuance overflows {to}")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_debits_balance() {
        let mut bridge = MemoryBridge::new();
        let account = Uuid::new_v4();
        bridge.fund(account, 100);
        bridge.collect_purchase_asset(account, 60).unwrap();
        assert_eq!(bridge.balances(account).purchase, 40);
    }

    #[test]
    fn test_collect_fails_on_short_balance() {
        let mut bridge = MemoryBridge::new();
        let account = Uuid::new_v4();
        bridge.fund(account, 10);
        let err = bridge.collect_purchase_asset(account, 11).unwrap_err();
        assert!(matches!(err, PaymentError::TransferFailed(_)));
        assert_eq!(bridge.balances(account).purchase, 10, "failed collect must not debit");
    }

    #[test]
    fn test_collect_from_unknown_account_fails() {
        let mut bridge = MemoryBridge::new();
        assert!(bridge.collect_purchase_asset(Uuid::new_v4(), 1).is_err());
    }

    #[test]
    fn test_issue_credits_sale_balance() {
        let mut bridge = MemoryBridge::new();
        let account = Uuid::new_v4();
        bridge.issue_sale_asset(account, 5).unwrap();
        bridge.issue_sale_asset(account, 7).unwrap();
        assert_eq!(bridge.balances(account).sale, 12);
    }

    #[test]
    fn test_refund_credits_purchase_balance() {
        let mut bridge = MemoryBridge::new();
        let account = Uuid::new_v4();
        bridge.refund_native(account, 30).unwrap();
        assert_eq!(bridge.balances(account).purchase, 30);
    }
}
