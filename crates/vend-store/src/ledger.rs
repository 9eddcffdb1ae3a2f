//! SQLite-backed account ledger implementing the engine's asset
//! collaborator.
//!
//! Balances live in the `accounts` table as decimal TEXT. The bridge runs
//! over whatever connection (usually a transaction) the caller hands it, so
//! a failed purchase unwinds its balance movements together with the rest
//! of the call.

use rusqlite::{Connection, OptionalExtension, params};
use uuid::Uuid;

use vend_core::{AssetBridge, Balances, PaymentError};

use crate::error::Result;
use crate::store::{Store, parse_u128};

/// [`AssetBridge`] over a live connection or transaction.
pub struct LedgerBridge<'a> {
    conn: &'a Connection,
}

impl<'a> LedgerBridge<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn balance(&self, account: Uuid, column: &str) -> std::result::Result<u128, PaymentError> {
        let raw: Option<String> = self
            .conn
            .query_row(
                &format!("SELECT {column} FROM accounts WHERE id = ?1"),
                [account.to_string()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| PaymentError::TransferFailed(e.to_string()))?;
        match raw {
            Some(raw) => raw
                .parse()
                .map_err(|_| PaymentError::TransferFailed(format!("corrupt balance {raw:?}"))),
            None => Ok(0),
        }
    }

    fn set_balance(
        &self,
        account: Uuid,
        column: &str,
        value: u128,
    ) -> std::result::Result<(), PaymentError> {
        self.conn
            .execute(
                &format!(
                    "INSERT INTO accounts (id, {column}) VALUES (?1, ?2)
                     ON CONFLICT(id) DO UPDATE SET {column} = ?2"
                ),
                params![account.to_string(), value.to_string()],
            )
            .map_err(|e| PaymentError::TransferFailed(e.to_string()))?;
        Ok(())
    }

    fn credit(
        &self,
        account: Uuid,
        column: &str,
        amount: u128,
    ) -> std::result::Result<(), PaymentError> {
        let current = self.balance(account, column)?;
        let next = current
            .checked_add(amount)
            .ok_or_else(|| PaymentError::TransferFailed(format!("{column} overflow")))?;
        self.set_balance(account, column, next)
    }
}

impl AssetBridge for LedgerBridge<'_> {
    fn collect_purchase_asset(
        &mut self,
        from: Uuid,
        amount: u128,
    ) -> std::result::Result<(), PaymentError> {
        let current = self.balance(from, "purchase_balance")?;
        if current < amount {
            return Err(PaymentError::TransferFailed(format!(
                "account {from} holds {current} of {amount} required"
            )));
        }
        self.set_balance(from, "purchase_balance", current - amount)
    }

    fn refund_native(&mut self, to: Uuid, amount: u128) -> std::result::Result<(), PaymentError> {
        self.credit(to, "purchase_balance", amount)
    }

    fn issue_sale_asset(
        &mut self,
        to: Uuid,
        quantity: u128,
    ) -> std::result::Result<(), PaymentError> {
        self.credit(to, "sale_balance", quantity)
    }
}

impl Store {
    /// Credit `amount` of the purchase asset to `account`.
    pub fn fund_account(&self, account: Uuid, amount: u128) -> Result<u128> {
        let mut bridge = LedgerBridge::new(self.conn());
        bridge
            .refund_native(account, amount)
            .map_err(|e| crate::error::StoreError::InvalidData(e.to_string()))?;
        Ok(self.account_balances(account)?.purchase)
    }

    pub fn account_balances(&self, account: Uuid) -> Result<Balances> {
        let row: Option<(String, String)> = self
            .conn()
            .query_row(
                "SELECT purchase_balance, sale_balance FROM accounts WHERE id = ?1",
                [account.to_string()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        match row {
            Some((purchase, sale)) => Ok(Balances {
                purchase: parse_u128(&purchase, "purchase_balance")?,
                sale: parse_u128(&sale, "sale_balance")?,
            }),
            None => Ok(Balances::default()),
        }
    }
}
