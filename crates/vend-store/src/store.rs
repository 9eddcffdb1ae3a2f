use std::path::Path;

use rusqlite::{Connection, OptionalExtension, params};
use uuid::Uuid;

use vend_core::{PeriodState, Purchase, SaleConfig, SaleEngine, SaleParams};

use crate::error::{Result, StoreError};
use crate::ledger::LedgerBridge;
use crate::schema;

/// One engine instance's persistent home: write-once sale parameters, the
/// mutable period state, the purchase ledger, and account balances.
pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn is_initialised(&self) -> Result<bool> {
        let count: i64 = self
            .conn
            .query_row("SELECT count(*) FROM sale", [], |row| row.get(0))?;
        Ok(count > 0)
    }

    // --- Initialisation ---

    /// Persist the write-once configuration and its genesis state.
    /// Fails with [`StoreError::AlreadyInitialised`] on any later attempt.
    pub fn init_sale(&self, config: &SaleConfig, now: u64) -> Result<SaleEngine> {
        if self.is_initialised()? {
            return Err(StoreError::AlreadyInitialised);
        }

        let engine = SaleEngine::initialise(config.clone(), now);
        let tx = self.conn.unchecked_transaction()?;
        Self::insert_sale_on(&tx, config.params(), now)?;
        Self::insert_state_on(&tx, engine.state())?;
        tx.commit()?;

        tracing::info!(asset = %config.purchase_asset(), "sale initialised");
        Ok(engine)
    }

    /// Initialise from previously exported parts, keeping their state.
    pub(crate) fn init_from_parts(&self, engine: &SaleEngine, now: u64) -> Result<()> {
        if self.is_initialised()? {
            return Err(StoreError::AlreadyInitialised);
        }
        let tx = self.conn.unchecked_transaction()?;
        Self::insert_sale_on(&tx, engine.config().params(), now)?;
        Self::insert_state_on(&tx, engine.state())?;
        tx.commit()?;
        Ok(())
    }

    fn insert_sale_on(conn: &Connection, params: &SaleParams, now: u64) -> Result<()> {
        conn.execute(
            "INSERT INTO sale (id, purchase_asset, period_secs, window, target_per_period,
                               max_per_period, starting_price, sale_decimals, purchase_decimals,
                               created_at)
             VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                params.purchase_asset.to_string(),
                to_i64(params.period_secs, "period_secs")?,
                params.window,
                params.target_per_period.to_string(),
                params.max_per_period.to_string(),
                params.starting_price.to_string(),
                params.sale_decimals,
                params.purchase_decimals,
                to_i64(now, "created_at")?,
            ],
        )?;
        Ok(())
    }

    fn insert_state_on(conn: &Connection, state: &PeriodState) -> Result<()> {
        conn.execute(
            "INSERT INTO period_state (id, period_index, period_start, ema, sold_this_period)
             VALUES (1, ?1, ?2, ?3, ?4)",
            params![
                to_i64(state.period_index, "period_index")?,
                to_i64(state.period_start, "period_start")?,
                state.ema.to_string(),
                state.sold_this_period.to_string(),
            ],
        )?;
        Ok(())
    }

    // --- State ---

    pub fn save_state(&self, state: &PeriodState) -> Result<()> {
        Self::save_state_on(&self.conn, state)
    }

    fn save_state_on(conn: &Connection, state: &PeriodState) -> Result<()> {
        let updated = conn.execute(
            "UPDATE period_state
             SET period_index = ?1, period_start = ?2, ema = ?3, sold_this_period = ?4
             WHERE id = 1",
            params![
                to_i64(state.period_index, "period_index")?,
                to_i64(state.period_start, "period_start")?,
                state.ema.to_string(),
                state.sold_this_period.to_string(),
            ],
        )?;
        if updated != 1 {
            return Err(StoreError::InvalidData("no period state row".to_string()));
        }
        Ok(())
    }

    pub fn load_params(&self) -> Result<SaleParams> {
        let row = self
            .conn
            .query_row(
                "SELECT purchase_asset, period_secs, window, target_per_period,
                        max_per_period, starting_price, sale_decimals, purchase_decimals
                 FROM sale WHERE id = 1",
                [],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, u32>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, String>(5)?,
                        row.get::<_, u32>(6)?,
                        row.get::<_, u32>(7)?,
                    ))
                },
            )
            .optional()?;

        let (asset, period_secs, window, target, max, price, sale_dec, purchase_dec) =
            row.ok_or_else(|| StoreError::InvalidData("sale not initialised".to_string()))?;

        Ok(SaleParams {
            purchase_asset: asset
                .parse()
                .map_err(StoreError::InvalidData)?,
            period_secs: from_i64(period_secs, "period_secs")?,
            window,
            target_per_period: parse_u128(&target, "target_per_period")?,
            max_per_period: parse_u128(&max, "max_per_period")?,
            starting_price: parse_u128(&price, "starting_price")?,
            sale_decimals: sale_dec,
            purchase_decimals: purchase_dec,
        })
    }

    pub fn load_state(&self) -> Result<PeriodState> {
        let row = self
            .conn
            .query_row(
                "SELECT period_index, period_start, ema, sold_this_period
                 FROM period_state WHERE id = 1",
                [],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;

        let (period_index, period_start, ema, sold) =
            row.ok_or_else(|| StoreError::InvalidData("no period state row".to_string()))?;

        Ok(PeriodState {
            period_index: from_i64(period_index, "period_index")?,
            period_start: from_i64(period_start, "period_start")?,
            ema: parse_u128(&ema, "ema")?,
            sold_this_period: parse_u128(&sold, "sold_this_period")?,
        })
    }

    /// Rebuild the engine from the persisted parts, revalidating the
    /// configuration on the way.
    pub fn load_engine(&self) -> Result<SaleEngine> {
        let params = self.load_params()?;
        let config = SaleConfig::new(params)
            .map_err(|e| StoreError::InvalidData(format!("persisted parameters: {e}")))?;
        let state = self.load_state()?;
        Ok(SaleEngine::from_parts(config, state))
    }

    // --- Purchases ---

    /// Run one purchase end to end inside a single transaction: ledger
    /// movements, the state save, and the history row all commit together
    /// or not at all. The engine is only advanced when the commit lands.
    pub fn execute_purchase(
        &self,
        engine: &mut SaleEngine,
        buyer: Uuid,
        requested: u128,
        payment_provided: u128,
        now: u64,
    ) -> Result<Purchase> {
        let tx = self.conn.unchecked_transaction()?;

        let mut staged = engine.clone();
        let purchase = {
            let mut bridge = LedgerBridge::new(&tx);
            staged.buy_tokens(&mut bridge, buyer, requested, payment_provided, now)?
        };
        Self::save_state_on(&tx, staged.state())?;
        Self::record_purchase_on(&tx, &purchase, now)?;
        tx.commit()?;

        *engine = staged;
        tracing::debug!(
            buyer = %purchase.buyer,
            quantity = %purchase.quantity,
            cost = %purchase.cost,
            "purchase recorded"
        );
        Ok(purchase)
    }

    fn record_purchase_on(conn: &Connection, purchase: &Purchase, now: u64) -> Result<()> {
        conn.execute(
            "INSERT INTO purchases (buyer, period_index, quantity, unit_price, cost, refund, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                purchase.buyer.to_string(),
                to_i64(purchase.period_index, "period_index")?,
                purchase.quantity.to_string(),
                purchase.unit_price.to_string(),
                purchase.cost.to_string(),
                purchase.refund.to_string(),
                to_i64(now, "created_at")?,
            ],
        )?;
        Ok(())
    }

    /// Most recent purchases first.
    pub fn purchases(&self, limit: usize) -> Result<Vec<PurchaseRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, buyer, period_index, quantity, unit_price, cost, refund, created_at
             FROM purchases ORDER BY id DESC LIMIT ?1",
        )?;

        let rows: Vec<(i64, String, i64, String, String, String, String, i64)> = stmt
            .query_map([limit as i64], |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                    row.get(6)?,
                    row.get(7)?,
                ))
            })?
            .collect::<std::result::Result<_, _>>()?;

        rows.into_iter()
            .map(|(id, buyer, period_index, quantity, unit_price, cost, refund, created_at)| {
                Ok(PurchaseRecord {
                    id,
                    buyer: parse_uuid(&buyer)?,
                    period_index: from_i64(period_index, "period_index")?,
                    quantity: parse_u128(&quantity, "quantity")?,
                    unit_price: parse_u128(&unit_price, "unit_price")?,
                    cost: parse_u128(&cost, "cost")?,
                    refund: parse_u128(&refund, "refund")?,
                    created_at: from_i64(created_at, "created_at")?,
                })
            })
            .collect()
    }
}

/// One row of the purchase history.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PurchaseRecord {
    pub id: i64,
    pub buyer: Uuid,
    pub period_index: u64,
    pub quantity: u128,
    pub unit_price: u128,
    pub cost: u128,
    pub refund: u128,
    pub created_at: u64,
}

pub(crate) fn parse_u128(raw: &str, field: &str) -> Result<u128> {
    raw.parse()
        .map_err(|_| StoreError::InvalidData(format!("{field}: bad amount {raw:?}")))
}

pub(crate) fn parse_uuid(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw)
        .map_err(|_| StoreError::InvalidData(format!("bad uuid {raw:?}")))
}

fn to_i64(value: u64, field: &str) -> Result<i64> {
    i64::try_from(value)
        .map_err(|_| StoreError::InvalidData(format!("{field}: {value} exceeds storage range")))
}

fn from_i64(value: i64, field: &str) -> Result<u64> {
    u64::try_from(value)
        .map_err(|_| StoreError::InvalidData(format!("{field}: negative value {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use vend_core::AssetKind;

    fn config() -> SaleConfig {
        SaleConfig::new(SaleParams {
            purchase_asset: AssetKind::Native,
            period_secs: 3600,
            window: 10,
            target_per_period: 100,
            max_per_period: 200,
            starting_price: 10,
            sale_decimals: 0,
            purchase_decimals: 1,
        })
        .unwrap()
    }

    #[test]
    fn test_init_and_load_roundtrip() {
        let store = Store::open_in_memory().unwrap();
        let engine = store.init_sale(&config(), 1000).unwrap();

        let loaded = store.load_engine().unwrap();
        assert_eq!(loaded.config().params(), engine.config().params());
        assert_eq!(loaded.state(), engine.state());
    }

    #[test]
    fn test_second_init_rejected() {
        let store = Store::open_in_memory().unwrap();
        store.init_sale(&config(), 1000).unwrap();
        assert!(matches!(
            store.init_sale(&config(), 2000),
            Err(StoreError::AlreadyInitialised)
        ));
    }

    #[test]
    fn test_load_without_init_fails() {
        let store = Store::open_in_memory().unwrap();
        assert!(matches!(
            store.load_engine(),
            Err(StoreError::InvalidData(_))
        ));
    }

    #[test]
    fn test_save_state_roundtrip() {
        let store = Store::open_in_memory().unwrap();
        let mut engine = store.init_sale(&config(), 0).unwrap();

        engine.update_period(5 * 3600).unwrap();
        store.save_state(engine.state()).unwrap();

        assert_eq!(&store.load_state().unwrap(), engine.state());
    }

    #[test]
    fn test_execute_purchase_records_history() {
        let store = Store::open_in_memory().unwrap();
        let mut engine = store.init_sale(&config(), 0).unwrap();
        let buyer = Uuid::new_v4();

        let purchase = store
            .execute_purchase(&mut engine, buyer, 50, 600, 10)
            .unwrap();
        assert_eq!(purchase.quantity, 50);
        assert_eq!(purchase.cost, 500);
        assert_eq!(purchase.refund, 100);

        // state persisted alongside
        assert_eq!(&store.load_state().unwrap(), engine.state());

        let history = store.purchases(10).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].buyer, buyer);
        assert_eq!(history[0].quantity, 50);
        assert_eq!(history[0].cost, 500);

        // refunded native currency landed on the buyer's account
        assert_eq!(store.account_balances(buyer).unwrap().purchase, 100);
        assert_eq!(store.account_balances(buyer).unwrap().sale, 50);
    }

    #[test]
    fn test_failed_purchase_rolls_everything_back() {
        let mut cfg_params = config().params().clone();
        cfg_params.purchase_asset = AssetKind::Token(Uuid::nil());
        let config = SaleConfig::new(cfg_params).unwrap();

        let store = Store::open_in_memory().unwrap();
        let mut engine = store.init_sale(&config, 0).unwrap();
        let buyer = Uuid::new_v4();
        store.fund_account(buyer, 40).unwrap();

        let state_before = engine.state().clone();
        let err = store
            .execute_purchase(&mut engine, buyer, 50, 0, 2 * 3600)
            .unwrap_err();
        assert!(matches!(err, StoreError::Sale(_)));

        assert_eq!(engine.state(), &state_before, "engine must not advance");
        assert_eq!(&store.load_state().unwrap(), &state_before);
        assert!(store.purchases(10).unwrap().is_empty());
        assert_eq!(store.account_balances(buyer).unwrap().purchase, 40);
    }

    #[test]
    fn test_purchases_ordering_and_limit() {
        let store = Store::open_in_memory().unwrap();
        let mut engine = store.init_sale(&config(), 0).unwrap();
        let buyer = Uuid::new_v4();

        for i in 0..5u128 {
            store
                .execute_purchase(&mut engine, buyer, 10 + i, 10_000, 0)
                .unwrap();
        }

        let history = store.purchases(3).unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].quantity, 14, "most recent first");
        assert!(history[0].id > history[2].id);
    }
}
