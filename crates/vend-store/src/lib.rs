pub mod error;
pub mod json_bridge;
pub mod ledger;
pub mod paths;
pub mod schema;
pub mod store;

pub use error::{Result, StoreError};
pub use ledger::LedgerBridge;
pub use paths::{db_path, default_base_dir};
pub use store::{PurchaseRecord, Store};
