//! ledger-pos-client — the HTTP client for the POS vendor's
//! transaction/inventory/discount reporting endpoints (spec §4.6, §6.1).

pub mod client;

pub use client::{
    DiscountRow, InventoryRow, NetworkPosClient, PosClient, TransactionQuery, DEFAULT_OTHER_TIMEOUT,
    DEFAULT_TRANSACTIONS_TIMEOUT,
};
