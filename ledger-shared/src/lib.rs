//! ledger-shared — domain models, the unified error system, decimal money
//! helpers, and the Time Resolver (C3) shared by every crate in the
//! workspace.

pub mod error;
pub mod model;
pub mod money;
pub mod store_registry;
pub mod time;

pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use model::{
    DiscountLine, GlRow, Item, JournalSource, OverageRenderingVariant, Store, StoreTotals,
    Transaction, TransactionType,
};
pub use store_registry::{InMemoryStoreRegistry, StoreRegistry};
