//! Job processors, one per named queue (spec §4.8). Wired to their
//! queues in `main.rs`.

pub mod banner_sync;
pub mod gl_export;
pub mod hourly_sales;
pub mod inventory_sync;
pub mod odoo_sync;

pub use banner_sync::BannerSyncProcessor;
pub use gl_export::GlExportProcessor;
pub use hourly_sales::HourlySalesProcessor;
pub use inventory_sync::InventorySyncProcessor;
pub use odoo_sync::OdooSyncProcessor;
