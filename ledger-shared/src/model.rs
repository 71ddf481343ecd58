//! Domain models shared across the GL pipeline
//!
//! These mirror the POS vendor's wire schema (spec §3.1) closely enough
//! that `serde_json` deserializes vendor payloads directly into
//! [`Transaction`], while staying independent of transport concerns.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A retail store the service reports on. Immutable for the lifetime of a
/// single job run (spec §3.1); refreshed wholesale by the Store Registry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Store {
    pub id: String,
    pub name: String,
    /// Stable accounting-system identifier, e.g. `"FLD-BONITA"`.
    pub branch_code: String,
    /// IANA timezone name, e.g. `"America/New_York"`, `"America/Phoenix"`.
    pub timezone: String,
    pub pos_api_key: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub enum TransactionType {
    Retail,
    Wholesale,
    Transfer,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscountLine {
    pub discount_name: Option<String>,
    pub discount_reason: Option<String>,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub product_id: String,
    pub total_price: Decimal,
    #[serde(default)]
    pub total_discount: Decimal,
    #[serde(default)]
    pub unit_cost: Decimal,
    pub quantity: Decimal,
    #[serde(default)]
    pub is_returned: bool,
    pub return_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub transaction_id: String,
    pub transaction_type: TransactionType,
    pub transaction_date: DateTime<Utc>,
    /// Tz-naive local wall-clock timestamp, when the POS supplied one.
    pub transaction_date_local_time: Option<NaiveDateTime>,
    #[serde(default)]
    pub is_void: bool,
    #[serde(default)]
    pub is_return: bool,
    #[serde(default)]
    pub subtotal: Decimal,
    #[serde(default)]
    pub total_discount: Decimal,
    #[serde(default)]
    pub tax: Decimal,
    #[serde(default)]
    pub total: Decimal,
    #[serde(default)]
    pub paid: Decimal,
    #[serde(default)]
    pub cash_paid: Decimal,
    #[serde(default)]
    pub debit_paid: Decimal,
    #[serde(default)]
    pub electronic_paid: Decimal,
    #[serde(default)]
    pub credit_paid: Decimal,
    #[serde(default)]
    pub pre_payment_amount: Decimal,
    #[serde(default)]
    pub change_due: Decimal,
    #[serde(default)]
    pub loyalty_spent: Decimal,
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default)]
    pub discounts: Vec<DiscountLine>,
}

/// Computed per-store totals for a single report period (day or hour).
/// All monetary fields carry two decimals of precision at render time
/// (spec §3.1).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StoreTotals {
    pub gross_sales: Decimal,
    pub discounts: Decimal,
    pub loyalty_spent: Decimal,
    /// Always zero under the return-backdating policy (spec §4.2); kept as
    /// a field because the renderer emits a dedicated GL row for it.
    pub returns: Decimal,
    pub tax: Decimal,
    pub cash_paid: Decimal,
    pub change_due: Decimal,
    pub cash_only_change_due: Decimal,
    pub net_cash: Decimal,
    pub debit_paid: Decimal,
    pub cogs: Decimal,
    pub overage: Decimal,
    pub transaction_count: u64,
}

/// Convention for rendering the overage/shortage plug row (spec §4.2
/// "Variants"; Open Question resolved in DESIGN.md).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverageRenderingVariant {
    /// `overage` always lands in the credit column (may be negative).
    SignedCredit,
    /// `overage > 0` -> debit column; `overage < 0` -> credit column
    /// (absolute value).
    SplitSign,
}

/// Source of the input that fed a rendered GL journal; drives the output
/// file name suffix (spec §4.3, §6.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JournalSource {
    PosApi,
    Csv,
    Json,
    Post,
    Upload,
}

impl JournalSource {
    pub fn file_suffix(&self) -> &'static str {
        match self {
            JournalSource::PosApi => "",
            JournalSource::Csv => "_csv",
            JournalSource::Json => "_json",
            JournalSource::Post => "_post",
            JournalSource::Upload => "_upload",
        }
    }
}

/// One row of a ten-row-per-store GL journal (spec §3.1, §4.3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlRow {
    pub branch_code: String,
    pub store_name: String,
    pub account_code: &'static str,
    pub account_desc: &'static str,
    pub subaccount: &'static str,
    pub ref_number: String,
    pub quantity: &'static str,
    pub uom: &'static str,
    pub debit: Decimal,
    pub credit: Decimal,
}
