//! Hourly Aggregator (C6)
//!
//! Buckets a date range of transactions into a 24-hour-of-day grid per
//! store, both aggregated across the whole range and broken out per
//! reporting day (spec §4.5). Bucketing happens on UTC hour: local hour is
//! converted with the store's DST-aware offset before accumulation, so the
//! output is stable regardless of which local timezone fed it.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use chrono_tz::Tz;
use rust_decimal::Decimal;

use ledger_shared::time::{local_date, local_date_and_hour, utc_offset_hours};
use ledger_shared::{Store, Transaction, TransactionType};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HourBucket {
    pub sales: Decimal,
    pub transactions: u64,
    pub discounts: Decimal,
    pub tax: Decimal,
    pub returns: Decimal,
    pub net_sales: Decimal,
}

/// The default end of a range when the caller does not supply one (spec
/// §4.5: "end defaults to S + 6 days").
pub fn default_range_end(start: NaiveDate) -> NaiveDate {
    start + Duration::days(6)
}

/// One store's hourly profile: an aggregated 24-bucket array plus a
/// per-reporting-day breakdown, both indexed 0..24 by UTC hour.
pub struct HourlyProfile {
    pub aggregated: [HourBucket; 24],
    pub detailed: BTreeMap<NaiveDate, [HourBucket; 24]>,
}

fn convert_local_hour_to_utc(local_date: NaiveDate, local_hour: u32, offset_hours: i32) -> (NaiveDate, u32) {
    let total = local_hour as i32 - offset_hours;
    if total < 0 {
        (local_date - Duration::days(1), (total + 24) as u32)
    } else if total >= 24 {
        (local_date + Duration::days(1), (total - 24) as u32)
    } else {
        (local_date, total as u32)
    }
}

/// Build the hourly profile for `store` over `[start, end]`. `transactions`
/// is expected to already include the one-day-past-`end` padding the
/// fetch layer is responsible for (spec §4.5); this function filters to
/// reporting-day membership itself.
pub fn aggregate_hourly(
    store: &Store,
    transactions: &[Transaction],
    start: NaiveDate,
    end: NaiveDate,
) -> ledger_shared::AppResult<HourlyProfile> {
    let tz: Tz = store
        .timezone
        .parse()
        .map_err(|_| ledger_shared::AppError::validation(format!("unrecognized timezone '{}'", store.timezone)))?;

    let mut aggregated = [HourBucket::default(); 24];
    let mut detailed: BTreeMap<NaiveDate, [HourBucket; 24]> = BTreeMap::new();
    let mut day = start;
    while day <= end {
        detailed.insert(day, [HourBucket::default(); 24]);
        day += Duration::days(1);
    }

    for txn in transactions {
        if txn.is_void || txn.transaction_type != TransactionType::Retail {
            continue;
        }

        let day = local_date(txn, tz);
        if day < start || day > end {
            continue;
        }

        let local_time = match txn.transaction_date_local_time {
            Some(t) => t,
            None => txn.transaction_date.with_timezone(&tz).naive_local(),
        };
        let (_, local_hour) = local_date_and_hour(local_time);
        let offset = utc_offset_hours(tz, day);
        let (_, utc_hour) = convert_local_hour_to_utc(day, local_hour, offset);

        let is_return_item = txn.is_return;
        let bucket_delta = HourBucket {
            sales: if is_return_item { Decimal::ZERO } else { txn.subtotal },
            transactions: 1,
            discounts: txn.total_discount,
            tax: txn.tax,
            returns: if is_return_item { txn.subtotal } else { Decimal::ZERO },
            net_sales: if is_return_item {
                -txn.subtotal
            } else {
                txn.subtotal - txn.total_discount
            },
        };

        add_bucket(&mut aggregated[utc_hour as usize], bucket_delta);
        if let Some(day_buckets) = detailed.get_mut(&day) {
            add_bucket(&mut day_buckets[utc_hour as usize], bucket_delta);
        }
    }

    Ok(HourlyProfile { aggregated, detailed })
}

fn add_bucket(target: &mut HourBucket, delta: HourBucket) {
    target.sales += delta.sales;
    target.transactions += delta.transactions;
    target.discounts += delta.discounts;
    target.tax += delta.tax;
    target.returns += delta.returns;
    target.net_sales += delta.net_sales;
}

/// Render the aggregated 24-row table as CSV/TSV (spec §4.5 column list).
pub fn render_aggregated(store: &Store, profile: &HourlyProfile, delimiter: char) -> String {
    let header = [
        "Branch",
        "Store Name",
        "Hour (UTC)",
        "Sales",
        "Transactions",
        "Discounts",
        "Tax",
        "Returns",
        "Net Sales",
    ];
    let mut out = header.join(&delimiter.to_string());
    out.push('\n');
    for (hour, bucket) in profile.aggregated.iter().enumerate() {
        let row = [
            store.branch_code.clone(),
            store.name.clone(),
            hour.to_string(),
            bucket.sales.to_string(),
            bucket.transactions.to_string(),
            bucket.discounts.to_string(),
            bucket.tax.to_string(),
            bucket.returns.to_string(),
            bucket.net_sales.to_string(),
        ];
        out.push_str(&row.join(&delimiter.to_string()));
        out.push('\n');
    }
    out
}

/// Render the detailed per-day table (24 rows per reporting day) as
/// CSV/TSV; adds a `Date` column between store name and hour.
pub fn render_detailed(store: &Store, profile: &HourlyProfile, delimiter: char) -> String {
    let header = [
        "Branch",
        "Store Name",
        "Date",
        "Hour (UTC)",
        "Sales",
        "Transactions",
        "Discounts",
        "Tax",
        "Returns",
        "Net Sales",
    ];
    let sep = delimiter.to_string();
    let mut out = header.join(&sep);
    out.push('\n');
    for (date, buckets) in &profile.detailed {
        for (hour, bucket) in buckets.iter().enumerate() {
            let row = [
                store.branch_code.clone(),
                store.name.clone(),
                date.format("%Y-%m-%d").to_string(),
                hour.to_string(),
                bucket.sales.to_string(),
                bucket.transactions.to_string(),
                bucket.discounts.to_string(),
                bucket.tax.to_string(),
                bucket.returns.to_string(),
                bucket.net_sales.to_string(),
            ];
            out.push_str(&row.join(&sep));
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn store() -> Store {
        Store {
            id: "s1".into(),
            name: "Phoenix".into(),
            branch_code: "AZ-PHX".into(),
            timezone: "America/Phoenix".into(),
            pos_api_key: "key".into(),
            is_active: true,
        }
    }

    fn txn_at(local: &str) -> Transaction {
        let local_time: chrono::NaiveDateTime = local.parse().unwrap();
        Transaction {
            transaction_id: "t".into(),
            transaction_type: TransactionType::Retail,
            transaction_date: DateTime::parse_from_rfc3339("2026-07-15T00:00:00Z")
                .unwrap()
                .with_timezone(&chrono::Utc),
            transaction_date_local_time: Some(local_time),
            is_void: false,
            is_return: false,
            subtotal: dec!(10),
            total_discount: dec!(0),
            tax: dec!(1),
            total: dec!(11),
            paid: dec!(11),
            cash_paid: dec!(11),
            debit_paid: dec!(0),
            electronic_paid: dec!(0),
            credit_paid: dec!(0),
            pre_payment_amount: dec!(0),
            change_due: dec!(0),
            loyalty_spent: dec!(0),
            items: vec![],
            discounts: vec![],
        }
    }

    #[test]
    fn default_range_end_is_six_days_later() {
        assert_eq!(default_range_end(date(2026, 7, 1)), date(2026, 7, 7));
    }

    #[test]
    fn arizona_fixed_offset_maps_local_hour_to_utc_hour() {
        let txn = txn_at("2026-07-15T09:00:00"); // AZ is always UTC-7
        let profile = aggregate_hourly(&store(), &[txn], date(2026, 7, 15), date(2026, 7, 15)).unwrap();
        assert_eq!(profile.aggregated[16].transactions, 1); // 09:00 - (-7) = 16:00 UTC
        assert_eq!(profile.aggregated[16].sales, dec!(10));
    }

    #[test]
    fn transactions_outside_range_are_excluded() {
        let txn = txn_at("2026-07-20T09:00:00");
        let profile = aggregate_hourly(&store(), &[txn], date(2026, 7, 15), date(2026, 7, 15)).unwrap();
        let total: u64 = profile.aggregated.iter().map(|b| b.transactions).sum();
        assert_eq!(total, 0);
    }

    #[test]
    fn detailed_profile_has_one_entry_per_reporting_day() {
        let profile = aggregate_hourly(&store(), &[], date(2026, 7, 1), date(2026, 7, 7)).unwrap();
        assert_eq!(profile.detailed.len(), 7);
    }
}
