//! Time Resolver (C3)
//!
//! Maps a store's local business day to a UTC fetch window and classifies
//! transactions by local date. The fetch API only understands UTC instants
//! while the authoritative "which day does this transaction belong to"
//! question is always local (spec §4.1) — so every window this module hands
//! back is deliberately wider than the target day, and callers filter
//! precisely afterward with [`local_date`].

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::model::Transaction;

/// A conservative, one-day-each-side padded UTC window guaranteed to
/// contain every transaction whose local date equals `date`, for any US
/// timezone including DST transitions. The timezone parameter is accepted
/// for interface symmetry with [`local_day_window`] but does not affect the
/// padded bound: it is wide enough to absorb any IANA offset.
pub fn extended_window(date: NaiveDate, _tz: Tz) -> (DateTime<Utc>, DateTime<Utc>) {
    let from = Utc
        .from_utc_datetime(&(date - Duration::days(1)).and_time(NaiveTime::MIN));
    let to_date = date + Duration::days(1);
    let to = Utc.from_utc_datetime(
        &to_date.and_hms_opt(23, 59, 59).expect("valid end-of-day time"),
    );
    (from, to)
}

/// Exact local-day window: local midnight of `date` through local midnight
/// of the following day, converted to UTC via the timezone database so DST
/// transitions (including Arizona's permanent no-DST offset) are handled
/// correctly rather than assumed.
pub fn local_day_window(date: NaiveDate, tz: Tz) -> (DateTime<Utc>, DateTime<Utc>) {
    let start_local = tz
        .from_local_datetime(&date.and_time(NaiveTime::MIN))
        .single()
        .unwrap_or_else(|| tz.from_utc_datetime(&date.and_time(NaiveTime::MIN)));
    let end_local = tz
        .from_local_datetime(&(date + Duration::days(1)).and_time(NaiveTime::MIN))
        .single()
        .unwrap_or_else(|| {
            tz.from_utc_datetime(&(date + Duration::days(1)).and_time(NaiveTime::MIN))
        });
    (start_local.with_timezone(&Utc), end_local.with_timezone(&Utc))
}

/// Classify a transaction's local calendar date (spec I2): prefer the
/// POS-supplied tz-naive local timestamp; otherwise convert the UTC instant
/// into the store's timezone.
pub fn local_date(txn: &Transaction, tz: Tz) -> NaiveDate {
    match txn.transaction_date_local_time {
        Some(local) => local.date(),
        None => txn.transaction_date.with_timezone(&tz).date_naive(),
    }
}

/// Local wall-clock date and hour-of-day, used by the Hourly Aggregator
/// (spec §4.5) to bucket transactions once their local timestamp is known.
pub fn local_date_and_hour(local_time: NaiveDateTime) -> (NaiveDate, u32) {
    use chrono::Timelike;
    (local_time.date(), local_time.time().hour())
}

/// UTC offset in whole hours for `tz` at the given local date, handling
/// DST. Arizona (`America/Phoenix`) never observes DST and is always
/// UTC-7; chrono-tz already encodes this, this helper just makes the
/// Hourly Aggregator's "convert local hour to UTC hour" step explicit.
pub fn utc_offset_hours(tz: Tz, date: NaiveDate) -> i32 {
    let noon_local = date.and_hms_opt(12, 0, 0).expect("valid noon");
    let offset = match tz.from_local_datetime(&noon_local).single() {
        Some(dt) => dt.offset().fix(),
        None => tz.from_utc_datetime(&noon_local).offset().fix(),
    };
    offset.local_minus_utc() / 3600
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn extended_window_pads_one_day_each_side_in_utc() {
        let tz: Tz = "America/Phoenix".parse().unwrap();
        let (from, to) = extended_window(date(2026, 7, 15), tz);
        assert_eq!(from.to_rfc3339(), "2026-07-14T00:00:00+00:00");
        assert_eq!(to.to_rfc3339(), "2026-07-16T23:59:59+00:00");
    }

    #[test]
    fn arizona_never_observes_dst() {
        let tz: Tz = "America/Phoenix".parse().unwrap();
        assert_eq!(utc_offset_hours(tz, date(2026, 1, 15)), -7);
        assert_eq!(utc_offset_hours(tz, date(2026, 7, 15)), -7);
    }

    #[test]
    fn local_day_window_crosses_dst_boundary() {
        // US DST starts 2026-03-08; before that date NY is UTC-5, after UTC-4.
        let tz: Tz = "America/New_York".parse().unwrap();
        let (from, to) = local_day_window(date(2026, 3, 8), tz);
        assert_eq!(from.to_rfc3339(), "2026-03-08T05:00:00+00:00");
        assert_eq!(to.to_rfc3339(), "2026-03-09T04:00:00+00:00");
    }

    #[test]
    fn local_date_prefers_pos_supplied_local_time() {
        use crate::model::{Transaction, TransactionType};
        use chrono::{DateTime, NaiveDateTime};
        use rust_decimal::Decimal;

        let tz: Tz = "America/Phoenix".parse().unwrap();
        let txn = Transaction {
            transaction_id: "t1".into(),
            transaction_type: TransactionType::Retail,
            transaction_date: "2026-07-16T03:00:00Z".parse::<DateTime<chrono::Utc>>().unwrap(),
            transaction_date_local_time: Some(
                "2026-07-15T20:00:00".parse::<NaiveDateTime>().unwrap(),
            ),
            is_void: false,
            is_return: false,
            subtotal: Decimal::ZERO,
            total_discount: Decimal::ZERO,
            tax: Decimal::ZERO,
            total: Decimal::ZERO,
            paid: Decimal::ZERO,
            cash_paid: Decimal::ZERO,
            debit_paid: Decimal::ZERO,
            electronic_paid: Decimal::ZERO,
            credit_paid: Decimal::ZERO,
            pre_payment_amount: Decimal::ZERO,
            change_due: Decimal::ZERO,
            loyalty_spent: Decimal::ZERO,
            items: vec![],
            discounts: vec![],
        };
        assert_eq!(local_date(&txn, tz), date(2026, 7, 15));
    }
}
