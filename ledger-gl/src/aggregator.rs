//! GL Aggregator (C4)
//!
//! Pure function from a transaction list to balanced per-store totals. No
//! I/O: the only failure mode is a shape the aggregator cannot reconcile,
//! which is a programmer/data error and propagates fatally rather than
//! being silently absorbed (spec §4.2 "Failure semantics").

use chrono::NaiveDate;
use rust_decimal::Decimal;

use ledger_shared::{AppError, AppResult, DiscountLine, Item, StoreTotals, Transaction, TransactionType};

use crate::loyalty::{self, DiscountLineClass};

/// An item contributes to the report iff it was not returned, or its
/// return was recorded after the report date (spec I4). Items without a
/// return date always count.
fn item_excluded(item: &Item, report_date: NaiveDate) -> bool {
    item.is_returned
        && match item.return_date {
            Some(return_date) => return_date <= report_date,
            None => true,
        }
}

/// Aggregate one transaction into `totals`, mutating it in place. Returns
/// an error only on a programmer-error shape (never on ordinary business
/// data, however unusual).
fn accumulate(totals: &mut StoreTotals, txn: &Transaction, report_date: NaiveDate) -> AppResult<()> {
    // I3: voided and non-retail transactions contribute nothing. A full
    // transaction-level return (`is_return`) is also skipped here; its
    // effect is carried entirely by item-level `is_returned` on the
    // original sale (spec §4.2 step 1).
    if txn.is_void || txn.transaction_type != TransactionType::Retail || txn.is_return {
        return Ok(());
    }

    let use_items = !txn.items.is_empty() && txn.subtotal != Decimal::ZERO;

    let mut gross_sales = Decimal::ZERO;
    let mut cogs = Decimal::ZERO;
    let mut discount_total = Decimal::ZERO;
    let mut all_items_returned = true;

    if use_items {
        for item in &txn.items {
            let included = !item_excluded(item, report_date);
            if included {
                all_items_returned = false;
                gross_sales += item.total_price;
                cogs += item.unit_cost * item.quantity;
                discount_total += item.total_discount;
            }
        }
    } else {
        // Inventory adjustment or a transaction with no item breakdown:
        // fall back to the transaction-level subtotal/discount, with no
        // return predicate to apply (spec §4.2 step 2).
        all_items_returned = false;
        gross_sales += txn.subtotal;
        discount_total += txn.total_discount;
    }

    // Loyalty reconciliation (region policy). The POS-reported field wins
    // when non-zero; otherwise probe discount-line reasons.
    let (loyalty_amount, discounts_contribution) = if txn.loyalty_spent != Decimal::ZERO {
        (txn.loyalty_spent, discount_total - txn.loyalty_spent)
    } else {
        classify_discount_lines(&txn.discounts, discount_total)
    };

    totals.gross_sales += gross_sales;
    totals.cogs += cogs;
    totals.discounts += discounts_contribution;
    totals.loyalty_spent += loyalty_amount;
    totals.tax += txn.tax;

    if !all_items_returned {
        totals.cash_paid += txn.cash_paid;
        totals.change_due += txn.change_due;
        let cash_only = txn.debit_paid == Decimal::ZERO && txn.electronic_paid == Decimal::ZERO;
        if cash_only {
            totals.cash_only_change_due += txn.change_due;
        }

        totals.debit_paid += txn.debit_paid;
        totals.debit_paid += txn.electronic_paid;
        totals.debit_paid += txn.pre_payment_amount;

        let no_recorded_payment = txn.cash_paid == Decimal::ZERO
            && txn.debit_paid == Decimal::ZERO
            && txn.electronic_paid == Decimal::ZERO
            && txn.pre_payment_amount == Decimal::ZERO;
        if no_recorded_payment {
            let imputed = txn.subtotal + txn.tax - discount_total - loyalty_amount;
            if imputed > Decimal::ZERO {
                totals.debit_paid += imputed;
            }
        }
    }

    totals.transaction_count += 1;
    Ok(())
}

/// Classify a transaction's discount lines against the loyalty pattern
/// table and return `(loyaltyAmount, discountsContribution)` (spec §4.2
/// "Loyalty policy by region").
///
/// Missouri/Illinois-style patterns mean the full pre-deduction discount
/// still counts toward `discounts`; the Florida pattern is loyalty-worded
/// but an ordinary discount, so it neither adds to loyalty nor changes the
/// discount total.
fn classify_discount_lines(
    lines: &[DiscountLine],
    discount_total: Decimal,
) -> (Decimal, Decimal) {
    let mut loyalty_amount = Decimal::ZERO;

    for line in lines {
        let Some(reason) = line.discount_reason.as_deref() else {
            continue;
        };
        if let Some(DiscountLineClass::Loyalty) = loyalty::classify(reason) {
            loyalty_amount += line.amount;
        }
    }

    // Loyalty detected from discount-line text (MO/IL patterns) keeps the
    // full pre-deduction discount total; only a POS-reported loyaltySpent
    // field (handled by the caller) subtracts from discounts.
    (loyalty_amount, discount_total)
}

/// Aggregate a full transaction list into balanced per-store totals for
/// report date `report_date` (spec §4.2). `returns` is always zero under
/// the return-backdating policy (spec I4, I7).
pub fn aggregate(transactions: &[Transaction], report_date: NaiveDate) -> AppResult<StoreTotals> {
    let mut totals = StoreTotals::default();
    for txn in transactions {
        accumulate(&mut totals, txn, report_date)?;
    }

    totals.net_cash = totals.cash_paid - totals.cash_only_change_due;
    totals.returns = Decimal::ZERO;

    let credits = totals.gross_sales + totals.tax + totals.cogs;
    let debits =
        totals.discounts + totals.returns + totals.loyalty_spent + totals.net_cash + totals.debit_paid + totals.cogs;
    totals.overage = credits - debits;

    Ok(totals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, NaiveDate, Utc};
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn base_txn() -> Transaction {
        Transaction {
            transaction_id: "t1".into(),
            transaction_type: TransactionType::Retail,
            transaction_date: "2026-01-06T12:00:00Z".parse::<DateTime<Utc>>().unwrap(),
            transaction_date_local_time: None,
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
        }
    }

    fn item(price: Decimal, cost: Decimal, qty: Decimal, returned: bool, return_date: Option<NaiveDate>) -> Item {
        Item {
            product_id: "p1".into(),
            total_price: price,
            total_discount: Decimal::ZERO,
            unit_cost: cost,
            quantity: qty,
            is_returned: returned,
            return_date,
        }
    }

    fn assert_balances(totals: &StoreTotals) {
        let credits = totals.gross_sales + totals.tax + totals.cogs;
        let debits = totals.discounts
            + totals.returns
            + totals.loyalty_spent
            + totals.net_cash
            + totals.debit_paid
            + totals.cogs
            + totals.overage;
        assert_eq!(credits, debits, "debits/credits must balance after overage: {totals:?}");
    }

    #[test]
    fn s1_single_retail_sale_cash_only() {
        let mut txn = base_txn();
        txn.subtotal = dec!(100);
        txn.tax = dec!(8);
        txn.cash_paid = dec!(108);
        txn.items = vec![item(dec!(100), dec!(40), dec!(1), false, None)];

        let totals = aggregate(&[txn], date(2026, 1, 6)).unwrap();
        assert_eq!(totals.gross_sales, dec!(100));
        assert_eq!(totals.tax, dec!(8));
        assert_eq!(totals.net_cash, dec!(108));
        assert_eq!(totals.cogs, dec!(40));
        assert_eq!(totals.discounts, dec!(0));
        assert_eq!(totals.debit_paid, dec!(0));
        assert_eq!(totals.overage, dec!(0));
        assert_balances(&totals);
    }

    #[test]
    fn s2_return_backdated_to_original_sale_date() {
        let mut txn = base_txn();
        txn.subtotal = dec!(100);
        txn.tax = dec!(8);
        txn.cash_paid = dec!(108);
        txn.items = vec![
            item(dec!(50), dec!(20), dec!(1), true, Some(date(2026, 1, 8))),
            item(dec!(50), dec!(20), dec!(1), false, None),
        ];

        // Report for the original sale date, before the return existed.
        let totals_before = aggregate(&[txn.clone()], date(2026, 1, 6)).unwrap();
        assert_eq!(totals_before.gross_sales, dec!(100));
        assert_eq!(totals_before.cogs, dec!(40));

        // Report for (or after) the return date excludes the returned item.
        let totals_after = aggregate(&[txn.clone()], date(2026, 1, 8)).unwrap();
        assert_eq!(totals_after.gross_sales, dec!(50));
        assert_eq!(totals_after.cogs, dec!(20));

        // Re-running the original date after the return is known: unchanged (P4).
        let totals_rerun = aggregate(&[txn], date(2026, 1, 6)).unwrap();
        assert_eq!(totals_rerun.gross_sales, dec!(100));
        assert_eq!(totals_rerun.cogs, dec!(40));
    }

    #[test]
    fn s3_missouri_loyalty_discount_line() {
        let mut txn = base_txn();
        txn.subtotal = dec!(60);
        txn.total_discount = dec!(15);
        txn.discounts = vec![DiscountLine {
            discount_name: None,
            discount_reason: Some("* Loyalty 10".into()),
            amount: dec!(10),
        }];

        let totals = aggregate(&[txn], date(2026, 1, 6)).unwrap();
        assert_eq!(totals.loyalty_spent, dec!(10));
        assert_eq!(totals.discounts, dec!(15));
    }

    #[test]
    fn s3_florida_loyalty_points_is_plain_discount() {
        let mut txn = base_txn();
        txn.subtotal = dec!(60);
        txn.total_discount = dec!(15);
        txn.discounts = vec![DiscountLine {
            discount_name: None,
            discount_reason: Some("5 Loyalty Points".into()),
            amount: dec!(10),
        }];

        let totals = aggregate(&[txn], date(2026, 1, 6)).unwrap();
        assert_eq!(totals.loyalty_spent, dec!(0));
        assert_eq!(totals.discounts, dec!(15));
    }

    #[test]
    fn s4_prepaid_online_order_imputes_no_due() {
        let mut txn = base_txn();
        txn.subtotal = dec!(40);
        txn.tax = dec!(5);
        txn.pre_payment_amount = dec!(45);
        txn.items = vec![item(dec!(40), dec!(15), dec!(1), false, None)];

        let totals = aggregate(&[txn], date(2026, 1, 6)).unwrap();
        assert_eq!(totals.debit_paid, dec!(45));
    }

    #[test]
    fn imputed_due_fills_in_when_no_payment_channel_recorded() {
        let mut txn = base_txn();
        txn.subtotal = dec!(40);
        txn.tax = dec!(5);
        txn.items = vec![item(dec!(40), dec!(15), dec!(1), false, None)];

        let totals = aggregate(&[txn], date(2026, 1, 6)).unwrap();
        assert_eq!(totals.debit_paid, dec!(45));
    }

    #[test]
    fn void_and_wholesale_transactions_contribute_nothing() {
        let mut voided = base_txn();
        voided.is_void = true;
        voided.subtotal = dec!(999);

        let mut wholesale = base_txn();
        wholesale.transaction_type = TransactionType::Wholesale;
        wholesale.subtotal = dec!(999);

        let totals = aggregate(&[voided, wholesale], date(2026, 1, 6)).unwrap();
        assert_eq!(totals.gross_sales, dec!(0));
        assert_eq!(totals.transaction_count, 0);
    }

    #[test]
    fn overage_collapses_to_zero_when_reconciliation_is_exact() {
        let mut txn = base_txn();
        txn.subtotal = dec!(200);
        txn.tax = dec!(16);
        txn.cash_paid = dec!(216);
        txn.items = vec![item(dec!(200), dec!(80), dec!(1), false, None)];

        let totals = aggregate(&[txn], date(2026, 1, 6)).unwrap();
        assert_eq!(totals.overage, dec!(0));
        assert_balances(&totals);
    }

    #[test]
    fn all_items_returned_excludes_cash_and_debit_entirely() {
        let mut txn = base_txn();
        txn.subtotal = dec!(50);
        txn.cash_paid = dec!(50);
        txn.items = vec![item(dec!(50), dec!(20), dec!(1), true, Some(date(2026, 1, 5)))];

        let totals = aggregate(&[txn], date(2026, 1, 6)).unwrap();
        assert_eq!(totals.gross_sales, dec!(0));
        assert_eq!(totals.cash_paid, dec!(0));
        assert_eq!(totals.debit_paid, dec!(0));
    }
}
