//! GL Renderer (C5)
//!
//! Turns a store's [`StoreTotals`] into the fixed 10-row GL journal and
//! serializes it as TSV or CSV with the exact column order and formatting
//! the accounting system expects (spec §4.3).

use chrono::NaiveDate;
use rust_decimal::Decimal;

use ledger_shared::money::format_money;
use ledger_shared::{GlRow, JournalSource, OverageRenderingVariant, Store, StoreTotals};

struct Account {
    code: &'static str,
    desc: &'static str,
}

const ACCOUNTS: [Account; 10] = [
    Account { code: "40001", desc: "Sales Income - Retail Sales" },
    Account { code: "40002", desc: "Retail Income: Discounts and Coupons" },
    Account { code: "40003", desc: "Retail Income: Sales Return" },
    Account { code: "40004", desc: "Loyalty Discounts" },
    Account { code: "23500", desc: "Taxes Payable - Sales & Use" },
    Account { code: "10000", desc: "Cash on Hand" },
    Account { code: "11010", desc: "Debit Card Receivable" },
    Account { code: "70260", desc: "Overage/Shortage - Cash Ledger Adj" },
    Account { code: "50000", desc: "Retail COG - Consumable Products for Resale" },
    Account { code: "12250", desc: "Inventory - Finished Goods" },
];

fn subaccount_for(code: &str) -> &'static str {
    let leading = code.as_bytes()[0];
    if leading == b'4' || leading == b'5' || leading == b'7' {
        "20-00"
    } else {
        "00-00"
    }
}

/// Render the 10 fixed journal rows for one store (spec §4.3 table).
/// `overage_variant` controls which column the overage/shortage plug
/// (account 70260) lands in.
pub fn render_rows(
    store: &Store,
    totals: &StoreTotals,
    report_date: NaiveDate,
    overage_variant: OverageRenderingVariant,
) -> Vec<GlRow> {
    let ref_number = format!("{} DS", report_date.format("%Y-%m-%d"));

    let (overage_debit, overage_credit) = match overage_variant {
        OverageRenderingVariant::SignedCredit => (Decimal::ZERO, totals.overage),
        OverageRenderingVariant::SplitSign => {
            if totals.overage >= Decimal::ZERO {
                (totals.overage, Decimal::ZERO)
            } else {
                (Decimal::ZERO, -totals.overage)
            }
        }
    };

    let debit_credit_by_code = [
        (Decimal::ZERO, totals.gross_sales),  // 40001 credit
        (totals.discounts, Decimal::ZERO),    // 40002 debit
        (totals.returns, Decimal::ZERO),      // 40003 debit (always 0)
        (totals.loyalty_spent, Decimal::ZERO),// 40004 debit
        (Decimal::ZERO, totals.tax),          // 23500 credit
        (totals.net_cash, Decimal::ZERO),     // 10000 debit
        (totals.debit_paid, Decimal::ZERO),   // 11010 debit
        (overage_debit, overage_credit),      // 70260 balance
        (totals.cogs, Decimal::ZERO),         // 50000 debit
        (Decimal::ZERO, totals.cogs),         // 12250 credit
    ];

    ACCOUNTS
        .iter()
        .zip(debit_credit_by_code)
        .map(|(account, (debit, credit))| GlRow {
            branch_code: store.branch_code.clone(),
            store_name: store.name.clone(),
            account_code: account.code,
            account_desc: account.desc,
            subaccount: subaccount_for(account.code),
            ref_number: ref_number.clone(),
            quantity: "1.00",
            uom: "",
            debit,
            credit,
        })
        .collect()
}

fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

const HEADER: [&str; 10] = [
    "Branch",
    "Dutchie Store Name",
    "Account",
    "Description",
    "Subaccount",
    "Ref. Number",
    "Quantity",
    "UOM",
    "Debit Amount",
    "Credit Amount",
];

fn row_fields(row: &GlRow) -> [String; 10] {
    [
        row.branch_code.clone(),
        row.store_name.clone(),
        row.account_code.to_string(),
        row.account_desc.to_string(),
        row.subaccount.to_string(),
        row.ref_number.clone(),
        row.quantity.to_string(),
        row.uom.to_string(),
        format_money(row.debit),
        format_money(row.credit),
    ]
}

/// TSV banner lines describing provenance, prepended only to TSV output
/// (spec §4.3, §6.3).
fn banner(source: JournalSource, report_date: NaiveDate, generated_at: chrono::DateTime<chrono::Utc>) -> String {
    let source_desc = match source {
        JournalSource::PosApi => "POS vendor API",
        JournalSource::Csv => "CSV upload",
        JournalSource::Json => "JSON upload",
        JournalSource::Post => "POST request body",
        JournalSource::Upload => "file upload",
    };
    format!(
        "# Source: {source_desc}\n# Report date: {}\n# Generated: {}\n# Methodology: GL totals computed by local-day attribution with item/fallback COGS, region-aware loyalty reconciliation, and an overage/shortage plug to balance debits and credits.\n",
        report_date.format("%Y-%m-%d"),
        generated_at.to_rfc3339(),
    )
}

/// Render all rows across every store as TSV, with the provenance banner.
pub fn render_tsv(
    rows: &[GlRow],
    source: JournalSource,
    report_date: NaiveDate,
    generated_at: chrono::DateTime<chrono::Utc>,
) -> String {
    let mut out = banner(source, report_date, generated_at);
    out.push_str(&HEADER.join("\t"));
    out.push('\n');
    for row in rows {
        out.push_str(&row_fields(row).join("\t"));
        out.push('\n');
    }
    out
}

/// Render all rows across every store as CSV. No banner (spec §4.3).
pub fn render_csv(rows: &[GlRow]) -> String {
    let mut out = String::new();
    out.push_str(&HEADER.iter().map(|h| csv_field(h)).collect::<Vec<_>>().join(","));
    out.push_str("\r\n");
    for row in rows {
        let fields = row_fields(row);
        out.push_str(&fields.iter().map(|f| csv_field(f)).collect::<Vec<_>>().join(","));
        out.push_str("\r\n");
    }
    out
}

/// File names for a rendered journal (spec §6.3). `source` drives the
/// suffix for non-POS-API ingestion paths.
pub fn file_names(report_date: NaiveDate, source: JournalSource) -> (String, String) {
    let date_str = report_date.format("%Y-%m-%d");
    let suffix = source.file_suffix();
    (
        format!("gl_journal_{date_str}{suffix}.tsv"),
        format!("gl_journal_{date_str}{suffix}.csv"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn store() -> Store {
        Store {
            id: "s1".into(),
            name: "Bonita".into(),
            branch_code: "FLD-BONITA".into(),
            timezone: "America/New_York".into(),
            pos_api_key: "key".into(),
            is_active: true,
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 6).unwrap()
    }

    fn balanced_totals() -> StoreTotals {
        StoreTotals {
            gross_sales: dec!(100),
            discounts: dec!(0),
            loyalty_spent: dec!(0),
            returns: dec!(0),
            tax: dec!(8),
            cash_paid: dec!(108),
            change_due: dec!(0),
            cash_only_change_due: dec!(0),
            net_cash: dec!(108),
            debit_paid: dec!(0),
            cogs: dec!(40),
            overage: dec!(0),
            transaction_count: 1,
        }
    }

    #[test]
    fn renders_exactly_ten_rows_with_fixed_account_codes() {
        let rows = render_rows(&store(), &balanced_totals(), date(), OverageRenderingVariant::SignedCredit);
        assert_eq!(rows.len(), 10);
        let codes: Vec<_> = rows.iter().map(|r| r.account_code).collect();
        assert_eq!(
            codes,
            ["40001", "40002", "40003", "40004", "23500", "10000", "11010", "70260", "50000", "12250"]
        );
    }

    #[test]
    fn double_entry_balances_p1() {
        let rows = render_rows(&store(), &balanced_totals(), date(), OverageRenderingVariant::SignedCredit);
        let total_debit: Decimal = rows.iter().map(|r| r.debit).sum();
        let total_credit: Decimal = rows.iter().map(|r| r.credit).sum();
        assert_eq!(total_debit, total_credit);
    }

    #[test]
    fn subaccount_rule_applies_by_leading_digit() {
        let rows = render_rows(&store(), &balanced_totals(), date(), OverageRenderingVariant::SignedCredit);
        assert_eq!(rows[0].subaccount, "20-00"); // 40001
        assert_eq!(rows[5].subaccount, "00-00"); // 10000
        assert_eq!(rows[8].subaccount, "20-00"); // 50000
    }

    #[test]
    fn overage_variants_both_balance() {
        let mut totals = balanced_totals();
        totals.overage = dec!(-3.50);
        let signed = render_rows(&store(), &totals, date(), OverageRenderingVariant::SignedCredit);
        let split = render_rows(&store(), &totals, date(), OverageRenderingVariant::SplitSign);

        let bal = |rows: &[GlRow]| -> (Decimal, Decimal) {
            (rows.iter().map(|r| r.debit).sum(), rows.iter().map(|r| r.credit).sum())
        };
        let (sd, sc) = bal(&signed);
        assert_eq!(sd, sc);
        let (pd, pc) = bal(&split);
        assert_eq!(pd, pc);

        let overage_row = &split[7];
        assert_eq!(overage_row.credit, dec!(3.50));
        assert_eq!(overage_row.debit, dec!(0));
    }

    #[test]
    fn csv_quotes_fields_with_commas() {
        let mut totals = balanced_totals();
        let mut s = store();
        s.name = "Store, Inc.".into();
        let rows = render_rows(&s, &totals, date(), OverageRenderingVariant::SignedCredit);
        totals.overage = dec!(0);
        let csv = render_csv(&rows);
        assert!(csv.contains("\"Store, Inc.\""));
    }

    #[test]
    fn tsv_has_banner_and_csv_does_not() {
        let rows = render_rows(&store(), &balanced_totals(), date(), OverageRenderingVariant::SignedCredit);
        let generated = "2026-01-07T00:00:00Z".parse().unwrap();
        let tsv = render_tsv(&rows, JournalSource::PosApi, date(), generated);
        let csv = render_csv(&rows);
        assert!(tsv.starts_with("# Source:"));
        assert!(!csv.starts_with('#'));
    }

    #[test]
    fn file_names_include_source_suffix() {
        let (tsv, csv) = file_names(date(), JournalSource::Csv);
        assert_eq!(tsv, "gl_journal_2026-01-06_csv.tsv");
        assert_eq!(csv, "gl_journal_2026-01-06_csv.csv");

        let (tsv, csv) = file_names(date(), JournalSource::PosApi);
        assert_eq!(tsv, "gl_journal_2026-01-06.tsv");
        assert_eq!(csv, "gl_journal_2026-01-06.csv");
    }

    #[test]
    fn row_count_equals_ten_times_store_count_p6() {
        let mut all_rows = Vec::new();
        for _ in 0..3 {
            all_rows.extend(render_rows(&store(), &balanced_totals(), date(), OverageRenderingVariant::SignedCredit));
        }
        assert_eq!(all_rows.len(), 30);
    }
}
