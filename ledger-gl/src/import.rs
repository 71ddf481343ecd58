//! CSV/JSON tabular import path (C4.4)
//!
//! Accepts externally produced tabular exports — one row per
//! transaction-aggregate rather than one row per transaction — and rolls
//! them up into the same [`StoreTotals`] the POS-driven aggregator
//! produces, so both paths feed the one renderer (spec §4.4, §9 "Multiple
//! near-duplicate GL exporter variants").

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde_json::Value;

use ledger_shared::money::parse_currency;
use ledger_shared::{AppError, AppResult, StoreTotals};

/// A single recognized logical column and its accepted header spellings
/// (spec §4.4 table): short form first, long form as fallback.
struct ColumnSpec {
    logical: &'static str,
    names: &'static [&'static str],
}

const COLUMNS: &[ColumnSpec] = &[
    ColumnSpec { logical: "date", names: &["Transaction Date", "Transactions Transaction Date"] },
    ColumnSpec { logical: "location", names: &["Location Name", "Lsp Location Location Name"] },
    ColumnSpec { logical: "total_price", names: &["Total Price", "Transaction Items Total Price"] },
    ColumnSpec { logical: "discount_amount", names: &["Amount", "Transaction Item Discounts Amount"] },
    ColumnSpec { logical: "loyalty", names: &["Sum Total Loyalty Paid", "Transactions Sum Total Loyalty Paid"] },
    ColumnSpec { logical: "tax", names: &["Total Tax", "Transactions Total Tax"] },
    ColumnSpec { logical: "debit", names: &["Debit Paid", "Transactions Debit Paid"] },
    ColumnSpec { logical: "cash", names: &["Cash Paid", "Transactions Cash Paid"] },
    ColumnSpec { logical: "electronic", names: &["Electronic Paid", "Transactions Electronic Paid"] },
    ColumnSpec { logical: "cost", names: &["Total Cost", "Transaction Items Total Cost"] },
];

/// Resolve a header row against [`COLUMNS`], returning a map of logical
/// name -> column index. Missing optional columns are simply absent from
/// the map; callers treat an absent column as a zero contribution.
fn resolve_headers(header: &[String]) -> HashMap<&'static str, usize> {
    let mut resolved = HashMap::new();
    for spec in COLUMNS {
        if let Some(idx) = header.iter().position(|h| spec.names.contains(&h.trim())) {
            resolved.insert(spec.logical, idx);
        }
    }
    resolved
}

fn field<'a>(row: &'a [String], resolved: &HashMap<&'static str, usize>, logical: &str) -> Option<&'a str> {
    resolved.get(logical).and_then(|&idx| row.get(idx)).map(|s| s.as_str())
}

fn money_field(row: &[String], resolved: &HashMap<&'static str, usize>, logical: &str) -> Decimal {
    field(row, resolved, logical)
        .and_then(parse_currency)
        .unwrap_or(Decimal::ZERO)
}

/// A single resolved import row, prior to store-alias resolution.
pub struct ImportRow {
    pub date: String,
    pub location: String,
    pub total_price: Decimal,
    pub discount_amount: Decimal,
    pub loyalty: Decimal,
    pub tax: Decimal,
    pub debit: Decimal,
    pub cash: Decimal,
    pub electronic: Decimal,
    pub cost: Decimal,
}

/// Parse a CSV body (quoting-aware) into [`ImportRow`]s. The date and
/// location columns are mandatory; a row missing either is rejected with
/// [`ledger_shared::ErrorCode::UnrecognizedColumn`].
pub fn parse_csv(body: &str) -> AppResult<Vec<ImportRow>> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(body.as_bytes());
    let header: Vec<String> = reader
        .headers()
        .map_err(|e| AppError::with_message(ledger_shared::ErrorCode::UnrecognizedColumn, e.to_string()))?
        .iter()
        .map(|s| s.to_string())
        .collect();
    let resolved = resolve_headers(&header);

    if !resolved.contains_key("date") || !resolved.contains_key("location") {
        return Err(AppError::with_message(
            ledger_shared::ErrorCode::UnrecognizedColumn,
            "no recognized Date or Location column in import header",
        ));
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| AppError::with_message(ledger_shared::ErrorCode::UnrecognizedColumn, e.to_string()))?;
        let fields: Vec<String> = record.iter().map(|s| s.to_string()).collect();
        rows.push(ImportRow {
            date: field(&fields, &resolved, "date").unwrap_or_default().to_string(),
            location: field(&fields, &resolved, "location").unwrap_or_default().to_string(),
            total_price: money_field(&fields, &resolved, "total_price"),
            discount_amount: money_field(&fields, &resolved, "discount_amount"),
            loyalty: money_field(&fields, &resolved, "loyalty"),
            tax: money_field(&fields, &resolved, "tax"),
            debit: money_field(&fields, &resolved, "debit"),
            cash: money_field(&fields, &resolved, "cash"),
            electronic: money_field(&fields, &resolved, "electronic"),
            cost: money_field(&fields, &resolved, "cost"),
        });
    }
    Ok(rows)
}

/// Parse a JSON import body: either a bare array of row objects or a
/// `{date?, data: [...]}` envelope (spec §6.5).
pub fn parse_json(body: &str) -> AppResult<Vec<ImportRow>> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| AppError::with_message(ledger_shared::ErrorCode::PosParseError, e.to_string()))?;

    let array = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(AppError::with_message(
                    ledger_shared::ErrorCode::PosParseError,
                    "JSON import body missing a 'data' array",
                ))
            }
        },
        _ => {
            return Err(AppError::with_message(
                ledger_shared::ErrorCode::PosParseError,
                "JSON import body must be an array or an object with a 'data' array",
            ))
        }
    };

    let json_money = |obj: &serde_json::Map<String, Value>, keys: &[&str]| -> Decimal {
        for key in keys {
            if let Some(v) = obj.get(*key) {
                match v {
                    Value::Number(n) => return Decimal::try_from(n.as_f64().unwrap_or(0.0)).unwrap_or(Decimal::ZERO),
                    Value::String(s) => {
                        if let Some(d) = parse_currency(s) {
                            return d;
                        }
                    }
                    _ => {}
                }
            }
        }
        Decimal::ZERO
    };
    let json_string = |obj: &serde_json::Map<String, Value>, keys: &[&str]| -> String {
        for key in keys {
            if let Some(Value::String(s)) = obj.get(*key) {
                return s.clone();
            }
        }
        String::new()
    };

    let mut rows = Vec::new();
    for item in array {
        let Value::Object(obj) = item else { continue };
        rows.push(ImportRow {
            date: json_string(&obj, &["Transaction Date", "Transactions Transaction Date"]),
            location: json_string(&obj, &["Location Name", "Lsp Location Location Name"]),
            total_price: json_money(&obj, &["Total Price", "Transaction Items Total Price"]),
            discount_amount: json_money(&obj, &["Amount", "Transaction Item Discounts Amount"]),
            loyalty: json_money(&obj, &["Sum Total Loyalty Paid", "Transactions Sum Total Loyalty Paid"]),
            tax: json_money(&obj, &["Total Tax", "Transactions Total Tax"]),
            debit: json_money(&obj, &["Debit Paid", "Transactions Debit Paid"]),
            cash: json_money(&obj, &["Cash Paid", "Transactions Cash Paid"]),
            electronic: json_money(&obj, &["Electronic Paid", "Transactions Electronic Paid"]),
            cost: json_money(&obj, &["Total Cost", "Transaction Items Total Cost"]),
        });
    }
    Ok(rows)
}

/// Map a dashboard-reported location name to an internal store name:
/// exact match first, then substring, else the input unchanged — logged
/// by the caller when the fallback is taken so the miss is auditable
/// (spec §9 "Dashboard-name alias map").
///
/// Substring candidates are tried longest-key-first, ties broken
/// alphabetically, rather than in `HashMap` iteration order — the
/// map's randomly seeded per-process hasher would otherwise make which
/// key wins when a dashboard name contains more than one configured key
/// unstable across runs (spec P2, I7).
pub fn resolve_store_alias<'a>(aliases: &'a HashMap<String, String>, dashboard_name: &str) -> (String, bool) {
    if let Some(exact) = aliases.get(dashboard_name) {
        return (exact.clone(), false);
    }

    let mut keys: Vec<&String> = aliases.keys().collect();
    keys.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    for key in keys {
        if dashboard_name.contains(key.as_str()) {
            return (aliases[key].clone(), false);
        }
    }
    (dashboard_name.to_string(), true)
}

/// Roll a store's import rows up into totals using the simpler tabular
/// rollup rule (spec §4.4): unlike the POS-transaction aggregator, there
/// is no item/fallback split or return-date predicate — the upstream
/// export has already flattened that out.
pub fn rollup(rows: &[ImportRow]) -> StoreTotals {
    let mut totals = StoreTotals::default();
    for row in rows {
        totals.gross_sales += row.total_price;
        totals.discounts += row.discount_amount;
        totals.loyalty_spent += row.loyalty;
        totals.tax += row.tax;
        totals.cash_paid += row.cash;
        totals.net_cash += row.cash;
        totals.debit_paid += row.debit + row.electronic;
        totals.cogs += row.cost;
        totals.transaction_count += 1;
    }
    totals.overage = (totals.discounts + totals.loyalty_spent + totals.cash_paid + totals.debit_paid)
        - (totals.gross_sales + totals.tax);
    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn parses_short_form_csv_headers() {
        let csv = "Transaction Date,Location Name,Total Price,Amount,Sum Total Loyalty Paid,Total Tax,Debit Paid,Cash Paid,Electronic Paid,Total Cost\n2026-01-06,Bonita,100.00,0,0,8.00,0,108.00,0,40.00\n";
        let rows = parse_csv(csv).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].total_price, dec!(100.00));
        assert_eq!(rows[0].cash, dec!(108.00));
    }

    #[test]
    fn parses_long_form_csv_headers() {
        let csv = "Transactions Transaction Date,Lsp Location Location Name,Transaction Items Total Price,Transaction Item Discounts Amount,Transactions Sum Total Loyalty Paid,Transactions Total Tax,Transactions Debit Paid,Transactions Cash Paid,Transactions Electronic Paid,Transaction Items Total Cost\n2026-01-06,Bonita,100.00,0,0,8.00,0,108.00,0,40.00\n";
        let rows = parse_csv(csv).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].location, "Bonita");
    }

    #[test]
    fn rejects_csv_missing_recognized_columns() {
        let csv = "Foo,Bar\n1,2\n";
        assert!(parse_csv(csv).is_err());
    }

    #[test]
    fn parses_json_envelope_with_data_array() {
        let body = r#"{"date":"2026-01-06","data":[{"Location Name":"Bonita","Total Price":"$100.00","Total Tax":"8.00"}]}"#;
        let rows = parse_json(body).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].total_price, dec!(100.00));
    }

    #[test]
    fn parses_bare_json_array() {
        let body = r#"[{"Location Name":"Bonita","Total Price":50}]"#;
        let rows = parse_json(body).unwrap();
        assert_eq!(rows[0].total_price, dec!(50));
    }

    #[test]
    fn alias_resolution_exact_then_substring_then_unchanged() {
        let mut aliases = HashMap::new();
        aliases.insert("Bonita Springs".to_string(), "FLD-BONITA".to_string());

        let (exact, fell_back) = resolve_store_alias(&aliases, "Bonita Springs");
        assert_eq!(exact, "FLD-BONITA");
        assert!(!fell_back);

        let (substring, fell_back) = resolve_store_alias(&aliases, "Dutchie - Bonita Springs - Retail");
        assert_eq!(substring, "FLD-BONITA");
        assert!(!fell_back);

        let (unchanged, fell_back) = resolve_store_alias(&aliases, "Unknown Location");
        assert_eq!(unchanged, "Unknown Location");
        assert!(fell_back);
    }

    #[test]
    fn alias_resolution_is_deterministic_when_multiple_keys_match() {
        let mut aliases = HashMap::new();
        aliases.insert("Bonita".to_string(), "WRONG-SHORT-MATCH".to_string());
        aliases.insert("Bonita Springs".to_string(), "FLD-BONITA".to_string());

        for _ in 0..20 {
            let (resolved, fell_back) = resolve_store_alias(&aliases, "Dutchie - Bonita Springs - Retail");
            assert_eq!(resolved, "FLD-BONITA");
            assert!(!fell_back);
        }
    }

    #[test]
    fn rollup_uses_the_simpler_tabular_formula() {
        let rows = vec![ImportRow {
            date: "2026-01-06".into(),
            location: "Bonita".into(),
            total_price: dec!(100),
            discount_amount: dec!(0),
            loyalty: dec!(0),
            tax: dec!(8),
            debit: dec!(0),
            cash: dec!(108),
            electronic: dec!(0),
            cost: dec!(40),
        }];
        let totals = rollup(&rows);
        assert_eq!(totals.gross_sales, dec!(100));
        assert_eq!(totals.net_cash, dec!(108));
        assert_eq!(totals.overage, dec!(0));
    }
}
