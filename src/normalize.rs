//! Column normalization for loosely-structured transaction CSVs.
//!
//! Input tables arrive with arbitrary header names and column order. This
//! module maps them onto one canonical schema, coercing types and filling
//! defaults so that every downstream consumer sees fully-populated rows.
//! Malformed values never reject a row: they degrade to a default instead.

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use log::{debug, info};
use serde::Serialize;

use crate::error::{Result, RetailInsightsError};

/// Accepted source names per canonical field, in priority order. The first
/// alias present in the input wins; later matches are ignored.
const DATE_ALIASES: &[&str] = &["date", "order_date", "txn_date", "timestamp"];
const PRODUCT_ALIASES: &[&str] = &["product", "sku", "item", "product_name"];
const QUANTITY_ALIASES: &[&str] = &["quantity", "qty", "units", "count"];
const UNIT_PRICE_ALIASES: &[&str] = &["unit_price", "price", "selling_price", "unitprice"];
const DISCOUNT_ALIASES: &[&str] = &["discount", "discount_amount", "disc"];
const CATEGORY_ALIASES: &[&str] = &["category", "cat"];
const PAYMENT_METHOD_ALIASES: &[&str] = &["payment_method", "payment", "pay_method", "paymenttype"];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%Y/%m/%d", "%d-%m-%Y"];

/// One fully-normalized point-of-sale record. Every field is populated;
/// `revenue` and `day` are derived, `category`/`payment_method` may be absent
/// in the source and stay `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    pub date: NaiveDateTime,
    pub day: NaiveDate,
    pub product: String,
    pub category: Option<String>,
    pub quantity: i64,
    pub unit_price: f64,
    pub discount: f64,
    pub payment_method: Option<String>,
    pub revenue: f64,
}

/// A raw tabular input: canonicalized header names plus string cells, as
/// parsed from CSV bytes. No typing or alias resolution has happened yet.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let headers = headers.iter().map(|h| canonical_header(h)).collect();
        Self { headers, rows }
    }

    /// Parse CSV bytes with a header row. UTF-8 is attempted strictly first;
    /// on failure the bytes are re-read through lossy decoding. Only input
    /// that fails both attempts is an error.
    pub fn from_csv_bytes(bytes: &[u8]) -> Result<Self> {
        match Self::parse(bytes) {
            Ok(table) => Ok(table),
            Err(first_err) => {
                let text = String::from_utf8_lossy(bytes).into_owned();
                Self::parse(text.as_bytes())
                    .map_err(|_| RetailInsightsError::CsvRead(first_err.to_string()))
            }
        }
    }

    fn parse(input: &[u8]) -> std::result::Result<Self, csv::Error> {
        let mut reader = csv::Reader::from_reader(input);
        let headers = reader
            .headers()?
            .iter()
            .map(canonical_header)
            .collect::<Vec<_>>();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_string).collect());
        }
        Ok(Self { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// The normalized transaction table: zero or more records, all with the
/// canonical field set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionTable {
    rows: Vec<Transaction>,
}

impl TransactionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows(rows: Vec<Transaction>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Transaction] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn push(&mut self, row: Transaction) {
        self.rows.push(row);
    }

    pub fn extend(&mut self, other: TransactionTable) {
        self.rows.extend(other.rows);
    }

    /// Serialize the table back to CSV: header row, canonical column order,
    /// no index column. Re-normalizing the output yields an identical table.
    pub fn to_csv_string(&self) -> String {
        let mut writer = csv::Writer::from_writer(Vec::new());
        // Infallible: writing into a Vec<u8> cannot produce IO errors and
        // every record has the same width as the header.
        let _ = writer.write_record([
            "date",
            "day",
            "product",
            "category",
            "quantity",
            "unit_price",
            "discount",
            "revenue",
            "payment_method",
        ]);
        for row in &self.rows {
            let _ = writer.write_record([
                row.date.format("%Y-%m-%d %H:%M:%S").to_string(),
                row.day.format("%Y-%m-%d").to_string(),
                row.product.clone(),
                row.category.clone().unwrap_or_default(),
                row.quantity.to_string(),
                row.unit_price.to_string(),
                row.discount.to_string(),
                row.revenue.to_string(),
                row.payment_method.clone().unwrap_or_default(),
            ]);
        }
        String::from_utf8(writer.into_inner().unwrap_or_default()).unwrap_or_default()
    }
}

impl<'a> IntoIterator for &'a TransactionTable {
    type Item = &'a Transaction;
    type IntoIter = std::slice::Iter<'a, Transaction>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// Where each canonical field was found in the source headers, if anywhere.
#[derive(Debug, Clone, Copy, Default)]
struct ColumnBindings {
    date: Option<usize>,
    product: Option<usize>,
    quantity: Option<usize>,
    unit_price: Option<usize>,
    discount: Option<usize>,
    category: Option<usize>,
    payment_method: Option<usize>,
}

impl ColumnBindings {
    fn resolve(headers: &[String]) -> Self {
        let find = |aliases: &[&str]| {
            aliases
                .iter()
                .find_map(|alias| headers.iter().position(|h| h == alias))
        };
        Self {
            date: find(DATE_ALIASES),
            product: find(PRODUCT_ALIASES),
            quantity: find(QUANTITY_ALIASES),
            unit_price: find(UNIT_PRICE_ALIASES),
            discount: find(DISCOUNT_ALIASES),
            category: find(CATEGORY_ALIASES),
            payment_method: find(PAYMENT_METHOD_ALIASES),
        }
    }
}

/// Normalize a raw table into the canonical transaction schema. Never fails:
/// missing columns get defaults, unparseable cells degrade to defaults.
pub fn normalize(raw: &RawTable) -> TransactionTable {
    let bindings = ColumnBindings::resolve(raw.headers());
    debug!("resolved column bindings: {:?}", bindings);

    let today = today_midnight();
    let rows = raw
        .rows
        .iter()
        .map(|row| normalize_row(&bindings, row, today))
        .collect();
    TransactionTable { rows }
}

/// Load CSV bytes and normalize in one step.
pub fn load_transactions_from_csv(bytes: &[u8]) -> Result<TransactionTable> {
    let raw = RawTable::from_csv_bytes(bytes)?;
    let table = normalize(&raw);
    info!("loaded {} transactions from CSV", table.len());
    Ok(table)
}

fn normalize_row(bindings: &ColumnBindings, row: &[String], today: NaiveDateTime) -> Transaction {
    let cell = |idx: Option<usize>| -> Option<&str> {
        idx.and_then(|i| row.get(i))
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    };

    let date = cell(bindings.date)
        .and_then(parse_datetime)
        .unwrap_or(today);

    let product = cell(bindings.product)
        .map(str::to_string)
        .unwrap_or_else(|| "Unknown".to_string());

    // A bound column with an unparseable cell coerces to 0; an unbound
    // column defaults to 1. The distinction matches the load contract.
    let quantity = match bindings.quantity {
        Some(_) => cell(bindings.quantity).map(parse_integer).unwrap_or(0),
        None => 1,
    };

    let unit_price = cell(bindings.unit_price).map(parse_money).unwrap_or(0.0);
    let discount = cell(bindings.discount).map(parse_money).unwrap_or(0.0);

    let category = cell(bindings.category).map(str::to_string);
    let payment_method = cell(bindings.payment_method).map(str::to_string);

    let revenue = quantity as f64 * unit_price - discount;

    Transaction {
        date,
        day: date.date(),
        product,
        category,
        quantity,
        unit_price,
        discount,
        payment_method,
        revenue,
    }
}

fn canonical_header(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

fn today_midnight() -> NaiveDateTime {
    Local::now().date_naive().and_time(NaiveTime::MIN)
}

fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d.and_time(NaiveTime::MIN));
        }
    }
    None
}

fn parse_integer(raw: &str) -> i64 {
    let s = raw.trim();
    s.parse::<i64>()
        .ok()
        .or_else(|| s.parse::<f64>().ok().map(|f| f as i64))
        .unwrap_or(0)
}

fn parse_money(raw: &str) -> f64 {
    let s = raw.replace(',', "").replace(['₹', '$'], "");
    s.trim().parse().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(headers: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable::new(
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn test_alias_mapping() {
        let table = normalize(&raw(
            &["order_date", "item", "qty", "price"],
            &[&["2024-01-01", "Milk", "2", "50.0"]],
        ));
        let row = &table.rows()[0];
        assert_eq!(row.day, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(row.product, "Milk");
        assert_eq!(row.quantity, 2);
        assert_eq!(row.unit_price, 50.0);
        assert_eq!(row.revenue, 100.0);
    }

    #[test]
    fn test_alias_priority_first_wins() {
        // Both `price` and `unit_price` present: `unit_price` is first in the
        // alias list and wins.
        let table = normalize(&raw(
            &["date", "product", "quantity", "price", "unit_price"],
            &[&["2024-01-01", "Tea", "1", "99.0", "10.0"]],
        ));
        assert_eq!(table.rows()[0].unit_price, 10.0);
    }

    #[test]
    fn test_header_canonicalization() {
        let table = normalize(&raw(
            &[" Order Date ", "Product Name", "QTY", "Unit Price"],
            &[&["2024-02-03", "Soap", "3", "20"]],
        ));
        let row = &table.rows()[0];
        assert_eq!(row.product, "Soap");
        assert_eq!(row.quantity, 3);
        assert_eq!(row.revenue, 60.0);
    }

    #[test]
    fn test_non_numeric_quantity_degrades_to_zero() {
        let table = normalize(&raw(
            &["date", "product", "quantity", "unit_price"],
            &[&["2024-01-01", "Milk", "abc", "50.0"]],
        ));
        assert_eq!(table.rows()[0].quantity, 0);
        assert_eq!(table.rows()[0].revenue, 0.0);
    }

    #[test]
    fn test_missing_columns_get_defaults() {
        let table = normalize(&raw(&["unit_price"], &[&["25.0"]]));
        let row = &table.rows()[0];
        assert_eq!(row.product, "Unknown");
        assert_eq!(row.quantity, 1);
        assert_eq!(row.discount, 0.0);
        assert_eq!(row.category, None);
        assert_eq!(row.payment_method, None);
        assert_eq!(row.revenue, 25.0);
        assert_eq!(row.day, Local::now().date_naive());
    }

    #[test]
    fn test_unparseable_date_defaults_to_today() {
        let table = normalize(&raw(
            &["date", "product", "quantity", "unit_price"],
            &[&["not-a-date", "Milk", "1", "10"]],
        ));
        assert_eq!(table.rows()[0].day, Local::now().date_naive());
    }

    #[test]
    fn test_discount_can_push_revenue_negative() {
        let table = normalize(&raw(
            &["date", "product", "quantity", "unit_price", "discount"],
            &[&["2024-01-01", "Milk", "1", "10", "15"]],
        ));
        assert_eq!(table.rows()[0].revenue, -5.0);
    }

    #[test]
    fn test_empty_input_yields_empty_table() {
        let table = normalize(&raw(&["date", "product"], &[]));
        assert!(table.is_empty());
        assert_eq!(table.to_csv_string().lines().count(), 1);
    }

    #[test]
    fn test_fractional_quantity_truncates() {
        let table = normalize(&raw(
            &["date", "product", "quantity", "unit_price"],
            &[&["2024-01-01", "Rice", "2.7", "10"]],
        ));
        assert_eq!(table.rows()[0].quantity, 2);
    }

    #[test]
    fn test_money_parsing_strips_separators() {
        let table = normalize(&raw(
            &["date", "product", "quantity", "unit_price"],
            &[&["2024-01-01", "TV", "1", "₹1,299.50"]],
        ));
        assert_eq!(table.rows()[0].unit_price, 1299.5);
    }

    #[test]
    fn test_csv_round_trip_is_idempotent() {
        let first = normalize(&raw(
            &["order_date", "item", "qty", "price", "category", "discount"],
            &[
                &["2024-01-01", "Milk", "2", "50.0", "Dairy", "5"],
                &["2024-01-02", "Bread", "1", "30.0", "", "0"],
            ],
        ));
        let exported = first.to_csv_string();
        let second = load_transactions_from_csv(exported.as_bytes()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_ragged_rows_are_a_load_error() {
        let err = load_transactions_from_csv(b"date,product\n2024-01-01,Milk,extra\n").unwrap_err();
        assert!(matches!(err, RetailInsightsError::CsvRead(_)));
    }

    #[test]
    fn test_lossy_decode_fallback() {
        let mut bytes = b"date,product,quantity,unit_price\n2024-01-01,Caf".to_vec();
        bytes.push(0xE9); // latin-1 e-acute, invalid UTF-8
        bytes.extend_from_slice(b",1,10\n");
        let table = load_transactions_from_csv(&bytes).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0].unit_price, 10.0);
    }
}
