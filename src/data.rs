//! CSV ingestion and typed record construction using Polars
//!
//! All downstream transforms operate on the typed records built here. Rows with
//! unparseable timestamps or missing identifiers are dropped at load time and
//! counted, so a transform never sees an invalid row.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use polars::prelude::*;

/// One sales line item. `order_id` is not unique per row: line items of the
/// same order share it, which is why the rate computations count distinct ids.
#[derive(Debug, Clone)]
pub struct SalesRecord {
    pub order_id: String,
    pub order_date: DateTime<Utc>,
    pub product_name: String,
    pub sales_channel: String,
    pub fulfillment_status: String,
    pub revenue: f64,
    pub discount_amount: f64,
    pub refund_amount: f64,
    pub quantity: i64,
    pub location: String,
    pub discount_code: Option<String>,
}

/// Whether a customer is a repeat buyer, normalized from the heterogeneous
/// encodings seen in real exports ("yes"/"no", true/false, 1/0).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomerType {
    Returning,
    New,
}

impl CustomerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CustomerType::Returning => "Returning",
            CustomerType::New => "New",
        }
    }
}

/// One customer, unique per `customer_id`.
#[derive(Debug, Clone)]
pub struct CustomerRecord {
    pub customer_id: String,
    pub email: String,
    pub total_orders: i64,
    pub total_spent: f64,
    pub location: String,
    pub iso2: String,
    pub customer_type: CustomerType,
}

/// Loaded sales table with load-time bookkeeping.
#[derive(Debug)]
pub struct SalesData {
    pub records: Vec<SalesRecord>,
    /// Rows dropped for unparseable dates or missing identifiers/measures.
    pub dropped_rows: usize,
    /// Whether the source file carried a `discount_code` column at all.
    pub has_discount_codes: bool,
}

/// Loaded customer table with load-time bookkeeping.
#[derive(Debug)]
pub struct CustomerData {
    pub records: Vec<CustomerRecord>,
    pub dropped_rows: usize,
}

/// City-level geographic reference row (worldcities.csv layout).
#[derive(Debug, Clone)]
pub struct CityRef {
    pub city: String,
    pub country: String,
    pub iso2: String,
    pub lat: f64,
    pub lng: f64,
}

/// Country-level geographic reference row.
#[derive(Debug, Clone)]
pub struct CountryRef {
    pub country: String,
    pub iso2: String,
    pub lat: f64,
    pub lng: f64,
}

const SALES_REQUIRED_COLUMNS: &[&str] = &[
    "order_id",
    "order_date",
    "product_name",
    "fulfillment_status",
    "product_revenue",
    "location",
];

const CUSTOMER_REQUIRED_COLUMNS: &[&str] = &[
    "customer_id",
    "total_orders",
    "total_spent",
    "location",
    "iso2",
    "returning_customer",
];

/// Load the sales CSV and build typed records.
///
/// Required columns are validated up front; `discount_code` is the one
/// optional column and its absence is recorded rather than raised, so the
/// discount ranking can report a schema error only when actually requested.
pub fn load_sales_data(path: &str) -> crate::Result<SalesData> {
    let df = CsvReader::from_path(path)?.finish()?;
    require_columns(&df, SALES_REQUIRED_COLUMNS, "sales")?;

    let order_ids = str_column(&df, "order_id")?;
    let order_dates = str_column(&df, "order_date")?;
    let product_names = str_column(&df, "product_name")?;
    let channels = optional_str_column(&df, "sales_channel");
    let statuses = str_column(&df, "fulfillment_status")?;
    let revenues = f64_column(&df, "product_revenue")?;
    let discounts = optional_f64_column(&df, "discount_amount");
    let refunds = optional_f64_column(&df, "refund_amount");
    let quantities = optional_i64_column(&df, "quantity");
    let locations = str_column(&df, "location")?;
    let has_discount_codes = df.get_column_names().contains(&"discount_code");
    let discount_codes = optional_str_column(&df, "discount_code");

    let mut records = Vec::with_capacity(df.height());
    let mut dropped_rows = 0usize;

    for i in 0..df.height() {
        let order_id = match order_ids[i].as_deref() {
            Some(id) if !id.trim().is_empty() => id.trim().to_string(),
            _ => {
                dropped_rows += 1;
                continue;
            }
        };
        let order_date = match order_dates[i].as_deref().and_then(parse_timestamp) {
            Some(ts) => ts,
            None => {
                dropped_rows += 1;
                continue;
            }
        };
        let revenue = match revenues[i] {
            Some(v) => v,
            None => {
                dropped_rows += 1;
                continue;
            }
        };

        records.push(SalesRecord {
            order_id,
            order_date,
            product_name: column_value(&product_names, i),
            sales_channel: column_value(&channels, i),
            fulfillment_status: column_value(&statuses, i),
            revenue,
            discount_amount: discounts[i].unwrap_or(0.0),
            refund_amount: refunds[i].unwrap_or(0.0),
            quantity: quantities[i].unwrap_or(0),
            location: column_value(&locations, i),
            discount_code: discount_codes[i]
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string),
        });
    }

    if dropped_rows > 0 {
        eprintln!(
            "warning: dropped {} sales row(s) with invalid dates or measures",
            dropped_rows
        );
    }

    Ok(SalesData {
        records,
        dropped_rows,
        has_discount_codes,
    })
}

/// Load the customer CSV and build typed records, normalizing the
/// returning-customer flag as it comes in.
pub fn load_customer_data(path: &str) -> crate::Result<CustomerData> {
    let df = CsvReader::from_path(path)?.finish()?;
    require_columns(&df, CUSTOMER_REQUIRED_COLUMNS, "customer")?;

    let customer_ids = str_column(&df, "customer_id")?;
    let emails = optional_str_column(&df, "email");
    let total_orders = i64_column(&df, "total_orders")?;
    let total_spent = f64_column(&df, "total_spent")?;
    let locations = str_column(&df, "location")?;
    let iso2s = str_column(&df, "iso2")?;
    let returning = str_column(&df, "returning_customer")?;

    let mut records = Vec::with_capacity(df.height());
    let mut dropped_rows = 0usize;

    for i in 0..df.height() {
        let customer_id = match customer_ids[i].as_deref() {
            Some(id) if !id.trim().is_empty() => id.trim().to_string(),
            _ => {
                dropped_rows += 1;
                continue;
            }
        };
        let (orders, spent) = match (total_orders[i], total_spent[i]) {
            (Some(o), Some(s)) => (o, s),
            _ => {
                dropped_rows += 1;
                continue;
            }
        };

        records.push(CustomerRecord {
            customer_id,
            email: column_value(&emails, i),
            total_orders: orders,
            total_spent: spent,
            location: column_value(&locations, i),
            iso2: column_value(&iso2s, i),
            customer_type: classify_customer_type(returning[i].as_deref()),
        });
    }

    if dropped_rows > 0 {
        eprintln!(
            "warning: dropped {} customer row(s) with missing ids or measures",
            dropped_rows
        );
    }

    Ok(CustomerData {
        records,
        dropped_rows,
    })
}

/// Load the city-level reference table. Accepts either a `city_ascii` or a
/// `city` name column; rows without coordinates are skipped.
pub fn load_city_reference(path: &str) -> crate::Result<Vec<CityRef>> {
    let df = CsvReader::from_path(path)?.finish()?;
    let city_col = if df.get_column_names().contains(&"city_ascii") {
        "city_ascii"
    } else {
        "city"
    };
    require_columns(&df, &[city_col, "country", "iso2", "lat", "lng"], "city reference")?;

    let cities = str_column(&df, city_col)?;
    let countries = str_column(&df, "country")?;
    let iso2s = str_column(&df, "iso2")?;
    let lats = f64_column(&df, "lat")?;
    let lngs = f64_column(&df, "lng")?;

    let mut refs = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        if let (Some(city), Some(iso2), Some(lat), Some(lng)) =
            (cities[i].as_deref(), iso2s[i].as_deref(), lats[i], lngs[i])
        {
            refs.push(CityRef {
                city: city.to_string(),
                country: column_value(&countries, i),
                iso2: iso2.to_string(),
                lat,
                lng,
            });
        }
    }
    Ok(refs)
}

/// Load the country-level reference table.
pub fn load_country_reference(path: &str) -> crate::Result<Vec<CountryRef>> {
    let df = CsvReader::from_path(path)?.finish()?;
    require_columns(&df, &["country", "iso2", "lat", "lng"], "country reference")?;

    let countries = str_column(&df, "country")?;
    let iso2s = str_column(&df, "iso2")?;
    let lats = f64_column(&df, "lat")?;
    let lngs = f64_column(&df, "lng")?;

    let mut refs = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        if let (Some(country), Some(iso2), Some(lat), Some(lng)) =
            (countries[i].as_deref(), iso2s[i].as_deref(), lats[i], lngs[i])
        {
            refs.push(CountryRef {
                country: country.to_string(),
                iso2: iso2.to_string(),
                lat,
                lng,
            });
        }
    }
    Ok(refs)
}

/// Normalize the returning-customer flag to a two-state classification.
/// Unrecognized or missing values are treated as new customers explicitly.
pub fn classify_customer_type(raw: Option<&str>) -> CustomerType {
    match raw {
        Some(value) => match value.trim().to_lowercase().as_str() {
            "yes" | "y" | "true" | "1" => CustomerType::Returning,
            _ => CustomerType::New,
        },
        None => CustomerType::New,
    }
}

/// Parse a timestamp in any of the formats common to CSV exports.
/// Returns `None` for anything unrecognized; the caller drops the row.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&dt));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?));
    }
    None
}

fn require_columns(df: &DataFrame, required: &[&str], table: &str) -> crate::Result<()> {
    let names = df.get_column_names();
    for column in required {
        if !names.contains(column) {
            anyhow::bail!("the '{}' column is missing from the {} dataset", column, table);
        }
    }
    Ok(())
}

/// Extract a column as strings, casting whatever dtype inference produced.
fn str_column(df: &DataFrame, name: &str) -> crate::Result<Vec<Option<String>>> {
    let series = df.column(name)?.cast(&DataType::String)?;
    Ok(series
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

/// Extract a column as f64; non-numeric cells become `None` via the
/// non-strict cast rather than failing the whole load.
fn f64_column(df: &DataFrame, name: &str) -> crate::Result<Vec<Option<f64>>> {
    let series = df.column(name)?.cast(&DataType::Float64)?;
    Ok(series.f64()?.into_iter().collect())
}

fn i64_column(df: &DataFrame, name: &str) -> crate::Result<Vec<Option<i64>>> {
    let series = df.column(name)?.cast(&DataType::Int64)?;
    Ok(series.i64()?.into_iter().collect())
}

fn optional_str_column(df: &DataFrame, name: &str) -> Vec<Option<String>> {
    str_column(df, name).unwrap_or_else(|_| vec![None; df.height()])
}

fn optional_f64_column(df: &DataFrame, name: &str) -> Vec<Option<f64>> {
    f64_column(df, name).unwrap_or_else(|_| vec![None; df.height()])
}

fn optional_i64_column(df: &DataFrame, name: &str) -> Vec<Option<i64>> {
    i64_column(df, name).unwrap_or_else(|_| vec![None; df.height()])
}

fn column_value(column: &[Option<String>], index: usize) -> String {
    column
        .get(index)
        .and_then(|v| v.as_deref())
        .unwrap_or_default()
        .to_string()
}
