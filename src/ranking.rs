//! Top-N ranking transforms
//!
//! Group by one categorical key, aggregate a measure (sum for revenue,
//! count for usage), stable sort descending and truncate. Discount codes and
//! locations are trimmed and lower-cased before grouping so case and
//! whitespace variants land in the same bucket; product names are ranked
//! as-is.

use crate::data::{CustomerData, SalesData};
use crate::round2;
use crate::trend::GrowthPoint;
use chrono::Datelike;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Default truncation for every ranking.
pub const DEFAULT_TOP_N: usize = 10;

/// One ranked row: categorical key plus the aggregated measure.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedEntry {
    pub key: String,
    pub value: f64,
}

/// A product's share of total sales volume and revenue.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductShare {
    pub product: String,
    pub volume_pct: f64,
    pub revenue_pct: f64,
    pub revenue: f64,
}

/// Monthly revenue trend for a single region.
#[derive(Debug, Clone)]
pub struct RegionTrend {
    pub region: String,
    pub points: Vec<GrowthPoint>,
}

/// Top products by summed revenue.
pub fn top_products_by_revenue(sales: &SalesData, top_n: usize) -> Vec<RankedEntry> {
    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
    for record in &sales.records {
        *totals.entry(&record.product_name).or_insert(0.0) += record.revenue;
    }
    rank(totals.into_iter().map(|(k, v)| (k.to_string(), v)), top_n)
}

/// Most-used discount codes by line-item count. The column itself is part
/// of the contract: its absence is a schema error, not an empty result.
pub fn top_discount_codes(sales: &SalesData, top_n: usize) -> crate::Result<Vec<RankedEntry>> {
    if !sales.has_discount_codes {
        anyhow::bail!("the 'discount_code' column is missing from the dataset");
    }
    let mut usage: BTreeMap<String, f64> = BTreeMap::new();
    for record in &sales.records {
        if let Some(code) = record.discount_code.as_deref() {
            *usage.entry(normalize_key(code)).or_insert(0.0) += 1.0;
        }
    }
    Ok(rank(usage.into_iter(), top_n))
}

/// Top regions by summed revenue, on the normalized location string.
pub fn top_regions_by_revenue(sales: &SalesData, top_n: usize) -> Vec<RankedEntry> {
    let mut totals: BTreeMap<String, f64> = BTreeMap::new();
    for record in &sales.records {
        *totals.entry(normalize_key(&record.location)).or_insert(0.0) += record.revenue;
    }
    rank(totals.into_iter(), top_n)
}

/// Top locations by customer count.
pub fn top_locations_by_customers(customers: &CustomerData, top_n: usize) -> Vec<RankedEntry> {
    let mut counts: BTreeMap<String, f64> = BTreeMap::new();
    for record in &customers.records {
        *counts.entry(normalize_key(&record.location)).or_insert(0.0) += 1.0;
    }
    rank(counts.into_iter(), top_n)
}

/// Per-product percentage of total line-item count and of total revenue,
/// ranked by revenue share.
pub fn product_share(sales: &SalesData, top_n: usize) -> Vec<ProductShare> {
    let mut per_product: BTreeMap<&str, (usize, f64)> = BTreeMap::new();
    for record in &sales.records {
        let entry = per_product.entry(&record.product_name).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += record.revenue;
    }

    let total_rows: usize = per_product.values().map(|(count, _)| count).sum();
    let total_revenue: f64 = per_product.values().map(|(_, revenue)| revenue).sum();
    if total_rows == 0 {
        return Vec::new();
    }

    let mut shares: Vec<ProductShare> = per_product
        .into_iter()
        .map(|(product, (count, revenue))| ProductShare {
            product: product.to_string(),
            volume_pct: round2(count as f64 / total_rows as f64 * 100.0),
            revenue_pct: if total_revenue != 0.0 {
                round2(revenue / total_revenue * 100.0)
            } else {
                0.0
            },
            revenue,
        })
        .collect();
    shares.sort_by(|a, b| {
        b.revenue_pct
            .partial_cmp(&a.revenue_pct)
            .unwrap_or(Ordering::Equal)
    });
    shares.truncate(top_n);
    shares
}

/// Monthly revenue and growth for the top-N regions by total revenue.
pub fn region_sales_growth(sales: &SalesData, top_n: usize) -> Vec<RegionTrend> {
    let top_regions = top_regions_by_revenue(sales, top_n);

    top_regions
        .into_iter()
        .map(|entry| {
            let mut monthly: BTreeMap<String, f64> = BTreeMap::new();
            for record in &sales.records {
                if normalize_key(&record.location) == entry.key {
                    let key = format!(
                        "{:04}-{:02}",
                        record.order_date.year(),
                        record.order_date.month()
                    );
                    *monthly.entry(key).or_insert(0.0) += record.revenue;
                }
            }

            let mut points = Vec::new();
            let mut previous: Option<f64> = None;
            for (period, revenue) in monthly {
                let growth_pct = match previous {
                    Some(prev) if prev != 0.0 => Some(round2((revenue - prev) / prev * 100.0)),
                    _ => None,
                };
                points.push(GrowthPoint {
                    period,
                    revenue,
                    growth_pct,
                });
                previous = Some(revenue);
            }
            RegionTrend {
                region: entry.key,
                points,
            }
        })
        .collect()
}

/// Stable descending sort by value, truncated to `top_n`. Grouping comes in
/// key order from a BTreeMap, so ties keep a deterministic order and the
/// whole ranking is idempotent.
fn rank(groups: impl Iterator<Item = (String, f64)>, top_n: usize) -> Vec<RankedEntry> {
    let mut entries: Vec<RankedEntry> = groups
        .map(|(key, value)| RankedEntry { key, value })
        .collect();
    entries.sort_by(|a, b| b.value.partial_cmp(&a.value).unwrap_or(Ordering::Equal));
    entries.truncate(top_n);
    entries
}

fn normalize_key(raw: &str) -> String {
    raw.trim().to_lowercase()
}
