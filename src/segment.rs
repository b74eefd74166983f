//! Customer segmentation by dynamic binning
//!
//! Bin edges are data dependent: the observed minimum, a fixed ladder of
//! breakpoints, and the observed maximum when it exceeds the ladder top.
//! Only bins that actually contain customers are returned, in edge order.

use crate::data::{CustomerData, CustomerType};
use crate::round2;

/// Spend breakpoints in the dataset's currency. The ladder tops out at 1500;
/// anything above the top edge lands in the open-ended final bin.
pub const SPEND_LADDER: [f64; 4] = [100.0, 500.0, 1000.0, 1500.0];

/// Order-count breakpoints for frequency segmentation.
pub const ORDER_FREQUENCY_LADDER: [f64; 4] = [1.0, 5.0, 10.0, 20.0];

/// One labeled bin with the number of customers falling into it.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentBucket {
    pub label: String,
    pub count: usize,
}

/// Counts and proportion of new versus returning customers.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerTypeSplit {
    pub customer_type: CustomerType,
    pub count: usize,
    pub proportion: f64,
}

/// Segment customers into spend-level bins.
pub fn segment_by_spend_level(customers: &CustomerData) -> Vec<SegmentBucket> {
    let values: Vec<f64> = customers.records.iter().map(|c| c.total_spent).collect();
    segment(&values, &SPEND_LADDER, "")
}

/// Segment customers into order-frequency bins.
pub fn segment_by_order_frequency(customers: &CustomerData) -> Vec<SegmentBucket> {
    let values: Vec<f64> = customers
        .records
        .iter()
        .map(|c| c.total_orders as f64)
        .collect();
    segment(&values, &ORDER_FREQUENCY_LADDER, " Orders")
}

/// Split customers into new and returning with proportions of the total.
pub fn new_vs_returning(customers: &CustomerData) -> Vec<CustomerTypeSplit> {
    let total = customers.records.len();
    if total == 0 {
        return Vec::new();
    }
    let returning = customers
        .records
        .iter()
        .filter(|c| c.customer_type == CustomerType::Returning)
        .count();
    let new = total - returning;

    [
        (CustomerType::Returning, returning),
        (CustomerType::New, new),
    ]
    .into_iter()
    .filter(|(_, count)| *count > 0)
    .map(|(customer_type, count)| CustomerTypeSplit {
        customer_type,
        count,
        proportion: round2(count as f64 / total as f64 * 100.0),
    })
    .collect()
}

/// Build bin edges from the observed range and a breakpoint ladder:
/// sorted unique union of the minimum, the ladder, and the maximum when it
/// exceeds the ladder top.
pub fn bin_edges(min: f64, max: f64, ladder: &[f64]) -> Vec<f64> {
    let mut edges = vec![min];
    edges.extend_from_slice(ladder);
    if let Some(&top) = ladder.last() {
        if max > top {
            edges.push(max);
        }
    }
    edges.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    edges.dedup();
    edges
}

/// Labels for consecutive edge pairs: interior bins are `"low-high"`, the
/// final bin is the open-ended `"low+"`.
pub fn bin_labels(edges: &[f64], suffix: &str) -> Vec<String> {
    let mut labels = Vec::new();
    for i in 0..edges.len().saturating_sub(1) {
        if i == edges.len() - 2 {
            labels.push(format!("{}+{}", fmt_edge(edges[i]), suffix));
        } else {
            labels.push(format!(
                "{}-{}{}",
                fmt_edge(edges[i]),
                fmt_edge(edges[i + 1]),
                suffix
            ));
        }
    }
    labels
}

fn segment(values: &[f64], ladder: &[f64], suffix: &str) -> Vec<SegmentBucket> {
    if values.is_empty() {
        return Vec::new();
    }
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    let edges = bin_edges(min, max, ladder);
    if edges.len() < 2 {
        return Vec::new();
    }
    let labels = bin_labels(&edges, suffix);

    let mut counts = vec![0usize; labels.len()];
    for &value in values {
        if let Some(index) = bin_index(value, &edges) {
            counts[index] += 1;
        }
    }

    // Sparse output: only bins that actually contain customers
    labels
        .into_iter()
        .zip(counts)
        .filter(|(_, count)| *count > 0)
        .map(|(label, count)| SegmentBucket { label, count })
        .collect()
}

/// Assign a value to its bin. Bins are right-closed, with the first bin
/// also including its lower edge.
fn bin_index(value: f64, edges: &[f64]) -> Option<usize> {
    for i in 0..edges.len() - 1 {
        let lower_ok = if i == 0 {
            value >= edges[0]
        } else {
            value > edges[i]
        };
        if lower_ok && value <= edges[i + 1] {
            return Some(i);
        }
    }
    None
}

/// Print an edge without a trailing ".0" when it is an integer.
fn fmt_edge(edge: f64) -> String {
    if edge.fract() == 0.0 && edge.abs() < 1e15 {
        format!("{}", edge as i64)
    } else {
        format!("{}", edge)
    }
}
