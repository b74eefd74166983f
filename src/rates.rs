//! Rate and ratio computations
//!
//! Each rate is `distinct numerator count / distinct denominator count * 100`
//! over order identifiers (one order may span several line-item rows), rounded
//! to two decimals. A zero denominator is a legitimate data state and yields
//! 0 rather than an error.

use crate::data::{CustomerData, CustomerType, SalesData};
use crate::round2;
use std::collections::HashSet;

/// A percentage in [0, 100].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rate {
    pub value: f64,
}

impl Rate {
    fn from_counts(numerator: usize, denominator: usize) -> Rate {
        let value = if denominator > 0 {
            round2(numerator as f64 / denominator as f64 * 100.0)
        } else {
            0.0
        };
        Rate { value }
    }

    /// The gauge annotation shown next to the needle. It compares the value
    /// against itself, which is how the dashboard has always rendered it.
    pub fn threshold_label(&self) -> String {
        format!("Threshold: {:.2}%", self.value)
    }
}

/// Fraction of distinct orders where a discount was applied.
pub fn discount_usage_rate(sales: &SalesData) -> Rate {
    order_rate(sales, |r| r.discount_amount > 0.0)
}

/// Fraction of distinct orders with a positive refund amount.
pub fn refund_rate(sales: &SalesData) -> Rate {
    order_rate(sales, |r| r.refund_amount > 0.0)
}

/// Fraction of distinct orders marked fulfilled, case-insensitively.
pub fn fulfillment_rate(sales: &SalesData) -> Rate {
    order_rate(sales, |r| {
        r.fulfillment_status.trim().eq_ignore_ascii_case("fulfilled")
    })
}

/// Fraction of customers flagged as returning.
pub fn retention_rate(customers: &CustomerData) -> Rate {
    let total = customers.records.len();
    let returning = customers
        .records
        .iter()
        .filter(|c| c.customer_type == CustomerType::Returning)
        .count();
    Rate::from_counts(returning, total)
}

/// Mean discount over line items that actually carried one; 0 when none did.
pub fn average_discount_amount(sales: &SalesData) -> f64 {
    let discounted: Vec<f64> = sales
        .records
        .iter()
        .filter(|r| r.discount_amount > 0.0)
        .map(|r| r.discount_amount)
        .collect();
    if discounted.is_empty() {
        return 0.0;
    }
    round2(discounted.iter().sum::<f64>() / discounted.len() as f64)
}

fn order_rate(sales: &SalesData, matches: impl Fn(&crate::data::SalesRecord) -> bool) -> Rate {
    let mut all_orders: HashSet<&str> = HashSet::new();
    let mut matching_orders: HashSet<&str> = HashSet::new();
    for record in &sales.records {
        all_orders.insert(&record.order_id);
        if matches(record) {
            matching_orders.insert(&record.order_id);
        }
    }
    Rate::from_counts(matching_orders.len(), all_orders.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{CustomerRecord, SalesRecord};

    fn sale(order_id: &str, discount: f64, refund: f64, status: &str) -> SalesRecord {
        SalesRecord {
            order_id: order_id.to_string(),
            order_date: crate::data::parse_timestamp("2024-01-10 10:00:00").unwrap(),
            product_name: "Widget".to_string(),
            sales_channel: "online".to_string(),
            fulfillment_status: status.to_string(),
            revenue: 100.0,
            discount_amount: discount,
            refund_amount: refund,
            quantity: 1,
            location: "berlin".to_string(),
            discount_code: None,
        }
    }

    fn sales_data(records: Vec<SalesRecord>) -> SalesData {
        SalesData {
            records,
            dropped_rows: 0,
            has_discount_codes: false,
        }
    }

    fn customer(id: &str, customer_type: CustomerType) -> CustomerRecord {
        CustomerRecord {
            customer_id: id.to_string(),
            email: format!("{}@example.com", id),
            total_orders: 1,
            total_spent: 100.0,
            location: "berlin".to_string(),
            iso2: "de".to_string(),
            customer_type,
        }
    }

    #[test]
    fn test_discount_usage_rate_scenario() {
        // 4 distinct orders, 1 discounted => 25.0
        let sales = sales_data(vec![
            sale("1", 5.0, 0.0, "fulfilled"),
            sale("2", 0.0, 0.0, "fulfilled"),
            sale("3", 0.0, 0.0, "fulfilled"),
            sale("4", 0.0, 0.0, "fulfilled"),
        ]);
        assert_eq!(discount_usage_rate(&sales).value, 25.0);
    }

    #[test]
    fn test_distinct_orders_not_rows() {
        // Order 1 has two line items, only one discounted; still one
        // discounted order out of two total.
        let sales = sales_data(vec![
            sale("1", 5.0, 0.0, "fulfilled"),
            sale("1", 0.0, 0.0, "fulfilled"),
            sale("2", 0.0, 0.0, "fulfilled"),
        ]);
        assert_eq!(discount_usage_rate(&sales).value, 50.0);
    }

    #[test]
    fn test_refund_rate() {
        let sales = sales_data(vec![
            sale("1", 0.0, 20.0, "fulfilled"),
            sale("2", 0.0, 0.0, "fulfilled"),
        ]);
        assert_eq!(refund_rate(&sales).value, 50.0);
    }

    #[test]
    fn test_fulfillment_rate_case_insensitive() {
        let sales = sales_data(vec![
            sale("1", 0.0, 0.0, "Fulfilled"),
            sale("2", 0.0, 0.0, "FULFILLED"),
            sale("3", 0.0, 0.0, "unfulfilled"),
        ]);
        let rate = fulfillment_rate(&sales);
        assert_eq!(rate.value, 66.67);
        assert!(rate.value >= 0.0 && rate.value <= 100.0);
    }

    #[test]
    fn test_zero_denominator_yields_zero() {
        let sales = sales_data(vec![]);
        assert_eq!(discount_usage_rate(&sales).value, 0.0);
        assert_eq!(refund_rate(&sales).value, 0.0);
        assert_eq!(fulfillment_rate(&sales).value, 0.0);

        let customers = CustomerData {
            records: vec![],
            dropped_rows: 0,
        };
        assert_eq!(retention_rate(&customers).value, 0.0);
        assert_eq!(average_discount_amount(&sales), 0.0);
    }

    #[test]
    fn test_retention_rate() {
        let customers = CustomerData {
            records: vec![
                customer("c1", CustomerType::Returning),
                customer("c2", CustomerType::New),
                customer("c3", CustomerType::New),
                customer("c4", CustomerType::Returning),
            ],
            dropped_rows: 0,
        };
        assert_eq!(retention_rate(&customers).value, 50.0);
    }

    #[test]
    fn test_average_discount_amount() {
        let sales = sales_data(vec![
            sale("1", 10.0, 0.0, "fulfilled"),
            sale("2", 5.0, 0.0, "fulfilled"),
            sale("3", 0.0, 0.0, "fulfilled"),
        ]);
        assert_eq!(average_discount_amount(&sales), 7.5);
    }

    #[test]
    fn test_threshold_label_matches_value() {
        let rate = Rate { value: 42.5 };
        assert_eq!(rate.threshold_label(), "Threshold: 42.50%");
    }
}
