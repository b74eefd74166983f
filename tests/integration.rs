//! Integration tests for Salescope

use chrono::{TimeZone, Utc};
use salescope::{
    geo, load_city_reference, load_country_reference, load_customer_data, load_sales_data,
    ranking, rates, segment, trend, viz, GeoResolution, MatchType,
};
use std::io::Write;
use tempfile::NamedTempFile;

/// Create a sales CSV covering two months, shared order ids, discounts,
/// refunds and mixed fulfillment states.
fn create_sales_csv() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        "order_id,order_date,product_name,sales_channel,fulfillment_status,product_revenue,discount_amount,refund_amount,quantity,location,discount_code"
    )
    .unwrap();

    // Order 1001: two line items in January, one discounted
    writeln!(file, "1001,2024-01-10 09:30:00,Vegan Burger,online,fulfilled,60.0,10.0,0,2,Berlin,SAVE10").unwrap();
    writeln!(file, "1001,2024-01-10 09:30:00,Vegan Steak,online,fulfilled,40.0,0,0,1,Berlin,").unwrap();
    // Order 1002: January, refunded
    writeln!(file, "1002,2024-01-20 14:00:00,Vegan Burger,online,fulfilled,50.0,0,50.0,1,Hamburg,").unwrap();
    // Order 1003: February
    writeln!(file, "1003,2024-02-05 11:00:00,Vegan Steak,pos,unfulfilled,200.0,0,0,1,Berlin,").unwrap();
    // Order 1004: February, second use of the same discount code
    writeln!(file, "1004,2024-02-15 16:00:00,Vegan Burger,online,fulfilled,80.0,8.0,0,2,Munich, save10 ").unwrap();
    // Unparseable date: dropped at load
    writeln!(file, "1005,garbage,Vegan Burger,online,fulfilled,999.0,0,0,1,Berlin,").unwrap();

    file
}

fn create_customer_csv() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        "customer_id,email,total_orders,total_spent,location,iso2,returning_customer"
    )
    .unwrap();
    writeln!(file, "c1,a@example.com,3,450.0,Berlin,DE,yes").unwrap();
    writeln!(file, "c2,b@example.com,1,80.0,Berlin,DE,no").unwrap();
    writeln!(file, "c3,c@example.com,8,2100.0,Hamburg,DE,true").unwrap();
    writeln!(file, "c4,d@example.com,25,1200.0,Atlantis,XX,no").unwrap();
    file
}

fn create_city_csv() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "city,city_ascii,country,iso2,lat,lng").unwrap();
    writeln!(file, "Berlin,Berlin,Germany,DE,52.52,13.405").unwrap();
    writeln!(file, "Hamburg,Hamburg,Germany,DE,53.55,9.993").unwrap();
    file
}

fn create_country_csv() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "country,iso2,lat,lng").unwrap();
    writeln!(file, "Germany,DE,51.16,10.45").unwrap();
    file
}

#[test]
fn test_end_to_end_monthly_trend() {
    let sales_file = create_sales_csv();
    let sales = load_sales_data(sales_file.path().to_str().unwrap()).unwrap();

    // 6 rows in the file, 1 dropped for the bad date
    assert_eq!(sales.records.len(), 5);
    assert_eq!(sales.dropped_rows, 1);

    let monthly = trend::revenue_by_month(&sales);
    assert_eq!(monthly.len(), 2);
    assert_eq!(monthly[0].period, "Jan-2024");
    assert_eq!(monthly[0].value, 150.0);
    assert_eq!(monthly[1].period, "Feb-2024");
    assert_eq!(monthly[1].value, 280.0);

    let growth = trend::monthly_growth_rate(&sales);
    assert_eq!(growth[0].growth_pct, None);
    // (280 - 150) / 150 * 100 = 86.67
    assert_eq!(growth[1].growth_pct, Some(86.67));
}

#[test]
fn test_end_to_end_rates() {
    let sales_file = create_sales_csv();
    let customers_file = create_customer_csv();
    let sales = load_sales_data(sales_file.path().to_str().unwrap()).unwrap();
    let customers = load_customer_data(customers_file.path().to_str().unwrap()).unwrap();

    // 4 distinct orders; 1001 and 1004 discounted => 50%
    assert_eq!(rates::discount_usage_rate(&sales).value, 50.0);
    // Only 1002 refunded => 25%
    assert_eq!(rates::refund_rate(&sales).value, 25.0);
    // 1001, 1002, 1004 fulfilled => 75%
    assert_eq!(rates::fulfillment_rate(&sales).value, 75.0);
    // c1 and c3 returning => 50%
    assert_eq!(rates::retention_rate(&customers).value, 50.0);

    for rate in [
        rates::discount_usage_rate(&sales),
        rates::refund_rate(&sales),
        rates::fulfillment_rate(&sales),
        rates::retention_rate(&customers),
    ] {
        assert!(rate.value >= 0.0 && rate.value <= 100.0);
    }
}

#[test]
fn test_end_to_end_rankings() {
    let sales_file = create_sales_csv();
    let sales = load_sales_data(sales_file.path().to_str().unwrap()).unwrap();

    let products = ranking::top_products_by_revenue(&sales, 10);
    assert_eq!(products[0].key, "Vegan Steak");
    assert_eq!(products[0].value, 240.0);
    assert_eq!(products[1].key, "Vegan Burger");
    assert_eq!(products[1].value, 190.0);

    // Both spellings of save10 collapse into one bucket
    let discounts = ranking::top_discount_codes(&sales, 10).unwrap();
    assert_eq!(discounts.len(), 1);
    assert_eq!(discounts[0].key, "save10");
    assert_eq!(discounts[0].value, 2.0);

    let regions = ranking::top_regions_by_revenue(&sales, 10);
    assert_eq!(regions[0].key, "berlin");
    assert_eq!(regions[0].value, 300.0);

    // Idempotence over repeated runs
    assert_eq!(products, ranking::top_products_by_revenue(&sales, 10));
}

#[test]
fn test_end_to_end_segmentation() {
    let customers_file = create_customer_csv();
    let customers = load_customer_data(customers_file.path().to_str().unwrap()).unwrap();

    let spend = segment::segment_by_spend_level(&customers);
    let total: usize = spend.iter().map(|b| b.count).sum();
    assert_eq!(total, 4);
    // Max spend 2100 > ladder top, so an open-ended final bin exists
    assert!(spend.iter().any(|b| b.label == "1500+"));

    let frequency = segment::segment_by_order_frequency(&customers);
    let total: usize = frequency.iter().map(|b| b.count).sum();
    assert_eq!(total, 4);
    assert!(frequency.iter().any(|b| b.label == "20+ Orders"));
}

#[test]
fn test_end_to_end_geo_city_level() {
    let customers_file = create_customer_csv();
    let city_file = create_city_csv();
    let country_file = create_country_csv();

    let customers = load_customer_data(customers_file.path().to_str().unwrap()).unwrap();
    let cities = load_city_reference(city_file.path().to_str().unwrap()).unwrap();
    let countries = load_country_reference(country_file.path().to_str().unwrap()).unwrap();

    // 3 of 4 customers match the city table: city-level resolution
    match geo::resolve_customer_geo(&customers, &cities, &countries) {
        GeoResolution::Resolved(summary) => {
            assert_eq!(summary.match_type, MatchType::City);
            let berlin = summary
                .points
                .iter()
                .find(|p| p.location == "berlin")
                .expect("berlin point");
            assert_eq!(berlin.total_customers, 2);
            assert_eq!(berlin.total_spent, 530.0);
            // Hamburg's 2100 spend wins the map center
            assert_eq!(summary.center, (53.55, 9.993));
        }
        GeoResolution::NoData => panic!("expected city-level resolution"),
    }
}

#[test]
fn test_end_to_end_geo_country_fallback() {
    let city_file = create_city_csv();
    let country_file = create_country_csv();
    let cities = load_city_reference(city_file.path().to_str().unwrap()).unwrap();
    let countries = load_country_reference(country_file.path().to_str().unwrap()).unwrap();

    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        "customer_id,email,total_orders,total_spent,location,iso2,returning_customer"
    )
    .unwrap();
    writeln!(file, "c1,a@example.com,1,100.0,Germany,DE,no").unwrap();
    writeln!(file, "c2,b@example.com,1,200.0,Germany,DE,no").unwrap();
    writeln!(file, "c3,c@example.com,1,50.0,Nowhere,XX,no").unwrap();
    let customers = load_customer_data(file.path().to_str().unwrap()).unwrap();

    match geo::resolve_customer_geo(&customers, &cities, &countries) {
        GeoResolution::Resolved(summary) => {
            assert_eq!(summary.match_type, MatchType::Country);
            assert_eq!(summary.points.len(), 1);
            assert_eq!(summary.points[0].total_customers, 2);
            assert_eq!(summary.points[0].total_spent, 300.0);
        }
        GeoResolution::NoData => panic!("expected country-level fallback"),
    }
}

#[test]
fn test_schema_error_for_missing_column() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "order_id,product_name,product_revenue").unwrap();
    writeln!(file, "1001,Vegan Burger,50.0").unwrap();

    let result = load_sales_data(file.path().to_str().unwrap());
    assert!(result.is_err());
}

#[test]
fn test_full_report_generation() {
    let sales_file = create_sales_csv();
    let customers_file = create_customer_csv();
    let sales = load_sales_data(sales_file.path().to_str().unwrap()).unwrap();
    let customers = load_customer_data(customers_file.path().to_str().unwrap()).unwrap();

    let output_dir = tempfile::tempdir().unwrap();
    // A fixed reference instant keeps the 90-day window deterministic
    let now = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();

    let written = viz::generate_report(
        &sales,
        &customers,
        10,
        now,
        output_dir.path().to_str().unwrap(),
    )
    .unwrap();

    assert!(!written.is_empty());
    for path in &written {
        assert!(std::path::Path::new(path).exists(), "missing chart {}", path);
    }
}
