//! Salescope CLI: load the sales and customer exports, run the selected
//! analyses and write chart PNGs.
//!
//! Every metric is computed independently; a failure in one degrades to a
//! warning on stderr and the remaining metrics still run.

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use salescope::cli::Metric;
use salescope::{
    geo, load_city_reference, load_country_reference, load_customer_data, load_sales_data,
    ranking, rates, segment, trend, viz, Args, CustomerData, SalesData,
};
use std::time::Instant;

fn main() -> Result<()> {
    let args = Args::parse();

    if args.verbose {
        println!("Salescope - Sales & Customer Analytics");
        println!("======================================\n");
    }

    let start_time = Instant::now();

    if args.verbose {
        println!("Loading sales data from: {}", args.sales);
        println!("Loading customer data from: {}", args.customers);
    }
    let sales = load_sales_data(&args.sales)?;
    let customers = load_customer_data(&args.customers)?;

    println!(
        "✓ Data loaded: {} sales rows, {} customers",
        sales.records.len(),
        customers.records.len()
    );
    if args.verbose && (sales.dropped_rows > 0 || customers.dropped_rows > 0) {
        println!(
            "  Dropped rows: {} sales, {} customers",
            sales.dropped_rows, customers.dropped_rows
        );
    }

    if args.metric == Metric::All {
        run_full_report(&args, &sales, &customers)?;
    } else {
        run_single_metric(&args, &sales, &customers);
    }

    if args.verbose {
        println!(
            "\nTotal processing time: {:.2}s",
            start_time.elapsed().as_secs_f64()
        );
    }

    Ok(())
}

/// Render the whole chart catalog plus the printed summaries.
fn run_full_report(args: &Args, sales: &SalesData, customers: &CustomerData) -> Result<()> {
    println!("\n=== Full Report ===");

    let written = viz::generate_report(sales, customers, args.top_n, Utc::now(), &args.output)?;
    println!("✓ {} charts written to {}/", written.len(), args.output);
    if args.verbose {
        for path in &written {
            println!("  {}", path);
        }
    }

    viz::print_rate_summary(sales, customers);
    run_geo(args, customers);

    Ok(())
}

/// Compute and print exactly one metric.
fn run_single_metric(args: &Args, sales: &SalesData, customers: &CustomerData) {
    let top_n = args.top_n;
    match args.metric {
        Metric::All => unreachable!("handled by run_full_report"),
        Metric::MonthlyRevenue => print_buckets("Revenue by month", trend::revenue_by_month(sales)),
        Metric::QuarterlyRevenue => {
            print_buckets("Revenue by quarter", trend::revenue_by_quarter(sales))
        }
        Metric::YearlyRevenue => print_buckets("Revenue by year", trend::revenue_by_year(sales)),
        Metric::MonthlyGrowth => {
            println!("\n=== Monthly growth rate ===");
            for point in trend::monthly_growth_rate(sales) {
                match point.growth_pct {
                    Some(growth) => println!(
                        "{:10} {:>12.2} {:>+8.2}%",
                        point.period, point.revenue, growth
                    ),
                    None => println!("{:10} {:>12.2}        -", point.period, point.revenue),
                }
            }
        }
        Metric::Aov => print_buckets("Average order value by month", trend::aov_by_month(sales)),
        Metric::QuarterlyOrders => {
            print_buckets("Orders by quarter", trend::orders_by_quarter(sales))
        }
        Metric::WeekdayHourly => {
            let summary = trend::weekday_hourly_averages(sales, Utc::now());
            print_buckets("Average revenue by weekday (last 90 days)", summary.daily);
            print_buckets("Average revenue by hour (last 90 days)", summary.hourly);
        }
        Metric::Rates => viz::print_rate_summary(sales, customers),
        Metric::TopProducts => print_ranked(
            "Top products by revenue",
            ranking::top_products_by_revenue(sales, top_n),
        ),
        Metric::ProductShare => {
            println!("\n=== Product share of volume and revenue ===");
            for share in ranking::product_share(sales, top_n) {
                println!(
                    "{:30} volume {:6.2}%  revenue {:6.2}%  (${:.2})",
                    share.product, share.volume_pct, share.revenue_pct, share.revenue
                );
            }
        }
        Metric::TopDiscounts => match ranking::top_discount_codes(sales, top_n) {
            Ok(codes) => print_ranked("Top discount codes", codes),
            Err(e) => eprintln!("warning: top-discounts: {:#}", e),
        },
        Metric::TopRegions => print_ranked(
            "Top regions by revenue",
            ranking::top_regions_by_revenue(sales, top_n),
        ),
        Metric::RegionGrowth => {
            println!("\n=== Region sales growth ===");
            for region in ranking::region_sales_growth(sales, top_n) {
                println!("{}:", region.region);
                for point in region.points {
                    match point.growth_pct {
                        Some(growth) => println!(
                            "  {:10} {:>12.2} {:>+8.2}%",
                            point.period, point.revenue, growth
                        ),
                        None => println!("  {:10} {:>12.2}        -", point.period, point.revenue),
                    }
                }
            }
        }
        Metric::TopLocations => print_ranked(
            "Top locations by customer count",
            ranking::top_locations_by_customers(customers, top_n),
        ),
        Metric::SpendSegments => {
            print_segments("Spend level segments", segment::segment_by_spend_level(customers))
        }
        Metric::FrequencySegments => print_segments(
            "Order frequency segments",
            segment::segment_by_order_frequency(customers),
        ),
        Metric::NewVsReturning => {
            println!("\n=== New vs. returning customers ===");
            for split in segment::new_vs_returning(customers) {
                println!(
                    "{:10} {:6} customers ({:.1}%)",
                    split.customer_type.as_str(),
                    split.count,
                    split.proportion
                );
            }
            println!(
                "Retention rate: {:.2}%",
                rates::retention_rate(customers).value
            );
        }
        Metric::Geo => run_geo(args, customers),
    }
}

/// Resolve and print the geographic distribution when both reference tables
/// were supplied; otherwise explain what is missing.
fn run_geo(args: &Args, customers: &CustomerData) {
    let (cities_path, countries_path) = match (&args.cities, &args.countries) {
        (Some(cities), Some(countries)) => (cities, countries),
        _ => {
            println!("\nGeographic distribution skipped: pass --cities and --countries reference CSVs to enable it.");
            return;
        }
    };

    let resolution = load_city_reference(cities_path)
        .and_then(|cities| {
            let countries = load_country_reference(countries_path)?;
            Ok(geo::resolve_customer_geo(customers, &cities, &countries))
        });
    match resolution {
        Ok(resolution) => viz::print_geo_summary(&resolution),
        Err(e) => eprintln!("warning: geographic distribution: {:#}", e),
    }
}

fn print_buckets(title: &str, buckets: Vec<trend::PeriodBucket>) {
    println!("\n=== {} ===", title);
    if buckets.is_empty() {
        println!("(no data)");
        return;
    }
    for bucket in buckets {
        println!("{:12} {:>12.2}", bucket.period, bucket.value);
    }
}

fn print_ranked(title: &str, entries: Vec<ranking::RankedEntry>) {
    println!("\n=== {} ===", title);
    if entries.is_empty() {
        println!("(no data)");
        return;
    }
    for (i, entry) in entries.iter().enumerate() {
        println!("{:2}. {:30} {:>12.2}", i + 1, entry.key, entry.value);
    }
}

fn print_segments(title: &str, buckets: Vec<segment::SegmentBucket>) {
    println!("\n=== {} ===", title);
    if buckets.is_empty() {
        println!("(no data)");
        return;
    }
    for bucket in buckets {
        println!("{:16} {:6} customers", bucket.label, bucket.count);
    }
}
