//! Chart rendering with Plotters
//!
//! Every transform returns labeled (period/key, value) rows; the renderers
//! here bind those to a categorical x axis without further inference. Bars
//! are drawn as rectangles over an index axis with a label formatter, the
//! same scheme for rankings, segments and period buckets alike.

use crate::data::{CustomerData, SalesData};
use crate::geo::GeoResolution;
use crate::trend::GrowthPoint;
use crate::{ranking, rates, segment, trend};
use chrono::{DateTime, Utc};
use plotters::prelude::*;
use std::path::Path;

/// Color palette cycled across bars
const BAR_COLORS: [RGBColor; 5] = [
    RGBColor(102, 153, 204),
    RGBColor(204, 102, 119),
    RGBColor(102, 204, 153),
    RGBColor(221, 187, 102),
    RGBColor(170, 136, 204),
];

/// Render labeled values as a bar chart PNG.
pub fn render_bar_chart(
    data: &[(String, f64)],
    title: &str,
    x_desc: &str,
    y_desc: &str,
    output_path: &str,
) -> crate::Result<()> {
    if data.is_empty() {
        anyhow::bail!("no data to display for '{}'", title);
    }

    let max_value = data
        .iter()
        .map(|(_, v)| *v)
        .fold(f64::NEG_INFINITY, f64::max)
        .max(0.0);

    let root = BitMapBackend::new(output_path, (900, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 28))
        .margin(10)
        .x_label_area_size(70)
        .y_label_area_size(70)
        .build_cartesian_2d(0f64..data.len() as f64, 0f64..(max_value * 1.1).max(1.0))?;

    chart
        .configure_mesh()
        .x_desc(x_desc)
        .y_desc(y_desc)
        .x_labels(data.len().min(24))
        .x_label_formatter(&|x| {
            let index = x.floor() as usize;
            data.get(index)
                .map(|(label, _)| label.clone())
                .unwrap_or_default()
        })
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    for (i, (_, value)) in data.iter().enumerate() {
        let color = &BAR_COLORS[i % BAR_COLORS.len()];
        chart.draw_series(std::iter::once(Rectangle::new(
            [(i as f64 + 0.1, 0.0), (i as f64 + 0.9, *value)],
            color.filled(),
        )))?;
    }

    root.present()?;
    Ok(())
}

/// Render a growth series as a line chart PNG. Periods without a defined
/// growth value (the first one) are skipped, not drawn as zero.
pub fn render_growth_chart(
    points: &[GrowthPoint],
    title: &str,
    output_path: &str,
) -> crate::Result<()> {
    let series: Vec<(usize, f64)> = points
        .iter()
        .enumerate()
        .filter_map(|(i, p)| p.growth_pct.map(|g| (i, g)))
        .collect();
    if series.is_empty() {
        anyhow::bail!("no growth data to display for '{}'", title);
    }

    let y_min = series.iter().map(|(_, v)| *v).fold(f64::INFINITY, f64::min);
    let y_max = series
        .iter()
        .map(|(_, v)| *v)
        .fold(f64::NEG_INFINITY, f64::max);
    let pad = ((y_max - y_min).abs() * 0.1).max(1.0);

    let root = BitMapBackend::new(output_path, (900, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 28))
        .margin(10)
        .x_label_area_size(70)
        .y_label_area_size(70)
        .build_cartesian_2d(0f64..points.len() as f64, (y_min - pad)..(y_max + pad))?;

    chart
        .configure_mesh()
        .x_desc("Period")
        .y_desc("Growth Rate (%)")
        .x_labels(points.len().min(24))
        .x_label_formatter(&|x| {
            let index = x.floor() as usize;
            points
                .get(index)
                .map(|p| p.period.clone())
                .unwrap_or_default()
        })
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    chart.draw_series(LineSeries::new(
        series.iter().map(|&(i, v)| (i as f64 + 0.5, v)),
        &BAR_COLORS[0],
    ))?;
    chart.draw_series(
        series
            .iter()
            .map(|&(i, v)| Circle::new((i as f64 + 0.5, v), 4, BAR_COLORS[0].filled())),
    )?;

    root.present()?;
    Ok(())
}

/// Print every rate with its gauge annotation to stdout.
pub fn print_rate_summary(sales: &SalesData, customers: &CustomerData) {
    println!("\n=== Rates ===");
    let rows = [
        ("Discount usage rate", rates::discount_usage_rate(sales)),
        ("Refund rate", rates::refund_rate(sales)),
        ("Fulfillment rate", rates::fulfillment_rate(sales)),
        ("Customer retention rate", rates::retention_rate(customers)),
    ];
    for (name, rate) in rows {
        println!("{:24} {:6.2}%   ({})", name, rate.value, rate.threshold_label());
    }
    println!(
        "{:24} ${:.2}",
        "Average discount amount",
        rates::average_discount_amount(sales)
    );
}

/// Print the resolved geographic distribution, or the no-data message.
pub fn print_geo_summary(resolution: &GeoResolution) {
    println!("\n=== Customer Distribution ===");
    match resolution {
        GeoResolution::Resolved(summary) => {
            println!(
                "Match level: {} ({} locations), map center ({:.3}, {:.3})",
                summary.match_type.as_str(),
                summary.points.len(),
                summary.center.0,
                summary.center.1
            );
            for point in &summary.points {
                println!(
                    "  {:20} {:4} customers  ${:>10.2}  ({:.3}, {:.3})",
                    point.location, point.total_customers, point.total_spent, point.lat, point.lng
                );
            }
        }
        GeoResolution::NoData => {
            println!("No data to display: locations matched neither reference table.");
        }
    }
}

/// Generate the full chart catalog into `output_dir`, one PNG per metric.
/// Individual failures degrade to a warning for that chart only.
pub fn generate_report(
    sales: &SalesData,
    customers: &CustomerData,
    top_n: usize,
    now: DateTime<Utc>,
    output_dir: &str,
) -> crate::Result<Vec<String>> {
    std::fs::create_dir_all(output_dir)?;
    let mut written = Vec::new();

    let mut render = |name: &str, result: crate::Result<()>| match result {
        Ok(()) => written.push(format!("{}/{}.png", output_dir, name)),
        Err(e) => eprintln!("warning: skipping chart '{}': {:#}", name, e),
    };

    let path = |name: &str| {
        Path::new(output_dir)
            .join(format!("{}.png", name))
            .to_string_lossy()
            .into_owned()
    };

    let monthly = bucket_pairs(trend::revenue_by_month(sales));
    render(
        "revenue_by_month",
        render_bar_chart(
            &monthly,
            "Total Sales Revenue by Month",
            "Month",
            "Revenue ($)",
            &path("revenue_by_month"),
        ),
    );

    let quarterly = bucket_pairs(trend::revenue_by_quarter(sales));
    render(
        "revenue_by_quarter",
        render_bar_chart(
            &quarterly,
            "Total Sales Revenue by Quarter",
            "Quarter",
            "Revenue ($)",
            &path("revenue_by_quarter"),
        ),
    );

    let yearly = bucket_pairs(trend::revenue_by_year(sales));
    render(
        "revenue_by_year",
        render_bar_chart(
            &yearly,
            "Total Sales Revenue by Year",
            "Year",
            "Revenue ($)",
            &path("revenue_by_year"),
        ),
    );

    render(
        "monthly_growth",
        render_growth_chart(
            &trend::monthly_growth_rate(sales),
            "Monthly Sales Growth Rate",
            &path("monthly_growth"),
        ),
    );

    let aov = bucket_pairs(trend::aov_by_month(sales));
    render(
        "aov_by_month",
        render_bar_chart(
            &aov,
            "Average Order Value by Month",
            "Month",
            "AOV ($)",
            &path("aov_by_month"),
        ),
    );

    let orders = bucket_pairs(trend::orders_by_quarter(sales));
    render(
        "orders_by_quarter",
        render_bar_chart(
            &orders,
            "Total Orders by Quarter",
            "Quarter",
            "Orders",
            &path("orders_by_quarter"),
        ),
    );

    let weekday_hourly = trend::weekday_hourly_averages(sales, now);
    render(
        "weekday_revenue",
        render_bar_chart(
            &bucket_pairs(weekday_hourly.daily),
            "Average Daily Revenue (Last 90 Days)",
            "Day of Week",
            "Average Revenue ($)",
            &path("weekday_revenue"),
        ),
    );
    render(
        "hourly_revenue",
        render_bar_chart(
            &bucket_pairs(weekday_hourly.hourly),
            "Average Hourly Revenue (Last 90 Days)",
            "Hour of Day",
            "Average Revenue ($)",
            &path("hourly_revenue"),
        ),
    );

    let products = ranked_pairs(ranking::top_products_by_revenue(sales, top_n));
    render(
        "top_products",
        render_bar_chart(
            &products,
            &format!("Top {} Selling Products by Revenue", top_n),
            "Product",
            "Revenue ($)",
            &path("top_products"),
        ),
    );

    match ranking::top_discount_codes(sales, top_n) {
        Ok(codes) => render(
            "top_discounts",
            render_bar_chart(
                &ranked_pairs(codes),
                &format!("Top {} Most-Used Discounts", top_n),
                "Discount Code",
                "Uses",
                &path("top_discounts"),
            ),
        ),
        Err(e) => eprintln!("warning: skipping chart 'top_discounts': {:#}", e),
    }

    let regions = ranked_pairs(ranking::top_regions_by_revenue(sales, top_n));
    render(
        "top_regions",
        render_bar_chart(
            &regions,
            &format!("Top {} Regions by Sales Revenue", top_n),
            "Region",
            "Revenue ($)",
            &path("top_regions"),
        ),
    );

    let locations = ranked_pairs(ranking::top_locations_by_customers(customers, top_n));
    render(
        "top_locations",
        render_bar_chart(
            &locations,
            &format!("Top {} Locations by Customer Count", top_n),
            "Location",
            "Customers",
            &path("top_locations"),
        ),
    );

    let spend = segment_pairs(segment::segment_by_spend_level(customers));
    render(
        "spend_segments",
        render_bar_chart(
            &spend,
            "Customer Spend Level Segmentation",
            "Spend Level",
            "Customer Count",
            &path("spend_segments"),
        ),
    );

    let frequency = segment_pairs(segment::segment_by_order_frequency(customers));
    render(
        "order_frequency_segments",
        render_bar_chart(
            &frequency,
            "Customer Order Frequency Segmentation",
            "Order Frequency",
            "Customer Count",
            &path("order_frequency_segments"),
        ),
    );

    let split: Vec<(String, f64)> = segment::new_vs_returning(customers)
        .into_iter()
        .map(|s| (s.customer_type.as_str().to_string(), s.count as f64))
        .collect();
    render(
        "new_vs_returning",
        render_bar_chart(
            &split,
            "New vs. Returning Customers",
            "Customer Type",
            "Customers",
            &path("new_vs_returning"),
        ),
    );

    Ok(written)
}

fn bucket_pairs(buckets: Vec<trend::PeriodBucket>) -> Vec<(String, f64)> {
    buckets.into_iter().map(|b| (b.period, b.value)).collect()
}

fn ranked_pairs(entries: Vec<ranking::RankedEntry>) -> Vec<(String, f64)> {
    entries.into_iter().map(|e| (e.key, e.value)).collect()
}

fn segment_pairs(buckets: Vec<segment::SegmentBucket>) -> Vec<(String, f64)> {
    buckets
        .into_iter()
        .map(|b| (b.label, b.count as f64))
        .collect()
}
