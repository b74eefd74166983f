//! Command-line interface definitions and argument parsing

use clap::{Parser, ValueEnum};

/// Which analysis to run. `All` renders the full report catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Metric {
    All,
    MonthlyRevenue,
    QuarterlyRevenue,
    YearlyRevenue,
    MonthlyGrowth,
    Aov,
    QuarterlyOrders,
    WeekdayHourly,
    Rates,
    TopProducts,
    ProductShare,
    TopDiscounts,
    TopRegions,
    RegionGrowth,
    TopLocations,
    SpendSegments,
    FrequencySegments,
    NewVsReturning,
    Geo,
}

/// Aggregate analytics CLI over sales and customer CSV exports
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the sales CSV file
    #[arg(short, long, default_value = "sales.csv")]
    pub sales: String,

    /// Path to the customer CSV file
    #[arg(short, long, default_value = "customers.csv")]
    pub customers: String,

    /// Path to the city-level geographic reference CSV (worldcities layout)
    #[arg(long)]
    pub cities: Option<String>,

    /// Path to the country-level geographic reference CSV
    #[arg(long)]
    pub countries: Option<String>,

    /// Analysis to run
    #[arg(short, long, value_enum, default_value_t = Metric::All)]
    pub metric: Metric,

    /// Number of rows kept by ranking transforms
    #[arg(long, default_value_t = crate::ranking::DEFAULT_TOP_N)]
    pub top_n: usize,

    /// Directory for the generated chart PNGs
    #[arg(short, long, default_value = "report")]
    pub output: String,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Whether a given metric should run under the current selection.
    pub fn wants(&self, metric: Metric) -> bool {
        self.metric == Metric::All || self.metric == metric
    }
}
